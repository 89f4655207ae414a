mod alu;
mod bits;
mod flags;
mod flow;
mod load;

use crate::core::{InterruptType, Registers, SizeBits, W65816};
use crate::traits::BusInterface;

pub(crate) fn u24_address(bank: u8, address: u16) -> u32 {
    (u32::from(bank) << 16) | u32::from(address)
}

pub(crate) fn bus_read<B: BusInterface>(cpu: &mut W65816, bus: &mut B, address: u32) -> u8 {
    cpu.state.cycles += 1;
    bus.read(address & B::ADDRESS_MASK)
}

pub(crate) fn bus_write<B: BusInterface>(cpu: &mut W65816, bus: &mut B, address: u32, value: u8) {
    cpu.state.cycles += 1;
    bus.write(address & B::ADDRESS_MASK, value);
}

pub(crate) fn idle<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    cpu.state.cycles += 1;
    bus.idle();
}

pub(crate) fn fetch_operand<B: BusInterface>(cpu: &mut W65816, bus: &mut B) -> u8 {
    let address = u24_address(cpu.registers.pbr, cpu.registers.pc);
    cpu.registers.pc = cpu.registers.pc.wrapping_add(1);
    bus_read(cpu, bus, address)
}

pub(crate) fn fetch_operand_u16<B: BusInterface>(cpu: &mut W65816, bus: &mut B) -> u16 {
    let lsb = fetch_operand(cpu, bus);
    let msb = fetch_operand(cpu, bus);
    u16::from_le_bytes([lsb, msb])
}

pub(crate) fn poll_interrupt_lines<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    let nmi = bus.nmi();
    cpu.state.nmi_triggered |= !cpu.state.last_nmi && nmi;
    cpu.state.last_nmi = nmi;

    cpu.state.irq_triggered = !cpu.registers.p.irq_disabled && bus.irq();
}

pub(crate) fn ensure_page_1_stack(registers: &mut Registers) {
    registers.s = 0x0100 | (registers.s & 0x00FF);
}

/// Re-assert the register-width invariants after P has been replaced
/// wholesale (PLP, RTI, or the debug setter).
pub(crate) fn apply_status_invariants(registers: &mut Registers) {
    if registers.emulation_mode {
        registers.p.accumulator_size = SizeBits::Eight;
        registers.p.index_size = SizeBits::Eight;
    }

    if registers.p.index_size == SizeBits::Eight {
        registers.x &= 0x00FF;
        registers.y &= 0x00FF;
    }
}

// Stack accesses; emulation mode pins the stack to page 1 after every
// pointer move.

pub(crate) fn push_u8<B: BusInterface>(cpu: &mut W65816, bus: &mut B, value: u8) {
    let stack_address = cpu.registers.s.into();
    bus_write(cpu, bus, stack_address, value);
    cpu.registers.s = cpu.registers.s.wrapping_sub(1);
    if cpu.registers.emulation_mode {
        ensure_page_1_stack(&mut cpu.registers);
    }
}

pub(crate) fn push_u16<B: BusInterface>(cpu: &mut W65816, bus: &mut B, value: u16) {
    let [lsb, msb] = value.to_le_bytes();
    push_u8(cpu, bus, msb);
    push_u8(cpu, bus, lsb);
}

pub(crate) fn pop_u8<B: BusInterface>(cpu: &mut W65816, bus: &mut B) -> u8 {
    cpu.registers.s = cpu.registers.s.wrapping_add(1);
    if cpu.registers.emulation_mode {
        ensure_page_1_stack(&mut cpu.registers);
    }
    let stack_address = cpu.registers.s.into();
    bus_read(cpu, bus, stack_address)
}

pub(crate) fn pop_u16<B: BusInterface>(cpu: &mut W65816, bus: &mut B) -> u16 {
    let lsb = pop_u8(cpu, bus);
    let msb = pop_u8(cpu, bus);
    u16::from_le_bytes([lsb, msb])
}

pub(crate) fn service_interrupt<B: BusInterface>(
    cpu: &mut W65816,
    bus: &mut B,
    interrupt: InterruptType,
) {
    idle(cpu, bus);

    if !cpu.registers.emulation_mode {
        let pbr = cpu.registers.pbr;
        push_u8(cpu, bus, pbr);
    }
    let pc = cpu.registers.pc;
    push_u16(cpu, bus, pc);
    let p = cpu.registers.p.into();
    push_u8(cpu, bus, p);

    cpu.registers.p.irq_disabled = true;
    cpu.registers.p.decimal_mode = false;
    cpu.registers.pbr = 0;

    let vector = interrupt.vector(cpu.registers.emulation_mode);
    let lsb = bus_read(cpu, bus, vector);
    let msb = bus_read(cpu, bus, vector + 1);
    cpu.registers.pc = u16::from_le_bytes([lsb, msb]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AddressingMode {
    Accumulator,
    Immediate,
    DirectPage,
    DirectPageX,
    DirectPageY,
    DirectPageIndirect,
    DirectPageIndexedIndirect,
    DirectPageIndirectIndexed,
    DirectPageIndirectLong,
    DirectPageIndirectLongIndexed,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    AbsoluteLong,
    AbsoluteLongX,
    StackRelative,
    StackRelativeIndirectIndexed,
}

// Direct page indexing wraps within the page when in emulation mode with
// the D register page-aligned; otherwise it wraps within bank 0.
fn index_direct_page(cpu: &W65816, operand: u8, index: u16) -> u16 {
    if cpu.registers.emulation_mode && cpu.registers.d & 0x00FF == 0 {
        (cpu.registers.d.wrapping_add(operand.into()).wrapping_add(index) & 0x00FF)
            | (cpu.registers.d & 0xFF00)
    } else {
        cpu.registers.d.wrapping_add(operand.into()).wrapping_add(index)
    }
}

fn direct_page_penalty<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    // Non-page-aligned D costs one extra cycle on every direct page access
    if cpu.registers.d & 0x00FF != 0 {
        idle(cpu, bus);
    }
}

fn read_direct_pointer<B: BusInterface>(cpu: &mut W65816, bus: &mut B, pointer: u16) -> u16 {
    let lsb = bus_read(cpu, bus, pointer.into());
    let msb = bus_read(cpu, bus, pointer.wrapping_add(1).into());
    u16::from_le_bytes([lsb, msb])
}

fn read_direct_pointer_long<B: BusInterface>(cpu: &mut W65816, bus: &mut B, pointer: u16) -> u32 {
    let lsb = bus_read(cpu, bus, pointer.into());
    let mid = bus_read(cpu, bus, pointer.wrapping_add(1).into());
    let msb = bus_read(cpu, bus, pointer.wrapping_add(2).into());
    u32::from_le_bytes([lsb, mid, msb, 0])
}

/// Resolve the effective addresses of an operand's low and high bytes.
///
/// The pair is needed because 16-bit direct page and stack relative
/// operands wrap within bank 0 while the absolute and long modes carry into
/// the next bank.
fn operand_addresses<B: BusInterface>(
    cpu: &mut W65816,
    bus: &mut B,
    mode: AddressingMode,
) -> (u32, u32) {
    let bank0_pair = |address: u16| (u32::from(address), u32::from(address.wrapping_add(1)));
    let linear_pair = |address: u32| (address & B::ADDRESS_MASK, (address + 1) & B::ADDRESS_MASK);

    match mode {
        AddressingMode::Accumulator | AddressingMode::Immediate => {
            panic!("addressing mode {mode:?} has no effective address")
        }
        AddressingMode::DirectPage => {
            let operand = fetch_operand(cpu, bus);
            direct_page_penalty(cpu, bus);
            bank0_pair(cpu.registers.d.wrapping_add(operand.into()))
        }
        AddressingMode::DirectPageX => {
            let operand = fetch_operand(cpu, bus);
            direct_page_penalty(cpu, bus);
            idle(cpu, bus);
            bank0_pair(index_direct_page(cpu, operand, cpu.registers.x))
        }
        AddressingMode::DirectPageY => {
            let operand = fetch_operand(cpu, bus);
            direct_page_penalty(cpu, bus);
            idle(cpu, bus);
            bank0_pair(index_direct_page(cpu, operand, cpu.registers.y))
        }
        AddressingMode::DirectPageIndirect => {
            let operand = fetch_operand(cpu, bus);
            direct_page_penalty(cpu, bus);
            let pointer = cpu.registers.d.wrapping_add(operand.into());
            let address = read_direct_pointer(cpu, bus, pointer);
            linear_pair(u24_address(cpu.registers.dbr, address))
        }
        AddressingMode::DirectPageIndexedIndirect => {
            let operand = fetch_operand(cpu, bus);
            direct_page_penalty(cpu, bus);
            idle(cpu, bus);
            let pointer = index_direct_page(cpu, operand, cpu.registers.x);
            let address = read_direct_pointer(cpu, bus, pointer);
            linear_pair(u24_address(cpu.registers.dbr, address))
        }
        AddressingMode::DirectPageIndirectIndexed => {
            let operand = fetch_operand(cpu, bus);
            direct_page_penalty(cpu, bus);
            let pointer = cpu.registers.d.wrapping_add(operand.into());
            let address = read_direct_pointer(cpu, bus, pointer);
            idle(cpu, bus);
            let base = u24_address(cpu.registers.dbr, address);
            linear_pair(base + u32::from(cpu.registers.y))
        }
        AddressingMode::DirectPageIndirectLong => {
            let operand = fetch_operand(cpu, bus);
            direct_page_penalty(cpu, bus);
            let pointer = cpu.registers.d.wrapping_add(operand.into());
            let address = read_direct_pointer_long(cpu, bus, pointer);
            linear_pair(address)
        }
        AddressingMode::DirectPageIndirectLongIndexed => {
            let operand = fetch_operand(cpu, bus);
            direct_page_penalty(cpu, bus);
            let pointer = cpu.registers.d.wrapping_add(operand.into());
            let address = read_direct_pointer_long(cpu, bus, pointer);
            linear_pair(address + u32::from(cpu.registers.y))
        }
        AddressingMode::Absolute => {
            let address = fetch_operand_u16(cpu, bus);
            linear_pair(u24_address(cpu.registers.dbr, address))
        }
        AddressingMode::AbsoluteX => {
            let address = fetch_operand_u16(cpu, bus);
            idle(cpu, bus);
            let base = u24_address(cpu.registers.dbr, address);
            linear_pair(base + u32::from(cpu.registers.x))
        }
        AddressingMode::AbsoluteY => {
            let address = fetch_operand_u16(cpu, bus);
            idle(cpu, bus);
            let base = u24_address(cpu.registers.dbr, address);
            linear_pair(base + u32::from(cpu.registers.y))
        }
        AddressingMode::AbsoluteLong => {
            let lsb = fetch_operand(cpu, bus);
            let mid = fetch_operand(cpu, bus);
            let msb = fetch_operand(cpu, bus);
            linear_pair(u32::from_le_bytes([lsb, mid, msb, 0]))
        }
        AddressingMode::AbsoluteLongX => {
            let lsb = fetch_operand(cpu, bus);
            let mid = fetch_operand(cpu, bus);
            let msb = fetch_operand(cpu, bus);
            let base = u32::from_le_bytes([lsb, mid, msb, 0]);
            linear_pair(base + u32::from(cpu.registers.x))
        }
        AddressingMode::StackRelative => {
            let operand = fetch_operand(cpu, bus);
            idle(cpu, bus);
            bank0_pair(cpu.registers.s.wrapping_add(operand.into()))
        }
        AddressingMode::StackRelativeIndirectIndexed => {
            let operand = fetch_operand(cpu, bus);
            idle(cpu, bus);
            let pointer = cpu.registers.s.wrapping_add(operand.into());
            let address = read_direct_pointer(cpu, bus, pointer);
            idle(cpu, bus);
            let base = u24_address(cpu.registers.dbr, address);
            linear_pair(base + u32::from(cpu.registers.y))
        }
    }
}

pub(crate) fn read_operand_u8<B: BusInterface>(
    cpu: &mut W65816,
    bus: &mut B,
    mode: AddressingMode,
) -> u8 {
    match mode {
        AddressingMode::Immediate => fetch_operand(cpu, bus),
        _ => {
            let (address, _) = operand_addresses(cpu, bus, mode);
            bus_read(cpu, bus, address)
        }
    }
}

pub(crate) fn read_operand_u16<B: BusInterface>(
    cpu: &mut W65816,
    bus: &mut B,
    mode: AddressingMode,
) -> u16 {
    match mode {
        AddressingMode::Immediate => fetch_operand_u16(cpu, bus),
        _ => {
            let (lsb_addr, msb_addr) = operand_addresses(cpu, bus, mode);
            let lsb = bus_read(cpu, bus, lsb_addr);
            let msb = bus_read(cpu, bus, msb_addr);
            u16::from_le_bytes([lsb, msb])
        }
    }
}

pub(crate) fn write_operand_u8<B: BusInterface>(
    cpu: &mut W65816,
    bus: &mut B,
    mode: AddressingMode,
    value: u8,
) {
    let (address, _) = operand_addresses(cpu, bus, mode);
    bus_write(cpu, bus, address, value);
}

pub(crate) fn write_operand_u16<B: BusInterface>(
    cpu: &mut W65816,
    bus: &mut B,
    mode: AddressingMode,
    value: u16,
) {
    let (lsb_addr, msb_addr) = operand_addresses(cpu, bus, mode);
    let [lsb, msb] = value.to_le_bytes();
    bus_write(cpu, bus, lsb_addr, lsb);
    bus_write(cpu, bus, msb_addr, msb);
}

pub(crate) fn modify_operand_u8<B: BusInterface>(
    cpu: &mut W65816,
    bus: &mut B,
    mode: AddressingMode,
    op: impl FnOnce(&mut Registers, u8) -> u8,
) {
    match mode {
        AddressingMode::Accumulator => {
            idle(cpu, bus);
            let value = cpu.registers.a_u8();
            let result = op(&mut cpu.registers, value);
            cpu.registers.set_a_u8(result);
        }
        _ => {
            let (address, _) = operand_addresses(cpu, bus, mode);
            let value = bus_read(cpu, bus, address);
            idle(cpu, bus);
            let result = op(&mut cpu.registers, value);
            bus_write(cpu, bus, address, result);
        }
    }
}

pub(crate) fn modify_operand_u16<B: BusInterface>(
    cpu: &mut W65816,
    bus: &mut B,
    mode: AddressingMode,
    op: impl FnOnce(&mut Registers, u16) -> u16,
) {
    match mode {
        AddressingMode::Accumulator => {
            idle(cpu, bus);
            let value = cpu.registers.a;
            cpu.registers.a = op(&mut cpu.registers, value);
        }
        _ => {
            let (lsb_addr, msb_addr) = operand_addresses(cpu, bus, mode);
            let lsb = bus_read(cpu, bus, lsb_addr);
            let msb = bus_read(cpu, bus, msb_addr);
            idle(cpu, bus);
            let result = op(&mut cpu.registers, u16::from_le_bytes([lsb, msb]));
            let [result_lsb, result_msb] = result.to_le_bytes();
            bus_write(cpu, bus, msb_addr, result_msb);
            bus_write(cpu, bus, lsb_addr, result_lsb);
        }
    }
}

// NOP: No-op
fn nop<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    idle(cpu, bus);
}

// WDM: William D. Mensch, Jr. (2-byte no-op)
fn wdm<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    idle(cpu, bus);
    cpu.registers.pc = cpu.registers.pc.wrapping_add(1);
}

pub(crate) fn execute<B: BusInterface>(cpu: &mut W65816, bus: &mut B, opcode: u8) {
    use AddressingMode as AM;

    match opcode {
        0x00 => flow::brk(cpu, bus),
        0x01 => alu::ora(cpu, bus, AM::DirectPageIndexedIndirect),
        0x02 => flow::cop(cpu, bus),
        0x03 => alu::ora(cpu, bus, AM::StackRelative),
        0x04 => bits::tsb(cpu, bus, AM::DirectPage),
        0x05 => alu::ora(cpu, bus, AM::DirectPage),
        0x06 => bits::asl(cpu, bus, AM::DirectPage),
        0x07 => alu::ora(cpu, bus, AM::DirectPageIndirectLong),
        0x08 => load::php(cpu, bus),
        0x09 => alu::ora(cpu, bus, AM::Immediate),
        0x0A => bits::asl(cpu, bus, AM::Accumulator),
        0x0B => load::phd(cpu, bus),
        0x0C => bits::tsb(cpu, bus, AM::Absolute),
        0x0D => alu::ora(cpu, bus, AM::Absolute),
        0x0E => bits::asl(cpu, bus, AM::Absolute),
        0x0F => alu::ora(cpu, bus, AM::AbsoluteLong),
        0x10 => flow::bpl(cpu, bus),
        0x11 => alu::ora(cpu, bus, AM::DirectPageIndirectIndexed),
        0x12 => alu::ora(cpu, bus, AM::DirectPageIndirect),
        0x13 => alu::ora(cpu, bus, AM::StackRelativeIndirectIndexed),
        0x14 => bits::trb(cpu, bus, AM::DirectPage),
        0x15 => alu::ora(cpu, bus, AM::DirectPageX),
        0x16 => bits::asl(cpu, bus, AM::DirectPageX),
        0x17 => alu::ora(cpu, bus, AM::DirectPageIndirectLongIndexed),
        0x18 => flags::clc(cpu, bus),
        0x19 => alu::ora(cpu, bus, AM::AbsoluteY),
        0x1A => alu::inc(cpu, bus, AM::Accumulator),
        0x1B => load::tcs(cpu, bus),
        0x1C => bits::trb(cpu, bus, AM::Absolute),
        0x1D => alu::ora(cpu, bus, AM::AbsoluteX),
        0x1E => bits::asl(cpu, bus, AM::AbsoluteX),
        0x1F => alu::ora(cpu, bus, AM::AbsoluteLongX),
        0x20 => flow::jsr_absolute(cpu, bus),
        0x21 => alu::and(cpu, bus, AM::DirectPageIndexedIndirect),
        0x22 => flow::jsl(cpu, bus),
        0x23 => alu::and(cpu, bus, AM::StackRelative),
        0x24 => bits::bit(cpu, bus, AM::DirectPage),
        0x25 => alu::and(cpu, bus, AM::DirectPage),
        0x26 => bits::rol(cpu, bus, AM::DirectPage),
        0x27 => alu::and(cpu, bus, AM::DirectPageIndirectLong),
        0x28 => load::plp(cpu, bus),
        0x29 => alu::and(cpu, bus, AM::Immediate),
        0x2A => bits::rol(cpu, bus, AM::Accumulator),
        0x2B => load::pld(cpu, bus),
        0x2C => bits::bit(cpu, bus, AM::Absolute),
        0x2D => alu::and(cpu, bus, AM::Absolute),
        0x2E => bits::rol(cpu, bus, AM::Absolute),
        0x2F => alu::and(cpu, bus, AM::AbsoluteLong),
        0x30 => flow::bmi(cpu, bus),
        0x31 => alu::and(cpu, bus, AM::DirectPageIndirectIndexed),
        0x32 => alu::and(cpu, bus, AM::DirectPageIndirect),
        0x33 => alu::and(cpu, bus, AM::StackRelativeIndirectIndexed),
        0x34 => bits::bit(cpu, bus, AM::DirectPageX),
        0x35 => alu::and(cpu, bus, AM::DirectPageX),
        0x36 => bits::rol(cpu, bus, AM::DirectPageX),
        0x37 => alu::and(cpu, bus, AM::DirectPageIndirectLongIndexed),
        0x38 => flags::sec(cpu, bus),
        0x39 => alu::and(cpu, bus, AM::AbsoluteY),
        0x3A => alu::dec(cpu, bus, AM::Accumulator),
        0x3B => load::tsc(cpu, bus),
        0x3C => bits::bit(cpu, bus, AM::AbsoluteX),
        0x3D => alu::and(cpu, bus, AM::AbsoluteX),
        0x3E => bits::rol(cpu, bus, AM::AbsoluteX),
        0x3F => alu::and(cpu, bus, AM::AbsoluteLongX),
        0x40 => flow::rti(cpu, bus),
        0x41 => alu::eor(cpu, bus, AM::DirectPageIndexedIndirect),
        0x42 => wdm(cpu, bus),
        0x43 => alu::eor(cpu, bus, AM::StackRelative),
        0x44 => load::mvp(cpu, bus),
        0x45 => alu::eor(cpu, bus, AM::DirectPage),
        0x46 => bits::lsr(cpu, bus, AM::DirectPage),
        0x47 => alu::eor(cpu, bus, AM::DirectPageIndirectLong),
        0x48 => load::pha(cpu, bus),
        0x49 => alu::eor(cpu, bus, AM::Immediate),
        0x4A => bits::lsr(cpu, bus, AM::Accumulator),
        0x4B => load::phk(cpu, bus),
        0x4C => flow::jmp_absolute(cpu, bus),
        0x4D => alu::eor(cpu, bus, AM::Absolute),
        0x4E => bits::lsr(cpu, bus, AM::Absolute),
        0x4F => alu::eor(cpu, bus, AM::AbsoluteLong),
        0x50 => flow::bvc(cpu, bus),
        0x51 => alu::eor(cpu, bus, AM::DirectPageIndirectIndexed),
        0x52 => alu::eor(cpu, bus, AM::DirectPageIndirect),
        0x53 => alu::eor(cpu, bus, AM::StackRelativeIndirectIndexed),
        0x54 => load::mvn(cpu, bus),
        0x55 => alu::eor(cpu, bus, AM::DirectPageX),
        0x56 => bits::lsr(cpu, bus, AM::DirectPageX),
        0x57 => alu::eor(cpu, bus, AM::DirectPageIndirectLongIndexed),
        0x58 => flags::cli(cpu, bus),
        0x59 => alu::eor(cpu, bus, AM::AbsoluteY),
        0x5A => load::phy(cpu, bus),
        0x5B => load::tcd(cpu, bus),
        0x5C => flow::jmp_absolute_long(cpu, bus),
        0x5D => alu::eor(cpu, bus, AM::AbsoluteX),
        0x5E => bits::lsr(cpu, bus, AM::AbsoluteX),
        0x5F => alu::eor(cpu, bus, AM::AbsoluteLongX),
        0x60 => flow::rts(cpu, bus),
        0x61 => alu::adc(cpu, bus, AM::DirectPageIndexedIndirect),
        0x62 => flow::per(cpu, bus),
        0x63 => alu::adc(cpu, bus, AM::StackRelative),
        0x64 => load::stz(cpu, bus, AM::DirectPage),
        0x65 => alu::adc(cpu, bus, AM::DirectPage),
        0x66 => bits::ror(cpu, bus, AM::DirectPage),
        0x67 => alu::adc(cpu, bus, AM::DirectPageIndirectLong),
        0x68 => load::pla(cpu, bus),
        0x69 => alu::adc(cpu, bus, AM::Immediate),
        0x6A => bits::ror(cpu, bus, AM::Accumulator),
        0x6B => flow::rtl(cpu, bus),
        0x6C => flow::jmp_indirect(cpu, bus),
        0x6D => alu::adc(cpu, bus, AM::Absolute),
        0x6E => bits::ror(cpu, bus, AM::Absolute),
        0x6F => alu::adc(cpu, bus, AM::AbsoluteLong),
        0x70 => flow::bvs(cpu, bus),
        0x71 => alu::adc(cpu, bus, AM::DirectPageIndirectIndexed),
        0x72 => alu::adc(cpu, bus, AM::DirectPageIndirect),
        0x73 => alu::adc(cpu, bus, AM::StackRelativeIndirectIndexed),
        0x74 => load::stz(cpu, bus, AM::DirectPageX),
        0x75 => alu::adc(cpu, bus, AM::DirectPageX),
        0x76 => bits::ror(cpu, bus, AM::DirectPageX),
        0x77 => alu::adc(cpu, bus, AM::DirectPageIndirectLongIndexed),
        0x78 => flags::sei(cpu, bus),
        0x79 => alu::adc(cpu, bus, AM::AbsoluteY),
        0x7A => load::ply(cpu, bus),
        0x7B => load::tdc(cpu, bus),
        0x7C => flow::jmp_indexed_indirect(cpu, bus),
        0x7D => alu::adc(cpu, bus, AM::AbsoluteX),
        0x7E => bits::ror(cpu, bus, AM::AbsoluteX),
        0x7F => alu::adc(cpu, bus, AM::AbsoluteLongX),
        0x80 => flow::bra(cpu, bus),
        0x81 => load::sta(cpu, bus, AM::DirectPageIndexedIndirect),
        0x82 => flow::brl(cpu, bus),
        0x83 => load::sta(cpu, bus, AM::StackRelative),
        0x84 => load::sty(cpu, bus, AM::DirectPage),
        0x85 => load::sta(cpu, bus, AM::DirectPage),
        0x86 => load::stx(cpu, bus, AM::DirectPage),
        0x87 => load::sta(cpu, bus, AM::DirectPageIndirectLong),
        0x88 => alu::dey(cpu, bus),
        0x89 => bits::bit_immediate(cpu, bus),
        0x8A => load::txa(cpu, bus),
        0x8B => load::phb(cpu, bus),
        0x8C => load::sty(cpu, bus, AM::Absolute),
        0x8D => load::sta(cpu, bus, AM::Absolute),
        0x8E => load::stx(cpu, bus, AM::Absolute),
        0x8F => load::sta(cpu, bus, AM::AbsoluteLong),
        0x90 => flow::bcc(cpu, bus),
        0x91 => load::sta(cpu, bus, AM::DirectPageIndirectIndexed),
        0x92 => load::sta(cpu, bus, AM::DirectPageIndirect),
        0x93 => load::sta(cpu, bus, AM::StackRelativeIndirectIndexed),
        0x94 => load::sty(cpu, bus, AM::DirectPageX),
        0x95 => load::sta(cpu, bus, AM::DirectPageX),
        0x96 => load::stx(cpu, bus, AM::DirectPageY),
        0x97 => load::sta(cpu, bus, AM::DirectPageIndirectLongIndexed),
        0x98 => load::tya(cpu, bus),
        0x99 => load::sta(cpu, bus, AM::AbsoluteY),
        0x9A => load::txs(cpu, bus),
        0x9B => load::txy(cpu, bus),
        0x9C => load::stz(cpu, bus, AM::Absolute),
        0x9D => load::sta(cpu, bus, AM::AbsoluteX),
        0x9E => load::stz(cpu, bus, AM::AbsoluteX),
        0x9F => load::sta(cpu, bus, AM::AbsoluteLongX),
        0xA0 => load::ldy(cpu, bus, AM::Immediate),
        0xA1 => load::lda(cpu, bus, AM::DirectPageIndexedIndirect),
        0xA2 => load::ldx(cpu, bus, AM::Immediate),
        0xA3 => load::lda(cpu, bus, AM::StackRelative),
        0xA4 => load::ldy(cpu, bus, AM::DirectPage),
        0xA5 => load::lda(cpu, bus, AM::DirectPage),
        0xA6 => load::ldx(cpu, bus, AM::DirectPage),
        0xA7 => load::lda(cpu, bus, AM::DirectPageIndirectLong),
        0xA8 => load::tay(cpu, bus),
        0xA9 => load::lda(cpu, bus, AM::Immediate),
        0xAA => load::tax(cpu, bus),
        0xAB => load::plb(cpu, bus),
        0xAC => load::ldy(cpu, bus, AM::Absolute),
        0xAD => load::lda(cpu, bus, AM::Absolute),
        0xAE => load::ldx(cpu, bus, AM::Absolute),
        0xAF => load::lda(cpu, bus, AM::AbsoluteLong),
        0xB0 => flow::bcs(cpu, bus),
        0xB1 => load::lda(cpu, bus, AM::DirectPageIndirectIndexed),
        0xB2 => load::lda(cpu, bus, AM::DirectPageIndirect),
        0xB3 => load::lda(cpu, bus, AM::StackRelativeIndirectIndexed),
        0xB4 => load::ldy(cpu, bus, AM::DirectPageX),
        0xB5 => load::lda(cpu, bus, AM::DirectPageX),
        0xB6 => load::ldx(cpu, bus, AM::DirectPageY),
        0xB7 => load::lda(cpu, bus, AM::DirectPageIndirectLongIndexed),
        0xB8 => flags::clv(cpu, bus),
        0xB9 => load::lda(cpu, bus, AM::AbsoluteY),
        0xBA => load::tsx(cpu, bus),
        0xBB => load::tyx(cpu, bus),
        0xBC => load::ldy(cpu, bus, AM::AbsoluteX),
        0xBD => load::lda(cpu, bus, AM::AbsoluteX),
        0xBE => load::ldx(cpu, bus, AM::AbsoluteY),
        0xBF => load::lda(cpu, bus, AM::AbsoluteLongX),
        0xC0 => alu::cpy(cpu, bus, AM::Immediate),
        0xC1 => alu::cmp(cpu, bus, AM::DirectPageIndexedIndirect),
        0xC2 => flags::rep(cpu, bus),
        0xC3 => alu::cmp(cpu, bus, AM::StackRelative),
        0xC4 => alu::cpy(cpu, bus, AM::DirectPage),
        0xC5 => alu::cmp(cpu, bus, AM::DirectPage),
        0xC6 => alu::dec(cpu, bus, AM::DirectPage),
        0xC7 => alu::cmp(cpu, bus, AM::DirectPageIndirectLong),
        0xC8 => alu::iny(cpu, bus),
        0xC9 => alu::cmp(cpu, bus, AM::Immediate),
        0xCA => alu::dex(cpu, bus),
        0xCB => flow::wai(cpu, bus),
        0xCC => alu::cpy(cpu, bus, AM::Absolute),
        0xCD => alu::cmp(cpu, bus, AM::Absolute),
        0xCE => alu::dec(cpu, bus, AM::Absolute),
        0xCF => alu::cmp(cpu, bus, AM::AbsoluteLong),
        0xD0 => flow::bne(cpu, bus),
        0xD1 => alu::cmp(cpu, bus, AM::DirectPageIndirectIndexed),
        0xD2 => alu::cmp(cpu, bus, AM::DirectPageIndirect),
        0xD3 => alu::cmp(cpu, bus, AM::StackRelativeIndirectIndexed),
        0xD4 => flow::pei(cpu, bus),
        0xD5 => alu::cmp(cpu, bus, AM::DirectPageX),
        0xD6 => alu::dec(cpu, bus, AM::DirectPageX),
        0xD7 => alu::cmp(cpu, bus, AM::DirectPageIndirectLongIndexed),
        0xD8 => flags::cld(cpu, bus),
        0xD9 => alu::cmp(cpu, bus, AM::AbsoluteY),
        0xDA => load::phx(cpu, bus),
        0xDB => flow::stp(cpu, bus),
        0xDC => flow::jmp_indirect_long(cpu, bus),
        0xDD => alu::cmp(cpu, bus, AM::AbsoluteX),
        0xDE => alu::dec(cpu, bus, AM::AbsoluteX),
        0xDF => alu::cmp(cpu, bus, AM::AbsoluteLongX),
        0xE0 => alu::cpx(cpu, bus, AM::Immediate),
        0xE1 => alu::sbc(cpu, bus, AM::DirectPageIndexedIndirect),
        0xE2 => flags::sep(cpu, bus),
        0xE3 => alu::sbc(cpu, bus, AM::StackRelative),
        0xE4 => alu::cpx(cpu, bus, AM::DirectPage),
        0xE5 => alu::sbc(cpu, bus, AM::DirectPage),
        0xE6 => alu::inc(cpu, bus, AM::DirectPage),
        0xE7 => alu::sbc(cpu, bus, AM::DirectPageIndirectLong),
        0xE8 => alu::inx(cpu, bus),
        0xE9 => alu::sbc(cpu, bus, AM::Immediate),
        0xEA => nop(cpu, bus),
        0xEB => load::xba(cpu, bus),
        0xEC => alu::cpx(cpu, bus, AM::Absolute),
        0xED => alu::sbc(cpu, bus, AM::Absolute),
        0xEE => alu::inc(cpu, bus, AM::Absolute),
        0xEF => alu::sbc(cpu, bus, AM::AbsoluteLong),
        0xF0 => flow::beq(cpu, bus),
        0xF1 => alu::sbc(cpu, bus, AM::DirectPageIndirectIndexed),
        0xF2 => alu::sbc(cpu, bus, AM::DirectPageIndirect),
        0xF3 => alu::sbc(cpu, bus, AM::StackRelativeIndirectIndexed),
        0xF4 => flow::pea(cpu, bus),
        0xF5 => alu::sbc(cpu, bus, AM::DirectPageX),
        0xF6 => alu::inc(cpu, bus, AM::DirectPageX),
        0xF7 => alu::sbc(cpu, bus, AM::DirectPageIndirectLongIndexed),
        0xF8 => flags::sed(cpu, bus),
        0xF9 => alu::sbc(cpu, bus, AM::AbsoluteY),
        0xFA => load::plx(cpu, bus),
        0xFB => flags::xce(cpu, bus),
        0xFC => flow::jsr_indexed_indirect(cpu, bus),
        0xFD => alu::sbc(cpu, bus, AM::AbsoluteX),
        0xFE => alu::inc(cpu, bus, AM::AbsoluteX),
        0xFF => alu::sbc(cpu, bus, AM::AbsoluteLongX),
    }
}
