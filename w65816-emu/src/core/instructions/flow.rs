#[allow(clippy::wildcard_imports)]
use super::*;

fn branch_if<B: BusInterface>(cpu: &mut W65816, bus: &mut B, condition: bool) {
    let offset = fetch_operand(cpu, bus) as i8;
    if condition {
        idle(cpu, bus);
        cpu.registers.pc = cpu.registers.pc.wrapping_add(offset as u16);
    }
}

macro_rules! impl_branch_op {
    ($name:ident, |$p:ident| $condition:expr) => {
        pub(crate) fn $name<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
            let $p = &cpu.registers.p;
            let condition = $condition;
            branch_if(cpu, bus, condition);
        }
    };
}

// The eight conditional branches
impl_branch_op!(bpl, |p| !p.negative);
impl_branch_op!(bmi, |p| p.negative);
impl_branch_op!(bvc, |p| !p.overflow);
impl_branch_op!(bvs, |p| p.overflow);
impl_branch_op!(bcc, |p| !p.carry);
impl_branch_op!(bcs, |p| p.carry);
impl_branch_op!(bne, |p| !p.zero);
impl_branch_op!(beq, |p| p.zero);

// BRA: Branch always
pub(crate) fn bra<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    branch_if(cpu, bus, true);
}

// BRL: Branch always long (16-bit displacement)
pub(crate) fn brl<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    let offset = fetch_operand_u16(cpu, bus);
    idle(cpu, bus);
    cpu.registers.pc = cpu.registers.pc.wrapping_add(offset);
}

// JMP: Jump absolute (within the current program bank)
pub(crate) fn jmp_absolute<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    cpu.registers.pc = fetch_operand_u16(cpu, bus);
}

// JML: Jump absolute long
pub(crate) fn jmp_absolute_long<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    let pc = fetch_operand_u16(cpu, bus);
    let pbr = fetch_operand(cpu, bus);
    cpu.registers.pc = pc;
    cpu.registers.pbr = pbr;
}

// JMP (addr): the pointer always lives in bank 0
pub(crate) fn jmp_indirect<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    let pointer = fetch_operand_u16(cpu, bus);
    let lsb = bus_read(cpu, bus, pointer.into());
    let msb = bus_read(cpu, bus, pointer.wrapping_add(1).into());
    cpu.registers.pc = u16::from_le_bytes([lsb, msb]);
}

// JML [addr]: 24-bit pointer in bank 0
pub(crate) fn jmp_indirect_long<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    let pointer = fetch_operand_u16(cpu, bus);
    let lsb = bus_read(cpu, bus, pointer.into());
    let msb = bus_read(cpu, bus, pointer.wrapping_add(1).into());
    let bank = bus_read(cpu, bus, pointer.wrapping_add(2).into());
    cpu.registers.pc = u16::from_le_bytes([lsb, msb]);
    cpu.registers.pbr = bank;
}

// JMP (addr,X): the pointer is indexed within the program bank
pub(crate) fn jmp_indexed_indirect<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    let base = fetch_operand_u16(cpu, bus);
    idle(cpu, bus);
    let pointer = base.wrapping_add(cpu.registers.x);
    let lsb_address = u24_address(cpu.registers.pbr, pointer);
    let msb_address = u24_address(cpu.registers.pbr, pointer.wrapping_add(1));
    let lsb = bus_read(cpu, bus, lsb_address);
    let msb = bus_read(cpu, bus, msb_address);
    cpu.registers.pc = u16::from_le_bytes([lsb, msb]);
}

// JSR: Jump to subroutine; pushes the address of the last operand byte
pub(crate) fn jsr_absolute<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    let target = fetch_operand_u16(cpu, bus);
    idle(cpu, bus);
    let return_address = cpu.registers.pc.wrapping_sub(1);
    push_u16(cpu, bus, return_address);
    cpu.registers.pc = target;
}

// JSR (addr,X)
pub(crate) fn jsr_indexed_indirect<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    let base = fetch_operand_u16(cpu, bus);
    let return_address = cpu.registers.pc.wrapping_sub(1);
    push_u16(cpu, bus, return_address);
    idle(cpu, bus);
    let pointer = base.wrapping_add(cpu.registers.x);
    let lsb_address = u24_address(cpu.registers.pbr, pointer);
    let msb_address = u24_address(cpu.registers.pbr, pointer.wrapping_add(1));
    let lsb = bus_read(cpu, bus, lsb_address);
    let msb = bus_read(cpu, bus, msb_address);
    cpu.registers.pc = u16::from_le_bytes([lsb, msb]);
}

// JSL: Jump to subroutine long; pushes PBR then PC-1
pub(crate) fn jsl<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    let pc = fetch_operand_u16(cpu, bus);
    let old_pbr = cpu.registers.pbr;
    push_u8(cpu, bus, old_pbr);
    idle(cpu, bus);
    let pbr = fetch_operand(cpu, bus);
    let return_address = cpu.registers.pc.wrapping_sub(1);
    push_u16(cpu, bus, return_address);
    cpu.registers.pc = pc;
    cpu.registers.pbr = pbr;
}

// RTS: Return from subroutine
pub(crate) fn rts<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    idle(cpu, bus);
    idle(cpu, bus);
    cpu.registers.pc = pop_u16(cpu, bus).wrapping_add(1);
    idle(cpu, bus);
}

// RTL: Return from subroutine long
pub(crate) fn rtl<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    idle(cpu, bus);
    idle(cpu, bus);
    cpu.registers.pc = pop_u16(cpu, bus).wrapping_add(1);
    cpu.registers.pbr = pop_u8(cpu, bus);
}

// RTI: Return from interrupt
pub(crate) fn rti<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    idle(cpu, bus);
    idle(cpu, bus);

    let p = pop_u8(cpu, bus);
    cpu.registers.p = p.into();
    apply_status_invariants(&mut cpu.registers);

    cpu.registers.pc = pop_u16(cpu, bus);
    if !cpu.registers.emulation_mode {
        cpu.registers.pbr = pop_u8(cpu, bus);
    }
}

// BRK: Software break; the byte after the opcode is a signature byte
pub(crate) fn brk<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    let _signature = fetch_operand(cpu, bus);
    service_interrupt(cpu, bus, InterruptType::Break);
}

// COP: Coprocessor enable; vectors like BRK through the COP table
pub(crate) fn cop<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    let _signature = fetch_operand(cpu, bus);
    service_interrupt(cpu, bus, InterruptType::Coprocessor);
}

// PEA: Push effective absolute address (a 16-bit immediate)
pub(crate) fn pea<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    let value = fetch_operand_u16(cpu, bus);
    push_u16(cpu, bus, value);
}

// PEI: Push the 16-bit word at a direct page address
pub(crate) fn pei<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    let operand = fetch_operand(cpu, bus);
    let pointer = cpu.registers.d.wrapping_add(operand.into());
    let lsb = bus_read(cpu, bus, pointer.into());
    let msb = bus_read(cpu, bus, pointer.wrapping_add(1).into());
    push_u16(cpu, bus, u16::from_le_bytes([lsb, msb]));
}

// PER: Push PC-relative effective address
pub(crate) fn per<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    let offset = fetch_operand_u16(cpu, bus);
    idle(cpu, bus);
    let address = cpu.registers.pc.wrapping_add(offset);
    push_u16(cpu, bus, address);
}

// WAI: Halt until an interrupt line asserts
pub(crate) fn wai<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    idle(cpu, bus);
    cpu.state.waiting = true;
}

// STP: Halt until reset
pub(crate) fn stp<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    idle(cpu, bus);
    cpu.state.stopped = true;
    log::debug!("STP executed; CPU halted until reset");
}
