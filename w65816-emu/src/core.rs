mod disassemble;
mod instructions;

use crate::traits::BusInterface;
use bincode::{Decode, Encode};
use sfc_common::num::GetBit;

const RESET_VECTOR: u32 = 0x00FFFC;

// Applied when the reset vector reads as $0000 (blank/invalid ROM) so that
// execution starts somewhere inside the mapped cartridge area.
const DEFAULT_RESET_PC: u16 = 0x8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub enum SizeBits {
    #[default]
    Eight,
    Sixteen,
}

impl SizeBits {
    fn from_bit(bit: bool) -> Self {
        if bit { Self::Eight } else { Self::Sixteen }
    }
}

/// The P register, stored unpacked. The emulation-mode flag E lives in
/// [`Registers`] because it is not part of P on hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct StatusRegister {
    pub negative: bool,
    pub overflow: bool,
    pub accumulator_size: SizeBits,
    pub index_size: SizeBits,
    pub decimal_mode: bool,
    pub irq_disabled: bool,
    pub zero: bool,
    pub carry: bool,
}

impl StatusRegister {
    fn new() -> Self {
        Self {
            negative: false,
            overflow: false,
            accumulator_size: SizeBits::Eight,
            index_size: SizeBits::Eight,
            decimal_mode: false,
            irq_disabled: true,
            zero: false,
            carry: false,
        }
    }

    pub(crate) fn set_nz_u8(&mut self, value: u8) {
        self.negative = value.bit(7);
        self.zero = value == 0;
    }

    pub(crate) fn set_nz_u16(&mut self, value: u16) {
        self.negative = value.bit(15);
        self.zero = value == 0;
    }
}

impl From<u8> for StatusRegister {
    fn from(value: u8) -> Self {
        Self {
            negative: value.bit(7),
            overflow: value.bit(6),
            accumulator_size: SizeBits::from_bit(value.bit(5)),
            index_size: SizeBits::from_bit(value.bit(4)),
            decimal_mode: value.bit(3),
            irq_disabled: value.bit(2),
            zero: value.bit(1),
            carry: value.bit(0),
        }
    }
}

impl From<StatusRegister> for u8 {
    fn from(p: StatusRegister) -> Self {
        (u8::from(p.negative) << 7)
            | (u8::from(p.overflow) << 6)
            | (u8::from(p.accumulator_size == SizeBits::Eight) << 5)
            | (u8::from(p.index_size == SizeBits::Eight) << 4)
            | (u8::from(p.decimal_mode) << 3)
            | (u8::from(p.irq_disabled) << 2)
            | (u8::from(p.zero) << 1)
            | u8::from(p.carry)
    }
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct Registers {
    pub a: u16,
    pub x: u16,
    pub y: u16,
    pub s: u16,
    pub d: u16,
    pub pc: u16,
    pub dbr: u8,
    pub pbr: u8,
    pub p: StatusRegister,
    pub emulation_mode: bool,
}

impl Registers {
    fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0x01FF,
            d: 0,
            pc: 0,
            dbr: 0,
            pbr: 0,
            p: StatusRegister::new(),
            emulation_mode: true,
        }
    }

    pub(crate) fn a_u8(&self) -> u8 {
        self.a as u8
    }

    pub(crate) fn set_a_u8(&mut self, value: u8) {
        self.a = (self.a & 0xFF00) | u16::from(value);
    }

    // X=1 keeps the index high bytes zeroed, so an 8-bit write replaces the
    // whole register.
    pub(crate) fn set_x_u8(&mut self, value: u8) {
        self.x = value.into();
    }

    pub(crate) fn set_y_u8(&mut self, value: u8) {
        self.y = value.into();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub(crate) enum InterruptType {
    Nmi,
    Irq,
    Break,
    Coprocessor,
}

impl InterruptType {
    pub(crate) fn vector(self, emulation_mode: bool) -> u32 {
        match (self, emulation_mode) {
            (Self::Nmi, false) => 0xFFEA,
            (Self::Irq | Self::Break, false) => 0xFFEE,
            (Self::Coprocessor, false) => 0xFFE4,
            (Self::Nmi, true) => 0xFFFA,
            (Self::Irq | Self::Break, true) => 0xFFFE,
            (Self::Coprocessor, true) => 0xFFF4,
        }
    }
}

#[derive(Debug, Clone, Encode, Decode)]
struct State {
    cycles: u32,
    nmi_triggered: bool,
    last_nmi: bool,
    irq_triggered: bool,
    waiting: bool,
    stopped: bool,
}

impl State {
    fn new() -> Self {
        Self {
            cycles: 0,
            nmi_triggered: false,
            last_nmi: false,
            irq_triggered: false,
            waiting: false,
            stopped: false,
        }
    }
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct W65816 {
    pub registers: Registers,
    state: State,
}

impl W65816 {
    #[must_use]
    pub fn new() -> Self {
        Self { registers: Registers::new(), state: State::new() }
    }

    /// Load the reset vector and force the documented power-on state:
    /// emulation mode, 8-bit A/X/Y, IRQs masked, stack at $01FF.
    pub fn reset<B: BusInterface>(&mut self, bus: &mut B) {
        let vector_lsb = bus.read(RESET_VECTOR);
        let vector_msb = bus.read(RESET_VECTOR + 1);
        let mut pc = u16::from_le_bytes([vector_lsb, vector_msb]);

        if pc == 0x0000 {
            log::warn!(
                "Reset vector reads as $0000; falling back to ${DEFAULT_RESET_PC:04X} for a ROM with no vector table"
            );
            pc = DEFAULT_RESET_PC;
        }

        self.registers = Registers::new();
        self.registers.pc = pc;
        self.state = State::new();

        log::debug!("CPU reset; PC={pc:04X}");
    }

    /// Execute one instruction (or service a pending interrupt) and return
    /// the number of CPU cycles consumed. Cycle accounting is approximate:
    /// one cycle per bus access plus one per internal operation.
    pub fn step<B: BusInterface>(&mut self, bus: &mut B) -> u32 {
        self.state.cycles = 0;

        instructions::poll_interrupt_lines(self, bus);

        if self.state.stopped {
            instructions::idle(self, bus);
            return self.state.cycles;
        }

        if self.state.waiting {
            // IRQs release WAI even while the I flag masks them
            if self.state.nmi_triggered || bus.irq() {
                self.state.waiting = false;
            } else {
                instructions::idle(self, bus);
                return self.state.cycles;
            }
        }

        if self.state.nmi_triggered {
            self.state.nmi_triggered = false;
            log::trace!("Servicing NMI");
            instructions::service_interrupt(self, bus, InterruptType::Nmi);
            return self.state.cycles;
        }

        if self.state.irq_triggered {
            log::trace!("Servicing IRQ");
            instructions::service_interrupt(self, bus, InterruptType::Irq);
            return self.state.cycles;
        }

        let opcode = instructions::fetch_operand(self, bus);

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "Fetched opcode {opcode:02X} ({}) from {:02X}:{:04X}; m={}, x={}, e={}",
                disassemble::instruction_str(opcode),
                self.registers.pbr,
                self.registers.pc.wrapping_sub(1),
                u8::from(self.registers.p.accumulator_size == SizeBits::Eight),
                u8::from(self.registers.p.index_size == SizeBits::Eight),
                u8::from(self.registers.emulation_mode),
            );
        }

        instructions::execute(self, bus, opcode);

        self.state.cycles
    }

    /// P as a packed NVMXDIZC byte. E is reported separately by
    /// [`Self::emulation_mode`].
    #[must_use]
    pub fn status_register(&self) -> u8 {
        self.registers.p.into()
    }

    /// Replace P wholesale; applies the same width-narrowing rules as PLP.
    pub fn set_status_register(&mut self, value: u8) {
        self.registers.p = value.into();
        instructions::apply_status_invariants(&mut self.registers);
    }

    #[must_use]
    pub fn emulation_mode(&self) -> bool {
        self.registers.emulation_mode
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state.stopped
    }
}

impl Default for W65816 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    struct TestBus {
        memory: Vec<u8>,
        nmi_line: bool,
        irq_line: bool,
    }

    impl TestBus {
        fn new() -> Self {
            init_logging();
            Self { memory: vec![0; 1 << 24], nmi_line: false, irq_line: false }
        }

        fn with_program(program: &[u8]) -> Self {
            let mut bus = Self::new();
            // Reset vector -> $8000
            bus.memory[0xFFFC] = 0x00;
            bus.memory[0xFFFD] = 0x80;
            bus.memory[0x8000..0x8000 + program.len()].copy_from_slice(program);
            bus
        }
    }

    impl BusInterface for TestBus {
        fn read(&mut self, address: u32) -> u8 {
            self.memory[address as usize]
        }

        fn write(&mut self, address: u32, value: u8) {
            self.memory[address as usize] = value;
        }

        fn idle(&mut self) {}

        fn nmi(&self) -> bool {
            self.nmi_line
        }

        fn irq(&self) -> bool {
            self.irq_line
        }
    }

    fn boot(program: &[u8]) -> (W65816, TestBus) {
        let mut bus = TestBus::with_program(program);
        let mut cpu = W65816::new();
        cpu.reset(&mut bus);
        (cpu, bus)
    }

    fn run_instructions(cpu: &mut W65816, bus: &mut TestBus, count: u32) {
        for _ in 0..count {
            cpu.step(bus);
        }
    }

    #[test]
    fn reset_reads_vector() {
        let mut bus = TestBus::new();
        bus.memory[0xFFFC] = 0x34;
        bus.memory[0xFFFD] = 0x12;

        let mut cpu = W65816::new();
        cpu.reset(&mut bus);

        assert_eq!(cpu.registers.pc, 0x1234);
        assert_eq!(cpu.registers.s, 0x01FF);
        assert!(cpu.registers.emulation_mode);
        assert!(cpu.registers.p.irq_disabled);
        assert_eq!(cpu.registers.p.accumulator_size, SizeBits::Eight);
    }

    #[test]
    fn reset_vector_fallback() {
        let mut bus = TestBus::new();
        let mut cpu = W65816::new();
        cpu.reset(&mut bus);

        assert_eq!(cpu.registers.pc, 0x8000);
    }

    #[test]
    fn status_register_round_trip() {
        init_logging();

        let mut cpu = W65816::new();
        cpu.registers.emulation_mode = false;

        for p in 0..=u8::MAX {
            cpu.set_status_register(p);
            assert_eq!(cpu.status_register(), p, "P={p:02X}");
        }
    }

    #[test]
    fn lda_immediate_widths() {
        // CLC; XCE; REP #$20; LDA #$1234
        let (mut cpu, mut bus) = boot(&[0x18, 0xFB, 0xC2, 0x20, 0xA9, 0x34, 0x12]);
        run_instructions(&mut cpu, &mut bus, 4);

        assert_eq!(cpu.registers.a, 0x1234);
        assert!(!cpu.registers.p.zero);
        assert!(!cpu.registers.p.negative);
    }

    #[test]
    fn lda_8_bit_preserves_high_byte() {
        let (mut cpu, mut bus) = boot(&[0xA9, 0x42]);
        cpu.registers.a = 0xAB00;
        run_instructions(&mut cpu, &mut bus, 1);

        assert_eq!(cpu.registers.a, 0xAB42);
    }

    #[test]
    fn xce_round_trip() {
        // CLC; XCE
        let (mut cpu, mut bus) = boot(&[0x18, 0xFB, 0x38, 0xFB]);
        run_instructions(&mut cpu, &mut bus, 2);

        assert!(!cpu.registers.emulation_mode);
        assert!(cpu.registers.p.carry);
        // M and X stay set until explicitly cleared with REP
        assert_eq!(cpu.registers.p.accumulator_size, SizeBits::Eight);
        assert_eq!(cpu.registers.p.index_size, SizeBits::Eight);

        // SEC; XCE: back to emulation mode
        cpu.registers.s = 0x02FF;
        run_instructions(&mut cpu, &mut bus, 2);

        assert!(cpu.registers.emulation_mode);
        assert!(!cpu.registers.p.carry);
        assert_eq!(cpu.registers.s, 0x01FF);
        assert_eq!(cpu.registers.p.accumulator_size, SizeBits::Eight);
        assert_eq!(cpu.registers.p.index_size, SizeBits::Eight);
    }

    #[test]
    fn rep_is_masked_in_emulation_mode() {
        // REP #$30 while E=1 must leave m and x set
        let (mut cpu, mut bus) = boot(&[0xC2, 0x30]);
        run_instructions(&mut cpu, &mut bus, 1);

        assert_eq!(cpu.registers.p.accumulator_size, SizeBits::Eight);
        assert_eq!(cpu.registers.p.index_size, SizeBits::Eight);
    }

    #[test]
    fn rep_sep_round_trip() {
        // CLC; XCE to native, then REP #$28 / SEP #$28
        let (mut cpu, mut bus) = boot(&[0x18, 0xFB, 0x08, 0xC2, 0x28, 0xE2, 0x28, 0x28]);
        run_instructions(&mut cpu, &mut bus, 3);
        let p_before = cpu.status_register();

        run_instructions(&mut cpu, &mut bus, 2);
        // PLP restores the original P
        run_instructions(&mut cpu, &mut bus, 1);
        assert_eq!(cpu.status_register() | 0x28, p_before | 0x28);
    }

    #[test]
    fn sep_narrows_index_registers() {
        // CLC; XCE; REP #$10; LDX #$1234; SEP #$10
        let (mut cpu, mut bus) = boot(&[0x18, 0xFB, 0xC2, 0x10, 0xA2, 0x34, 0x12, 0xE2, 0x10]);
        run_instructions(&mut cpu, &mut bus, 4);
        assert_eq!(cpu.registers.x, 0x1234);

        run_instructions(&mut cpu, &mut bus, 1);
        assert_eq!(cpu.registers.x, 0x0034);
    }

    #[test]
    fn push_pop_round_trip_across_emulation_boundary() {
        // PHA in emulation, switch to native, PLA
        let (mut cpu, mut bus) = boot(&[0x48, 0x18, 0xFB, 0x68]);
        cpu.registers.a = 0x00A5;
        run_instructions(&mut cpu, &mut bus, 4);

        assert_eq!(cpu.registers.a & 0x00FF, 0x00A5);
        assert_eq!(cpu.registers.s, 0x01FF);
        assert_eq!(cpu.registers.s & 0xFF00, 0x0100);
    }

    #[test]
    fn stack_stays_in_page_1_while_emulated() {
        let (mut cpu, mut bus) = boot(&[0x48]);
        cpu.registers.s = 0x0100;
        cpu.registers.a = 0x12;
        run_instructions(&mut cpu, &mut bus, 1);

        // Wraps within page 1 instead of escaping to page 0
        assert_eq!(cpu.registers.s, 0x01FF);
    }

    #[test]
    fn adc_sets_carry_and_overflow() {
        let (mut cpu, mut bus) = boot(&[0xA9, 0x7F, 0x69, 0x01]);
        run_instructions(&mut cpu, &mut bus, 2);

        assert_eq!(cpu.registers.a as u8, 0x80);
        assert!(cpu.registers.p.overflow);
        assert!(cpu.registers.p.negative);
        assert!(!cpu.registers.p.carry);

        // $80 + $80 carries and overflows
        let (mut cpu, mut bus) = boot(&[0xA9, 0x80, 0x69, 0x80]);
        run_instructions(&mut cpu, &mut bus, 2);
        assert_eq!(cpu.registers.a as u8, 0x00);
        assert!(cpu.registers.p.carry);
        assert!(cpu.registers.p.overflow);
        assert!(cpu.registers.p.zero);
    }

    #[test]
    fn adc_decimal_mode() {
        // SED; CLC implicit (carry clear after reset); LDA #$19; ADC #$28
        let (mut cpu, mut bus) = boot(&[0xF8, 0xA9, 0x19, 0x69, 0x28]);
        run_instructions(&mut cpu, &mut bus, 3);

        assert_eq!(cpu.registers.a as u8, 0x47);
        assert!(!cpu.registers.p.carry);
    }

    #[test]
    fn sbc_borrow_behavior() {
        // SEC; LDA #$50; SBC #$60
        let (mut cpu, mut bus) = boot(&[0x38, 0xA9, 0x50, 0xE9, 0x60]);
        run_instructions(&mut cpu, &mut bus, 3);

        assert_eq!(cpu.registers.a as u8, 0xF0);
        assert!(!cpu.registers.p.carry);
        assert!(cpu.registers.p.negative);
    }

    #[test]
    fn cmp_sets_flags_without_modifying_a() {
        let (mut cpu, mut bus) = boot(&[0xA9, 0x40, 0xC9, 0x40]);
        run_instructions(&mut cpu, &mut bus, 2);

        assert_eq!(cpu.registers.a as u8, 0x40);
        assert!(cpu.registers.p.zero);
        assert!(cpu.registers.p.carry);
    }

    #[test]
    fn branch_taken_and_not_taken() {
        // LDA #$00; BEQ +2; LDA #$01; LDA #$02
        let (mut cpu, mut bus) = boot(&[0xA9, 0x00, 0xF0, 0x02, 0xA9, 0x01, 0xA9, 0x02]);
        run_instructions(&mut cpu, &mut bus, 3);

        assert_eq!(cpu.registers.a as u8, 0x02);

        // BNE not taken falls through
        let (mut cpu, mut bus) = boot(&[0xA9, 0x00, 0xD0, 0x02, 0xA9, 0x01]);
        run_instructions(&mut cpu, &mut bus, 3);
        assert_eq!(cpu.registers.a as u8, 0x01);
    }

    #[test]
    fn backwards_branch() {
        // BRA $-2 loops in place
        let (mut cpu, mut bus) = boot(&[0x80, 0xFE]);
        run_instructions(&mut cpu, &mut bus, 4);

        assert_eq!(cpu.registers.pc, 0x8000);
    }

    #[test]
    fn jsr_rts_round_trip() {
        // JSR $8010 ... subroutine: LDA #$55; RTS
        let mut program = vec![0x20, 0x10, 0x80, 0xA9, 0x01];
        program.resize(0x10, 0xEA);
        program.extend_from_slice(&[0xA9, 0x55, 0x60]);
        let (mut cpu, mut bus) = boot(&program);

        run_instructions(&mut cpu, &mut bus, 3);
        assert_eq!(cpu.registers.a as u8, 0x55);
        assert_eq!(cpu.registers.pc, 0x8003);
        assert_eq!(cpu.registers.s, 0x01FF);
    }

    #[test]
    fn jsl_rtl_round_trip() {
        // JSL $00:8010
        let mut program = vec![0x22, 0x10, 0x80, 0x00];
        program.resize(0x10, 0xEA);
        program.extend_from_slice(&[0x6B]);
        let (mut cpu, mut bus) = boot(&program);

        run_instructions(&mut cpu, &mut bus, 2);
        assert_eq!(cpu.registers.pc, 0x8004);
        assert_eq!(cpu.registers.pbr, 0x00);
        assert_eq!(cpu.registers.s, 0x01FF);
    }

    #[test]
    fn direct_page_store_and_load() {
        // LDA #$5A; STA $10; LDA #$00; LDA $10
        let (mut cpu, mut bus) = boot(&[0xA9, 0x5A, 0x85, 0x10, 0xA9, 0x00, 0xA5, 0x10]);
        run_instructions(&mut cpu, &mut bus, 4);

        assert_eq!(bus.memory[0x0010], 0x5A);
        assert_eq!(cpu.registers.a as u8, 0x5A);
    }

    #[test]
    fn absolute_store_uses_data_bank() {
        let (mut cpu, mut bus) = boot(&[0x8D, 0x00, 0x20]);
        cpu.registers.dbr = 0x7E;
        cpu.registers.a = 0x0042;
        run_instructions(&mut cpu, &mut bus, 1);

        assert_eq!(bus.memory[0x7E2000], 0x42);
    }

    #[test]
    fn sixteen_bit_store_crosses_bank() {
        // Native mode, 16-bit A, STA $FFFF writes the MSB into the next bank
        let (mut cpu, mut bus) = boot(&[0x18, 0xFB, 0xC2, 0x20, 0x8D, 0xFF, 0xFF]);
        run_instructions(&mut cpu, &mut bus, 3);
        cpu.registers.a = 0xBEEF;
        cpu.registers.dbr = 0x7E;
        run_instructions(&mut cpu, &mut bus, 1);

        assert_eq!(bus.memory[0x7EFFFF], 0xEF);
        assert_eq!(bus.memory[0x7F0000], 0xBE);
    }

    #[test]
    fn block_move_mvn() {
        // Native, 16-bit index; MVN copies 3 bytes ascending
        let (mut cpu, mut bus) = boot(&[0x18, 0xFB, 0xC2, 0x30, 0x54, 0x00, 0x00]);
        bus.memory[0x1000..0x1003].copy_from_slice(&[0x11, 0x22, 0x33]);
        run_instructions(&mut cpu, &mut bus, 2);

        cpu.registers.a = 0x0002;
        cpu.registers.x = 0x1000;
        cpu.registers.y = 0x2000;
        run_instructions(&mut cpu, &mut bus, 4);

        assert_eq!(&bus.memory[0x2000..0x2003], &[0x11, 0x22, 0x33]);
        assert_eq!(cpu.registers.a, 0xFFFF);
        assert_eq!(cpu.registers.x, 0x1003);
        assert_eq!(cpu.registers.y, 0x2003);
        assert_eq!(cpu.registers.pc, 0x8007);
    }

    #[test]
    fn nmi_serviced_between_instructions() {
        let (mut cpu, mut bus) = boot(&[0xEA, 0xEA, 0xEA]);
        // Emulation-mode NMI vector
        bus.memory[0xFFFA] = 0x00;
        bus.memory[0xFFFB] = 0x90;

        run_instructions(&mut cpu, &mut bus, 1);
        bus.nmi_line = true;
        run_instructions(&mut cpu, &mut bus, 1);

        assert_eq!(cpu.registers.pc, 0x9000);
        assert!(cpu.registers.p.irq_disabled);

        // Level staying high does not retrigger after RTI
        bus.memory[0x9000] = 0x40; // RTI
        run_instructions(&mut cpu, &mut bus, 2);
        assert_eq!(cpu.registers.pc, 0x8002);
    }

    #[test]
    fn irq_masked_by_i_flag() {
        let (mut cpu, mut bus) = boot(&[0xEA, 0x58, 0xEA]);
        bus.memory[0xFFFE] = 0x00;
        bus.memory[0xFFFF] = 0xA0;
        bus.irq_line = true;

        // I is set after reset; IRQ must not be serviced
        run_instructions(&mut cpu, &mut bus, 1);
        assert_eq!(cpu.registers.pc, 0x8001);

        // CLI, then the IRQ fires before the next instruction
        run_instructions(&mut cpu, &mut bus, 2);
        assert_eq!(cpu.registers.pc, 0xA000);
    }

    #[test]
    fn wai_wakes_on_interrupt() {
        let (mut cpu, mut bus) = boot(&[0xCB, 0xEA]);
        bus.memory[0xFFFA] = 0x00;
        bus.memory[0xFFFB] = 0x90;

        run_instructions(&mut cpu, &mut bus, 3);
        assert_eq!(cpu.registers.pc, 0x8001);

        bus.nmi_line = true;
        run_instructions(&mut cpu, &mut bus, 1);
        assert_eq!(cpu.registers.pc, 0x9000);
    }

    #[test]
    fn inc_dec_memory() {
        let (mut cpu, mut bus) = boot(&[0xE6, 0x20, 0xE6, 0x20, 0xC6, 0x20]);
        run_instructions(&mut cpu, &mut bus, 3);

        assert_eq!(bus.memory[0x0020], 0x01);
        assert!(!cpu.registers.p.zero);
    }

    #[test]
    fn asl_rol_carry_chain() {
        // LDA #$81; ASL A; ROL A
        let (mut cpu, mut bus) = boot(&[0xA9, 0x81, 0x0A, 0x2A]);
        run_instructions(&mut cpu, &mut bus, 3);

        // ASL: $81 -> $02, C=1; ROL: $02 -> $05, C=0
        assert_eq!(cpu.registers.a as u8, 0x05);
        assert!(!cpu.registers.p.carry);
    }

    #[test]
    fn stp_halts_cpu() {
        let (mut cpu, mut bus) = boot(&[0xDB, 0xEA]);
        run_instructions(&mut cpu, &mut bus, 3);

        assert!(cpu.is_stopped());
        assert_eq!(cpu.registers.pc, 0x8001);
    }
}
