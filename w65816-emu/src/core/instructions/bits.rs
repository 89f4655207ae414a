#[allow(clippy::wildcard_imports)]
use super::*;
use sfc_common::num::{GetBit, SignBit};

// BIT: Test bits
// The immediate form is separate because it only sets the Z flag
pub(crate) fn bit<B: BusInterface>(cpu: &mut W65816, bus: &mut B, mode: AddressingMode) {
    match cpu.registers.p.accumulator_size {
        SizeBits::Eight => {
            let value = read_operand_u8(cpu, bus, mode);
            cpu.registers.p.zero = (cpu.registers.a as u8) & value == 0;
            cpu.registers.p.negative = value.sign_bit();
            cpu.registers.p.overflow = value.bit(6);
        }
        SizeBits::Sixteen => {
            let value = read_operand_u16(cpu, bus, mode);
            cpu.registers.p.zero = cpu.registers.a & value == 0;
            cpu.registers.p.negative = value.sign_bit();
            cpu.registers.p.overflow = value.bit(14);
        }
    }
}

pub(crate) fn bit_immediate<B: BusInterface>(cpu: &mut W65816, bus: &mut B) {
    match cpu.registers.p.accumulator_size {
        SizeBits::Eight => {
            let value = fetch_operand(cpu, bus);
            cpu.registers.p.zero = (cpu.registers.a as u8) & value == 0;
        }
        SizeBits::Sixteen => {
            let value = fetch_operand_u16(cpu, bus);
            cpu.registers.p.zero = cpu.registers.a & value == 0;
        }
    }
}

// TSB: Test and set bits
pub(crate) fn tsb<B: BusInterface>(cpu: &mut W65816, bus: &mut B, mode: AddressingMode) {
    match cpu.registers.p.accumulator_size {
        SizeBits::Eight => modify_operand_u8(cpu, bus, mode, |registers, value| {
            let a_lsb = registers.a as u8;
            registers.p.zero = a_lsb & value == 0;
            value | a_lsb
        }),
        SizeBits::Sixteen => modify_operand_u16(cpu, bus, mode, |registers, value| {
            registers.p.zero = registers.a & value == 0;
            value | registers.a
        }),
    }
}

// TRB: Test and reset bits
pub(crate) fn trb<B: BusInterface>(cpu: &mut W65816, bus: &mut B, mode: AddressingMode) {
    match cpu.registers.p.accumulator_size {
        SizeBits::Eight => modify_operand_u8(cpu, bus, mode, |registers, value| {
            let a_lsb = registers.a as u8;
            registers.p.zero = a_lsb & value == 0;
            value & !a_lsb
        }),
        SizeBits::Sixteen => modify_operand_u16(cpu, bus, mode, |registers, value| {
            registers.p.zero = registers.a & value == 0;
            value & !registers.a
        }),
    }
}

// ASL: Arithmetic shift left
pub(crate) fn asl<B: BusInterface>(cpu: &mut W65816, bus: &mut B, mode: AddressingMode) {
    match cpu.registers.p.accumulator_size {
        SizeBits::Eight => modify_operand_u8(cpu, bus, mode, |registers, value| {
            let result = value << 1;
            registers.p.carry = value.sign_bit();
            registers.p.set_nz_u8(result);
            result
        }),
        SizeBits::Sixteen => modify_operand_u16(cpu, bus, mode, |registers, value| {
            let result = value << 1;
            registers.p.carry = value.sign_bit();
            registers.p.set_nz_u16(result);
            result
        }),
    }
}

// LSR: Logical shift right
pub(crate) fn lsr<B: BusInterface>(cpu: &mut W65816, bus: &mut B, mode: AddressingMode) {
    match cpu.registers.p.accumulator_size {
        SizeBits::Eight => modify_operand_u8(cpu, bus, mode, |registers, value| {
            let result = value >> 1;
            registers.p.carry = value.bit(0);
            registers.p.set_nz_u8(result);
            result
        }),
        SizeBits::Sixteen => modify_operand_u16(cpu, bus, mode, |registers, value| {
            let result = value >> 1;
            registers.p.carry = value.bit(0);
            registers.p.set_nz_u16(result);
            result
        }),
    }
}

// ROL: Rotate left through carry
pub(crate) fn rol<B: BusInterface>(cpu: &mut W65816, bus: &mut B, mode: AddressingMode) {
    match cpu.registers.p.accumulator_size {
        SizeBits::Eight => modify_operand_u8(cpu, bus, mode, |registers, value| {
            let result = (value << 1) | u8::from(registers.p.carry);
            registers.p.carry = value.sign_bit();
            registers.p.set_nz_u8(result);
            result
        }),
        SizeBits::Sixteen => modify_operand_u16(cpu, bus, mode, |registers, value| {
            let result = (value << 1) | u16::from(registers.p.carry);
            registers.p.carry = value.sign_bit();
            registers.p.set_nz_u16(result);
            result
        }),
    }
}

// ROR: Rotate right through carry
pub(crate) fn ror<B: BusInterface>(cpu: &mut W65816, bus: &mut B, mode: AddressingMode) {
    match cpu.registers.p.accumulator_size {
        SizeBits::Eight => modify_operand_u8(cpu, bus, mode, |registers, value| {
            let result = (value >> 1) | (u8::from(registers.p.carry) << 7);
            registers.p.carry = value.bit(0);
            registers.p.set_nz_u8(result);
            result
        }),
        SizeBits::Sixteen => modify_operand_u16(cpu, bus, mode, |registers, value| {
            let result = (value >> 1) | (u16::from(registers.p.carry) << 15);
            registers.p.carry = value.bit(0);
            registers.p.set_nz_u16(result);
            result
        }),
    }
}
