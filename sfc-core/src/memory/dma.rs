//! The 5A22 CPU I/O register block ($4200-$43FF) and the general-purpose
//! DMA engine it controls.

use crate::bus::Bus;
use bincode::{Decode, Encode};
use sfc_common::num::GetBit;
use std::array;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
enum IrqMode {
    // No IRQs
    #[default]
    Off,
    // IRQ at H=HTIME, every line
    H,
    // IRQ at V=VTIME + H=0
    V,
    // IRQ at V=VTIME + H=HTIME
    HV,
}

impl IrqMode {
    fn from_byte(byte: u8) -> Self {
        match byte & 0x30 {
            0x00 => Self::Off,
            0x10 => Self::H,
            0x20 => Self::V,
            0x30 => Self::HV,
            _ => unreachable!("value & 0x30 is always one of the above values"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
enum DmaDirection {
    #[default]
    AtoB,
    BtoA,
}

impl DmaDirection {
    fn from_byte(byte: u8) -> Self {
        if byte.bit(7) { Self::BtoA } else { Self::AtoB }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
enum DmaIncrementMode {
    #[default]
    Increment,
    Decrement,
    Fixed,
}

impl DmaIncrementMode {
    fn from_byte(byte: u8) -> Self {
        match byte & 0x18 {
            0x00 => Self::Increment,
            0x10 => Self::Decrement,
            0x08 | 0x18 => Self::Fixed,
            _ => unreachable!("value & 0x18 is always one of the above values"),
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            Self::Increment => 0x00,
            Self::Decrement => 0x10,
            Self::Fixed => 0x08,
        }
    }
}

// Registers/ports that live on the 5A22 chip but are not part of the 65816
#[derive(Debug, Clone, Encode, Decode)]
pub struct CpuInternalRegisters {
    nmi_enabled: bool,
    irq_mode: IrqMode,
    auto_joypad_read_enabled: bool,
    irq_htime: u16,
    irq_vtime: u16,
    multiply_operand_l: u8,
    multiply_operand_r: u8,
    multiply_product: u16,
    division_dividend: u16,
    division_divisor: u8,
    division_quotient: u16,
    vblank_flag: bool,
    vblank_nmi_flag: bool,
    auto_joypad_words: [u16; 2],
    // GPDMA channel register file ($43x0-$43x9)
    gpdma_active: [bool; 8],
    dma_direction: [DmaDirection; 8],
    dma_increment_mode: [DmaIncrementMode; 8],
    dma_transfer_unit: [u8; 8],
    dma_bus_b_address: [u8; 8],
    dma_bus_a_address: [u16; 8],
    dma_bus_a_bank: [u8; 8],
    dma_byte_counter: [u16; 8],
    dma_in_progress: bool,
}

impl CpuInternalRegisters {
    pub fn new() -> Self {
        Self {
            nmi_enabled: false,
            irq_mode: IrqMode::default(),
            auto_joypad_read_enabled: false,
            irq_htime: 0,
            irq_vtime: 0,
            multiply_operand_l: 0xFF,
            multiply_operand_r: 0xFF,
            multiply_product: 0,
            division_dividend: 0xFFFF,
            division_divisor: 0xFF,
            division_quotient: 0,
            vblank_flag: false,
            vblank_nmi_flag: false,
            auto_joypad_words: [0; 2],
            gpdma_active: [false; 8],
            dma_direction: [DmaDirection::default(); 8],
            dma_increment_mode: [DmaIncrementMode::default(); 8],
            dma_transfer_unit: [0x07; 8],
            dma_bus_b_address: [0xFF; 8],
            dma_bus_a_address: [0xFFFF; 8],
            dma_bus_a_bank: [0xFF; 8],
            dma_byte_counter: [0xFFFF; 8],
            dma_in_progress: false,
        }
    }

    /// The NMI line as seen by the CPU: enabled in NMITIMEN and the vblank
    /// NMI latch still set (reading RDNMI drops the line).
    pub fn nmi_line(&self) -> bool {
        self.nmi_enabled && self.vblank_nmi_flag
    }

    /// Called by the scheduler at the vblank edges; the rising edge latches
    /// the NMI flag.
    pub fn set_vblank(&mut self, vblank: bool) {
        if vblank && !self.vblank_flag {
            self.vblank_nmi_flag = true;
        }
        if !vblank {
            self.vblank_nmi_flag = false;
        }
        self.vblank_flag = vblank;
    }

    pub fn auto_joypad_read_enabled(&self) -> bool {
        self.auto_joypad_read_enabled
    }

    pub fn set_auto_joypad_words(&mut self, words: [u16; 2]) {
        self.auto_joypad_words = words;
    }

    pub fn gpdma_pending(&self) -> bool {
        !self.dma_in_progress && self.gpdma_active.iter().copied().any(|active| active)
    }

    pub fn read_register(&mut self, address: u32) -> u8 {
        match address & 0xFFFF {
            0x4210 => {
                // RDNMI: Vblank NMI flag (cleared on read) + CPU version
                let value = (u8::from(self.vblank_nmi_flag) << 7) | 0x02;
                self.vblank_nmi_flag = false;
                value
            }
            0x4211 => {
                // TIMEUP: H/V IRQ flag; timer IRQs are never raised here
                0x00
            }
            0x4212 => {
                // HVBJOY: Vblank/hblank/auto-joypad status
                u8::from(self.vblank_flag) << 7
            }
            0x4214 => {
                // RDDIVL: Division quotient, low byte
                self.division_quotient as u8
            }
            0x4215 => {
                // RDDIVH: Division quotient, high byte
                (self.division_quotient >> 8) as u8
            }
            0x4216 => {
                // RDMPYL: Multiply product / division remainder, low byte
                self.multiply_product as u8
            }
            0x4217 => {
                // RDMPYH: Multiply product / division remainder, high byte
                (self.multiply_product >> 8) as u8
            }
            0x4218 => self.auto_joypad_words[0] as u8,
            0x4219 => (self.auto_joypad_words[0] >> 8) as u8,
            0x421A => self.auto_joypad_words[1] as u8,
            0x421B => (self.auto_joypad_words[1] >> 8) as u8,
            0x421C..=0x421F => {
                // Joypads 3/4 are not connected
                0x00
            }
            address @ 0x4300..=0x437F => self.read_dma_register(address),
            address => {
                log::debug!("Unmapped CPU I/O read: {address:06X}");
                0xFF
            }
        }
    }

    pub fn write_register(&mut self, address: u32, value: u8) {
        log::trace!("CPU internal register write: {address:06X} {value:02X}");

        match address & 0xFFFF {
            0x4200 => {
                // NMITIMEN: Interrupt enable and joypad request
                self.auto_joypad_read_enabled = value.bit(0);
                self.irq_mode = IrqMode::from_byte(value);
                self.nmi_enabled = value.bit(7);

                if self.irq_mode != IrqMode::Off {
                    log::warn!("H/V timer IRQs enabled but not implemented: {value:02X}");
                }
            }
            0x4201 => {
                // WRIO: Programmable I/O port; not wired to anything here
                log::debug!("Ignored WRIO write: {value:02X}");
            }
            0x4202 => {
                // WRMPYA: Multiplication 8-bit operand A
                self.multiply_operand_l = value;
            }
            0x4203 => {
                // WRMPYB: Multiplication 8-bit operand B + start multiplication
                self.multiply_operand_r = value;
                self.multiply_product = u16::from(self.multiply_operand_l) * u16::from(value);

                // Multiplication always writes operand B to the quotient register
                self.division_quotient = value.into();
            }
            0x4204 => {
                // WRDIVL: Division 16-bit dividend, low byte
                self.division_dividend = (self.division_dividend & 0xFF00) | u16::from(value);
            }
            0x4205 => {
                // WRDIVH: Division 16-bit dividend, high byte
                self.division_dividend =
                    (self.division_dividend & 0x00FF) | (u16::from(value) << 8);
            }
            0x4206 => {
                // WRDIVB: Division 8-bit divisor + start division
                self.division_divisor = value;

                if value != 0 {
                    self.division_quotient = self.division_dividend / u16::from(value);
                    // Division writes the remainder to the multiply product register
                    self.multiply_product = self.division_dividend % u16::from(value);
                } else {
                    // Divide by 0 sets quotient $FFFF and remainder = dividend
                    self.division_quotient = 0xFFFF;
                    self.multiply_product = self.division_dividend;
                }
            }
            0x4207 => {
                // HTIMEL
                self.irq_htime = (self.irq_htime & 0xFF00) | u16::from(value);
            }
            0x4208 => {
                // HTIMEH: only the lowest bit is significant
                self.irq_htime = (self.irq_htime & 0x00FF) | (u16::from(value & 0x01) << 8);
            }
            0x4209 => {
                // VTIMEL
                self.irq_vtime = (self.irq_vtime & 0xFF00) | u16::from(value);
            }
            0x420A => {
                // VTIMEH: only the lowest bit is significant
                self.irq_vtime = (self.irq_vtime & 0x00FF) | (u16::from(value & 0x01) << 8);
            }
            0x420B => {
                // MDMAEN: Select general purpose DMA channels + start transfer
                if self.dma_in_progress {
                    log::warn!("MDMAEN written during an active DMA transfer; ignored");
                    return;
                }
                self.gpdma_active = array::from_fn(|i| value.bit(i as u8));

                log::trace!("  GPDMA channel select: {value:02X}");
            }
            0x420C => {
                // HDMAEN: HBlank DMA is not performed
                if value != 0 {
                    log::warn!("HDMA enabled but not implemented: {value:02X}");
                }
            }
            0x420D => {
                // MEMSEL: Memory-2 waitstate control; the flat cycle model
                // has no fast/slow distinction
                log::trace!("MEMSEL write: {value:02X}");
            }
            address @ 0x4300..=0x437F => {
                self.write_dma_register(address, value);
            }
            address => {
                log::debug!("Unmapped CPU I/O write: {address:06X} {value:02X}");
            }
        }
    }

    fn read_dma_register(&self, address: u32) -> u8 {
        // Second-least significant nibble is the channel
        let channel = ((address >> 4) & 0x7) as usize;

        match address & 0xFF0F {
            0x4300 => {
                // DMAPx: reconstruct the parameter byte
                (u8::from(self.dma_direction[channel] == DmaDirection::BtoA) << 7)
                    | self.dma_increment_mode[channel].to_bits()
                    | self.dma_transfer_unit[channel]
            }
            0x4301 => self.dma_bus_b_address[channel],
            0x4302 => self.dma_bus_a_address[channel] as u8,
            0x4303 => (self.dma_bus_a_address[channel] >> 8) as u8,
            0x4304 => self.dma_bus_a_bank[channel],
            0x4305 => self.dma_byte_counter[channel] as u8,
            0x4306 => (self.dma_byte_counter[channel] >> 8) as u8,
            _ => {
                log::debug!("Unmapped DMA register read: {address:06X}");
                0xFF
            }
        }
    }

    fn write_dma_register(&mut self, address: u32, value: u8) {
        // Second-least significant nibble is the channel
        let channel = ((address >> 4) & 0x7) as usize;

        match address & 0xFF0F {
            0x4300 => {
                // DMAPx: DMA parameters
                self.dma_transfer_unit[channel] = value & 0x07;
                self.dma_increment_mode[channel] = DmaIncrementMode::from_byte(value);
                self.dma_direction[channel] = DmaDirection::from_byte(value);
            }
            0x4301 => {
                // BBADx: Bus B address (I/O port low byte)
                self.dma_bus_b_address[channel] = value;
            }
            0x4302 => {
                // A1TxL: Bus A address, low byte
                self.dma_bus_a_address[channel] =
                    (self.dma_bus_a_address[channel] & 0xFF00) | u16::from(value);
            }
            0x4303 => {
                // A1TxH: Bus A address, high byte
                self.dma_bus_a_address[channel] =
                    (self.dma_bus_a_address[channel] & 0x00FF) | (u16::from(value) << 8);
            }
            0x4304 => {
                // A1Bx: Bus A bank
                self.dma_bus_a_bank[channel] = value;
            }
            0x4305 => {
                // DASxL: Byte counter, low byte
                self.dma_byte_counter[channel] =
                    (self.dma_byte_counter[channel] & 0xFF00) | u16::from(value);
            }
            0x4306 => {
                // DASxH: Byte counter, high byte
                self.dma_byte_counter[channel] =
                    (self.dma_byte_counter[channel] & 0x00FF) | (u16::from(value) << 8);
            }
            0x4307..=0x430A => {
                // HDMA table registers; accepted but HDMA never runs
                log::debug!("Ignored HDMA register write: {address:06X} {value:02X}");
            }
            _ => {
                log::debug!("Unmapped DMA register write: {address:06X} {value:02X}");
            }
        }
    }
}

// Transfer units (0-7) select how the bus B address walks per byte:
//   0: 1 byte, 1 register        {+0}
//   1: 2 bytes, 2 registers      {+0, +1}
//   2: 2 bytes, 1 register       {+0, +0}
//   3: 4 bytes, 2 registers      {+0, +0, +1, +1}
//   4: 4 bytes, 4 registers      {+0, +1, +2, +3}
//   5: 4 bytes, alternating      {+0, +1, +0, +1}
//   6: same as 2
//   7: same as 3
fn bus_b_adjustment(transfer_unit: u8, bytes_copied: u16) -> u8 {
    match transfer_unit {
        0 | 2 | 6 => 0,
        1 | 5 => (bytes_copied & 0x01) as u8,
        3 | 7 => ((bytes_copied >> 1) & 0x01) as u8,
        4 => (bytes_copied & 0x03) as u8,
        _ => panic!("invalid transfer unit: {transfer_unit}"),
    }
}

const CYCLES_PER_DMA_BYTE: u32 = 1;
const CYCLES_PER_DMA_CHANNEL: u32 = 8;

/// Drain every pending GPDMA channel in ascending order, synchronously.
///
/// Returns the cycle cost to charge against the scanline CPU budget. A byte
/// counter of 0 transfers the full $10000 bytes per the hardware rule.
pub fn run_gpdma(bus: &mut Bus<'_>) -> u32 {
    bus.cpu_registers.dma_in_progress = true;

    let mut cycles = 0;
    for channel in 0..8 {
        if !bus.cpu_registers.gpdma_active[channel] {
            continue;
        }

        cycles += CYCLES_PER_DMA_CHANNEL;

        log::trace!(
            "GPDMA channel {channel}: {:02X}:{:04X} {} $21{:02X}, unit {}, {:04X} bytes",
            bus.cpu_registers.dma_bus_a_bank[channel],
            bus.cpu_registers.dma_bus_a_address[channel],
            match bus.cpu_registers.dma_direction[channel] {
                DmaDirection::AtoB => "->",
                DmaDirection::BtoA => "<-",
            },
            bus.cpu_registers.dma_bus_b_address[channel],
            bus.cpu_registers.dma_transfer_unit[channel],
            bus.cpu_registers.dma_byte_counter[channel],
        );

        let mut bytes_copied: u16 = 0;
        loop {
            let transfer_unit = bus.cpu_registers.dma_transfer_unit[channel];
            let adjustment = bus_b_adjustment(transfer_unit, bytes_copied);

            let bus_a_address = bus.cpu_registers.dma_bus_a_address[channel];
            let bus_a_full_address = (u32::from(bus.cpu_registers.dma_bus_a_bank[channel]) << 16)
                | u32::from(bus_a_address);
            let bus_b_full_address = 0x002100
                | u32::from(bus.cpu_registers.dma_bus_b_address[channel].wrapping_add(adjustment));

            match bus.cpu_registers.dma_direction[channel] {
                DmaDirection::AtoB => {
                    let byte = bus.read_for_dma(bus_a_full_address);
                    bus.write_for_dma(bus_b_full_address, byte);
                }
                DmaDirection::BtoA => {
                    let byte = bus.read_for_dma(bus_b_full_address);
                    bus.write_for_dma(bus_a_full_address, byte);
                }
            }

            match bus.cpu_registers.dma_increment_mode[channel] {
                DmaIncrementMode::Fixed => {}
                DmaIncrementMode::Increment => {
                    bus.cpu_registers.dma_bus_a_address[channel] = bus_a_address.wrapping_add(1);
                }
                DmaIncrementMode::Decrement => {
                    bus.cpu_registers.dma_bus_a_address[channel] = bus_a_address.wrapping_sub(1);
                }
            }

            cycles += CYCLES_PER_DMA_BYTE;
            bytes_copied = bytes_copied.wrapping_add(1);

            let byte_counter = bus.cpu_registers.dma_byte_counter[channel].wrapping_sub(1);
            bus.cpu_registers.dma_byte_counter[channel] = byte_counter;
            if byte_counter == 0 {
                break;
            }
        }

        bus.cpu_registers.gpdma_active[channel] = false;
    }

    bus.cpu_registers.dma_in_progress = false;
    cycles
}
