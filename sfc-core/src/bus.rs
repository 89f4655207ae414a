use crate::apu::Apu;
use crate::input::Joypads;
use crate::memory::dma::{self, CpuInternalRegisters};
use crate::memory::Memory;
use crate::ppu::Ppu;
use w65816_emu::traits::BusInterface;

/// A per-quantum borrowing view over the console. The CPU and the DMA
/// engine both drive reads/writes through this; `dma_cycles` accumulates
/// the cost of any transfer triggered mid-instruction so the scheduler can
/// charge it against the scanline budget.
pub struct Bus<'a> {
    pub memory: &'a mut Memory,
    pub cpu_registers: &'a mut CpuInternalRegisters,
    pub ppu: &'a mut Ppu,
    pub apu: &'a mut Apu,
    pub joypads: &'a mut Joypads,
    pub dma_cycles: u32,
}

impl Bus<'_> {
    fn read_system_area(&mut self, address: u32) -> u8 {
        match address & 0xFFFF {
            0x0000..=0x1FFF => {
                // First 8KB of WRAM
                self.memory.read_wram(address)
            }
            0x2100..=0x213F => self.ppu.read_port(address),
            0x2140..=0x217F => self.apu.read_port(address),
            0x2180 => self.memory.read_wram_port(),
            0x4016 => {
                // JOYSER0: controller 1 serial bit
                self.joypads.read_port(0)
            }
            0x4017 => {
                // JOYSER1: controller 2 serial bit
                self.joypads.read_port(1)
            }
            0x4000..=0x5FFF => self.cpu_registers.read_register(address),
            0x6000..=0x7FFF => {
                // Expansion / HiROM SRAM region
                self.memory.read_cartridge(address)
            }
            _ => {
                log::debug!("Open bus read: {address:06X}");
                0xFF
            }
        }
    }

    fn write_system_area(&mut self, address: u32, value: u8) {
        match address & 0xFFFF {
            0x0000..=0x1FFF => {
                // First 8KB of WRAM
                self.memory.write_wram(address, value);
            }
            0x2100..=0x213F => self.ppu.write_port(address, value),
            0x2140..=0x217F => self.apu.write_port(address, value),
            0x2180 => self.memory.write_wram_port(value),
            0x2181 => self.memory.write_wram_port_address_low(value),
            0x2182 => self.memory.write_wram_port_address_mid(value),
            0x2183 => self.memory.write_wram_port_address_high(value),
            0x4016 => self.joypads.write_strobe(value),
            0x4000..=0x5FFF => {
                self.cpu_registers.write_register(address, value);

                // MDMAEN transfers run synchronously at the triggering write
                if self.cpu_registers.gpdma_pending() {
                    let cycles = dma::run_gpdma(self);
                    self.dma_cycles += cycles;
                }
            }
            0x6000..=0x7FFF => {
                self.memory.write_cartridge(address, value);
            }
            _ => {
                log::debug!("Discarded write: {address:06X} {value:02X}");
            }
        }
    }

    fn read_internal(&mut self, address: u32) -> u8 {
        let bank = address >> 16;
        let offset = address & 0xFFFF;
        match (bank, offset) {
            (0x7E..=0x7F, _) => {
                // WRAM
                self.memory.read_wram(address)
            }
            (0x00..=0x3F | 0x80..=0xBF, 0x0000..=0x7FFF) => {
                // System area
                self.read_system_area(address)
            }
            _ => {
                // Cartridge
                self.memory.read_cartridge(address)
            }
        }
    }

    fn write_internal(&mut self, address: u32, value: u8) {
        let bank = address >> 16;
        let offset = address & 0xFFFF;
        match (bank, offset) {
            (0x7E..=0x7F, _) => {
                // WRAM
                self.memory.write_wram(address, value);
            }
            (0x00..=0x3F | 0x80..=0xBF, 0x0000..=0x7FFF) => {
                // System area
                self.write_system_area(address, value);
            }
            _ => {
                // Cartridge
                self.memory.write_cartridge(address, value);
            }
        }
    }

    pub(crate) fn read_for_dma(&mut self, address: u32) -> u8 {
        self.read_internal(address)
    }

    pub(crate) fn write_for_dma(&mut self, address: u32, value: u8) {
        self.write_internal(address, value);
    }
}

impl BusInterface for Bus<'_> {
    #[inline]
    fn read(&mut self, address: u32) -> u8 {
        self.read_internal(address)
    }

    #[inline]
    fn write(&mut self, address: u32, value: u8) {
        self.write_internal(address, value);
    }

    #[inline]
    fn idle(&mut self) {}

    #[inline]
    fn nmi(&self) -> bool {
        self.cpu_registers.nmi_line()
    }

    #[inline]
    fn irq(&self) -> bool {
        // H/V timer IRQs are not generated
        false
    }
}
