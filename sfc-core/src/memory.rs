pub mod cartridge;
pub mod dma;

use crate::memory::cartridge::{Cartridge, CartridgeError, RomHeader};
use bincode::{Decode, Encode};

const MAIN_RAM_LEN: usize = 128 * 1024;

type MainRam = [u8; MAIN_RAM_LEN];

#[derive(Debug, Clone, Encode, Decode)]
pub struct Memory {
    cartridge: Cartridge,
    main_ram: Box<MainRam>,
    wram_port_address: u32,
}

impl Memory {
    pub fn from_rom(rom: Vec<u8>, require_valid_header: bool) -> Result<Self, CartridgeError> {
        let cartridge = Cartridge::create(rom, require_valid_header)?;

        Ok(Self {
            cartridge,
            main_ram: vec![0; MAIN_RAM_LEN].into_boxed_slice().try_into().unwrap(),
            wram_port_address: 0,
        })
    }

    pub fn rom_header(&self) -> &RomHeader {
        self.cartridge.header()
    }

    pub fn read_cartridge(&self, address: u32) -> u8 {
        self.cartridge.read(address)
    }

    pub fn write_cartridge(&mut self, address: u32, value: u8) {
        self.cartridge.write(address, value);
    }

    pub fn read_wram(&self, address: u32) -> u8 {
        self.main_ram[(address as usize) & (MAIN_RAM_LEN - 1)]
    }

    pub fn write_wram(&mut self, address: u32, value: u8) {
        self.main_ram[(address as usize) & (MAIN_RAM_LEN - 1)] = value;
    }

    // WMDATA: WRAM data port on address bus B, with auto-increment

    pub fn read_wram_port(&mut self) -> u8 {
        let value = self.main_ram[self.wram_port_address as usize];
        self.increment_wram_port_address();
        value
    }

    pub fn write_wram_port(&mut self, value: u8) {
        self.main_ram[self.wram_port_address as usize] = value;
        self.increment_wram_port_address();
    }

    fn increment_wram_port_address(&mut self) {
        self.wram_port_address = (self.wram_port_address + 1) & ((MAIN_RAM_LEN - 1) as u32);
    }

    pub fn write_wram_port_address_low(&mut self, value: u8) {
        self.wram_port_address = (self.wram_port_address & 0xFFFF00) | u32::from(value);
    }

    pub fn write_wram_port_address_mid(&mut self, value: u8) {
        self.wram_port_address = (self.wram_port_address & 0xFF00FF) | (u32::from(value) << 8);
    }

    pub fn write_wram_port_address_high(&mut self, value: u8) {
        // Only 1 bit of the high byte is used
        self.wram_port_address =
            (self.wram_port_address & 0x00FFFF) | (u32::from(value & 0x01) << 16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_memory() -> Memory {
        Memory::from_rom(vec![0; 0x40000], false).unwrap()
    }

    #[test]
    fn wram_is_byte_bijective() {
        let mut memory = test_memory();

        for address in [0x7E0000_u32, 0x7E1234, 0x7EFFFF, 0x7F0000, 0x7FFFFF] {
            memory.write_wram(address, 0xA7);
            assert_eq!(memory.read_wram(address), 0xA7, "address {address:06X}");
            memory.write_wram(address, 0x00);
            assert_eq!(memory.read_wram(address), 0x00, "address {address:06X}");
        }
    }

    #[test]
    fn wram_mirror_aliases_low_8k() {
        let mut memory = test_memory();

        // Bank $00 offset $1FFF mirrors $7E1FFF
        memory.write_wram(0x001FFF, 0x55);
        assert_eq!(memory.read_wram(0x7E1FFF), 0x55);
    }

    #[test]
    fn wram_port_auto_increments() {
        let mut memory = test_memory();

        memory.write_wram_port_address_low(0x00);
        memory.write_wram_port_address_mid(0x10);
        memory.write_wram_port_address_high(0x00);

        memory.write_wram_port(0x11);
        memory.write_wram_port(0x22);

        assert_eq!(memory.read_wram(0x7E1000), 0x11);
        assert_eq!(memory.read_wram(0x7E1001), 0x22);

        memory.write_wram_port_address_low(0x00);
        memory.write_wram_port_address_mid(0x10);
        assert_eq!(memory.read_wram_port(), 0x11);
        assert_eq!(memory.read_wram_port(), 0x22);
    }
}
