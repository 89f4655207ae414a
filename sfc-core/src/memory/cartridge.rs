use bincode::{Decode, Encode};
use std::fmt::{Display, Formatter};
use thiserror::Error;

// Copier devices prepended a 512-byte header to dumps; detectable because
// real SNES ROM sizes are multiples of 1KB
const COPIER_HEADER_LEN: usize = 512;

const LOROM_HEADER_ADDR: usize = 0x7FC0;
const HIROM_HEADER_ADDR: usize = 0xFFC0;

const TITLE_LEN: usize = 21;

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("ROM is too small to contain an internal header: {len} bytes")]
    TooSmall { len: usize },
    #[error("ROM has no valid internal header (checksum XOR complement != $FFFF on both sides)")]
    NoValidHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum Mapper {
    LoRom,
    HiRom,
}

impl Display for Mapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoRom => write!(f, "LoROM"),
            Self::HiRom => write!(f, "HiROM"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum Region {
    Japan,
    Usa,
    Europe,
    Sweden,
    Finland,
    Denmark,
    France,
    Netherlands,
    Spain,
    Germany,
    Italy,
    China,
    Indonesia,
    SouthKorea,
    Unknown(u8),
}

impl Region {
    fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::Japan,
            1 => Self::Usa,
            2 => Self::Europe,
            3 => Self::Sweden,
            4 => Self::Finland,
            5 => Self::Denmark,
            6 => Self::France,
            7 => Self::Netherlands,
            8 => Self::Spain,
            9 => Self::Germany,
            10 => Self::Italy,
            11 => Self::China,
            12 => Self::Indonesia,
            13 => Self::SouthKorea,
            other => Self::Unknown(other),
        }
    }
}

/// The parsed internal header at $7FC0 (LoROM) / $FFC0 (HiROM).
#[derive(Debug, Clone, Encode, Decode)]
pub struct RomHeader {
    pub title: String,
    pub mapper: Mapper,
    pub rom_size: u32,
    pub ram_size: u32,
    pub region: Region,
    pub version: u8,
    pub complement: u16,
    pub checksum: u16,
    /// `checksum XOR complement == $FFFF`
    pub valid: bool,
    /// Sum of all ROM bytes mod $10000 matches the header checksum
    pub checksum_ok: bool,
}

fn header_is_valid(rom: &[u8], header_addr: usize) -> bool {
    if rom.len() < header_addr + 0x30 {
        return false;
    }

    let complement = u16::from_le_bytes([rom[header_addr + 0x2C], rom[header_addr + 0x2D]]);
    let checksum = u16::from_le_bytes([rom[header_addr + 0x2E], rom[header_addr + 0x2F]]);
    checksum ^ complement == 0xFFFF
}

fn detect_mapper(rom: &[u8], require_valid_header: bool) -> Result<Mapper, CartridgeError> {
    let lorom_valid = header_is_valid(rom, LOROM_HEADER_ADDR);
    let hirom_valid = header_is_valid(rom, HIROM_HEADER_ADDR);

    match (lorom_valid, hirom_valid) {
        (true, false) => Ok(Mapper::LoRom),
        (false, true) => Ok(Mapper::HiRom),
        _ => {
            if !lorom_valid && require_valid_header {
                return Err(CartridgeError::NoValidHeader);
            }

            // Both or neither side validates; fall back on size
            let mapper = if rom.len() > 2 * 1024 * 1024 { Mapper::HiRom } else { Mapper::LoRom };
            if !lorom_valid {
                log::warn!("No valid internal header found; guessing {mapper} from ROM size");
            }
            Ok(mapper)
        }
    }
}

fn parse_header(rom: &[u8], mapper: Mapper) -> RomHeader {
    let header_addr = match mapper {
        Mapper::LoRom => LOROM_HEADER_ADDR,
        Mapper::HiRom => HIROM_HEADER_ADDR,
    };

    let title: String = rom[header_addr..header_addr + TITLE_LEN]
        .iter()
        .copied()
        .filter(|&b| (0x20..0x7F).contains(&b))
        .map(char::from)
        .collect();
    let title = title.trim_end_matches(' ').to_string();

    let rom_size = 1024_u32 << rom[header_addr + 0x27];
    let ram_size_code = rom[header_addr + 0x28];
    let ram_size = if ram_size_code == 0 { 0 } else { 1024_u32 << ram_size_code };

    let region = Region::from_byte(rom[header_addr + 0x29]);
    let version = rom[header_addr + 0x2B];

    let complement = u16::from_le_bytes([rom[header_addr + 0x2C], rom[header_addr + 0x2D]]);
    let checksum = u16::from_le_bytes([rom[header_addr + 0x2E], rom[header_addr + 0x2F]]);
    let valid = checksum ^ complement == 0xFFFF;

    let global_sum = rom.iter().fold(0_u16, |sum, &b| sum.wrapping_add(b.into()));
    let checksum_ok = global_sum == checksum;

    RomHeader {
        title,
        mapper,
        rom_size,
        ram_size,
        region,
        version,
        complement,
        checksum,
        valid,
        checksum_ok,
    }
}

enum CartridgeAddress {
    None,
    Rom(u32),
    Sram(u32),
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct Cartridge {
    rom: Box<[u8]>,
    sram: Box<[u8]>,
    header: RomHeader,
}

impl Cartridge {
    /// Ingest a ROM image: strip any copier header, detect the mapper via
    /// the internal header checksum, and size SRAM from the header.
    pub fn create(mut rom: Vec<u8>, require_valid_header: bool) -> Result<Self, CartridgeError> {
        if rom.len() % 1024 == COPIER_HEADER_LEN {
            log::info!("Stripping {COPIER_HEADER_LEN}-byte copier header");
            rom.drain(..COPIER_HEADER_LEN);
        }

        if rom.len() < LOROM_HEADER_ADDR + 0x30 {
            return Err(CartridgeError::TooSmall { len: rom.len() });
        }

        let mapper = detect_mapper(&rom, require_valid_header)?;
        let header = parse_header(&rom, mapper);

        log::info!(
            "Loaded \"{}\": {mapper}, {} bytes of ROM, {} bytes of SRAM, region {:?}, version {}",
            header.title,
            header.rom_size,
            header.ram_size,
            header.region,
            header.version,
        );
        if !header.checksum_ok {
            log::warn!(
                "Global checksum mismatch: header says {:04X}; continuing anyway",
                header.checksum
            );
        }

        let sram = vec![0; header.ram_size as usize].into_boxed_slice();

        Ok(Self { rom: rom.into_boxed_slice(), sram, header })
    }

    pub fn header(&self) -> &RomHeader {
        &self.header
    }

    pub fn read(&self, address: u32) -> u8 {
        match self.map_address(address) {
            CartridgeAddress::Rom(rom_addr) => {
                self.rom[(rom_addr as usize) % self.rom.len()]
            }
            CartridgeAddress::Sram(sram_addr) => self.sram[sram_addr as usize],
            CartridgeAddress::None => 0xFF,
        }
    }

    pub fn write(&mut self, address: u32, value: u8) {
        match self.map_address(address) {
            CartridgeAddress::Sram(sram_addr) => {
                self.sram[sram_addr as usize] = value;
            }
            CartridgeAddress::Rom(_) | CartridgeAddress::None => {
                log::debug!("Discarded write to ROM address {address:06X} ({value:02X})");
            }
        }
    }

    fn map_address(&self, address: u32) -> CartridgeAddress {
        match self.header.mapper {
            Mapper::LoRom => self.lorom_map_address(address),
            Mapper::HiRom => self.hirom_map_address(address),
        }
    }

    fn lorom_map_address(&self, address: u32) -> CartridgeAddress {
        let bank = address >> 16;
        let offset = address & 0xFFFF;
        match (bank & 0x7F, offset) {
            (_, 0x8000..=0xFFFF) => {
                let rom_addr = ((bank & 0x7F) << 15) | (offset & 0x7FFF);
                CartridgeAddress::Rom(rom_addr)
            }
            (0x70..=0x7D, 0x0000..=0x7FFF) if !self.sram.is_empty() => {
                // Battery RAM sits in the lower half of banks $70-$7D
                let sram_addr = (((bank & 0x0F) << 15) | offset) & (self.sram.len() as u32 - 1);
                CartridgeAddress::Sram(sram_addr)
            }
            _ => CartridgeAddress::None,
        }
    }

    fn hirom_map_address(&self, address: u32) -> CartridgeAddress {
        let bank = address >> 16;
        let offset = address & 0xFFFF;
        match (bank & 0x7F, offset) {
            (0x20..=0x3F, 0x6000..=0x7FFF) if !self.sram.is_empty() => {
                let sram_addr = (((bank & 0x1F) << 13) | (offset & 0x1FFF))
                    & (self.sram.len() as u32 - 1);
                CartridgeAddress::Sram(sram_addr)
            }
            (0x00..=0x3F, 0x0000..=0x7FFF) => CartridgeAddress::None,
            _ => {
                let rom_addr = ((bank & 0x3F) << 16) | offset;
                CartridgeAddress::Rom(rom_addr)
            }
        }
    }
}
