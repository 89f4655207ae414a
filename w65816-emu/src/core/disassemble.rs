//! Mnemonic lookup for trace logging.

pub(crate) fn instruction_str(opcode: u8) -> &'static str {
    match opcode {
        0x61 | 0x63 | 0x65 | 0x67 | 0x69 | 0x6D | 0x6F | 0x71 | 0x72 | 0x73 | 0x75 | 0x77
        | 0x79 | 0x7D | 0x7F => "ADC",
        0x21 | 0x23 | 0x25 | 0x27 | 0x29 | 0x2D | 0x2F | 0x31 | 0x32 | 0x33 | 0x35 | 0x37
        | 0x39 | 0x3D | 0x3F => "AND",
        0x06 | 0x0A | 0x0E | 0x16 | 0x1E => "ASL",
        0x90 => "BCC",
        0xB0 => "BCS",
        0xF0 => "BEQ",
        0x24 | 0x2C | 0x34 | 0x3C | 0x89 => "BIT",
        0x30 => "BMI",
        0xD0 => "BNE",
        0x10 => "BPL",
        0x80 => "BRA",
        0x00 => "BRK",
        0x82 => "BRL",
        0x50 => "BVC",
        0x70 => "BVS",
        0x18 => "CLC",
        0xD8 => "CLD",
        0x58 => "CLI",
        0xB8 => "CLV",
        0xC1 | 0xC3 | 0xC5 | 0xC7 | 0xC9 | 0xCD | 0xCF | 0xD1 | 0xD2 | 0xD3 | 0xD5 | 0xD7
        | 0xD9 | 0xDD | 0xDF => "CMP",
        0x02 => "COP",
        0xE0 | 0xE4 | 0xEC => "CPX",
        0xC0 | 0xC4 | 0xCC => "CPY",
        0x3A | 0xC6 | 0xCE | 0xD6 | 0xDE => "DEC",
        0xCA => "DEX",
        0x88 => "DEY",
        0x41 | 0x43 | 0x45 | 0x47 | 0x49 | 0x4D | 0x4F | 0x51 | 0x52 | 0x53 | 0x55 | 0x57
        | 0x59 | 0x5D | 0x5F => "EOR",
        0x1A | 0xE6 | 0xEE | 0xF6 | 0xFE => "INC",
        0xE8 => "INX",
        0xC8 => "INY",
        0x4C | 0x6C | 0x7C => "JMP",
        0x5C | 0xDC => "JML",
        0x20 | 0xFC => "JSR",
        0x22 => "JSL",
        0xA1 | 0xA3 | 0xA5 | 0xA7 | 0xA9 | 0xAD | 0xAF | 0xB1 | 0xB2 | 0xB3 | 0xB5 | 0xB7
        | 0xB9 | 0xBD | 0xBF => "LDA",
        0xA2 | 0xA6 | 0xAE | 0xB6 | 0xBE => "LDX",
        0xA0 | 0xA4 | 0xAC | 0xB4 | 0xBC => "LDY",
        0x46 | 0x4A | 0x4E | 0x56 | 0x5E => "LSR",
        0x54 => "MVN",
        0x44 => "MVP",
        0xEA => "NOP",
        0x01 | 0x03 | 0x05 | 0x07 | 0x09 | 0x0D | 0x0F | 0x11 | 0x12 | 0x13 | 0x15 | 0x17
        | 0x19 | 0x1D | 0x1F => "ORA",
        0xF4 => "PEA",
        0xD4 => "PEI",
        0x62 => "PER",
        0x48 => "PHA",
        0x8B => "PHB",
        0x0B => "PHD",
        0x4B => "PHK",
        0x08 => "PHP",
        0xDA => "PHX",
        0x5A => "PHY",
        0x68 => "PLA",
        0xAB => "PLB",
        0x2B => "PLD",
        0x28 => "PLP",
        0xFA => "PLX",
        0x7A => "PLY",
        0xC2 => "REP",
        0x26 | 0x2A | 0x2E | 0x36 | 0x3E => "ROL",
        0x66 | 0x6A | 0x6E | 0x76 | 0x7E => "ROR",
        0x40 => "RTI",
        0x6B => "RTL",
        0x60 => "RTS",
        0xE1 | 0xE3 | 0xE5 | 0xE7 | 0xE9 | 0xED | 0xEF | 0xF1 | 0xF2 | 0xF3 | 0xF5 | 0xF7
        | 0xF9 | 0xFD | 0xFF => "SBC",
        0x38 => "SEC",
        0xF8 => "SED",
        0x78 => "SEI",
        0xE2 => "SEP",
        0x81 | 0x83 | 0x85 | 0x87 | 0x8D | 0x8F | 0x91 | 0x92 | 0x93 | 0x95 | 0x97 | 0x99
        | 0x9D | 0x9F => "STA",
        0xDB => "STP",
        0x86 | 0x8E | 0x96 => "STX",
        0x84 | 0x8C | 0x94 => "STY",
        0x64 | 0x74 | 0x9C | 0x9E => "STZ",
        0xAA => "TAX",
        0xA8 => "TAY",
        0x5B => "TCD",
        0x1B => "TCS",
        0x7B => "TDC",
        0x14 | 0x1C => "TRB",
        0x04 | 0x0C => "TSB",
        0x3B => "TSC",
        0xBA => "TSX",
        0x8A => "TXA",
        0x9A => "TXS",
        0x9B => "TXY",
        0x98 => "TYA",
        0xBB => "TYX",
        0xCB => "WAI",
        0x42 => "WDM",
        0xEB => "XBA",
        0xFB => "XCE",
    }
}
