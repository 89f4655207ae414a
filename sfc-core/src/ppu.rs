use bincode::{Decode, Encode};
use sfc_common::frontend::{Color, FrameSize};
use sfc_common::num::GetBit;

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 224;
pub const FRAME_BUFFER_LEN: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

pub const SCANLINES_PER_FRAME: u16 = 262;
pub const VBLANK_START_SCANLINE: u16 = 224;

const VRAM_LEN_WORDS: usize = 64 * 1024 / 2;
const OAM_LEN: usize = 512 + 32;
const CGRAM_LEN_WORDS: usize = 256;

const VRAM_ADDRESS_MASK: u16 = (1 << 15) - 1;
const OAM_ADDRESS_MODULUS: u16 = OAM_LEN as u16;

const SPRITE_COUNT: usize = 128;

// Per-pixel priority scratch codes: background ranks run 1..=8 (tile
// priority adds 2, a promoted mode-1 BG3 pixel gets the top BG rank), and
// sprites stack above every background
const BG3_PROMOTED_RANK: u8 = 8;
const OBJ_RANK_BASE: u8 = 10;

// Layer-id scratch codes
const LAYER_BACKDROP: u8 = 0xFF;
const LAYER_OBJ: u8 = 4;

type Vram = [u16; VRAM_LEN_WORDS];
type Oam = [u8; OAM_LEN];
type Cgram = [u16; CGRAM_LEN_WORDS];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BitsPerPixel {
    // 4-color
    Two,
    // 16-color
    Four,
    // 256-color
    Eight,
}

impl BitsPerPixel {
    const fn bitplanes(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Four => 4,
            Self::Eight => 8,
        }
    }

    const fn tile_size_words(self) -> u16 {
        match self {
            Self::Two => 8,
            Self::Four => 16,
            Self::Eight => 32,
        }
    }

    const fn color_count(self) -> u16 {
        1 << self.bitplanes() as u16
    }
}

// OBJ is always 4bpp
const OBJ_BPP: BitsPerPixel = BitsPerPixel::Four;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
enum BgMode {
    #[default]
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
}

#[derive(Debug, Clone, Copy)]
struct LayerSpec {
    bg: usize,
    bpp: BitsPerPixel,
}

impl BgMode {
    fn from_byte(byte: u8) -> Self {
        match byte & 0x07 {
            0x00 => Self::Zero,
            0x01 => Self::One,
            0x02 => Self::Two,
            0x03 => Self::Three,
            0x04 => Self::Four,
            0x05 => Self::Five,
            0x06 => Self::Six,
            0x07 => Self::Seven,
            _ => unreachable!("value & 0x07 is always <= 0x07"),
        }
    }

    /// Background layers for this mode, listed back to front; a layer's
    /// base priority rank is its position + 1.
    ///
    /// Mode 7 is rendered as a flat 8bpp layer; the affine matrix is not
    /// applied.
    fn layers(self) -> &'static [LayerSpec] {
        use BitsPerPixel as Bpp;

        match self {
            Self::Zero => &[
                LayerSpec { bg: 3, bpp: Bpp::Two },
                LayerSpec { bg: 2, bpp: Bpp::Two },
                LayerSpec { bg: 1, bpp: Bpp::Two },
                LayerSpec { bg: 0, bpp: Bpp::Two },
            ],
            Self::One => &[
                LayerSpec { bg: 2, bpp: Bpp::Two },
                LayerSpec { bg: 1, bpp: Bpp::Four },
                LayerSpec { bg: 0, bpp: Bpp::Four },
            ],
            Self::Two => &[
                LayerSpec { bg: 1, bpp: Bpp::Four },
                LayerSpec { bg: 0, bpp: Bpp::Four },
            ],
            Self::Three => &[
                LayerSpec { bg: 1, bpp: Bpp::Four },
                LayerSpec { bg: 0, bpp: Bpp::Eight },
            ],
            Self::Four => &[
                LayerSpec { bg: 1, bpp: Bpp::Two },
                LayerSpec { bg: 0, bpp: Bpp::Eight },
            ],
            Self::Five => &[
                LayerSpec { bg: 1, bpp: Bpp::Two },
                LayerSpec { bg: 0, bpp: Bpp::Four },
            ],
            Self::Six => &[LayerSpec { bg: 0, bpp: Bpp::Four }],
            Self::Seven => &[LayerSpec { bg: 0, bpp: Bpp::Eight }],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
enum TileSize {
    // 8x8
    #[default]
    Small,
    // 16x16
    Large,
}

impl TileSize {
    fn from_bit(bit: bool) -> Self {
        if bit { Self::Large } else { Self::Small }
    }

    fn pixels(self) -> u16 {
        match self {
            Self::Small => 8,
            Self::Large => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
enum ObjTileSize {
    // 0: 8x8 / 16x16
    #[default]
    Zero,
    // 1: 8x8 / 32x32
    One,
    // 2: 8x8 / 64x64
    Two,
    // 3: 16x16 / 32x32
    Three,
    // 4: 16x16 / 64x64
    Four,
    // 5: 32x32 / 64x64
    Five,
    // 6: 16x32 / 32x64
    Six,
    // 7: 16x32 / 32x32
    Seven,
}

impl ObjTileSize {
    fn from_byte(byte: u8) -> Self {
        match byte & 0xE0 {
            0x00 => Self::Zero,
            0x20 => Self::One,
            0x40 => Self::Two,
            0x60 => Self::Three,
            0x80 => Self::Four,
            0xA0 => Self::Five,
            0xC0 => Self::Six,
            0xE0 => Self::Seven,
            _ => unreachable!("value & 0xE0 is always one of the above values"),
        }
    }

    fn small_size(self) -> (u16, u16) {
        match self {
            Self::Zero | Self::One | Self::Two => (8, 8),
            Self::Three | Self::Four => (16, 16),
            Self::Five => (32, 32),
            Self::Six | Self::Seven => (16, 32),
        }
    }

    fn large_size(self) -> (u16, u16) {
        match self {
            Self::Zero => (16, 16),
            Self::One | Self::Three | Self::Seven => (32, 32),
            Self::Two | Self::Four | Self::Five => (64, 64),
            Self::Six => (32, 64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
enum BgScreenSize {
    #[default]
    OneScreen,
    VerticalMirror,
    HorizontalMirror,
    FourScreen,
}

impl BgScreenSize {
    fn from_byte(byte: u8) -> Self {
        match byte & 0x03 {
            0x00 => Self::OneScreen,
            0x01 => Self::VerticalMirror,
            0x02 => Self::HorizontalMirror,
            0x03 => Self::FourScreen,
            _ => unreachable!("value & 0x03 is always <= 0x03"),
        }
    }

    fn width_tiles(self) -> u16 {
        match self {
            Self::OneScreen | Self::HorizontalMirror => 32,
            Self::VerticalMirror | Self::FourScreen => 64,
        }
    }

    fn height_tiles(self) -> u16 {
        match self {
            Self::OneScreen | Self::VerticalMirror => 32,
            Self::HorizontalMirror | Self::FourScreen => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
enum VramIncrementMode {
    #[default]
    Low,
    High,
}

impl VramIncrementMode {
    fn from_byte(byte: u8) -> Self {
        if byte.bit(7) { Self::High } else { Self::Low }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
enum AccessFlipflop {
    #[default]
    First,
    Second,
}

#[derive(Debug, Clone, Encode, Decode)]
struct Registers {
    // INIDISP
    forced_blanking: bool,
    brightness: u8,
    // TM
    main_bg_enabled: [bool; 4],
    main_obj_enabled: bool,
    // TS
    sub_bg_enabled: [bool; 4],
    sub_obj_enabled: bool,
    // BGMODE
    bg_mode: BgMode,
    mode_1_bg3_priority: bool,
    bg_tile_size: [TileSize; 4],
    // MOSAIC
    mosaic_size: u8,
    bg_mosaic_enabled: [bool; 4],
    // BG1SC-BG4SC
    bg_screen_size: [BgScreenSize; 4],
    bg_base_address: [u16; 4],
    // BG12NBA/BG34NBA
    bg_tile_base_address: [u16; 4],
    // BG1HOFS-BG4VOFS; one shared previous-byte buffer across all ports
    bg_h_scroll: [u16; 4],
    bg_v_scroll: [u16; 4],
    bg_scroll_write_buffer: u8,
    // OBSEL
    obj_tile_base_address: u16,
    obj_tile_gap_size: u16,
    obj_tile_size: ObjTileSize,
    // VMAIN
    vram_address_increment_step: u16,
    vram_address_increment_mode: VramIncrementMode,
    // VMADDL/VMADDH
    vram_address: u16,
    // RDVRAML/RDVRAMH
    vram_prefetch_buffer: u16,
    // OAMADDL/OAMADDH
    oam_address: u16,
    oam_address_reload_value: u16,
    // CGADD
    cgram_address: u8,
    // CGDATA/RDCGRAM
    cgram_write_buffer: u8,
    cgram_flipflop: AccessFlipflop,
}

impl Registers {
    fn new() -> Self {
        Self {
            forced_blanking: true,
            brightness: 0,
            main_bg_enabled: [false; 4],
            main_obj_enabled: false,
            sub_bg_enabled: [false; 4],
            sub_obj_enabled: false,
            bg_mode: BgMode::default(),
            mode_1_bg3_priority: false,
            bg_tile_size: [TileSize::default(); 4],
            mosaic_size: 0,
            bg_mosaic_enabled: [false; 4],
            bg_screen_size: [BgScreenSize::default(); 4],
            bg_base_address: [0; 4],
            bg_tile_base_address: [0; 4],
            bg_h_scroll: [0; 4],
            bg_v_scroll: [0; 4],
            bg_scroll_write_buffer: 0,
            obj_tile_base_address: 0x6000,
            obj_tile_gap_size: 0,
            obj_tile_size: ObjTileSize::default(),
            vram_address_increment_step: 1,
            vram_address_increment_mode: VramIncrementMode::default(),
            vram_address: 0,
            vram_prefetch_buffer: 0,
            oam_address: 0,
            oam_address_reload_value: 0,
            cgram_address: 0,
            cgram_write_buffer: 0,
            cgram_flipflop: AccessFlipflop::default(),
        }
    }

    fn write_inidisp(&mut self, value: u8) {
        // INIDISP: Forced blanking + brightness
        self.forced_blanking = value.bit(7);
        self.brightness = value & 0x0F;

        log::trace!("  Forced blanking: {}", self.forced_blanking);
        log::trace!("  Brightness: {}", self.brightness);
    }

    fn write_tm(&mut self, value: u8) {
        // TM: Main screen designation
        for (i, bg_enabled) in self.main_bg_enabled.iter_mut().enumerate() {
            *bg_enabled = value.bit(i as u8);
        }
        self.main_obj_enabled = value.bit(4);

        log::trace!("  Main screen BG enabled: {:?}", self.main_bg_enabled);
        log::trace!("  Main screen OBJ enabled: {}", self.main_obj_enabled);
    }

    fn write_ts(&mut self, value: u8) {
        // TS: Sub screen designation; stored but the sub screen is never
        // composited (no color math)
        for (i, bg_enabled) in self.sub_bg_enabled.iter_mut().enumerate() {
            *bg_enabled = value.bit(i as u8);
        }
        self.sub_obj_enabled = value.bit(4);
    }

    fn write_bgmode(&mut self, value: u8) {
        // BGMODE: BG mode and character size
        self.bg_mode = BgMode::from_byte(value);
        self.mode_1_bg3_priority = value.bit(3);

        for (i, tile_size) in self.bg_tile_size.iter_mut().enumerate() {
            *tile_size = TileSize::from_bit(value.bit(i as u8 + 4));
        }

        log::trace!("  BG mode: {:?}", self.bg_mode);
        log::trace!("  Mode 1 BG3 priority: {}", self.mode_1_bg3_priority);
        log::trace!("  BG tile sizes: {:?}", self.bg_tile_size);
    }

    fn write_mosaic(&mut self, value: u8) {
        // MOSAIC: Mosaic size and enable
        self.mosaic_size = value >> 4;

        for (i, mosaic_enabled) in self.bg_mosaic_enabled.iter_mut().enumerate() {
            *mosaic_enabled = value.bit(i as u8);
        }
    }

    fn write_bg1234sc(&mut self, bg: usize, value: u8) {
        // BG1SC-BG4SC: tilemap base word address and screen size
        self.bg_screen_size[bg] = BgScreenSize::from_byte(value);
        self.bg_base_address[bg] = u16::from(value & 0xFC) << 8;

        log::trace!("  BG{} screen size: {:?}", bg + 1, self.bg_screen_size[bg]);
        log::trace!("  BG{} base address: {:04X}", bg + 1, self.bg_base_address[bg]);
    }

    fn write_bg1234nba(&mut self, base_bg: usize, value: u8) {
        // BG12NBA/BG34NBA: character data base word addresses
        self.bg_tile_base_address[base_bg] = u16::from(value & 0x0F) << 12;
        self.bg_tile_base_address[base_bg + 1] = u16::from(value & 0xF0) << 8;

        log::trace!(
            "  BG{}/BG{} tile base addresses: {:04X}/{:04X}",
            base_bg + 1,
            base_bg + 2,
            self.bg_tile_base_address[base_bg],
            self.bg_tile_base_address[base_bg + 1],
        );
    }

    fn write_bg_h_scroll(&mut self, bg: usize, value: u8) {
        let current = self.bg_h_scroll[bg];
        let prev = self.bg_scroll_write_buffer;

        // Double-write formula from hardware: the low 3 bits of the
        // in-flight value survive into the new one
        self.bg_h_scroll[bg] =
            ((u16::from(value) << 8) | u16::from(prev & !0x07) | ((current >> 8) & 0x07)) & 0x3FF;
        self.bg_scroll_write_buffer = value;

        log::trace!("  BG{} H scroll: {:04X}", bg + 1, self.bg_h_scroll[bg]);
    }

    fn write_bg_v_scroll(&mut self, bg: usize, value: u8) {
        let prev = self.bg_scroll_write_buffer;

        self.bg_v_scroll[bg] = u16::from_le_bytes([prev, value]) & 0x3FF;
        self.bg_scroll_write_buffer = value;

        log::trace!("  BG{} V scroll: {:04X}", bg + 1, self.bg_v_scroll[bg]);
    }

    fn write_obsel(&mut self, value: u8) {
        // OBSEL: sprite character base, gap, and size select
        self.obj_tile_base_address = u16::from(value & 0x07) << 13;
        self.obj_tile_gap_size = u16::from(value & 0x18) << 9;
        self.obj_tile_size = ObjTileSize::from_byte(value);

        log::trace!("  OBJ tile base address: {:04X}", self.obj_tile_base_address);
        log::trace!("  OBJ tile size: {:?}", self.obj_tile_size);
    }

    fn write_oamaddl(&mut self, value: u8) {
        // OAMADDL: OAM word address, low byte
        self.oam_address_reload_value = (self.oam_address_reload_value & 0xFF00) | u16::from(value);
        self.oam_address = (self.oam_address_reload_value << 1) % OAM_ADDRESS_MODULUS;
    }

    fn write_oamaddh(&mut self, value: u8) {
        // OAMADDH: bit 0 is OAM byte address bit 9
        self.oam_address_reload_value =
            (self.oam_address_reload_value & 0x00FF) | (u16::from(value & 0x01) << 8);
        self.oam_address = (self.oam_address_reload_value << 1) % OAM_ADDRESS_MODULUS;
    }

    fn write_vmain(&mut self, value: u8) {
        // VMAIN: VRAM address increment mode
        self.vram_address_increment_step = match value & 0x03 {
            0x00 => 1,
            0x01 => 32,
            0x02 | 0x03 => 128,
            _ => unreachable!("value & 0x03 is always <= 0x03"),
        };
        self.vram_address_increment_mode = VramIncrementMode::from_byte(value);

        log::trace!("  VRAM data port increment step: {}", self.vram_address_increment_step);
        log::trace!("  VRAM data port increment on: {:?}", self.vram_address_increment_mode);
    }

    fn write_vmaddl(&mut self, value: u8, vram: &Vram) {
        // VMADDL: VRAM word address, low byte
        self.vram_address = (self.vram_address & 0xFF00) | u16::from(value);
        self.vram_prefetch_buffer = vram[(self.vram_address & VRAM_ADDRESS_MASK) as usize];
    }

    fn write_vmaddh(&mut self, value: u8, vram: &Vram) {
        // VMADDH: VRAM word address, high byte
        self.vram_address = (self.vram_address & 0x00FF) | (u16::from(value) << 8);
        self.vram_prefetch_buffer = vram[(self.vram_address & VRAM_ADDRESS_MASK) as usize];
    }

    fn write_cgadd(&mut self, value: u8) {
        // CGADD: CGRAM word index; resets the byte flipflop
        self.cgram_address = value;
        self.cgram_flipflop = AccessFlipflop::First;
    }
}

#[derive(Debug, Clone, Encode, Decode)]
struct State {
    scanline: u16,
    frame_count: u64,
    vblank_flag: bool,
}

impl State {
    fn new() -> Self {
        Self { scanline: 0, frame_count: 0, vblank_flag: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpuTickEffect {
    None,
    VBlankStart,
    FrameComplete,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct Ppu {
    registers: Registers,
    state: State,
    vram: Box<Vram>,
    oam: Box<Oam>,
    cgram: Box<Cgram>,
    frame_buffer: Vec<Color>,
    // Per-scanline compositing scratch
    line_color: [u16; SCREEN_WIDTH],
    line_priority: [u8; SCREEN_WIDTH],
    line_layer: [u8; SCREEN_WIDTH],
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            registers: Registers::new(),
            state: State::new(),
            vram: vec![0; VRAM_LEN_WORDS].into_boxed_slice().try_into().unwrap(),
            oam: vec![0; OAM_LEN].into_boxed_slice().try_into().unwrap(),
            cgram: vec![0; CGRAM_LEN_WORDS].into_boxed_slice().try_into().unwrap(),
            frame_buffer: vec![Color::default(); FRAME_BUFFER_LEN],
            line_color: [0; SCREEN_WIDTH],
            line_priority: [0; SCREEN_WIDTH],
            line_layer: [LAYER_BACKDROP; SCREEN_WIDTH],
        }
    }

    /// Render the current scanline (if visible), then advance the raster
    /// position. Vblank rises when the counter reaches 224 and clears on
    /// the wrap back to line 0.
    #[must_use]
    pub fn render_scanline(&mut self) -> PpuTickEffect {
        if self.state.scanline < VBLANK_START_SCANLINE {
            self.render_line();
        }

        self.state.scanline += 1;
        match self.state.scanline {
            VBLANK_START_SCANLINE => {
                self.state.vblank_flag = true;
                PpuTickEffect::VBlankStart
            }
            SCANLINES_PER_FRAME => {
                self.state.scanline = 0;
                self.state.vblank_flag = false;
                self.state.frame_count += 1;
                PpuTickEffect::FrameComplete
            }
            _ => PpuTickEffect::None,
        }
    }

    fn render_line(&mut self) {
        let line = self.state.scanline;

        if self.registers.forced_blanking {
            let row = &mut self.frame_buffer
                [line as usize * SCREEN_WIDTH..(line as usize + 1) * SCREEN_WIDTH];
            row.fill(Color::rgb(0, 0, 0));
            return;
        }

        // Backdrop is CGRAM entry 0 at the lowest priority
        self.line_color.fill(self.cgram[0]);
        self.line_priority.fill(0);
        self.line_layer.fill(LAYER_BACKDROP);

        for (i, layer) in self.registers.bg_mode.layers().iter().enumerate() {
            if self.registers.main_bg_enabled[layer.bg] {
                let base_rank = (i + 1) as u8;
                self.render_bg_line(line, layer.bg, layer.bpp, base_rank);
            }
        }

        if self.registers.main_obj_enabled {
            self.render_obj_line(line);
        }

        let brightness = self.registers.brightness;
        let row_start = line as usize * SCREEN_WIDTH;
        for (x, &snes_color) in self.line_color.iter().enumerate() {
            self.frame_buffer[row_start + x] = convert_snes_color(snes_color, brightness);
        }
    }

    fn render_bg_line(&mut self, line: u16, bg: usize, bpp: BitsPerPixel, base_rank: u8) {
        let h_scroll = self.registers.bg_h_scroll[bg];
        let v_scroll = self.registers.bg_v_scroll[bg];

        let bg3_promotable = self.registers.bg_mode == BgMode::One
            && bg == 2
            && self.registers.mode_1_bg3_priority;

        let tile_pixels = self.registers.bg_tile_size[bg].pixels();
        let tile_size_words = bpp.tile_size_words();
        let char_base = self.registers.bg_tile_base_address[bg];

        // One-entry tilemap cache; consecutive pixels usually share a tile
        let mut cached_tile = (u16::MAX, u16::MAX);
        let mut cached_entry = 0_u16;

        for x in 0..SCREEN_WIDTH as u16 {
            let (sx, sy) = self.apply_mosaic(bg, x, line);
            let px = sx.wrapping_add(h_scroll);
            let py = sy.wrapping_add(v_scroll);

            let tile_coords = (px / tile_pixels, py / tile_pixels);
            if tile_coords != cached_tile {
                cached_entry = self.bg_map_entry(bg, px, py);
                cached_tile = tile_coords;
            }
            let entry = cached_entry;

            let raw_tile_number = entry & 0x3FF;
            let palette = ((entry >> 10) & 0x07) as u8;
            let tile_priority = entry.bit(13);
            let x_flip = entry.bit(14);
            let y_flip = entry.bit(15);

            // 16x16 tiles are four consecutive 8x8 characters in a
            // 16-column layout
            let tile_number = if tile_pixels == 16 {
                let x_shift = if x_flip { px % 16 < 8 } else { px % 16 >= 8 };
                let y_shift = if y_flip { py % 16 < 8 } else { py % 16 >= 8 };
                raw_tile_number + u16::from(x_shift) + 16 * u16::from(y_shift)
            } else {
                raw_tile_number
            };

            let cell_row = if y_flip { 7 - (py % 8) } else { py % 8 };
            let cell_col = if x_flip { 7 - (px % 8) } else { px % 8 };

            let tile_addr = char_base.wrapping_add(tile_number * tile_size_words);
            let color_index = decode_tile_pixel(&self.vram, tile_addr, bpp, cell_row, cell_col);
            if color_index == 0 {
                // Color 0 is transparent on every layer
                continue;
            }

            let rank = if bg3_promotable && tile_priority {
                BG3_PROMOTED_RANK
            } else {
                base_rank + 2 * u8::from(tile_priority)
            };

            let xi = x as usize;
            if rank >= self.line_priority[xi] {
                let cgram_index = u16::from(palette) * bpp.color_count() + u16::from(color_index);
                self.line_color[xi] = self.cgram[(cgram_index & 0xFF) as usize];
                self.line_priority[xi] = rank;
                self.line_layer[xi] = bg as u8;
            }
        }
    }

    // Sprites walk OAM from entry 127 down to 0 so that lower-index
    // sprites win ties at equal priority.
    fn render_obj_line(&mut self, line: u16) {
        let (small_width, small_height) = self.registers.obj_tile_size.small_size();
        let (large_width, large_height) = self.registers.obj_tile_size.large_size();

        for index in (0..SPRITE_COUNT).rev() {
            let oam_addr = index << 2;
            let x_lsb = self.oam[oam_addr];
            let y = self.oam[oam_addr + 1];
            let tile_number_lsb = self.oam[oam_addr + 2];
            let attributes = self.oam[oam_addr + 3];

            // Two extra bits per sprite live in the 32-byte OAM tail
            let extra_bits = self.oam[512 + (index >> 2)] >> (2 * (index & 0x03));
            let x_msb = extra_bits.bit(0);
            let large = extra_bits.bit(1);

            let (sprite_width, sprite_height) =
                if large { (large_width, large_height) } else { (small_width, small_height) };

            let sprite_row = (line as u8).wrapping_sub(y);
            if u16::from(sprite_row) >= sprite_height {
                continue;
            }

            let x = u16::from_le_bytes([x_lsb, u8::from(x_msb)]);
            let palette = (attributes >> 1) & 0x07;
            let priority = (attributes >> 4) & 0x03;
            let x_flip = attributes.bit(6);
            let y_flip = attributes.bit(7);

            let tile_number = u16::from_le_bytes([tile_number_lsb, u8::from(attributes.bit(0))]);

            let row = if y_flip {
                sprite_height - 1 - u16::from(sprite_row)
            } else {
                u16::from(sprite_row)
            };
            let rank = OBJ_RANK_BASE + priority;

            for col in 0..sprite_width {
                // 9-bit wrap; pixels past x=255 clip off the right edge
                let screen_x = x.wrapping_add(col) & 0x1FF;
                if screen_x >= SCREEN_WIDTH as u16 {
                    continue;
                }

                let xi = screen_x as usize;
                if rank < self.line_priority[xi] {
                    continue;
                }

                let sprite_col = if x_flip { sprite_width - 1 - col } else { col };

                // Large sprites tile horizontally/vertically through OAM
                // tile numbers; offsets wrap within each 16-tile nibble
                let mut tile = tile_number;
                tile = (tile & !0xF) | (tile.wrapping_add(sprite_col / 8) & 0xF);
                tile = (tile & !0xF0) | (tile.wrapping_add((row / 8) << 4) & 0xF0);

                let tile_base = self.registers.obj_tile_base_address.wrapping_add(
                    u16::from(tile.bit(8))
                        * (256 * OBJ_BPP.tile_size_words())
                            .wrapping_add(self.registers.obj_tile_gap_size),
                );
                let tile_addr = tile_base.wrapping_add((tile & 0x00FF) * OBJ_BPP.tile_size_words());

                let color_index =
                    decode_tile_pixel(&self.vram, tile_addr, OBJ_BPP, row % 8, sprite_col % 8);
                if color_index == 0 {
                    continue;
                }

                // Sprite palettes occupy the upper half of CGRAM
                let cgram_index =
                    (8 + u16::from(palette)) * OBJ_BPP.color_count() + u16::from(color_index);
                self.line_color[xi] = self.cgram[(cgram_index & 0xFF) as usize];
                self.line_priority[xi] = rank;
                self.line_layer[xi] = LAYER_OBJ;
            }
        }
    }

    fn bg_map_entry(&self, bg: usize, x: u16, y: u16) -> u16 {
        let tile_pixels = self.registers.bg_tile_size[bg].pixels();
        let screen_size = self.registers.bg_screen_size[bg];

        let screen_width_pixels = screen_size.width_tiles() * tile_pixels;
        let screen_height_pixels = screen_size.height_tiles() * tile_pixels;

        let mut map_base = self.registers.bg_base_address[bg];
        let mut x = x & (screen_width_pixels - 1);
        let mut y = y & (screen_height_pixels - 1);

        // A larger screen is 1-4 stacked 32x32-tile maps
        let single_screen_width = 32 * tile_pixels;
        let single_screen_height = 32 * tile_pixels;

        if x >= single_screen_width {
            map_base += 32 * 32;
            x &= single_screen_width - 1;
        }

        if y >= single_screen_height {
            map_base += match screen_size {
                BgScreenSize::HorizontalMirror => 32 * 32,
                BgScreenSize::FourScreen => 2 * 32 * 32,
                BgScreenSize::OneScreen | BgScreenSize::VerticalMirror => {
                    unreachable!("y is masked below 32 tiles for single-height screens")
                }
            };
            y &= single_screen_height - 1;
        }

        let tile_row = y / tile_pixels;
        let tile_col = x / tile_pixels;
        let map_addr = map_base.wrapping_add(32 * tile_row + tile_col);

        self.vram[(map_addr & VRAM_ADDRESS_MASK) as usize]
    }

    fn apply_mosaic(&self, bg: usize, x: u16, line: u16) -> (u16, u16) {
        if !self.registers.bg_mosaic_enabled[bg] || self.registers.mosaic_size == 0 {
            return (x, line);
        }

        // Size N fills each (N+1)x(N+1) block with its top-left pixel
        let block: u16 = u16::from(self.registers.mosaic_size) + 1;
        (x / block * block, line / block * block)
    }

    pub fn read_port(&mut self, address: u32) -> u8 {
        match address & 0xFF {
            0x38 => self.read_oam_data_port(),
            0x39 => self.read_vram_data_port_low(),
            0x3A => self.read_vram_data_port_high(),
            0x3B => self.read_cgram_data_port(),
            0x3E => {
                // STAT77: PPU1 status; version number hardcoded to 1
                0x01
            }
            0x3F => {
                // STAT78: PPU2 status; odd-frame flag + version number 1
                (((self.state.frame_count & 1) as u8) << 7) | 0x01
            }
            _ => {
                log::debug!("Unhandled PPU port read: {address:06X}");
                0xFF
            }
        }
    }

    pub fn write_port(&mut self, address: u32, value: u8) {
        if log::log_enabled!(log::Level::Trace) {
            // Skip the data ports; they are written in bulk
            let port = address & 0xFF;
            if port != 0x04 && port != 0x18 && port != 0x19 && port != 0x22 {
                log::trace!(
                    "PPU register write: 21{port:02X} {value:02X} (scanline {})",
                    self.state.scanline
                );
            }
        }

        match address & 0xFF {
            0x00 => self.registers.write_inidisp(value),
            0x01 => self.registers.write_obsel(value),
            0x02 => self.registers.write_oamaddl(value),
            0x03 => self.registers.write_oamaddh(value),
            0x04 => self.write_oam_data_port(value),
            0x05 => self.registers.write_bgmode(value),
            0x06 => self.registers.write_mosaic(value),
            address @ 0x07..=0x0A => {
                let bg = ((address - 0x07) & 0x3) as usize;
                self.registers.write_bg1234sc(bg, value);
            }
            0x0B => self.registers.write_bg1234nba(0, value),
            0x0C => self.registers.write_bg1234nba(2, value),
            address @ (0x0D | 0x0F | 0x11 | 0x13) => {
                let bg = ((address - 0x0D) >> 1) as usize;
                self.registers.write_bg_h_scroll(bg, value);
            }
            address @ (0x0E | 0x10 | 0x12 | 0x14) => {
                let bg = ((address - 0x0E) >> 1) as usize;
                self.registers.write_bg_v_scroll(bg, value);
            }
            0x15 => self.registers.write_vmain(value),
            0x16 => self.registers.write_vmaddl(value, &self.vram),
            0x17 => self.registers.write_vmaddh(value, &self.vram),
            0x18 => self.write_vram_data_port_low(value),
            0x19 => self.write_vram_data_port_high(value),
            0x21 => self.registers.write_cgadd(value),
            0x22 => self.write_cgram_data_port(value),
            0x2C => self.registers.write_tm(value),
            0x2D => self.registers.write_ts(value),
            _ => {
                log::debug!("Unhandled PPU port write: {address:06X} {value:02X}");
            }
        }
    }

    fn write_vram_data_port_low(&mut self, value: u8) {
        let vram_addr = (self.registers.vram_address & VRAM_ADDRESS_MASK) as usize;
        self.vram[vram_addr] = (self.vram[vram_addr] & 0xFF00) | u16::from(value);

        if self.registers.vram_address_increment_mode == VramIncrementMode::Low {
            self.increment_vram_address();
        }
    }

    fn write_vram_data_port_high(&mut self, value: u8) {
        let vram_addr = (self.registers.vram_address & VRAM_ADDRESS_MASK) as usize;
        self.vram[vram_addr] = (self.vram[vram_addr] & 0x00FF) | (u16::from(value) << 8);

        if self.registers.vram_address_increment_mode == VramIncrementMode::High {
            self.increment_vram_address();
        }
    }

    fn read_vram_data_port_low(&mut self) -> u8 {
        let vram_byte = self.registers.vram_prefetch_buffer as u8;

        if self.registers.vram_address_increment_mode == VramIncrementMode::Low {
            // The prefetch buffer refills before the address increments
            self.fill_vram_prefetch_buffer();
            self.increment_vram_address();
        }

        vram_byte
    }

    fn read_vram_data_port_high(&mut self) -> u8 {
        let vram_byte = (self.registers.vram_prefetch_buffer >> 8) as u8;

        if self.registers.vram_address_increment_mode == VramIncrementMode::High {
            self.fill_vram_prefetch_buffer();
            self.increment_vram_address();
        }

        vram_byte
    }

    fn increment_vram_address(&mut self) {
        self.registers.vram_address =
            self.registers.vram_address.wrapping_add(self.registers.vram_address_increment_step);
    }

    fn fill_vram_prefetch_buffer(&mut self) {
        self.registers.vram_prefetch_buffer =
            self.vram[(self.registers.vram_address & VRAM_ADDRESS_MASK) as usize];
    }

    fn write_oam_data_port(&mut self, value: u8) {
        self.oam[self.registers.oam_address as usize] = value;
        self.registers.oam_address = (self.registers.oam_address + 1) % OAM_ADDRESS_MODULUS;
    }

    fn read_oam_data_port(&mut self) -> u8 {
        let value = self.oam[self.registers.oam_address as usize];
        self.registers.oam_address = (self.registers.oam_address + 1) % OAM_ADDRESS_MODULUS;
        value
    }

    fn write_cgram_data_port(&mut self, value: u8) {
        match self.registers.cgram_flipflop {
            AccessFlipflop::First => {
                self.registers.cgram_write_buffer = value;
                self.registers.cgram_flipflop = AccessFlipflop::Second;
            }
            AccessFlipflop::Second => {
                self.cgram[self.registers.cgram_address as usize] =
                    u16::from_le_bytes([self.registers.cgram_write_buffer, value]);
                self.registers.cgram_flipflop = AccessFlipflop::First;
                self.registers.cgram_address = self.registers.cgram_address.wrapping_add(1);
            }
        }
    }

    fn read_cgram_data_port(&mut self) -> u8 {
        let word = self.cgram[self.registers.cgram_address as usize];

        match self.registers.cgram_flipflop {
            AccessFlipflop::First => {
                self.registers.cgram_flipflop = AccessFlipflop::Second;
                word as u8
            }
            AccessFlipflop::Second => {
                self.registers.cgram_flipflop = AccessFlipflop::First;
                self.registers.cgram_address = self.registers.cgram_address.wrapping_add(1);
                (word >> 8) as u8
            }
        }
    }

    pub fn vblank_flag(&self) -> bool {
        self.state.vblank_flag
    }

    pub fn scanline(&self) -> u16 {
        self.state.scanline
    }

    pub fn frame_count(&self) -> u64 {
        self.state.frame_count
    }

    pub fn frame_buffer(&self) -> &[Color] {
        &self.frame_buffer
    }

    pub fn frame_size(&self) -> FrameSize {
        FrameSize { width: SCREEN_WIDTH as u32, height: SCREEN_HEIGHT as u32 }
    }
}

/// Planar tile decode: an N-bpp tile stores bitplane pairs in consecutive
/// 8-word groups, low plane in the low byte of each row word.
fn decode_tile_pixel(vram: &Vram, tile_addr: u16, bpp: BitsPerPixel, row: u16, col: u16) -> u8 {
    let bit_index = (7 - col) as u8;

    let mut color = 0_u8;
    for i in (0..bpp.bitplanes()).step_by(2) {
        let word_index = tile_addr.wrapping_add(row + 4 * i as u16) & VRAM_ADDRESS_MASK;
        let word = vram[word_index as usize];

        color |= u8::from(word.bit(bit_index)) << i;
        color |= u8::from(word.bit(bit_index + 8)) << (i + 1);
    }

    color
}

/// BGR555 to RGBA: each 5-bit channel expands by `<<3`, then the master
/// brightness scales linearly (0 = black, 15 = full).
fn convert_snes_color(snes_color: u16, brightness: u8) -> Color {
    if brightness == 0 {
        return Color::rgb(0, 0, 0);
    }

    let scale = |channel: u16| -> u8 {
        let expanded = ((channel & 0x1F) << 3) as u32;
        (expanded * u32::from(brightness) / 15) as u8
    };

    Color::rgb(scale(snes_color), scale(snes_color >> 5), scale(snes_color >> 10))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_cgram_entry(ppu: &mut Ppu, index: u8, color: u16) {
        ppu.write_port(0x2121, index);
        ppu.write_port(0x2122, color as u8);
        ppu.write_port(0x2122, (color >> 8) as u8);
    }

    fn write_vram_word(ppu: &mut Ppu, address: u16, word: u16) {
        ppu.write_port(0x2115, 0x80);
        ppu.write_port(0x2116, address as u8);
        ppu.write_port(0x2117, (address >> 8) as u8);
        ppu.write_port(0x2118, word as u8);
        ppu.write_port(0x2119, (word >> 8) as u8);
    }

    fn render_one_line(ppu: &mut Ppu) {
        let _ = ppu.render_scanline();
    }

    #[test]
    fn cgram_write_protocol() {
        let mut ppu = Ppu::new();

        ppu.write_port(0x2121, 0x10);
        ppu.write_port(0x2122, 0x34);
        ppu.write_port(0x2122, 0x12);

        assert_eq!(ppu.cgram[0x10], 0x1234);

        // Index advanced by one; next pair lands in the following word
        ppu.write_port(0x2122, 0x78);
        ppu.write_port(0x2122, 0x56);
        assert_eq!(ppu.cgram[0x11], 0x5678);
    }

    #[test]
    fn cgram_index_wraps() {
        let mut ppu = Ppu::new();

        ppu.write_port(0x2121, 0xFF);
        ppu.write_port(0x2122, 0xAA);
        ppu.write_port(0x2122, 0x00);
        // Wrapped back to word 0, in low-byte state
        ppu.write_port(0x2122, 0xBB);
        ppu.write_port(0x2122, 0x00);

        assert_eq!(ppu.cgram[0xFF], 0x00AA);
        assert_eq!(ppu.cgram[0x00], 0x00BB);
    }

    #[test]
    fn vram_increment_on_high_byte_trigger() {
        let mut ppu = Ppu::new();

        ppu.write_port(0x2115, 0x80);
        ppu.write_port(0x2116, 0x00);
        ppu.write_port(0x2117, 0x10);

        // Low-byte write must not increment; high-byte write increments once
        ppu.write_port(0x2118, 0xCD);
        assert_eq!(ppu.registers.vram_address, 0x1000);
        ppu.write_port(0x2119, 0xAB);
        assert_eq!(ppu.registers.vram_address, 0x1001);

        assert_eq!(ppu.vram[0x1000], 0xABCD);
    }

    #[test]
    fn vram_increment_step_32() {
        let mut ppu = Ppu::new();

        ppu.write_port(0x2115, 0x81);
        ppu.write_port(0x2116, 0x00);
        ppu.write_port(0x2117, 0x00);
        ppu.write_port(0x2118, 0x01);
        ppu.write_port(0x2119, 0x00);

        assert_eq!(ppu.registers.vram_address, 32);
    }

    #[test]
    fn vram_address_wraps_at_32k_words() {
        let mut ppu = Ppu::new();

        write_vram_word(&mut ppu, 0x7FFF, 0x5555);
        assert_eq!(ppu.registers.vram_address, 0x8000);

        // The next write masks back to word 0
        ppu.write_port(0x2118, 0x66);
        ppu.write_port(0x2119, 0x00);
        assert_eq!(ppu.vram[0x0000], 0x0066);
    }

    #[test]
    fn oam_address_wraps_at_0x220() {
        let mut ppu = Ppu::new();

        ppu.write_port(0x2102, 0x0F);
        ppu.write_port(0x2103, 0x01);
        assert_eq!(ppu.registers.oam_address, 0x21E);

        ppu.write_port(0x2104, 0x11);
        ppu.write_port(0x2104, 0x22);
        // 0x220 wraps to 0
        ppu.write_port(0x2104, 0x33);

        assert_eq!(ppu.oam[0x21E], 0x11);
        assert_eq!(ppu.oam[0x21F], 0x22);
        assert_eq!(ppu.oam[0x000], 0x33);
    }

    #[test]
    fn scanline_counter_and_vblank() {
        let mut ppu = Ppu::new();

        for line in 0..VBLANK_START_SCANLINE - 1 {
            assert_eq!(ppu.render_scanline(), PpuTickEffect::None, "line {line}");
            assert!(!ppu.vblank_flag());
        }

        assert_eq!(ppu.render_scanline(), PpuTickEffect::VBlankStart);
        assert!(ppu.vblank_flag());

        for _ in VBLANK_START_SCANLINE..SCANLINES_PER_FRAME - 1 {
            assert_eq!(ppu.render_scanline(), PpuTickEffect::None);
        }

        assert_eq!(ppu.render_scanline(), PpuTickEffect::FrameComplete);
        assert!(!ppu.vblank_flag());
        assert_eq!(ppu.scanline(), 0);
        assert_eq!(ppu.frame_count(), 1);
    }

    fn setup_bg1_tile(ppu: &mut Ppu) {
        // Mode 1, BG1 char base $2000 (words), tilemap base 0, full
        // brightness, BG1 on the main screen
        ppu.write_port(0x2100, 0x0F);
        ppu.write_port(0x2105, 0x01);
        ppu.write_port(0x210B, 0x02);
        ppu.write_port(0x2107, 0x00);
        ppu.write_port(0x212C, 0x01);

        // Tile 0, row 0: bitplane 0 = $FF, others 0 -> color index 1
        write_vram_word(ppu, 0x2000, 0x00FF);
        // Tilemap entry (0,0) = tile 0, palette 0
        write_vram_word(ppu, 0x0000, 0x0000);
    }

    #[test]
    fn renders_a_bg1_tile_row() {
        let mut ppu = Ppu::new();
        setup_bg1_tile(&mut ppu);
        write_cgram_entry(&mut ppu, 1, 0x7FFF);

        render_one_line(&mut ppu);

        let white = Color::rgb(0xF8, 0xF8, 0xF8);
        for x in 0..8 {
            assert_eq!(ppu.frame_buffer[x], white, "x={x}");
        }
        // Past the tile the backdrop (CGRAM entry 0 = black) shows through
        assert_eq!(ppu.frame_buffer[8], Color::rgb(0, 0, 0));
    }

    #[test]
    fn transparent_pixels_leave_backdrop_alone() {
        let mut ppu = Ppu::new();
        setup_bg1_tile(&mut ppu);
        write_cgram_entry(&mut ppu, 0, 0x001F); // red backdrop
        write_cgram_entry(&mut ppu, 1, 0x7FFF);

        render_one_line(&mut ppu);

        let red = Color::rgb(0xF8, 0, 0);
        // Columns 8+ decode to color index 0 and must not overwrite
        assert_eq!(ppu.frame_buffer[100], red);
    }

    #[test]
    fn brightness_scales_output() {
        let mut ppu = Ppu::new();
        setup_bg1_tile(&mut ppu);
        write_cgram_entry(&mut ppu, 1, 0x7FFF);

        // Brightness 7 of 15
        ppu.write_port(0x2100, 0x07);
        render_one_line(&mut ppu);

        let expected = (0xF8_u32 * 7 / 15) as u8;
        assert_eq!(ppu.frame_buffer[0], Color::rgb(expected, expected, expected));
    }

    #[test]
    fn brightness_zero_is_black() {
        let mut ppu = Ppu::new();
        setup_bg1_tile(&mut ppu);
        write_cgram_entry(&mut ppu, 1, 0x7FFF);

        ppu.write_port(0x2100, 0x00);
        render_one_line(&mut ppu);

        assert_eq!(ppu.frame_buffer[0], Color::rgb(0, 0, 0));
    }

    #[test]
    fn forced_blanking_renders_black() {
        let mut ppu = Ppu::new();
        setup_bg1_tile(&mut ppu);
        write_cgram_entry(&mut ppu, 0, 0x001F);

        ppu.write_port(0x2100, 0x8F);
        render_one_line(&mut ppu);

        assert_eq!(ppu.frame_buffer[0], Color::rgb(0, 0, 0));
    }

    #[test]
    fn tile_priority_bit_wins_between_layers() {
        let mut ppu = Ppu::new();

        // Mode 0, BG1 and BG2 both enabled, both tilemaps at word 0 but
        // with different palettes; BG2 carries the tile priority bit
        ppu.write_port(0x2100, 0x0F);
        ppu.write_port(0x2105, 0x00);
        ppu.write_port(0x210B, 0x22); // BG1 and BG2 char base $2000
        ppu.write_port(0x2107, 0x00); // BG1 map at 0
        ppu.write_port(0x2108, 0x04); // BG2 map at word $0400
        ppu.write_port(0x212C, 0x03);

        // Shared tile 0 row 0: solid color index 1
        write_vram_word(&mut ppu, 0x2000, 0x00FF);
        // BG1 map entry: palette 0, no priority
        write_vram_word(&mut ppu, 0x0000, 0x0000);
        // BG2 map entry: palette 1, priority bit set
        write_vram_word(&mut ppu, 0x0400, 0x2000 | 0x0400);

        write_cgram_entry(&mut ppu, 1, 0x001F); // BG1 color: red
        write_cgram_entry(&mut ppu, 5, 0x03E0); // BG2 palette 1 color: green

        render_one_line(&mut ppu);

        // BG2 rank 3 + 2 (priority) beats BG1 rank 4
        assert_eq!(ppu.frame_buffer[0], Color::rgb(0, 0xF8, 0));
    }

    fn setup_sprite(ppu: &mut Ppu, x: u16, y: u8) {
        ppu.write_port(0x2100, 0x0F);
        ppu.write_port(0x2101, 0x03); // 8x8 sprites, char base $6000
        ppu.write_port(0x212C, 0x10); // OBJ only on the main screen

        // Sprite tile 0, row 0: color index 1
        write_vram_word(ppu, 0x6000, 0x00FF);

        // OAM entry 0
        ppu.write_port(0x2102, 0x00);
        ppu.write_port(0x2103, 0x00);
        ppu.write_port(0x2104, x as u8);
        ppu.write_port(0x2104, y);
        ppu.write_port(0x2104, 0x00); // tile 0
        ppu.write_port(0x2104, 0x00); // palette 0, priority 0

        if x > 0xFF {
            // x bit 8 lives in the OAM tail
            ppu.write_port(0x2102, 0x00);
            ppu.write_port(0x2103, 0x01);
            ppu.write_port(0x2104, 0x01);
        }

        // Sprite palette 0 color 1 (CGRAM entry 129)
        write_cgram_entry(ppu, 129, 0x7FFF);
    }

    #[test]
    fn renders_a_sprite_row() {
        let mut ppu = Ppu::new();
        setup_sprite(&mut ppu, 0x10, 0x00);

        render_one_line(&mut ppu);

        let white = Color::rgb(0xF8, 0xF8, 0xF8);
        for x in 0x10..0x18 {
            assert_eq!(ppu.frame_buffer[x], white, "x={x}");
        }
        assert_eq!(ppu.frame_buffer[0x18], Color::rgb(0, 0, 0));
    }

    #[test]
    fn sprite_clips_at_right_edge() {
        let mut ppu = Ppu::new();
        setup_sprite(&mut ppu, 252, 0x00);

        render_one_line(&mut ppu);

        let white = Color::rgb(0xF8, 0xF8, 0xF8);
        for x in 252..256 {
            assert_eq!(ppu.frame_buffer[x], white, "x={x}");
        }
        // The remaining columns clip instead of wrapping to x=0
        assert_eq!(ppu.frame_buffer[0], Color::rgb(0, 0, 0));
    }

    #[test]
    fn sprite_draws_over_background() {
        let mut ppu = Ppu::new();
        setup_bg1_tile(&mut ppu);
        write_cgram_entry(&mut ppu, 1, 0x001F);
        setup_sprite(&mut ppu, 0x00, 0x00);
        // Re-enable BG1 alongside OBJ
        ppu.write_port(0x212C, 0x11);

        render_one_line(&mut ppu);

        // Sprite (white) wins over the BG1 pixel (red)
        assert_eq!(ppu.frame_buffer[0], Color::rgb(0xF8, 0xF8, 0xF8));
    }
}
