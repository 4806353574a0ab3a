//! The video registers. Each is stored as named fields; the packed byte the CPU sees is derived on
//! demand.

const fn bit(val: u8, n: u8) -> bool {
    val & (1 << n) != 0
}

const fn mask(set: bool, n: u8) -> u8 {
    (set as u8) << n
}

/// ADDR FF40
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LcdControl {
    /// Bit 7. When cleared, the PPU is idle and LY is held at 0.
    pub enabled: bool,
    /// Bit 6. Selects the 0x9C00 tile map for the window instead of 0x9800.
    pub window_high_map: bool,
    /// Bit 5
    pub window_enabled: bool,
    /// Bit 4. Tile data starts at 0x8000 with unsigned indices; otherwise tile data is indexed
    /// with a signed offset from 0x9000.
    pub unsigned_tile_data: bool,
    /// Bit 3. Selects the 0x9C00 tile map for the background instead of 0x9800.
    pub bg_high_map: bool,
    /// Bit 2
    pub tall_sprites: bool,
    /// Bit 1
    pub sprites_enabled: bool,
    /// Bit 0. On the DMG, clearing this blanks the background to shade 0.
    pub bg_enabled: bool,
}

impl From<u8> for LcdControl {
    fn from(value: u8) -> Self {
        Self {
            enabled: bit(value, 7),
            window_high_map: bit(value, 6),
            window_enabled: bit(value, 5),
            unsigned_tile_data: bit(value, 4),
            bg_high_map: bit(value, 3),
            tall_sprites: bit(value, 2),
            sprites_enabled: bit(value, 1),
            bg_enabled: bit(value, 0),
        }
    }
}

impl LcdControl {
    pub fn as_byte(&self) -> u8 {
        mask(self.enabled, 7)
            | mask(self.window_high_map, 6)
            | mask(self.window_enabled, 5)
            | mask(self.unsigned_tile_data, 4)
            | mask(self.bg_high_map, 3)
            | mask(self.tall_sprites, 2)
            | mask(self.sprites_enabled, 1)
            | mask(self.bg_enabled, 0)
    }

    /// The offset into VRAM of the background tile map.
    pub fn bg_map_base(&self) -> usize {
        if self.bg_high_map {
            0x1C00
        } else {
            0x1800
        }
    }

    /// The offset into VRAM of the first row of the given tile.
    pub fn tile_data_addr(&self, tile: u8) -> usize {
        if self.unsigned_tile_data {
            16 * tile as usize
        } else {
            (0x1000 + 16 * (tile as i8) as isize) as usize
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[repr(u8)]
pub enum PpuMode {
    #[default]
    HBlank = 0,
    VBlank = 1,
    OamScan = 2,
    Drawing = 3,
}

/// ADDR FF41
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LcdStatus {
    /// Bit 6
    pub lyc_interrupt: bool,
    /// Bit 5
    pub oam_interrupt: bool,
    /// Bit 4
    pub vblank_interrupt: bool,
    /// Bit 3
    pub hblank_interrupt: bool,
    /// Bit 2, read-only
    pub lyc_equal: bool,
    /// Bits 0 and 1, read-only
    pub mode: PpuMode,
}

impl From<u8> for LcdStatus {
    fn from(value: u8) -> Self {
        let mode = match value & 0b11 {
            0 => PpuMode::HBlank,
            1 => PpuMode::VBlank,
            2 => PpuMode::OamScan,
            _ => PpuMode::Drawing,
        };
        Self {
            lyc_interrupt: bit(value, 6),
            oam_interrupt: bit(value, 5),
            vblank_interrupt: bit(value, 4),
            hblank_interrupt: bit(value, 3),
            lyc_equal: bit(value, 2),
            mode,
        }
    }
}

impl LcdStatus {
    /// Bit 7 is unused and always reads as set.
    pub fn as_byte(&self) -> u8 {
        0x80 | mask(self.lyc_interrupt, 6)
            | mask(self.oam_interrupt, 5)
            | mask(self.vblank_interrupt, 4)
            | mask(self.hblank_interrupt, 3)
            | mask(self.lyc_equal, 2)
            | self.mode as u8
    }

    /// Only the interrupt enable bits are writable.
    pub fn write_byte(&mut self, value: u8) {
        let new = Self::from(value);
        self.lyc_interrupt = new.lyc_interrupt;
        self.oam_interrupt = new.oam_interrupt;
        self.vblank_interrupt = new.vblank_interrupt;
        self.hblank_interrupt = new.hblank_interrupt;
    }

    /// The level of the STAT interrupt line. The interrupt fires on its rising edge.
    pub fn interrupt_line(&self) -> bool {
        (self.oam_interrupt && self.mode == PpuMode::OamScan)
            || (self.vblank_interrupt && self.mode == PpuMode::VBlank)
            || (self.hblank_interrupt && self.mode == PpuMode::HBlank)
            || (self.lyc_interrupt && self.lyc_equal)
    }
}

/// ADDR FF47. Maps each of the four color indices onto one of the four shades.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Palette(pub [u8; 4]);

impl From<u8> for Palette {
    fn from(value: u8) -> Self {
        Self([0, 2, 4, 6].map(|shift| (value >> shift) & 0b11))
    }
}

impl Palette {
    pub fn as_byte(&self) -> u8 {
        self.0
            .iter()
            .enumerate()
            .fold(0, |acc, (i, shade)| acc | shade << (2 * i))
    }

    pub fn shade(&self, index: u8) -> u8 {
        self.0[(index & 0b11) as usize]
    }
}
