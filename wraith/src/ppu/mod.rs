//! The Pixel Processing Unit. Only the background layer is drawn; OAM is kept as plain memory for
//! the CPU to read and write.

use std::fmt;

use heapless::Deque;
use serde::Deserialize;
use serde::Serialize;

use crate::config::DmgPalette;
use crate::error::ConfigError;
use crate::instruction::Interrupt;

mod registers;

pub use registers::*;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;
/// The number of dots in one scanline, including H-blank.
pub const DOTS_PER_LINE: u16 = 456;
/// The number of scanlines, including V-blank.
pub const LINES_PER_FRAME: u8 = 154;
/// The number of dots it takes to draw a full frame.
pub const DOTS_PER_FRAME: u32 = DOTS_PER_LINE as u32 * LINES_PER_FRAME as u32;

const OAM_SCAN_DOTS: u16 = 80;

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(try_from = "String", into = "String")]
#[display("#{r:0>2X}{g:0>2X}{b:0>2X}")]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses a color written as `#RRGGBB`. The leading `#` is optional.
    pub fn from_hex(s: &str) -> Result<Self, ConfigError> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidColor {
                value: s.to_owned(),
            });
        }
        let [_, r, g, b] = u32::from_str_radix(digits, 16)
            .map_err(|_| ConfigError::InvalidColor {
                value: s.to_owned(),
            })?
            .to_be_bytes();
        Ok(Self { r, g, b })
    }
}

impl TryFrom<String> for Pixel {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Pixel> for String {
    fn from(value: Pixel) -> Self {
        value.to_string()
    }
}

/// Turns a row of tile data into color indices, leftmost pixel first.
pub fn zip_bits(hi: u8, lo: u8) -> impl Iterator<Item = u8> {
    (0..8)
        .rev()
        .map(move |i| (((hi >> i) & 1) << 1) | ((lo >> i) & 1))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
enum FetcherState {
    #[default]
    GetTile,
    DataLow,
    DataHigh,
    Push,
}

/// Pulls one tile row (8 pixels) of background at a time out of VRAM.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
struct PixelFetcher {
    state: FetcherState,
    /// The tile column (0..20) the next push will fill.
    tile_x: u8,
    tile: u8,
    lo: u8,
    hi: u8,
    /// The first fetch on each line is thrown away and redone.
    primed: bool,
}

/// The Pixel Processing Unit
#[derive(Clone)]
pub struct Ppu {
    vram: Box<[u8; 0x2000]>,
    oam: [u8; 0xA0],
    /// ADDR FF40
    pub lcdc: LcdControl,
    /// ADDR FF41
    pub stat: LcdStatus,
    /// ADDR FF42
    pub scy: u8,
    /// ADDR FF43
    pub scx: u8,
    /// ADDR FF44
    ly: u8,
    /// ADDR FF45
    pub lyc: u8,
    /// ADDR FF47
    pub bgp: Palette,
    /// ADDR FF4A
    pub wy: u8,
    /// ADDR FF4B
    pub wx: u8,
    shades: DmgPalette,
    /// Dots elapsed in the current scanline.
    dot: u16,
    /// Pixels pushed to the current scanline.
    lx: u8,
    fetcher: PixelFetcher,
    fifo: Deque<Pixel, 8>,
    stat_line: bool,
    /// The frame currently being drawn.
    back: Vec<[Pixel; SCREEN_WIDTH]>,
    /// The last complete frame. The length of this will always be 144.
    screen: Vec<[Pixel; SCREEN_WIDTH]>,
    frames: u64,
}

impl fmt::Debug for Ppu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ppu")
            .field("lcdc", &format_args!("0x{:0>2X}", self.lcdc.as_byte()))
            .field("stat", &format_args!("0x{:0>2X}", self.stat.as_byte()))
            .field("ly", &self.ly)
            .field("dot", &self.dot)
            .field("lx", &self.lx)
            .field("fetcher", &self.fetcher)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl Ppu {
    pub fn new(shades: DmgPalette) -> Self {
        Self {
            vram: Box::new([0; 0x2000]),
            oam: [0; 0xA0],
            lcdc: LcdControl::default(),
            stat: LcdStatus::default(),
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            bgp: Palette::default(),
            wy: 0,
            wx: 0,
            shades,
            dot: 0,
            lx: 0,
            fetcher: PixelFetcher::default(),
            fifo: Deque::new(),
            stat_line: false,
            back: vec![[shades.shade(0); SCREEN_WIDTH]; SCREEN_HEIGHT],
            screen: vec![[shades.shade(0); SCREEN_WIDTH]; SCREEN_HEIGHT],
            frames: 0,
        }
    }

    /// The PPU as the DMG boot ROM leaves it: display on, background on, and the 0xFC palette.
    pub fn post_boot(shades: DmgPalette) -> Self {
        let mut ppu = Self::new(shades);
        ppu.lcdc = LcdControl::from(0x91);
        ppu.bgp = Palette::from(0xFC);
        ppu
    }

    /// The last fully drawn frame, row by row.
    pub fn screen(&self) -> &[[Pixel; SCREEN_WIDTH]] {
        &self.screen
    }

    /// The number of frames that have been completed.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn ly(&self) -> u8 {
        self.ly
    }

    pub fn mode(&self) -> PpuMode {
        self.stat.mode
    }

    pub fn read_vram(&self, addr: u16) -> u8 {
        self.vram[addr as usize & 0x1FFF]
    }

    pub fn write_vram(&mut self, addr: u16, val: u8) {
        self.vram[addr as usize & 0x1FFF] = val;
    }

    pub fn read_oam(&self, addr: u16) -> u8 {
        self.oam.get(addr as usize & 0xFF).copied().unwrap_or(0xFF)
    }

    pub fn write_oam(&mut self, addr: u16, val: u8) {
        if let Some(byte) = self.oam.get_mut(addr as usize & 0xFF) {
            *byte = val;
        }
    }

    pub fn read_register(&self, addr: u16) -> u8 {
        match addr {
            0xFF40 => self.lcdc.as_byte(),
            0xFF41 => self.stat.as_byte(),
            0xFF42 => self.scy,
            0xFF43 => self.scx,
            0xFF44 => self.ly,
            0xFF45 => self.lyc,
            0xFF47 => self.bgp.as_byte(),
            0xFF4A => self.wy,
            0xFF4B => self.wx,
            _ => 0xFF,
        }
    }

    pub fn write_register(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF40 => {
                let was_enabled = self.lcdc.enabled;
                self.lcdc = LcdControl::from(val);
                if was_enabled && !self.lcdc.enabled {
                    self.switch_off();
                }
            }
            0xFF41 => self.stat.write_byte(val),
            0xFF42 => self.scy = val,
            0xFF43 => self.scx = val,
            // LY is read-only
            0xFF44 => {}
            0xFF45 => self.lyc = val,
            0xFF47 => self.bgp = Palette::from(val),
            0xFF4A => self.wy = val,
            0xFF4B => self.wx = val,
            _ => {}
        }
    }

    /// Turning the display off parks the PPU at the start of the first line.
    fn switch_off(&mut self) {
        self.ly = 0;
        self.dot = 0;
        self.stat.mode = PpuMode::HBlank;
        self.stat_line = false;
        self.reset_line();
    }

    fn reset_line(&mut self) {
        self.lx = 0;
        self.fetcher = PixelFetcher::default();
        self.fifo.clear();
    }

    /// Advances the PPU by a single dot. Returns the interrupts that should be requested, as a
    /// mask in the layout of the IF register.
    pub fn tick(&mut self) -> u8 {
        if !self.lcdc.enabled {
            return 0;
        }
        let mut requests = self.step();
        self.stat.lyc_equal = self.ly == self.lyc;
        let line = self.stat.interrupt_line();
        if line && !self.stat_line {
            requests |= Interrupt::Lcd.mask();
        }
        self.stat_line = line;
        requests
    }

    fn step(&mut self) -> u8 {
        if self.ly >= SCREEN_HEIGHT as u8 {
            self.dot += 1;
            if self.dot == DOTS_PER_LINE {
                self.dot = 0;
                self.ly += 1;
                if self.ly == LINES_PER_FRAME {
                    self.ly = 0;
                }
            }
            return 0;
        }

        if self.dot == 0 {
            self.stat.mode = PpuMode::OamScan;
        }
        if self.dot < OAM_SCAN_DOTS {
            self.dot += 1;
            return 0;
        }

        if (self.lx as usize) < SCREEN_WIDTH {
            self.stat.mode = PpuMode::Drawing;
            if (self.fetcher.tile_x as usize) < SCREEN_WIDTH / 8 {
                self.fetch();
            }
            if let Some(pixel) = self.fifo.pop_front() {
                self.back[self.ly as usize][self.lx as usize] = pixel;
                self.lx += 1;
            }
        } else {
            self.stat.mode = PpuMode::HBlank;
        }

        self.dot += 1;
        if self.dot < DOTS_PER_LINE {
            return 0;
        }
        self.dot = 0;
        self.ly += 1;
        self.reset_line();
        if self.ly == SCREEN_HEIGHT as u8 {
            self.stat.mode = PpuMode::VBlank;
            std::mem::swap(&mut self.screen, &mut self.back);
            self.frames += 1;
            return Interrupt::VBlank.mask();
        }
        0
    }

    /// Runs one dot of the background fetcher. Every phase but the push only makes progress on odd
    /// dots, so each takes two dots.
    fn fetch(&mut self) {
        let odd_dot = self.dot & 1 == 1;
        let y = self.ly.wrapping_add(self.scy);
        let fetcher = &mut self.fetcher;
        match fetcher.state {
            FetcherState::GetTile if odd_dot => {
                let column = (fetcher.tile_x as usize + self.scx as usize / 8) & 0x1F;
                let row = y as usize / 8;
                let offset = (column + 32 * row) & 0x3FF;
                fetcher.tile = self.vram[self.lcdc.bg_map_base() + offset];
                fetcher.state = FetcherState::DataLow;
            }
            FetcherState::DataLow if odd_dot => {
                let addr = self.lcdc.tile_data_addr(fetcher.tile) + 2 * (y as usize & 7);
                fetcher.lo = self.vram[addr];
                fetcher.state = FetcherState::DataHigh;
            }
            FetcherState::DataHigh if odd_dot => {
                let addr = self.lcdc.tile_data_addr(fetcher.tile) + 2 * (y as usize & 7) + 1;
                fetcher.hi = self.vram[addr];
                fetcher.state = if fetcher.primed {
                    FetcherState::Push
                } else {
                    fetcher.primed = true;
                    FetcherState::GetTile
                };
            }
            FetcherState::Push if self.fifo.is_empty() => {
                fetcher.tile_x += 1;
                for index in zip_bits(fetcher.hi, fetcher.lo) {
                    let pixel = if self.lcdc.bg_enabled {
                        self.shades.shade(self.bgp.shade(index))
                    } else {
                        self.shades.shade(0)
                    };
                    // The FIFO is only refilled once empty, so there is always room for a tile
                    let _ = self.fifo.push_back(pixel);
                }
                fetcher.state = FetcherState::GetTile;
            }
            _ => {}
        }
    }
}
