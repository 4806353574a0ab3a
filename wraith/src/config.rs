//! Values the host resolves up front and hands to [`Machine::new`](crate::Machine::new). Nothing in
//! here knows about files or formats; reading a settings file is the host's job.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;
use crate::ppu::Pixel;

/// Everything a machine needs to know about its surroundings at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineConfig {
    /// When present, the machine starts executing this image at 0x0000 with every register zeroed.
    /// Otherwise, the machine starts in the state the DMG boot ROM leaves behind.
    pub boot_rom: Option<BootRom>,
    /// The four shades background color indices are mapped onto.
    pub palette: DmgPalette,
    /// Emit a trace line to the sink before every instruction.
    pub trace: bool,
}

/// A 256-byte boot image that is mapped over the bottom of the address space until the game
/// disables it.
#[derive(Clone, PartialEq, Eq)]
pub struct BootRom(Box<[u8; 0x100]>);

impl BootRom {
    pub const LEN: usize = 0x100;

    pub fn new(bytes: &[u8]) -> Result<Self, ConfigError> {
        let data: [u8; Self::LEN] = bytes
            .try_into()
            .map_err(|_| ConfigError::BootRomLength { len: bytes.len() })?;
        Ok(Self(Box::new(data)))
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        self.0[addr as usize & 0xFF]
    }
}

impl TryFrom<Vec<u8>> for BootRom {
    type Error = ConfigError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl fmt::Debug for BootRom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BootRom({} bytes)", Self::LEN)
    }
}

/// The four DMG shades, lightest first. Color index `n` from the background palette register is
/// drawn with `self.0[n]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DmgPalette(pub [Pixel; 4]);

impl DmgPalette {
    /// The classic green-tinted shades.
    pub const GREEN: Self = Self([
        Pixel::new(0x9B, 0xBC, 0x0F),
        Pixel::new(0x8B, 0xAC, 0x0F),
        Pixel::new(0x30, 0x62, 0x30),
        Pixel::new(0x0F, 0x38, 0x0F),
    ]);

    /// Builds a palette from four `#RRGGBB` strings.
    pub fn from_hex<S: AsRef<str>>(colors: [S; 4]) -> Result<Self, ConfigError> {
        let [a, b, c, d] = colors;
        Ok(Self([
            Pixel::from_hex(a.as_ref())?,
            Pixel::from_hex(b.as_ref())?,
            Pixel::from_hex(c.as_ref())?,
            Pixel::from_hex(d.as_ref())?,
        ]))
    }

    pub fn shade(&self, index: u8) -> Pixel {
        self.0[(index & 0b11) as usize]
    }
}

impl Default for DmgPalette {
    fn default() -> Self {
        Self::GREEN
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn boot_rom_length_is_checked() {
        assert!(BootRom::new(&[0; 0x100]).is_ok());
        assert_eq!(
            BootRom::new(&[0; 0xFF]),
            Err(ConfigError::BootRomLength { len: 0xFF })
        );
        assert_eq!(
            BootRom::try_from(vec![0; 0x900]),
            Err(ConfigError::BootRomLength { len: 0x900 })
        );
    }

    #[test]
    fn palette_from_hex() {
        let palette = DmgPalette::from_hex(["#9BBC0F", "#8BAC0F", "#306230", "#0F380F"]).unwrap();
        assert_eq!(palette, DmgPalette::GREEN);
        assert_eq!(palette.shade(0b111), Pixel::new(0x0F, 0x38, 0x0F));
        assert!(DmgPalette::from_hex(["#9BBC0F", "nope", "#306230", "#0F380F"]).is_err());
    }
}
