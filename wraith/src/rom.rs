use tracing::warn;

use crate::error::CartridgeError;

/// Whether a cartridge makes use of Game Boy Color features. Only the flag is tracked; the machine
/// always runs in DMG mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{_variant}")]
pub enum CgbSupport {
    #[display("DMG only")]
    None,
    #[display("CGB supported")]
    Supported,
    #[display("CGB only")]
    Exclusive,
}

/// This struct represents a cartridge header. Per the Pan Docs, the header of the ROM occupies the
/// region between `0x100` and `0x14F`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeHeader {
    /// The memory region between `0x134` and `0x143`, with trailing padding removed.
    pub title: String,
    /// Derived from the byte at `0x143`.
    pub cgb: CgbSupport,
    /// Set when the byte at `0x146` is `0x03`.
    pub sgb: bool,
    /// The byte at `0x147`. Selects the bank controller.
    pub kind: u8,
    /// The byte at `0x148` decoded into a length in bytes, i.e. `0x8000 << code`.
    pub rom_size: usize,
    /// The byte at `0x149` decoded into a length in bytes.
    pub ram_size: usize,
    /// The byte at `0x14C`.
    pub revision: u8,
    /// The byte at `0x14D`. The boot ROM refuses to start a game whose header does not sum to
    /// this value (see [`CartridgeHeader::header_checksum_valid`]).
    pub header_checksum: u8,
    /// The big-endian word at `0x14E`. Nothing checks this on real hardware.
    pub global_checksum: u16,
    computed_checksum: u8,
}

impl CartridgeHeader {
    pub const START_ADDR: usize = 0x100;
    pub const END_ADDR: usize = 0x14F;

    pub fn parse(rom: &[u8]) -> Result<Self, CartridgeError> {
        if rom.len() <= Self::END_ADDR {
            return Err(CartridgeError::TruncatedHeader { len: rom.len() });
        }
        let title = rom[0x134..=0x143]
            .iter()
            .take_while(|b| **b != 0 && b.is_ascii())
            .map(|&b| b as char)
            .collect::<String>()
            .trim_end()
            .to_owned();
        let cgb = match rom[0x143] {
            0x80 => CgbSupport::Supported,
            0xC0 => CgbSupport::Exclusive,
            _ => CgbSupport::None,
        };
        let code = rom[0x148];
        let rom_size = match code {
            0x00..=0x08 => 0x8000 << code,
            code => return Err(CartridgeError::UnknownRomSize { code }),
        };
        let ram_size = match rom[0x149] {
            0x00 => 0,
            0x02 => 0x2000,
            0x03 => 0x8000,
            0x04 => 0x20000,
            0x05 => 0x10000,
            code => {
                warn!("Unknown RAM size code 0x{code:0>2X}, assuming no cartridge RAM");
                0
            }
        };
        let computed_checksum = rom[0x134..=0x14C]
            .iter()
            .fold(0u8, |acc, b| acc.wrapping_sub(*b).wrapping_sub(1));
        Ok(Self {
            title,
            cgb,
            sgb: rom[0x146] == 0x03,
            kind: rom[0x147],
            rom_size,
            ram_size,
            revision: rom[0x14C],
            header_checksum: rom[0x14D],
            global_checksum: u16::from_be_bytes([rom[0x14E], rom[0x14F]]),
            computed_checksum,
        })
    }

    /// Whether the checksum stored at `0x14D` matches the header's contents.
    pub fn header_checksum_valid(&self) -> bool {
        self.computed_checksum == self.header_checksum
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Builds a ROM image of the size the header declares, with a correct header checksum.
    pub(crate) fn blank_rom(title: &str, kind: u8, rom_code: u8, ram_code: u8) -> Vec<u8> {
        let mut rom = vec![0; 0x8000 << rom_code];
        rom[0x134..0x134 + title.len()].copy_from_slice(title.as_bytes());
        rom[0x147] = kind;
        rom[0x148] = rom_code;
        rom[0x149] = ram_code;
        rom[0x14D] = rom[0x134..=0x14C]
            .iter()
            .fold(0u8, |acc, b| acc.wrapping_sub(*b).wrapping_sub(1));
        rom
    }

    #[test]
    fn parse_header_fields() {
        let mut rom = blank_rom("WRAITH", 0x03, 0x02, 0x03);
        rom[0x143] = 0x80;
        rom[0x146] = 0x03;
        rom[0x14C] = 0x01;
        rom[0x14E] = 0xBE;
        rom[0x14F] = 0xEF;
        let header = CartridgeHeader::parse(&rom).unwrap();
        assert_eq!(header.title, "WRAITH");
        assert_eq!(header.cgb, CgbSupport::Supported);
        assert!(header.sgb);
        assert_eq!(header.kind, 0x03);
        assert_eq!(header.rom_size, 0x20000);
        assert_eq!(header.ram_size, 0x8000);
        assert_eq!(header.revision, 0x01);
        assert_eq!(header.global_checksum, 0xBEEF);
        // The header was edited after its checksum was computed
        assert!(!header.header_checksum_valid());
    }

    #[test]
    fn checksum() {
        let rom = blank_rom("TETRIS", 0x00, 0x00, 0x00);
        let header = CartridgeHeader::parse(&rom).unwrap();
        assert!(header.header_checksum_valid());
        assert_eq!(header.cgb, CgbSupport::None);
        assert!(!header.sgb);
    }

    #[test]
    fn ram_size_table() {
        for (code, size) in [(0, 0), (1, 0), (2, 0x2000), (3, 0x8000), (4, 0x20000), (5, 0x10000)] {
            let rom = blank_rom("", 0x03, 0x00, code);
            assert_eq!(CartridgeHeader::parse(&rom).unwrap().ram_size, size);
        }
    }

    #[test]
    fn bad_headers() {
        assert_eq!(
            CartridgeHeader::parse(&[0; 0x100]),
            Err(CartridgeError::TruncatedHeader { len: 0x100 })
        );
        let mut rom = blank_rom("", 0x00, 0x00, 0x00);
        rom[0x148] = 0x52;
        assert_eq!(
            CartridgeHeader::parse(&rom),
            Err(CartridgeError::UnknownRomSize { code: 0x52 })
        );
    }
}
