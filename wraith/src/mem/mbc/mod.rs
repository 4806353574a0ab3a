use std::fmt;

mod mbc1;

pub use mbc1::*;
use tracing::info;

use crate::error::CartridgeError;
use crate::mem::OPEN_BUS;
use crate::rom::CartridgeHeader;

/// The size of a ROM bank, 16 KiB.
pub const ROM_BANK_SIZE: usize = 16 * 1024;

/// The size of a RAM bank, 8 KiB.
pub const RAM_BANK_SIZE: usize = 8 * 1024;

/// A game cartridge: its parsed header plus the bank controller wired to its ROM and RAM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cartridge {
    header: CartridgeHeader,
    mbc: MemoryBankController,
}

impl Cartridge {
    /// Parses the header and wires up the bank controller it asks for. Fails if the buffer is not
    /// exactly as long as the header claims or if the cartridge type is not supported.
    pub fn new(rom: Vec<u8>) -> Result<Self, CartridgeError> {
        let header = CartridgeHeader::parse(&rom)?;
        if header.rom_size != rom.len() {
            return Err(CartridgeError::RomSizeMismatch {
                declared: header.rom_size,
                actual: rom.len(),
            });
        }
        info!(
            "Loaded '{}' ({}, {} KiB ROM, {} KiB RAM, type 0x{:0>2X})",
            header.title,
            header.cgb,
            header.rom_size / 1024,
            header.ram_size / 1024,
            header.kind
        );
        let mbc = match header.kind {
            0x00 => MemoryBankController::Direct {
                rom: rom.into_boxed_slice(),
            },
            0x01..=0x03 => MemoryBankController::MBC1(MBC1::new(rom, header.ram_size)),
            kind => return Err(CartridgeError::UnknownCartridgeType { kind }),
        };
        Ok(Self { header, mbc })
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    pub fn title(&self) -> &str {
        &self.header.title
    }

    pub fn mbc(&self) -> &MemoryBankController {
        &self.mbc
    }

    pub fn read_rom(&self, addr: u16) -> u8 {
        self.mbc.read_rom(addr)
    }

    pub fn write_rom(&mut self, addr: u16, val: u8) {
        self.mbc.write_rom(addr, val)
    }

    pub fn read_ram(&self, addr: u16) -> u8 {
        self.mbc.read_ram(addr)
    }

    pub fn write_ram(&mut self, addr: u16, val: u8) {
        self.mbc.write_ram(addr, val)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum MemoryBankController {
    /// There is no external MBC. The game ROM is mapped into the 32 KiB that starts at 0x0000 and
    /// extends to 0x7FFF and there is no cartridge RAM.
    ///
    /// See the Pan Docs [here](https://gbdev.io/pandocs/nombc.html).
    Direct { rom: Box<[u8]> },
    /// The first MBC chip. Supports up to 2 MiB of ROM and 32 KiB of RAM.
    ///
    /// See the Pan Docs [here](https://gbdev.io/pandocs/MBC1.html).
    MBC1(MBC1),
}

impl MemoryBankController {
    /// Reads from the 0x0000..0x8000 window.
    pub fn read_rom(&self, addr: u16) -> u8 {
        match self {
            Self::Direct { rom } => rom.get(addr as usize).copied().unwrap_or(OPEN_BUS),
            Self::MBC1(mbc) => mbc.read_rom(addr),
        }
    }

    /// Writes into the 0x0000..0x8000 window land on the controller's registers.
    pub fn write_rom(&mut self, addr: u16, val: u8) {
        match self {
            Self::Direct { .. } => {}
            Self::MBC1(mbc) => mbc.write_register(addr, val),
        }
    }

    /// Reads from the 0xA000..0xC000 window.
    pub fn read_ram(&self, addr: u16) -> u8 {
        match self {
            Self::Direct { .. } => OPEN_BUS,
            Self::MBC1(mbc) => mbc.read_ram(addr),
        }
    }

    pub fn write_ram(&mut self, addr: u16, val: u8) {
        match self {
            Self::Direct { .. } => {}
            Self::MBC1(mbc) => mbc.write_ram(addr, val),
        }
    }
}

impl fmt::Debug for MemoryBankController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct { rom } => write!(f, "Direct {{ {} bytes }}", rom.len()),
            Self::MBC1(mbc) => write!(f, "{mbc}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rom::test::blank_rom;

    #[test_log::test]
    fn construct_direct() {
        let mut rom = blank_rom("DIRECT", 0x00, 0x00, 0x00);
        rom[0x4000] = 0x42;
        let mut cart = Cartridge::new(rom).unwrap();
        assert_eq!(cart.title(), "DIRECT");
        assert!(matches!(cart.mbc(), MemoryBankController::Direct { .. }));
        assert_eq!(cart.read_rom(0x4000), 0x42);
        cart.write_rom(0x2000, 0x05);
        assert_eq!(cart.read_rom(0x4000), 0x42);
        cart.write_ram(0xA000, 0x12);
        assert_eq!(cart.read_ram(0xA000), OPEN_BUS);
    }

    #[test_log::test]
    fn construct_mbc1() {
        for kind in 0x01..=0x03 {
            let cart = Cartridge::new(blank_rom("", kind, 0x01, 0x02)).unwrap();
            assert!(matches!(cart.mbc(), MemoryBankController::MBC1(_)));
        }
    }

    #[test]
    fn length_mismatch_is_fatal() {
        let mut rom = blank_rom("", 0x00, 0x01, 0x00);
        rom.truncate(0x8000);
        assert_eq!(
            Cartridge::new(rom),
            Err(CartridgeError::RomSizeMismatch {
                declared: 0x10000,
                actual: 0x8000
            })
        );
    }

    #[test]
    fn unknown_type_is_fatal() {
        assert_eq!(
            Cartridge::new(blank_rom("", 0x13, 0x00, 0x00)),
            Err(CartridgeError::UnknownCartridgeType { kind: 0x13 })
        );
    }
}
