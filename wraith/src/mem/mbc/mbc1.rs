use std::fmt::Display;

use tracing::info;

use crate::mem::OPEN_BUS;
use crate::mem::mbc::RAM_BANK_SIZE;
use crate::mem::mbc::ROM_BANK_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MBC1 {
    rom: Box<[u8]>,
    ram: Box<[u8]>,
    /// The 5-bit ROM bank register, written via 0x2000..0x4000. Never holds zero.
    bank_index_one: u8,
    /// The 2-bit secondary register, written via 0x4000..0x6000. Supplies ROM address bits 19-20
    /// or the RAM bank, depending on the banking mode.
    bank_index_two: u8,
    /// Determines if RAM can be read from and written to. RAM is enabled when the lower 4 bits of
    /// a write to 0x0000..0x2000 are 0xA.
    ram_enabled: bool,
    banking_mode: BankingMode,
}

impl Display for MBC1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MBC1 {{")?;
        writeln!(f, "  MODE:  {}", self.banking_mode)?;
        writeln!(f, "  RAMG:  {}", self.ram_enabled)?;
        writeln!(f, "  BANK1: 0b{:0>5b}", self.bank_index_one)?;
        writeln!(f, "  BANK2: 0b{:0>2b}", self.bank_index_two)?;
        writeln!(f, "  ROM size: 0x{:X}", self.rom.len())?;
        writeln!(f, "  RAM size: 0x{:X}", self.ram.len())?;
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BankingMode {
    Simple = 0,
    Advanced = 1,
}

impl BankingMode {
    fn from_byte(value: u8) -> Self {
        if (value & 0x1) == 0 {
            Self::Simple
        } else {
            Self::Advanced
        }
    }
}

impl MBC1 {
    /// `rom` must be a power-of-two length, which the header's size code guarantees.
    pub fn new(rom: Vec<u8>, ram_size: usize) -> Self {
        debug_assert!(rom.len().is_power_of_two());
        info!(
            "MBC1 wired to {} ROM banks and {} RAM banks",
            rom.len() / ROM_BANK_SIZE,
            ram_size / RAM_BANK_SIZE,
        );
        Self {
            rom: rom.into_boxed_slice(),
            ram: vec![0; ram_size].into_boxed_slice(),
            bank_index_one: 1,
            bank_index_two: 0,
            ram_enabled: false,
            banking_mode: BankingMode::Simple,
        }
    }

    pub fn rom_bank(&self) -> u8 {
        self.bank_index_one
    }

    pub fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }

    pub fn read_rom(&self, addr: u16) -> u8 {
        self.rom[self.rom_addr(addr)]
    }

    pub fn write_register(&mut self, addr: u16, val: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram_enabled = (val & 0x0F) == 0x0A,
            0x2000..=0x3FFF => self.bank_index_one = (val & 0x1F).max(1),
            0x4000..=0x5FFF => self.bank_index_two = val & 0b11,
            0x6000..=0x7FFF => self.banking_mode = BankingMode::from_byte(val),
            _ => {}
        }
    }

    pub fn read_ram(&self, addr: u16) -> u8 {
        match self.ram_addr(addr) {
            Some(addr) => self.ram[addr],
            None => OPEN_BUS,
        }
    }

    pub fn write_ram(&mut self, addr: u16, val: u8) {
        if let Some(addr) = self.ram_addr(addr) {
            self.ram[addr] = val;
        }
    }

    /// Maps an address in the ROM window onto the physical ROM.
    pub(crate) fn rom_addr(&self, addr: u16) -> usize {
        let addr = addr as usize;
        let upper = (self.bank_index_two as usize) << 19;
        let addr = if addr < 0x4000 {
            match self.banking_mode {
                BankingMode::Simple => addr,
                BankingMode::Advanced => addr | upper,
            }
        } else {
            (addr & 0x3FFF) | ((self.bank_index_one as usize) << 14) | upper
        };
        addr & (self.rom.len() - 1)
    }

    /// Maps an address in the RAM window onto the physical RAM, if RAM is reachable at all.
    pub(crate) fn ram_addr(&self, addr: u16) -> Option<usize> {
        if !self.ram_enabled || self.ram.is_empty() {
            return None;
        }
        let mut addr = addr as usize & 0x1FFF;
        if self.banking_mode == BankingMode::Advanced {
            addr |= (self.bank_index_two as usize) << 13;
        }
        Some(addr & (self.ram.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banked(rom_banks: usize, ram_size: usize) -> MBC1 {
        // Tag every bank with its own index so reads show where they landed
        let mut rom = vec![0; rom_banks * ROM_BANK_SIZE];
        rom.chunks_mut(ROM_BANK_SIZE)
            .enumerate()
            .for_each(|(i, bank)| bank.fill(i as u8));
        MBC1::new(rom, ram_size)
    }

    #[test]
    fn zero_bank_aliases_to_one() {
        let mut mbc = banked(8, 0);
        assert_eq!(mbc.read_rom(0x4000), 1);
        mbc.write_register(0x2000, 0x00);
        assert_eq!(mbc.rom_bank(), 1);
        assert_eq!(mbc.read_rom(0x4000), 1);
        mbc.write_register(0x3FFF, 0x20);
        assert_eq!(mbc.read_rom(0x4000), 1);
        mbc.write_register(0x2000, 0x05);
        assert_eq!(mbc.read_rom(0x7FFF), 5);
        assert_eq!(mbc.read_rom(0x0000), 0);
    }

    #[test]
    fn bank_index_is_masked_to_rom_size() {
        let mut mbc = banked(4, 0);
        mbc.write_register(0x2000, 0x06);
        assert_eq!(mbc.read_rom(0x4000), 2);
    }

    #[test]
    fn secondary_register_selects_upper_rom() {
        // 2 MiB, so bits 19 and 20 are wired
        let mut mbc = banked(128, 0);
        mbc.write_register(0x2000, 0x02);
        mbc.write_register(0x4000, 0x01);
        assert_eq!(mbc.read_rom(0x4000), 0x22);
        // Only the advanced mode remaps the lower window
        assert_eq!(mbc.read_rom(0x0000), 0x00);
        mbc.write_register(0x6000, 0x01);
        assert_eq!(mbc.read_rom(0x0000), 0x20);
    }

    #[test]
    fn ram_is_gated() {
        let mut mbc = banked(2, 0x8000);
        mbc.write_ram(0xA000, 0x12);
        assert_eq!(mbc.read_ram(0xA000), OPEN_BUS);

        mbc.write_register(0x0000, 0x1A);
        assert!(mbc.ram_enabled());
        mbc.write_ram(0xA000, 0x12);
        assert_eq!(mbc.read_ram(0xA000), 0x12);

        // Bank 2 only becomes visible in the advanced mode
        mbc.write_register(0x4000, 0x02);
        assert_eq!(mbc.read_ram(0xA000), 0x12);
        mbc.write_register(0x6000, 0x01);
        assert_eq!(mbc.read_ram(0xA000), 0x00);
        mbc.write_ram(0xA000, 0x34);
        mbc.write_register(0x4000, 0x00);
        assert_eq!(mbc.read_ram(0xA000), 0x12);

        mbc.write_register(0x0000, 0x00);
        assert_eq!(mbc.read_ram(0xA000), OPEN_BUS);
    }

    #[test]
    fn absent_ram_reads_open_bus() {
        let mut mbc = banked(2, 0);
        mbc.write_register(0x0000, 0x0A);
        mbc.write_ram(0xB000, 0x12);
        assert_eq!(mbc.read_ram(0xB000), OPEN_BUS);
    }

    #[test]
    fn addresses_stay_within_every_size() {
        let ram_sizes = [0x2000, 0x8000, 0x10000, 0x20000];
        for rom_code in 0..=8 {
            let rom_size = 0x8000 << rom_code;
            for ram_size in ram_sizes {
                let mut mbc = MBC1::new(vec![0; rom_size], ram_size);
                mbc.write_register(0x0000, 0x0A);
                for (bank_one, bank_two, mode) in [(0x1F, 0x03, 1), (0x00, 0x03, 0), (0x15, 0x01, 1)]
                {
                    mbc.write_register(0x2000, bank_one);
                    mbc.write_register(0x4000, bank_two);
                    mbc.write_register(0x6000, mode);
                    for addr in (0x0000..0x8000).step_by(0x3FF) {
                        assert!(mbc.rom_addr(addr) < rom_size);
                    }
                    assert!(mbc.rom_addr(0x7FFF) < rom_size);
                    for addr in 0xA000..0xC000 {
                        assert!(mbc.ram_addr(addr).unwrap() < ram_size);
                    }
                }
            }
        }
    }
}
