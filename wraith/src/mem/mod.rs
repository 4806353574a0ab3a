use tracing::trace;

pub mod mbc;
mod serial;
mod timers;

pub use mbc::Cartridge;
pub use mbc::MemoryBankController;
pub use serial::Serial;
pub use timers::Timer;

use crate::config::BootRom;
use crate::config::MachineConfig;
use crate::instruction::Interrupt;
use crate::ppu::Ppu;

/// The byte read back from anything that is not wired up.
pub const OPEN_BUS: u8 = 0xFF;

/// This trait abstracts over the memory map so the CPU can be driven by a flat block of bytes in
/// tests.
pub trait MemoryLike {
    fn read_byte(&self, addr: u16) -> u8;

    fn write_byte(&mut self, addr: u16, val: u8);

    /// The interrupts that are both requested (IF) and enabled (IE).
    fn pending_interrupts(&self) -> u8 {
        self.read_byte(0xFFFF) & self.read_byte(0xFF0F) & 0x1F
    }

    fn clear_interrupt_req(&mut self, int: Interrupt) {
        let flags = self.read_byte(0xFF0F);
        self.write_byte(0xFF0F, flags & !int.mask());
    }
}

/// The full 16-bit address space. Every access from the CPU goes through here and is routed to
/// whichever component owns the address.
#[derive(Debug, Clone)]
pub struct MemoryMap {
    cart: Cartridge,
    /// Mapped over 0x0000..0x0100 until the game writes to 0xFF50.
    boot: Option<BootRom>,
    ppu: Ppu,
    timer: Timer,
    serial: Serial,
    /// The working RAM, also visible through echo RAM.
    wram: Box<[u8; 0x2000]>,
    /// High RAM
    hr: [u8; 0x7F],
    /// ADDR FF0F
    interrupt_flags: u8,
    /// The interrupt enable register. Bits 0-4 flag where or not certain interrupt handlers can be
    /// called.
    ///  - Bit 0 corresponds to the VBlank interrupt
    ///  - Bit 1 corresponds to the LCD interrupt
    ///  - Bit 2 corresponds to the timer interrupt
    ///  - Bit 3 corresponds to the serial interrupt
    ///  - Bit 4 corresponds to the joypad interrupt
    /// When indexed, this register is at 0xFFFF.
    pub ie: u8,
}

impl MemoryMap {
    /// Wires a cartridge into a fresh address space. Without a boot ROM, the peripherals start in
    /// the state the boot ROM would have left them in.
    pub fn new(cart: Cartridge, config: &MachineConfig) -> Self {
        let (ppu, timer, interrupt_flags) = match config.boot_rom {
            Some(_) => (Ppu::new(config.palette), Timer::new(), 0),
            None => (Ppu::post_boot(config.palette), Timer::post_boot(), 0x01),
        };
        Self {
            cart,
            boot: config.boot_rom.clone(),
            ppu,
            timer,
            serial: Serial::default(),
            wram: Box::new([0; 0x2000]),
            hr: [0; 0x7F],
            interrupt_flags,
            ie: 0,
        }
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cart
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Whether the boot ROM is still mapped over the bottom of the address space.
    pub fn boot_rom_mapped(&self) -> bool {
        self.boot.is_some()
    }

    pub fn request_interrupt(&mut self, int: Interrupt) {
        self.interrupt_flags |= int.mask();
    }

    /// Advances the timer by one machine cycle.
    pub fn tick_timer(&mut self) {
        if self.timer.tick() {
            self.request_interrupt(Interrupt::Timer);
        }
    }

    /// Advances the PPU by one dot.
    pub fn tick_ppu(&mut self) {
        self.interrupt_flags |= self.ppu.tick();
    }

    /// Takes the byte most recently sent over the serial port, if any.
    pub fn take_serial(&mut self) -> Option<u8> {
        self.serial.take_outgoing()
    }

    fn read_io(&self, addr: u16) -> u8 {
        match addr {
            0xFF01 | 0xFF02 => self.serial.read_byte(addr),
            0xFF04..=0xFF07 => self.timer.read_byte(addr),
            0xFF0F => 0xE0 | self.interrupt_flags,
            0xFF40..=0xFF45 | 0xFF47 | 0xFF4A | 0xFF4B => self.ppu.read_register(addr),
            _ => {
                trace!("Read from unmapped register 0x{addr:0>4X}");
                OPEN_BUS
            }
        }
    }

    fn write_io(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF01 | 0xFF02 => {
                if self.serial.write_byte(addr, val) {
                    self.request_interrupt(Interrupt::Serial);
                }
            }
            0xFF04..=0xFF07 => self.timer.write_byte(addr, val),
            0xFF0F => self.interrupt_flags = val & 0x1F,
            0xFF40..=0xFF45 | 0xFF47 | 0xFF4A | 0xFF4B => self.ppu.write_register(addr, val),
            0xFF50 => {
                if val & 0x01 != 0 && self.boot.take().is_some() {
                    trace!("Boot ROM unmapped");
                }
            }
            _ => trace!("Dropped write of 0x{val:0>2X} to unmapped register 0x{addr:0>4X}"),
        }
    }
}

impl MemoryLike for MemoryMap {
    fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            n @ 0x0000..=0x00FF if self.boot.is_some() => {
                self.boot.as_ref().map_or(OPEN_BUS, |boot| boot.read_byte(n))
            }
            n @ 0x0000..=0x7FFF => self.cart.read_rom(n),
            n @ 0x8000..=0x9FFF => self.ppu.read_vram(n),
            n @ 0xA000..=0xBFFF => self.cart.read_ram(n),
            // Work RAM and its echo
            n @ 0xC000..=0xFDFF => self.wram[n as usize & 0x1FFF],
            n @ 0xFE00..=0xFE9F => self.ppu.read_oam(n),
            // NOTE: This region *should not* actually be accessed
            0xFEA0..=0xFEFF => OPEN_BUS,
            n @ 0xFF00..=0xFF7F => self.read_io(n),
            n @ 0xFF80..=0xFFFE => self.hr[(n - 0xFF80) as usize],
            0xFFFF => self.ie,
        }
    }

    fn write_byte(&mut self, addr: u16, val: u8) {
        match addr {
            0x0000..=0x00FF if self.boot.is_some() => {}
            n @ 0x0000..=0x7FFF => self.cart.write_rom(n, val),
            n @ 0x8000..=0x9FFF => self.ppu.write_vram(n, val),
            n @ 0xA000..=0xBFFF => self.cart.write_ram(n, val),
            n @ 0xC000..=0xFDFF => self.wram[n as usize & 0x1FFF] = val,
            n @ 0xFE00..=0xFE9F => self.ppu.write_oam(n, val),
            0xFEA0..=0xFEFF => {}
            n @ 0xFF00..=0xFF7F => self.write_io(n, val),
            n @ 0xFF80..=0xFFFE => self.hr[(n - 0xFF80) as usize] = val,
            0xFFFF => self.ie = val,
        }
    }

    fn pending_interrupts(&self) -> u8 {
        self.ie & self.interrupt_flags & 0x1F
    }

    fn clear_interrupt_req(&mut self, int: Interrupt) {
        self.interrupt_flags &= !int.mask();
    }
}

/// A flat 64 KiB address space, used to test the CPU in isolation.
#[cfg(test)]
impl MemoryLike for Vec<u8> {
    fn read_byte(&self, addr: u16) -> u8 {
        self[addr as usize]
    }

    fn write_byte(&mut self, addr: u16, val: u8) {
        self[addr as usize] = val;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rom::test::blank_rom;

    fn map(boot: Option<BootRom>) -> MemoryMap {
        let mut rom = blank_rom("BUS", 0x00, 0x00, 0x00);
        rom[0x0000] = 0xAA;
        rom[0x0100] = 0xBB;
        let cart = Cartridge::new(rom).unwrap();
        let config = MachineConfig {
            boot_rom: boot,
            ..Default::default()
        };
        MemoryMap::new(cart, &config)
    }

    #[test]
    fn boot_rom_overlay() {
        let boot = BootRom::new(&[0x31; 0x100]).unwrap();
        let mut mem = map(Some(boot));
        assert!(mem.boot_rom_mapped());
        assert_eq!(mem.read_byte(0x0000), 0x31);
        assert_eq!(mem.read_byte(0x00FF), 0x31);
        assert_eq!(mem.read_byte(0x0100), 0xBB);
        mem.write_byte(0x0000, 0x12);
        assert_eq!(mem.read_byte(0x0000), 0x31);

        // Only bit 0 unmaps the overlay
        mem.write_byte(0xFF50, 0xFE);
        assert!(mem.boot_rom_mapped());
        mem.write_byte(0xFF50, 0x01);
        assert!(!mem.boot_rom_mapped());
        assert_eq!(mem.read_byte(0x0000), 0xAA);

        // And it never comes back
        mem.write_byte(0xFF50, 0x00);
        assert_eq!(mem.read_byte(0x0000), 0xAA);
    }

    #[test]
    fn no_boot_rom_starts_unmapped() {
        let mem = map(None);
        assert!(!mem.boot_rom_mapped());
        assert_eq!(mem.read_byte(0x0000), 0xAA);
        assert_eq!(mem.read_byte(0xFF40), 0x91);
        assert_eq!(mem.read_byte(0xFF47), 0xFC);
    }

    #[test]
    fn work_ram_and_echo() {
        let mut mem = map(None);
        mem.write_byte(0xC123, 0x45);
        assert_eq!(mem.read_byte(0xE123), 0x45);
        mem.write_byte(0xFDFF, 0x67);
        assert_eq!(mem.read_byte(0xDDFF), 0x67);
        mem.write_byte(0xFF80, 0x01);
        mem.write_byte(0xFFFE, 0x02);
        assert_eq!(mem.read_byte(0xFF80), 0x01);
        assert_eq!(mem.read_byte(0xFFFE), 0x02);
    }

    #[test]
    fn video_memory_is_routed_to_the_ppu() {
        let mut mem = map(None);
        mem.write_byte(0x8000, 0x12);
        mem.write_byte(0x9FFF, 0x34);
        mem.write_byte(0xFE9F, 0x56);
        assert_eq!(mem.ppu().read_vram(0x0000), 0x12);
        assert_eq!(mem.read_byte(0x9FFF), 0x34);
        assert_eq!(mem.read_byte(0xFE9F), 0x56);
        mem.write_byte(0xFF42, 0x78);
        assert_eq!(mem.ppu().scy, 0x78);
    }

    #[test]
    fn unmapped_addresses_fall_back() {
        let mut mem = map(None);
        for addr in [0xFF00, 0xFF03, 0xFF10, 0xFF46, 0xFF48, 0xFF50, 0xFF7F, 0xFEA0, 0xFEFF] {
            mem.write_byte(addr, 0x00);
            assert_eq!(mem.read_byte(addr), OPEN_BUS, "0x{addr:0>4X}");
        }
        // The direct cartridge has no RAM
        mem.write_byte(0xA000, 0x00);
        assert_eq!(mem.read_byte(0xA000), OPEN_BUS);
    }

    #[test]
    fn interrupt_registers() {
        let mut mem = map(Some(BootRom::new(&[0; 0x100]).unwrap()));
        assert_eq!(mem.read_byte(0xFF0F), 0xE0);
        mem.write_byte(0xFF0F, 0xFF);
        assert_eq!(mem.read_byte(0xFF0F), 0xFF);
        mem.write_byte(0xFFFF, 0b0_0101);
        assert_eq!(mem.pending_interrupts(), 0b0_0101);
        mem.clear_interrupt_req(Interrupt::Timer);
        assert_eq!(mem.read_byte(0xFF0F), 0xFB);
        assert_eq!(mem.pending_interrupts(), 0b0_0001);
    }

    #[test]
    fn serial_transfer_requests_interrupt() {
        let mut mem = map(None);
        mem.write_byte(0xFF0F, 0x00);
        mem.write_byte(0xFF01, b'!');
        mem.write_byte(0xFF02, 0x81);
        assert_eq!(mem.take_serial(), Some(b'!'));
        assert_eq!(mem.read_byte(0xFF0F), 0xE0 | Interrupt::Serial.mask());
    }

    #[test]
    fn timer_interrupt() {
        let mut mem = map(Some(BootRom::new(&[0; 0x100]).unwrap()));
        mem.write_byte(0xFF05, 0xFF);
        mem.write_byte(0xFF07, 0b101);
        (0..5).for_each(|_| mem.tick_timer());
        assert_eq!(mem.read_byte(0xFF0F), 0xE0 | Interrupt::Timer.mask());
    }
}
