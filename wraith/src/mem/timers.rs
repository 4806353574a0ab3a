use std::fmt::Display;

/// The divider, counter, modulo, and control registers (0xFF04 through 0xFF07).
///
/// The divider is a free-running 16-bit counter whose top byte is DIV. TIMA does not count on its
/// own; it increments whenever the divider bit selected by TAC (gated by the enable bit) falls
/// from high to low. That is why resetting DIV can bump TIMA. A TAC write is only sampled on the
/// next cycle.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Timer {
    /// ADDR FF04 (the top byte)
    divider: u16,
    /// ADDR FF05
    counter: u8,
    /// ADDR FF06
    /// When the timer counter overflows, it resets to the value in this register.
    modulo: u8,
    /// ADDR FF07
    control: u8,
    /// The last sampled value of the selected divider bit AND the enable bit.
    last_signal: bool,
    reload: Reload,
}

/// When the timer counter overflows, it reads as zero for one cycle before the modulo is loaded
/// and the interrupt is requested. The cycle after that, the counter is still latched to the
/// modulo.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum Reload {
    Idle,
    Scheduled,
    JustReloaded,
}

impl Display for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Timers {{")?;
        writeln!(f, "  DIV: 0x{:0>4X}", self.divider)?;
        writeln!(f, "  TIMA: 0x{:0>2X} ({:?})", self.counter, self.reload)?;
        writeln!(f, "  TMA: 0x{:0>2X}", self.modulo)?;
        writeln!(f, "  TAC: 0x{:0>2X}", self.control)?;
        write!(f, "}}")
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        Self {
            divider: 0,
            counter: 0,
            modulo: 0,
            control: 0,
            last_signal: false,
            reload: Reload::Idle,
        }
    }

    /// The timer as the DMG boot ROM leaves it.
    pub fn post_boot() -> Self {
        Self {
            divider: 0xABCC,
            ..Self::new()
        }
    }

    pub fn divider(&self) -> u16 {
        self.divider
    }

    /// Advances the timer by one machine cycle. Returns `true` if a timer interrupt should be
    /// requested.
    pub fn tick(&mut self) -> bool {
        let mut interrupt = false;
        match self.reload {
            Reload::Scheduled => {
                self.counter = self.modulo;
                self.reload = Reload::JustReloaded;
                interrupt = true;
            }
            Reload::JustReloaded => self.reload = Reload::Idle,
            Reload::Idle => {}
        }
        self.divider = self.divider.wrapping_add(4);
        self.check_edge();
        interrupt
    }

    /// The divider bit that feeds the counter for the current rate.
    fn tap(&self) -> u16 {
        match self.control & 0b11 {
            0b00 => 1 << 9,
            0b01 => 1 << 3,
            0b10 => 1 << 5,
            _ => 1 << 7,
        }
    }

    fn check_edge(&mut self) {
        let enabled = self.control & 0b100 != 0;
        let signal = enabled && self.divider & self.tap() != 0;
        if self.last_signal && !signal {
            self.inc_counter();
        }
        self.last_signal = signal;
    }

    fn inc_counter(&mut self) {
        let (val, overflowed) = self.counter.overflowing_add(1);
        self.counter = val;
        if overflowed {
            self.reload = Reload::Scheduled;
        }
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            0xFF04 => (self.divider >> 8) as u8,
            0xFF05 => self.counter,
            0xFF06 => self.modulo,
            0xFF07 => self.control,
            _ => 0xFF,
        }
    }

    pub fn write_byte(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF04 => {
                self.divider = 0;
                self.check_edge();
            }
            0xFF05 => {
                // A write during the reload cycle loses to the reload
                if self.reload != Reload::JustReloaded {
                    self.counter = val;
                }
                if self.reload == Reload::Scheduled {
                    self.reload = Reload::Idle;
                }
            }
            0xFF06 => {
                self.modulo = val;
                if self.reload == Reload::JustReloaded {
                    self.counter = val;
                }
            }
            0xFF07 => {
                self.control = val;
            }
            _ => {}
        }
    }
}
