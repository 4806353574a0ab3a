use super::*;

/// The five interrupt sources, in priority order. The discriminant is the source's bit in the IE
/// and IF registers.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, derive_more::Display)]
#[display("{_variant}")]
#[repr(u8)]
pub enum Interrupt {
    #[display("VBlank")]
    VBlank = 0,
    #[display("LCD")]
    Lcd = 1,
    #[display("Timer")]
    Timer = 2,
    #[display("Serial")]
    Serial = 3,
    #[display("Joypad")]
    Joypad = 4,
}

impl Interrupt {
    pub const ALL: [Interrupt; 5] = [
        Interrupt::VBlank,
        Interrupt::Lcd,
        Interrupt::Timer,
        Interrupt::Serial,
        Interrupt::Joypad,
    ];

    pub const fn bit(self) -> u8 {
        self as u8
    }

    pub const fn mask(self) -> u8 {
        1 << self.bit()
    }

    /// The address the handler for this interrupt lives at.
    pub const fn vector(self) -> u16 {
        0x40 + 8 * self.bit() as u16
    }

    /// The highest priority interrupt in a mask laid out like IE and IF.
    pub fn highest(pending: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|int| pending & int.mask() != 0)
    }

    /// Dispatching takes five cycles: the fetch cycle, two idle cycles, and two cycles that push
    /// PC. The jump to the vector happens alongside the last push.
    pub(crate) fn execute(self, cpu: &mut Cpu) {
        cpu.schedule_cycle(MCycle::noop());
        super::jump::push_pc(cpu, InternalOp::Restart(self.vector()));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn priority_and_vectors() {
        assert_eq!(Interrupt::highest(0), None);
        assert_eq!(Interrupt::highest(0b1_0100), Some(Interrupt::Timer));
        assert_eq!(Interrupt::highest(0b1_1111), Some(Interrupt::VBlank));
        assert_eq!(Interrupt::highest(0b1_0000), Some(Interrupt::Joypad));
        // Bits above the fifth are ignored
        assert_eq!(Interrupt::highest(0b1110_0000), None);
        let vectors: Vec<_> = Interrupt::ALL.iter().map(|int| int.vector()).collect();
        assert_eq!(vectors, [0x40, 0x48, 0x50, 0x58, 0x60]);
    }
}
