use super::*;

/// The rotates and shifts that live behind the `0xCB` prefix.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum Shift {
    /// Rotate left, bit 7 goes to both carry and bit 0
    #[display("RLC")]
    Rlc,
    /// Rotate right, bit 0 goes to both carry and bit 7
    #[display("RRC")]
    Rrc,
    /// Rotate left through the carry flag
    #[display("RL")]
    Rl,
    /// Rotate right through the carry flag
    #[display("RR")]
    Rr,
    #[display("SLA")]
    Sla,
    /// Shift right, keeping bit 7
    #[display("SRA")]
    Sra,
    #[display("SWAP")]
    Swap,
    #[display("SRL")]
    Srl,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{shift} {target}")]
pub struct BitShiftOp {
    pub shift: Shift,
    pub target: RegOrPointer,
}
