use super::*;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum BitOp {
    /// Sets the zero flag if the bit is *not* set
    #[display("BIT {_0}, {_1}")]
    Bit(u8, RegOrPointer),
    #[display("RES {_0}, {_1}")]
    Res(u8, RegOrPointer),
    #[display("SET {_0}, {_1}")]
    Set(u8, RegOrPointer),
}

impl BitOp {
    pub fn target(&self) -> RegOrPointer {
        match self {
            BitOp::Bit(_, target) | BitOp::Res(_, target) | BitOp::Set(_, target) => *target,
        }
    }

    /// Returns the new value of the operand, if the op writes one back.
    pub fn apply(self, val: u8, flags: &mut Flags) -> Option<u8> {
        match self {
            BitOp::Bit(bit, _) => {
                flags.z = val & (1 << bit) == 0;
                flags.n = false;
                flags.h = true;
                None
            }
            BitOp::Res(bit, _) => Some(val & !(1 << bit)),
            BitOp::Set(bit, _) => Some(val | (1 << bit)),
        }
    }
}
