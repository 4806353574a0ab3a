use super::*;
use crate::cpu::alu;

/// Everything that lives behind the `0xCB` prefix. These all operate on a register or, with extra
/// cycles, on the byte HL points at.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum PrefixedInstruction {
    #[display("{_0}")]
    BitShift(BitShiftOp),
    #[display("{_0}")]
    Bit(BitOp),
}

impl PrefixedInstruction {
    pub fn target(&self) -> RegOrPointer {
        match self {
            PrefixedInstruction::BitShift(op) => op.target,
            PrefixedInstruction::Bit(op) => op.target(),
        }
    }

    /// Runs the operation against a byte. Returns what should be written back to the operand.
    pub fn apply(self, val: u8, flags: &mut Flags) -> Option<u8> {
        match self {
            PrefixedInstruction::BitShift(op) => Some(alu::shift(op.shift, val, flags)),
            PrefixedInstruction::Bit(op) => op.apply(val, flags),
        }
    }

    /// Registers are handled during the cycle that fetched the second opcode byte. Working on
    /// (HL) adds a read cycle and, except for `BIT`, a write cycle.
    pub(crate) fn execute(self, cpu: &mut Cpu) {
        match self.target() {
            RegOrPointer::Reg(reg) => {
                let val = cpu.regs.half(reg);
                if let Some(val) = self.apply(val, &mut cpu.regs.f) {
                    cpu.regs.set_half(reg, val);
                }
            }
            RegOrPointer::Pointer => {
                cpu.schedule_cycle(
                    MCycle::read(PointerReg::HL, ReadLocation::Z)
                        .with(InternalOp::Prefixed(self)),
                );
                if !matches!(self, PrefixedInstruction::Bit(BitOp::Bit(..))) {
                    cpu.schedule_cycle(MCycle::write(PointerReg::HL, DataLocation::Z));
                }
            }
        }
    }
}
