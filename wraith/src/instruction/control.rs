use super::*;
use crate::cpu::CpuState;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum ControlOp {
    #[display("HALT")]
    Halt,
    #[display("NOP")]
    Noop,
    #[display("STOP")]
    Stop,
}

impl ControlOp {
    pub(crate) fn execute(self, cpu: &mut Cpu) {
        match self {
            ControlOp::Noop => {}
            ControlOp::Halt => cpu.state = CpuState::Halted,
            // There is no joypad to wake the CPU back up, so only the padding byte is skipped
            ControlOp::Stop => cpu.regs.pc = cpu.regs.pc.wrapping_add(1),
        }
    }
}
