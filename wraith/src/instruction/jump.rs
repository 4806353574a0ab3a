use super::*;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum JumpOp {
    /// Op Codes: 0x20, 0x30, 0x28, 0x38
    #[display("JR {_0}, e8")]
    ConditionalRelative(Condition),
    /// Op Code: 0x18
    #[display("JR e8")]
    Relative,
    /// Op Codes: 0xC2, 0xD2, 0xCA, 0xDA
    #[display("JP {_0}, a16")]
    ConditionalAbsolute(Condition),
    /// Op Code: 0xC3
    #[display("JP a16")]
    Absolute,
    /// Op Code: 0xE9
    #[display("JP HL")]
    JumpToHL,
    /// Op Code: 0xCD
    #[display("CALL a16")]
    Call,
    /// Op Codes: 0xC4, 0xD4, 0xCC, 0xDC
    #[display("CALL {_0}, a16")]
    ConditionalCall(Condition),
    /// Op Code: 0xC9
    #[display("RET")]
    Return,
    /// Op Codes: 0xC0, 0xD0, 0xC8, 0xD8
    #[display("RET {_0}")]
    ConditionalReturn(Condition),
    /// Op Code: 0xD9
    /// Return from the subroutine and enable intrupts
    #[display("RETI")]
    ReturnAndEnable,
    /// Op Codes: 0xC7, 0xCF, 0xD7, 0xDF, 0xE7, 0xEF, 0xF7, 0xFF
    #[display("RST 0x{_0:0>2X}")]
    Restart(u8),
}

impl JumpOp {
    pub(crate) fn execute(self, cpu: &mut Cpu) {
        let flags = cpu.regs.f;
        match self {
            JumpOp::Relative => {
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::Z));
                cpu.schedule_cycle(MCycle::internal(InternalOp::JumpRelative));
            }
            JumpOp::ConditionalRelative(cond) => {
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::Z));
                if cond.passed(&flags) {
                    cpu.schedule_cycle(MCycle::internal(InternalOp::JumpRelative));
                }
            }
            JumpOp::Absolute => {
                read_address(cpu);
                cpu.schedule_cycle(MCycle::internal(InternalOp::Jump));
            }
            JumpOp::ConditionalAbsolute(cond) => {
                read_address(cpu);
                if cond.passed(&flags) {
                    cpu.schedule_cycle(MCycle::internal(InternalOp::Jump));
                }
            }
            JumpOp::JumpToHL => cpu.regs.pc = cpu.regs.hl(),
            JumpOp::Call => {
                read_address(cpu);
                push_pc(cpu, InternalOp::Jump);
            }
            JumpOp::ConditionalCall(cond) => {
                read_address(cpu);
                if cond.passed(&flags) {
                    push_pc(cpu, InternalOp::Jump);
                }
            }
            JumpOp::Return => pop_pc(cpu),
            JumpOp::ConditionalReturn(cond) => {
                // Checking the condition takes a cycle of its own
                cpu.schedule_cycle(MCycle::noop());
                if cond.passed(&flags) {
                    pop_pc(cpu);
                }
            }
            JumpOp::ReturnAndEnable => {
                cpu.ime = true;
                cpu.ime_pending = false;
                pop_pc(cpu);
            }
            JumpOp::Restart(vector) => push_pc(cpu, InternalOp::Restart(vector as u16)),
        }
    }
}

/// Reads a little-endian address that follows the opcode into WZ.
fn read_address(cpu: &mut Cpu) {
    cpu.schedule_cycle(MCycle::read_pc(ReadLocation::Z));
    cpu.schedule_cycle(MCycle::read_pc(ReadLocation::W));
}

/// Pushes PC onto the stack, high byte first, then jumps. Used by calls, restarts, and interrupt
/// dispatch.
pub(super) fn push_pc(cpu: &mut Cpu, jump: InternalOp) {
    cpu.schedule_cycle(MCycle::idu(PointerReg::SP, IduSignal::Dec));
    cpu.schedule_cycle(MCycle::write(PointerReg::SP, DataLocation::PcHigh).with_idu(IduSignal::Dec));
    cpu.schedule_cycle(MCycle::write(PointerReg::SP, DataLocation::PcLow).with(jump));
}

fn pop_pc(cpu: &mut Cpu) {
    cpu.schedule_cycle(MCycle::read(PointerReg::SP, ReadLocation::Z).with_idu(IduSignal::Inc));
    cpu.schedule_cycle(MCycle::read(PointerReg::SP, ReadLocation::W).with_idu(IduSignal::Inc));
    cpu.schedule_cycle(MCycle::internal(InternalOp::Jump));
}
