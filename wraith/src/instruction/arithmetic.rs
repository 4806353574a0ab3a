use super::*;
use crate::cpu::alu;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum ArithmeticOp {
    /// Used for opcodes in 0x80..0xC0 and 0x_6/0x_E above 0xC0
    #[display("{_0} A, {_1}")]
    Alu(AluOp, SomeByte),
    /// Used for opcodes 0x_9 below 0x40
    #[display("ADD HL, {_0}")]
    Add16(WideReg),
    /// Opcode: 0xE8
    #[display("ADD SP, e8")]
    AddSP,
    #[display("INC {_0}")]
    Inc(RegOrPointer),
    #[display("INC {_0}")]
    Inc16(WideReg),
    #[display("DEC {_0}")]
    Dec(RegOrPointer),
    #[display("DEC {_0}")]
    Dec16(WideReg),
}

impl ArithmeticOp {
    pub(crate) fn execute(self, cpu: &mut Cpu) {
        let regs = &mut cpu.regs;
        match self {
            ArithmeticOp::Alu(op, SomeByte::Referenced(RegOrPointer::Reg(reg))) => {
                let val = regs.half(reg);
                regs.a = alu::alu(op, regs.a, val, &mut regs.f);
            }
            ArithmeticOp::Alu(op, SomeByte::Referenced(RegOrPointer::Pointer)) => {
                cpu.schedule_cycle(
                    MCycle::read(PointerReg::HL, ReadLocation::Z).with(InternalOp::Alu(op)),
                );
            }
            ArithmeticOp::Alu(op, SomeByte::Direct) => {
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::Z).with(InternalOp::Alu(op)));
            }
            ArithmeticOp::Add16(reg) => cpu.schedule_cycle(MCycle::internal(InternalOp::AddHl(reg))),
            ArithmeticOp::AddSP => {
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::Z));
                cpu.schedule_cycle(MCycle::noop());
                cpu.schedule_cycle(MCycle::internal(InternalOp::AddSp));
            }
            ArithmeticOp::Inc(RegOrPointer::Reg(reg)) => {
                let val = alu::inc(regs.half(reg), &mut regs.f);
                regs.set_half(reg, val);
            }
            ArithmeticOp::Dec(RegOrPointer::Reg(reg)) => {
                let val = alu::dec(regs.half(reg), &mut regs.f);
                regs.set_half(reg, val);
            }
            ArithmeticOp::Inc(RegOrPointer::Pointer) => {
                cpu.schedule_cycle(MCycle::read(PointerReg::HL, ReadLocation::Z).with(InternalOp::Inc));
                cpu.schedule_cycle(MCycle::write(PointerReg::HL, DataLocation::Z));
            }
            ArithmeticOp::Dec(RegOrPointer::Pointer) => {
                cpu.schedule_cycle(MCycle::read(PointerReg::HL, ReadLocation::Z).with(InternalOp::Dec));
                cpu.schedule_cycle(MCycle::write(PointerReg::HL, DataLocation::Z));
            }
            ArithmeticOp::Inc16(reg) => cpu.schedule_cycle(MCycle::idu(reg.into(), IduSignal::Inc)),
            ArithmeticOp::Dec16(reg) => cpu.schedule_cycle(MCycle::idu(reg.into(), IduSignal::Dec)),
        }
    }
}
