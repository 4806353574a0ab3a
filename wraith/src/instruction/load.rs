use super::*;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum LoadOp {
    /// Used for opcodes in 0x40..0x80, except 0x76
    #[display("LD {dest}, {src}")]
    Basic {
        dest: RegOrPointer,
        src: RegOrPointer,
    },
    /// Used for opcodes 0x_1 below 0x40
    #[display("LD {_0}, n16")]
    Direct16(WideReg),
    /// Used for opcodes 0x_6 and 0x_E below 0x40
    #[display("LD {_0}, n8")]
    Direct(RegOrPointer),
    /// Used for opcodes 0x_A below 0x40
    #[display("LD A, {_0}")]
    LoadIntoA(LoadAPointer),
    /// Used for opcodes 0x_2 below 0x40
    #[display("LD {_0}, A")]
    StoreFromA(LoadAPointer),
    /// Opcode: 0x08
    /// Store SP & $FF at address n16 and SP >> 8 at address n16 + 1.
    #[display("LD (a16), SP")]
    StoreSP,
    /// Opcode: 0xF9
    #[display("LD SP, HL")]
    HLIntoSP,
    /// Opcode: 0xF8
    /// Add the signed value e8 to SP and store the result in HL.
    #[display("LD HL, SP + e8")]
    SPIntoHL,
    /// Used for opcodes 0x_1 above 0xC0
    #[display("POP {_0}")]
    Pop(WideRegWithoutSP),
    /// Used for opcodes 0x_5 above 0xC0
    #[display("PUSH {_0}")]
    Push(WideRegWithoutSP),
    /// Opcode: 0xE0
    #[display("LDH (a8), A")]
    StoreHigh,
    /// Opcode: 0xF0
    #[display("LDH A, (a8)")]
    LoadHigh,
    /// Opcode: 0xE2
    #[display("LDH (C), A")]
    StoreHighC,
    /// Opcode: 0xF2
    #[display("LDH A, (C)")]
    LoadHighC,
    /// Opcode: 0xEA
    #[display("LD (a16), A")]
    StoreA,
    /// Opcode: 0xFA
    #[display("LD A, (a16)")]
    LoadA,
}

impl LoadOp {
    pub(crate) fn execute(self, cpu: &mut Cpu) {
        const A: ReadLocation = ReadLocation::Reg(HalfRegister::A);
        const FROM_A: DataLocation = DataLocation::Reg(HalfRegister::A);
        match self {
            LoadOp::Basic {
                dest: RegOrPointer::Reg(dest),
                src: RegOrPointer::Reg(src),
            } => {
                let val = cpu.regs.half(src);
                cpu.regs.set_half(dest, val);
            }
            LoadOp::Basic {
                dest: RegOrPointer::Reg(dest),
                src: RegOrPointer::Pointer,
            } => cpu.schedule_cycle(MCycle::read(PointerReg::HL, dest.into())),
            LoadOp::Basic {
                dest: RegOrPointer::Pointer,
                src: RegOrPointer::Reg(src),
            } => cpu.schedule_cycle(MCycle::write(PointerReg::HL, src.into())),
            // 0x76 is HALT, so this is never decoded
            LoadOp::Basic {
                dest: RegOrPointer::Pointer,
                src: RegOrPointer::Pointer,
            } => {}
            LoadOp::Direct16(reg) => {
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::Z));
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::W).with(InternalOp::WideLoad(reg)));
            }
            LoadOp::Direct(RegOrPointer::Reg(reg)) => {
                cpu.schedule_cycle(MCycle::read_pc(reg.into()))
            }
            LoadOp::Direct(RegOrPointer::Pointer) => {
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::Z));
                cpu.schedule_cycle(MCycle::write(PointerReg::HL, DataLocation::Z));
            }
            LoadOp::LoadIntoA(ptr) => {
                let (addr_bus, idu) = ptr.addr_bus();
                let mut cycle = MCycle::read(addr_bus, A);
                cycle.idu = idu;
                cpu.schedule_cycle(cycle);
            }
            LoadOp::StoreFromA(ptr) => {
                let (addr_bus, idu) = ptr.addr_bus();
                let mut cycle = MCycle::write(addr_bus, FROM_A);
                cycle.idu = idu;
                cpu.schedule_cycle(cycle);
            }
            LoadOp::StoreSP => {
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::Z));
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::W));
                cpu.schedule_cycle(
                    MCycle::write(PointerReg::Ghost, DataLocation::SpLow).with_idu(IduSignal::Inc),
                );
                cpu.schedule_cycle(MCycle::write(PointerReg::Ghost, DataLocation::SpHigh));
            }
            LoadOp::HLIntoSP => cpu.schedule_cycle(MCycle::internal(InternalOp::SpFromHl)),
            LoadOp::SPIntoHL => {
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::Z));
                cpu.schedule_cycle(MCycle::internal(InternalOp::HlFromSp));
            }
            LoadOp::Pop(reg) => {
                let (hi, lo) = reg.split();
                cpu.schedule_cycle(MCycle::read(PointerReg::SP, lo.into()).with_idu(IduSignal::Inc));
                cpu.schedule_cycle(MCycle::read(PointerReg::SP, hi.into()).with_idu(IduSignal::Inc));
            }
            LoadOp::Push(reg) => {
                let (hi, lo) = reg.split();
                cpu.schedule_cycle(MCycle::idu(PointerReg::SP, IduSignal::Dec));
                cpu.schedule_cycle(MCycle::write(PointerReg::SP, hi.into()).with_idu(IduSignal::Dec));
                cpu.schedule_cycle(MCycle::write(PointerReg::SP, lo.into()));
            }
            LoadOp::StoreHigh => {
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::Z));
                cpu.schedule_cycle(MCycle::write(PointerReg::HighZ, FROM_A));
            }
            LoadOp::LoadHigh => {
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::Z));
                cpu.schedule_cycle(MCycle::read(PointerReg::HighZ, A));
            }
            LoadOp::StoreHighC => cpu.schedule_cycle(MCycle::write(PointerReg::HighC, FROM_A)),
            LoadOp::LoadHighC => cpu.schedule_cycle(MCycle::read(PointerReg::HighC, A)),
            LoadOp::StoreA => {
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::Z));
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::W));
                cpu.schedule_cycle(MCycle::write(PointerReg::Ghost, FROM_A));
            }
            LoadOp::LoadA => {
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::Z));
                cpu.schedule_cycle(MCycle::read_pc(ReadLocation::W));
                cpu.schedule_cycle(MCycle::read(PointerReg::Ghost, A));
            }
        }
    }
}
