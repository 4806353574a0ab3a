//! Decoded instructions and the machine-cycle vocabulary they are lowered into.
//!
//! Every instruction is executed as a short series of [`MCycle`]s. The first cycle of every
//! instruction is the opcode fetch; whatever work fits into that cycle is done when the opcode is
//! decoded. Every remaining cycle is queued on the CPU and run one per tick.

use derive_more::IsVariant;

use crate::cpu::Cpu;
use crate::cpu::Flags;

mod arithmetic;
mod bit;
mod bit_shift;
mod control;
mod interrupt;
mod jump;
mod load;
mod prefixed;

pub use arithmetic::*;
pub use bit::*;
pub use bit_shift::*;
pub use control::*;
pub use interrupt::*;
pub use jump::*;
pub use load::*;
pub use prefixed::*;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum Instruction {
    #[display("{_0}")]
    Load(LoadOp),
    #[display("{_0}")]
    ControlOp(ControlOp),
    #[display("{_0}")]
    Jump(JumpOp),
    #[display("{_0}")]
    Arithmetic(ArithmeticOp),
    /// Not decoded from an opcode. The CPU dispatches these in place of a fetch.
    #[display("INT {_0}")]
    Interrupt(Interrupt),
    #[display("DAA")]
    Daa,
    /// Set Carry.
    #[display("SCF")]
    Scf,
    /// ComPLement accumulator.
    #[display("CPL")]
    Cpl,
    /// CompLement carry flag.
    #[display("CCF")]
    Ccf,
    /// Disable interupts
    #[display("DI")]
    Di,
    /// Enable interupts, starting after the next instruction
    #[display("EI")]
    Ei,
    /// The RLA, RLCA, RRA, RRCA are, in a sense, bit shift operations. However, they are the only
    /// shifting ops that are not prefixed, so they are classified as misc. Unlike their prefixed
    /// counterparts, they always clear the zero flag.
    #[display("RLA")]
    Rla,
    #[display("RLCA")]
    Rlca,
    #[display("RRA")]
    Rra,
    #[display("RRCA")]
    Rrca,
    /// Load the next byte as an op code for a prefixed instruction
    #[display("PREFIX CB")]
    Prefixed,
}

impl Instruction {
    /// Does the work that happens during the fetch cycle and queues the rest of the instruction's
    /// cycles onto the CPU.
    pub(crate) fn execute(self, cpu: &mut Cpu) {
        let regs = &mut cpu.regs;
        match self {
            Instruction::Load(op) => op.execute(cpu),
            Instruction::ControlOp(op) => op.execute(cpu),
            Instruction::Jump(op) => op.execute(cpu),
            Instruction::Arithmetic(op) => op.execute(cpu),
            Instruction::Interrupt(int) => int.execute(cpu),
            Instruction::Daa => regs.a = crate::cpu::alu::daa(regs.a, &mut regs.f),
            Instruction::Scf => {
                regs.f.n = false;
                regs.f.h = false;
                regs.f.c = true;
            }
            Instruction::Cpl => {
                regs.a = !regs.a;
                regs.f.n = true;
                regs.f.h = true;
            }
            Instruction::Ccf => {
                regs.f.n = false;
                regs.f.h = false;
                regs.f.c = !regs.f.c;
            }
            Instruction::Di => {
                cpu.ime = false;
                cpu.ime_pending = false;
            }
            Instruction::Ei => cpu.ime_pending = true,
            Instruction::Rla => regs.a = accumulator_shift(Shift::Rl, regs.a, &mut regs.f),
            Instruction::Rlca => regs.a = accumulator_shift(Shift::Rlc, regs.a, &mut regs.f),
            Instruction::Rra => regs.a = accumulator_shift(Shift::Rr, regs.a, &mut regs.f),
            Instruction::Rrca => regs.a = accumulator_shift(Shift::Rrc, regs.a, &mut regs.f),
            Instruction::Prefixed => cpu.schedule(MicroOp::FetchPrefixed),
        }
    }
}

fn accumulator_shift(shift: Shift, val: u8, flags: &mut Flags) -> u8 {
    let digest = crate::cpu::alu::shift(shift, val, flags);
    flags.z = false;
    digest
}

/// One entry in the CPU's queue of pending work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroOp {
    /// Check for interrupts, then read, decode, and start the next instruction.
    Fetch,
    /// Read and start the second byte of a `0xCB` prefixed instruction.
    FetchPrefixed,
    Cycle(MCycle),
}

/// Everything the CPU does during a single machine cycle. The bus action happens first, then the
/// IDU, then any internal operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MCycle {
    /// Signals which address will now live on the address bus.
    pub addr_bus: PointerReg,
    /// Signals what to do with the address that now lives on the address bus.
    pub action: AddrAction,
    /// Contains an optional signal to inc or dec the address on the address bus. The result is
    /// written back into the register that supplied the address.
    pub idu: Option<IduSignal>,
    /// Work done by the ALU or the register file once the bus is free again.
    pub internal: Option<InternalOp>,
}

impl MCycle {
    /// A cycle that does nothing observable.
    pub const fn noop() -> Self {
        Self {
            // This is not actually used
            addr_bus: PointerReg::PC,
            action: AddrAction::Noop,
            idu: None,
            internal: None,
        }
    }

    pub const fn read(addr_bus: PointerReg, dest: ReadLocation) -> Self {
        Self {
            addr_bus,
            action: AddrAction::Read(dest),
            idu: None,
            internal: None,
        }
    }

    /// Reads the byte pointed to by PC and moves PC forward.
    pub const fn read_pc(dest: ReadLocation) -> Self {
        Self::read(PointerReg::PC, dest).with_idu(IduSignal::Inc)
    }

    pub const fn write(addr_bus: PointerReg, src: DataLocation) -> Self {
        Self {
            addr_bus,
            action: AddrAction::Write(src),
            idu: None,
            internal: None,
        }
    }

    /// Only uses the IDU, which is how 16-bit increments and decrements are done.
    pub const fn idu(addr_bus: PointerReg, signal: IduSignal) -> Self {
        Self {
            addr_bus,
            action: AddrAction::Noop,
            idu: Some(signal),
            internal: None,
        }
    }

    pub const fn internal(op: InternalOp) -> Self {
        Self::noop().with(op)
    }

    pub const fn with_idu(mut self, signal: IduSignal) -> Self {
        self.idu = Some(signal);
        self
    }

    pub const fn with(mut self, op: InternalOp) -> Self {
        self.internal = Some(op);
        self
    }
}

/// Communicates which 16 bit address is moved from the CPU onto the address bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerReg {
    PC,
    SP,
    HL,
    BC,
    DE,
    /// Use the "ghost registers" WZ as a pointer
    Ghost,
    /// 0xFF00 + Z, used by `LDH` with an immediate
    HighZ,
    /// 0xFF00 + C
    HighC,
}

impl From<WideReg> for PointerReg {
    fn from(value: WideReg) -> Self {
        match value {
            WideReg::BC => PointerReg::BC,
            WideReg::DE => PointerReg::DE,
            WideReg::HL => PointerReg::HL,
            WideReg::SP => PointerReg::SP,
        }
    }
}

/// When the new address is put onto the address bus, either data is read from memory or writen
/// onto the data bus or a register. This communicates that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrAction {
    Read(ReadLocation),
    Write(DataLocation),
    Noop,
}

/// When data is read from memory, it can move to several locations. This signals where to put the
/// data.
///
/// NOTE: "Registers" Z and W are what are referred to (in this crate) as "ghost registers". For
/// single-byte operations that read data in, mess with it, and move it to an 8-bit register, this
/// can just be thought of as a byte living on the data bus. This idea breaks down when moving a
/// 2-byte datum around (e.g. loading a 16 bit literal into a wide register). For this, the "ghost"
/// wide register WZ is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadLocation {
    Z,
    W,
    Reg(HalfRegister),
}

impl From<HalfRegister> for ReadLocation {
    fn from(value: HalfRegister) -> Self {
        Self::Reg(value)
    }
}

/// Where the byte written to memory comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLocation {
    Z,
    Reg(HalfRegister),
    PcHigh,
    PcLow,
    SpLow,
    SpHigh,
}

impl From<HalfRegister> for DataLocation {
    fn from(value: HalfRegister) -> Self {
        Self::Reg(value)
    }
}

/// The IDU (increment/decrement unit) can, well, either increment or decrement the address on the
/// address bus (independently from the ALU) and then put the resulting value back into a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IduSignal {
    Inc,
    Dec,
}

/// Work that happens inside the CPU after the bus action for the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalOp {
    /// A = A op Z
    Alu(AluOp),
    /// Z = Z + 1
    Inc,
    /// Z = Z - 1
    Dec,
    /// Runs a prefixed op on Z
    Prefixed(PrefixedInstruction),
    /// Copies WZ into a wide register
    WideLoad(WideReg),
    /// HL = HL + rr
    AddHl(WideReg),
    SpFromHl,
    /// SP = SP + Z, with Z as a signed offset
    AddSp,
    /// HL = SP + Z, with Z as a signed offset
    HlFromSp,
    /// PC = WZ
    Jump,
    /// PC = the given vector
    Restart(u16),
    /// PC = PC + Z, with Z as a signed offset
    JumpRelative,
}

/// The binary operations the ALU performs against the accumulator.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum AluOp {
    #[display("ADD")]
    Add,
    #[display("ADC")]
    Adc,
    #[display("SUB")]
    Sub,
    #[display("SBC")]
    Sbc,
    #[display("AND")]
    And,
    #[display("XOR")]
    Xor,
    #[display("OR")]
    Or,
    #[display("CP")]
    Cp,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum SomeByte {
    #[display("{_0}")]
    Referenced(RegOrPointer),
    #[display("n8")]
    Direct,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum WideReg {
    #[display("BC")]
    BC,
    #[display("DE")]
    DE,
    #[display("HL")]
    HL,
    #[display("SP")]
    SP,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum WideRegWithoutSP {
    #[display("BC")]
    BC,
    #[display("DE")]
    DE,
    #[display("HL")]
    HL,
    #[display("AF")]
    AF,
}

impl WideRegWithoutSP {
    /// The high and low halves of the pair.
    pub fn split(self) -> (HalfRegister, HalfRegister) {
        match self {
            WideRegWithoutSP::BC => (HalfRegister::B, HalfRegister::C),
            WideRegWithoutSP::DE => (HalfRegister::D, HalfRegister::E),
            WideRegWithoutSP::HL => (HalfRegister::H, HalfRegister::L),
            WideRegWithoutSP::AF => (HalfRegister::A, HalfRegister::F),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum Condition {
    #[display("Z")]
    Zero,
    #[display("NZ")]
    NotZero,
    #[display("C")]
    Carry,
    #[display("NC")]
    NotCarry,
}

impl Condition {
    pub fn passed(&self, flags: &Flags) -> bool {
        match self {
            Condition::Zero => flags.z,
            Condition::NotZero => !flags.z,
            Condition::Carry => flags.c,
            Condition::NotCarry => !flags.c,
        }
    }
}

/// There are special operations for loading into the A register, so it is easier to have a special
/// enum for the unique types of pointers they use.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum LoadAPointer {
    /// Use the BC register
    #[display("(BC)")]
    BC,
    /// Use the DE register
    #[display("(DE)")]
    DE,
    /// Use the HL register and increment after performing the operation
    #[display("(HL+)")]
    Hli,
    /// Use the HL register and decrement after performing the operation
    #[display("(HL-)")]
    Hld,
}

impl LoadAPointer {
    /// The pointer put on the address bus and what the IDU does to it afterwards.
    pub fn addr_bus(self) -> (PointerReg, Option<IduSignal>) {
        match self {
            LoadAPointer::BC => (PointerReg::BC, None),
            LoadAPointer::DE => (PointerReg::DE, None),
            LoadAPointer::Hli => (PointerReg::HL, Some(IduSignal::Inc)),
            LoadAPointer::Hld => (PointerReg::HL, Some(IduSignal::Dec)),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum HalfRegister {
    #[display("A")]
    A,
    #[display("F")]
    F,
    #[display("B")]
    B,
    #[display("C")]
    C,
    #[display("D")]
    D,
    #[display("E")]
    E,
    #[display("H")]
    H,
    #[display("L")]
    L,
}

/// Most 8-bit operands are either a register or the byte that HL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IsVariant, derive_more::Display)]
#[display("{_variant}")]
pub enum RegOrPointer {
    #[display("{_0}")]
    Reg(HalfRegister),
    #[display("(HL)")]
    Pointer,
}

impl From<HalfRegister> for RegOrPointer {
    fn from(value: HalfRegister) -> Self {
        Self::Reg(value)
    }
}
