//! The SM83 core. The CPU is driven one machine cycle at a time; each call to [`Cpu::tick`] runs
//! the next entry in a short queue of pending work. The last entry of every instruction is always
//! a fetch of the next one.

use heapless::Deque;

use crate::error::CpuError;
use crate::instruction::AddrAction;
use crate::instruction::DataLocation;
use crate::instruction::HalfRegister;
use crate::instruction::IduSignal;
use crate::instruction::Instruction;
use crate::instruction::Interrupt;
use crate::instruction::InternalOp;
use crate::instruction::MCycle;
use crate::instruction::MicroOp;
use crate::instruction::PointerReg;
use crate::instruction::ReadLocation;
use crate::instruction::WideReg;
use crate::lookup::OP_LOOKUP;
use crate::lookup::PREFIXED_LOOKUP;
use crate::mem::MemoryLike;

pub(crate) mod alu;

/// No instruction needs more than six cycles after its fetch, including the fetch of the next one.
const QUEUE_LEN: usize = 8;

#[derive(Debug, Default, Hash, Clone, PartialEq, Eq, derive_more::Display)]
#[display(
    "CPU {{ A=0x{:0>2X} F={} B=0x{:0>2X} C=0x{:0>2X} D=0x{:0>2X} E=0x{:0>2X} H=0x{:0>2X} L=0x{:0>2X} SP=0x{:0>4X} PC=0x{:0>4X} }}",
    a,
    f,
    b,
    c,
    d,
    e,
    h,
    l,
    sp,
    pc
)]
pub struct Registers {
    pub a: u8,
    pub f: Flags,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    /// The SP register
    pub sp: u16,
    /// The PC register
    pub pc: u16,
    /// These two registers are "ghost registers". Z is used as the one byte data bus in most
    /// cases; however, there are times where a buffer of a second byte is needed.
    /// No assumptions about the state of these registers should be made between instructions.
    pub z: u8,
    pub w: u8,
}

impl Registers {
    /// The registers as the DMG boot ROM leaves them.
    pub fn post_boot() -> Self {
        Self {
            a: 0x01,
            f: Flags::from(0xB0),
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            h: 0x01,
            l: 0x4D,
            sp: 0xFFFE,
            pc: 0x0100,
            z: 0,
            w: 0,
        }
    }

    pub fn half(&self, reg: HalfRegister) -> u8 {
        match reg {
            HalfRegister::A => self.a,
            HalfRegister::F => self.f.as_byte(),
            HalfRegister::B => self.b,
            HalfRegister::C => self.c,
            HalfRegister::D => self.d,
            HalfRegister::E => self.e,
            HalfRegister::H => self.h,
            HalfRegister::L => self.l,
        }
    }

    /// Writes to F only keep the top nibble.
    pub fn set_half(&mut self, reg: HalfRegister, val: u8) {
        match reg {
            HalfRegister::A => self.a = val,
            HalfRegister::F => self.f = Flags::from(val),
            HalfRegister::B => self.b = val,
            HalfRegister::C => self.c = val,
            HalfRegister::D => self.d = val,
            HalfRegister::E => self.e = val,
            HalfRegister::H => self.h = val,
            HalfRegister::L => self.l = val,
        }
    }

    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.a, self.f.as_byte()])
    }

    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    fn wz(&self) -> u16 {
        u16::from_be_bytes([self.w, self.z])
    }

    pub fn wide(&self, reg: WideReg) -> u16 {
        match reg {
            WideReg::BC => self.bc(),
            WideReg::DE => self.de(),
            WideReg::HL => self.hl(),
            WideReg::SP => self.sp,
        }
    }

    pub fn set_wide(&mut self, reg: WideReg, val: u16) {
        let [hi, lo] = val.to_be_bytes();
        match reg {
            WideReg::BC => (self.b, self.c) = (hi, lo),
            WideReg::DE => (self.d, self.e) = (hi, lo),
            WideReg::HL => (self.h, self.l) = (hi, lo),
            WideReg::SP => self.sp = val,
        }
    }

    /// The address a pointer register puts on the address bus.
    pub fn pointer(&self, reg: PointerReg) -> u16 {
        match reg {
            PointerReg::PC => self.pc,
            PointerReg::SP => self.sp,
            PointerReg::HL => self.hl(),
            PointerReg::BC => self.bc(),
            PointerReg::DE => self.de(),
            PointerReg::Ghost => self.wz(),
            PointerReg::HighZ => 0xFF00 | self.z as u16,
            PointerReg::HighC => 0xFF00 | self.c as u16,
        }
    }

    /// Where the IDU puts its result. The high page pointers are never incremented.
    fn set_pointer(&mut self, reg: PointerReg, val: u16) {
        match reg {
            PointerReg::PC => self.pc = val,
            PointerReg::SP => self.sp = val,
            PointerReg::HL => self.set_wide(WideReg::HL, val),
            PointerReg::BC => self.set_wide(WideReg::BC, val),
            PointerReg::DE => self.set_wide(WideReg::DE, val),
            PointerReg::Ghost => [self.w, self.z] = val.to_be_bytes(),
            PointerReg::HighZ | PointerReg::HighC => {}
        }
    }

    fn store(&mut self, loc: ReadLocation, val: u8) {
        match loc {
            ReadLocation::Z => self.z = val,
            ReadLocation::W => self.w = val,
            ReadLocation::Reg(reg) => self.set_half(reg, val),
        }
    }

    fn load(&self, loc: DataLocation) -> u8 {
        match loc {
            DataLocation::Z => self.z,
            DataLocation::Reg(reg) => self.half(reg),
            DataLocation::PcHigh => (self.pc >> 8) as u8,
            DataLocation::PcLow => self.pc as u8,
            DataLocation::SpHigh => (self.sp >> 8) as u8,
            DataLocation::SpLow => self.sp as u8,
        }
    }

    /// Runs one machine cycle of an instruction.
    pub(crate) fn execute<M: MemoryLike>(&mut self, cycle: MCycle, mem: &mut M) {
        let addr = self.pointer(cycle.addr_bus);
        match cycle.action {
            AddrAction::Read(loc) => {
                let val = mem.read_byte(addr);
                self.store(loc, val);
            }
            AddrAction::Write(loc) => mem.write_byte(addr, self.load(loc)),
            AddrAction::Noop => {}
        }
        if let Some(signal) = cycle.idu {
            let val = match signal {
                IduSignal::Inc => addr.wrapping_add(1),
                IduSignal::Dec => addr.wrapping_sub(1),
            };
            self.set_pointer(cycle.addr_bus, val);
        }
        if let Some(op) = cycle.internal {
            self.internal(op);
        }
    }

    fn internal(&mut self, op: InternalOp) {
        match op {
            InternalOp::Alu(op) => self.a = alu::alu(op, self.a, self.z, &mut self.f),
            InternalOp::Inc => self.z = alu::inc(self.z, &mut self.f),
            InternalOp::Dec => self.z = alu::dec(self.z, &mut self.f),
            InternalOp::Prefixed(op) => {
                if let Some(val) = op.apply(self.z, &mut self.f) {
                    self.z = val;
                }
            }
            InternalOp::WideLoad(reg) => self.set_wide(reg, self.wz()),
            InternalOp::AddHl(reg) => {
                let val = alu::add_hl(self.hl(), self.wide(reg), &mut self.f);
                self.set_wide(WideReg::HL, val);
            }
            InternalOp::SpFromHl => self.sp = self.hl(),
            InternalOp::AddSp => self.sp = alu::add_sp(self.sp, self.z, &mut self.f),
            InternalOp::HlFromSp => {
                let val = alu::add_sp(self.sp, self.z, &mut self.f);
                self.set_wide(WideReg::HL, val);
            }
            InternalOp::Jump => self.pc = self.wz(),
            InternalOp::Restart(vector) => self.pc = vector,
            InternalOp::JumpRelative => self.pc = self.pc.wrapping_add(self.z as i8 as u16),
        }
    }
}

#[derive(Debug, Default, Hash, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum CpuState {
    #[default]
    Running,
    /// Set by HALT. The CPU idles until an enabled interrupt is requested, whether or not IME is
    /// set.
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, derive_more::Display)]
#[display(
    "Flags(Z={} N={} H={} C={})",
    *z as u8,
    *n as u8,
    *h as u8,
    *c as u8
)]
pub struct Flags {
    /// The zero flag
    pub z: bool,
    /// The substraction flag
    pub n: bool,
    /// The half-carry flag
    pub h: bool,
    /// The full carry flag
    pub c: bool,
}

impl From<u8> for Flags {
    fn from(value: u8) -> Self {
        Self {
            z: check_bit(7, value),
            n: check_bit(6, value),
            h: check_bit(5, value),
            c: check_bit(4, value),
        }
    }
}

impl Flags {
    pub fn set_for_byte_shift_op(&mut self, z: bool, c: bool) {
        self.z = z;
        self.n = false;
        self.h = false;
        self.c = c;
    }

    /// The low nibble is always zero.
    pub fn as_byte(&self) -> u8 {
        (self.z as u8) << 7 | (self.n as u8) << 6 | (self.h as u8) << 5 | (self.c as u8) << 4
    }
}

pub(crate) const fn check_bit(bit: u8, src: u8) -> bool {
    let bit = 0x1 << bit;
    (src & bit) == bit
}

#[derive(Debug, Clone, derive_more::Display)]
#[display("{regs} IME={ime} State={state}")]
pub struct Cpu {
    pub regs: Registers,
    /// The interrupt master enable flag
    pub ime: bool,
    /// Set by EI. Promoted to `ime` once the instruction after EI has started.
    pub(crate) ime_pending: bool,
    pub state: CpuState,
    queue: Deque<MicroOp, QUEUE_LEN>,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// A CPU with every register cleared, ready to run a boot ROM from 0x0000.
    pub fn new() -> Self {
        Self::with_registers(Registers::default())
    }

    /// A CPU in the state the boot ROM hands over to the cartridge with.
    pub fn post_boot() -> Self {
        Self::with_registers(Registers::post_boot())
    }

    fn with_registers(regs: Registers) -> Self {
        let mut cpu = Self {
            regs,
            ime: false,
            ime_pending: false,
            state: CpuState::Running,
            queue: Deque::new(),
        };
        cpu.schedule(MicroOp::Fetch);
        cpu
    }

    /// Whether the next tick will start a new instruction (or an interrupt dispatch).
    pub fn at_instruction_boundary(&self) -> bool {
        matches!(self.queue.front(), None | Some(MicroOp::Fetch))
    }

    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    pub(crate) fn schedule(&mut self, op: MicroOp) {
        if self.queue.push_back(op).is_err() {
            unreachable!("more than {QUEUE_LEN} machine cycles were queued for one instruction");
        }
    }

    pub(crate) fn schedule_cycle(&mut self, cycle: MCycle) {
        self.schedule(MicroOp::Cycle(cycle))
    }

    /// Runs a single machine cycle.
    pub fn tick<M: MemoryLike>(&mut self, mem: &mut M) -> Result<(), CpuError> {
        match self.queue.pop_front().unwrap_or(MicroOp::Fetch) {
            MicroOp::Fetch => self.fetch(mem)?,
            MicroOp::FetchPrefixed => self.fetch_prefixed(mem)?,
            MicroOp::Cycle(cycle) => self.regs.execute(cycle, mem),
        }
        Ok(())
    }

    fn fetch<M: MemoryLike>(&mut self, mem: &mut M) -> Result<(), CpuError> {
        let pending = mem.pending_interrupts();
        if self.state == CpuState::Halted {
            if pending == 0 {
                self.schedule(MicroOp::Fetch);
                return Ok(());
            }
            self.state = CpuState::Running;
        }
        if self.ime {
            if let Some(int) = Interrupt::highest(pending) {
                mem.clear_interrupt_req(int);
                self.ime = false;
                self.ime_pending = false;
                Instruction::Interrupt(int).execute(self);
                self.schedule(MicroOp::Fetch);
                return Ok(());
            }
        }
        if self.ime_pending {
            self.ime = true;
            self.ime_pending = false;
        }

        let addr = self.regs.pc;
        let opcode = mem.read_byte(addr);
        self.regs.pc = addr.wrapping_add(1);
        let instr = OP_LOOKUP[opcode as usize].ok_or(CpuError::UnknownOpcode { opcode, addr })?;
        instr.execute(self);
        // The prefixed fetch queues the next fetch itself
        if instr != Instruction::Prefixed {
            self.schedule(MicroOp::Fetch);
        }
        Ok(())
    }

    fn fetch_prefixed<M: MemoryLike>(&mut self, mem: &mut M) -> Result<(), CpuError> {
        let addr = self.regs.pc;
        let opcode = mem.read_byte(addr);
        self.regs.pc = addr.wrapping_add(1);
        let instr = PREFIXED_LOOKUP[opcode as usize]
            .ok_or(CpuError::UnknownPrefixedOpcode { opcode, addr })?;
        instr.execute(self);
        self.schedule(MicroOp::Fetch);
        Ok(())
    }

    /// A snapshot of the registers, the next three bytes at PC, and the instruction they decode
    /// to.
    pub fn trace_line<M: MemoryLike>(&self, mem: &M) -> String {
        let regs = &self.regs;
        let pc = regs.pc;
        let bytes = [0, 1, 2].map(|i| mem.read_byte(pc.wrapping_add(i)));
        let mnemonic = match OP_LOOKUP[bytes[0] as usize] {
            Some(Instruction::Prefixed) => PREFIXED_LOOKUP[bytes[1] as usize]
                .map(|instr| instr.to_string())
                .unwrap_or_default(),
            Some(instr) => instr.to_string(),
            None => format!("ILLEGAL 0x{:0>2X}", bytes[0]),
        };
        format!(
            "AF: ${:0>4X} BC: ${:0>4X} DE: ${:0>4X} HL: ${:0>4X} PC: ${pc:0>4X} SP: ${:0>4X} | {:0>2X} {:0>2X} {:0>2X} {mnemonic}",
            regs.af(),
            regs.bc(),
            regs.de(),
            regs.hl(),
            regs.sp,
            bytes[0],
            bytes[1],
            bytes[2],
        )
    }
}
