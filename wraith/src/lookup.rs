//! The two 256-entry opcode tables. Both are built at compile time by decoding every byte.

use crate::instruction::*;

/// Maps every opcode to its instruction. The eleven opcodes the CPU does not implement map to
/// `None`.
pub static OP_LOOKUP: [Option<Instruction>; 256] = primary_table();

/// Maps the byte following `0xCB` to its instruction.
pub static PREFIXED_LOOKUP: [Option<PrefixedInstruction>; 256] = prefixed_table();

const fn primary_table() -> [Option<Instruction>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < table.len() {
        table[i] = decode(i as u8);
        i += 1;
    }
    table
}

const fn prefixed_table() -> [Option<PrefixedInstruction>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < table.len() {
        table[i] = Some(decode_prefixed(i as u8));
        i += 1;
    }
    table
}

/// Register operands are encoded in three bits: B, C, D, E, H, L, (HL), A.
const fn reg_or_pointer(bits: u8) -> RegOrPointer {
    match bits & 0b111 {
        0 => RegOrPointer::Reg(HalfRegister::B),
        1 => RegOrPointer::Reg(HalfRegister::C),
        2 => RegOrPointer::Reg(HalfRegister::D),
        3 => RegOrPointer::Reg(HalfRegister::E),
        4 => RegOrPointer::Reg(HalfRegister::H),
        5 => RegOrPointer::Reg(HalfRegister::L),
        6 => RegOrPointer::Pointer,
        _ => RegOrPointer::Reg(HalfRegister::A),
    }
}

const fn wide(bits: u8) -> WideReg {
    match bits & 0b11 {
        0 => WideReg::BC,
        1 => WideReg::DE,
        2 => WideReg::HL,
        _ => WideReg::SP,
    }
}

/// PUSH and POP swap SP for AF.
const fn wide_with_af(bits: u8) -> WideRegWithoutSP {
    match bits & 0b11 {
        0 => WideRegWithoutSP::BC,
        1 => WideRegWithoutSP::DE,
        2 => WideRegWithoutSP::HL,
        _ => WideRegWithoutSP::AF,
    }
}

const fn a_pointer(bits: u8) -> LoadAPointer {
    match bits & 0b11 {
        0 => LoadAPointer::BC,
        1 => LoadAPointer::DE,
        2 => LoadAPointer::Hli,
        _ => LoadAPointer::Hld,
    }
}

const fn condition(bits: u8) -> Condition {
    match bits & 0b11 {
        0 => Condition::NotZero,
        1 => Condition::Zero,
        2 => Condition::NotCarry,
        _ => Condition::Carry,
    }
}

const fn alu_op(bits: u8) -> AluOp {
    match bits & 0b111 {
        0 => AluOp::Add,
        1 => AluOp::Adc,
        2 => AluOp::Sub,
        3 => AluOp::Sbc,
        4 => AluOp::And,
        5 => AluOp::Xor,
        6 => AluOp::Or,
        _ => AluOp::Cp,
    }
}

const fn shift(bits: u8) -> Shift {
    match bits & 0b111 {
        0 => Shift::Rlc,
        1 => Shift::Rrc,
        2 => Shift::Rl,
        3 => Shift::Rr,
        4 => Shift::Sla,
        5 => Shift::Sra,
        6 => Shift::Swap,
        _ => Shift::Srl,
    }
}

/// Opcodes are laid out as `xx yyy zzz`. Most families are picked out by `x` and `z`, with `y`
/// (or the top two bits of it, `p`) selecting the operand.
const fn decode(op: u8) -> Option<Instruction> {
    let y = (op >> 3) & 0b111;
    let z = op & 0b111;
    let p = y >> 1;
    let instr = match op {
        0x00 => Instruction::ControlOp(ControlOp::Noop),
        0x08 => Instruction::Load(LoadOp::StoreSP),
        0x10 => Instruction::ControlOp(ControlOp::Stop),
        0x18 => Instruction::Jump(JumpOp::Relative),
        0x20 | 0x28 | 0x30 | 0x38 => Instruction::Jump(JumpOp::ConditionalRelative(condition(y))),
        0x01 | 0x11 | 0x21 | 0x31 => Instruction::Load(LoadOp::Direct16(wide(p))),
        0x09 | 0x19 | 0x29 | 0x39 => Instruction::Arithmetic(ArithmeticOp::Add16(wide(p))),
        0x02 | 0x12 | 0x22 | 0x32 => Instruction::Load(LoadOp::StoreFromA(a_pointer(p))),
        0x0A | 0x1A | 0x2A | 0x3A => Instruction::Load(LoadOp::LoadIntoA(a_pointer(p))),
        0x03 | 0x13 | 0x23 | 0x33 => Instruction::Arithmetic(ArithmeticOp::Inc16(wide(p))),
        0x0B | 0x1B | 0x2B | 0x3B => Instruction::Arithmetic(ArithmeticOp::Dec16(wide(p))),
        0x07 => Instruction::Rlca,
        0x0F => Instruction::Rrca,
        0x17 => Instruction::Rla,
        0x1F => Instruction::Rra,
        0x27 => Instruction::Daa,
        0x2F => Instruction::Cpl,
        0x37 => Instruction::Scf,
        0x3F => Instruction::Ccf,
        0x00..=0x3F if z == 4 => Instruction::Arithmetic(ArithmeticOp::Inc(reg_or_pointer(y))),
        0x00..=0x3F if z == 5 => Instruction::Arithmetic(ArithmeticOp::Dec(reg_or_pointer(y))),
        0x00..=0x3F if z == 6 => Instruction::Load(LoadOp::Direct(reg_or_pointer(y))),
        0x76 => Instruction::ControlOp(ControlOp::Halt),
        0x40..=0x7F => Instruction::Load(LoadOp::Basic {
            dest: reg_or_pointer(y),
            src: reg_or_pointer(z),
        }),
        0x80..=0xBF => Instruction::Arithmetic(ArithmeticOp::Alu(
            alu_op(y),
            SomeByte::Referenced(reg_or_pointer(z)),
        )),
        0xC0 | 0xC8 | 0xD0 | 0xD8 => Instruction::Jump(JumpOp::ConditionalReturn(condition(y))),
        0xE0 => Instruction::Load(LoadOp::StoreHigh),
        0xE8 => Instruction::Arithmetic(ArithmeticOp::AddSP),
        0xF0 => Instruction::Load(LoadOp::LoadHigh),
        0xF8 => Instruction::Load(LoadOp::SPIntoHL),
        0xC1 | 0xD1 | 0xE1 | 0xF1 => Instruction::Load(LoadOp::Pop(wide_with_af(p))),
        0xC9 => Instruction::Jump(JumpOp::Return),
        0xD9 => Instruction::Jump(JumpOp::ReturnAndEnable),
        0xE9 => Instruction::Jump(JumpOp::JumpToHL),
        0xF9 => Instruction::Load(LoadOp::HLIntoSP),
        0xC2 | 0xCA | 0xD2 | 0xDA => Instruction::Jump(JumpOp::ConditionalAbsolute(condition(y))),
        0xE2 => Instruction::Load(LoadOp::StoreHighC),
        0xEA => Instruction::Load(LoadOp::StoreA),
        0xF2 => Instruction::Load(LoadOp::LoadHighC),
        0xFA => Instruction::Load(LoadOp::LoadA),
        0xC3 => Instruction::Jump(JumpOp::Absolute),
        0xCB => Instruction::Prefixed,
        0xF3 => Instruction::Di,
        0xFB => Instruction::Ei,
        0xC4 | 0xCC | 0xD4 | 0xDC => Instruction::Jump(JumpOp::ConditionalCall(condition(y))),
        0xC5 | 0xD5 | 0xE5 | 0xF5 => Instruction::Load(LoadOp::Push(wide_with_af(p))),
        0xCD => Instruction::Jump(JumpOp::Call),
        0xC0..=0xFF if z == 6 => {
            Instruction::Arithmetic(ArithmeticOp::Alu(alu_op(y), SomeByte::Direct))
        }
        0xC0..=0xFF if z == 7 => Instruction::Jump(JumpOp::Restart(y * 8)),
        // D3 DB DD E3 E4 EB EC ED F4 FC FD
        _ => return None,
    };
    Some(instr)
}

const fn decode_prefixed(op: u8) -> PrefixedInstruction {
    let target = reg_or_pointer(op);
    let y = (op >> 3) & 0b111;
    match op >> 6 {
        0 => PrefixedInstruction::BitShift(BitShiftOp {
            shift: shift(y),
            target,
        }),
        1 => PrefixedInstruction::Bit(BitOp::Bit(y, target)),
        2 => PrefixedInstruction::Bit(BitOp::Res(y, target)),
        _ => PrefixedInstruction::Bit(BitOp::Set(y, target)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unused_opcodes() {
        let unused: Vec<u8> = (0..=255u8).filter(|op| OP_LOOKUP[*op as usize].is_none()).collect();
        assert_eq!(
            unused,
            [0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD]
        );
        assert!(PREFIXED_LOOKUP.iter().all(Option::is_some));
    }

    #[test]
    fn mnemonics() {
        let show = |op: u8| OP_LOOKUP[op as usize].map(|i| i.to_string());
        assert_eq!(show(0x00).as_deref(), Some("NOP"));
        assert_eq!(show(0x01).as_deref(), Some("LD BC, n16"));
        assert_eq!(show(0x22).as_deref(), Some("LD (HL+), A"));
        assert_eq!(show(0x36).as_deref(), Some("LD (HL), n8"));
        assert_eq!(show(0x41).as_deref(), Some("LD B, C"));
        assert_eq!(show(0x76).as_deref(), Some("HALT"));
        assert_eq!(show(0x7E).as_deref(), Some("LD A, (HL)"));
        assert_eq!(show(0x9F).as_deref(), Some("SBC A, A"));
        assert_eq!(show(0xC3).as_deref(), Some("JP a16"));
        assert_eq!(show(0xD8).as_deref(), Some("RET C"));
        assert_eq!(show(0xEE).as_deref(), Some("XOR A, n8"));
        assert_eq!(show(0xF1).as_deref(), Some("POP AF"));
        assert_eq!(show(0xFF).as_deref(), Some("RST 0x38"));
        assert_eq!(show(0x20).as_deref(), Some("JR NZ, e8"));

        let prefixed = |op: u8| PREFIXED_LOOKUP[op as usize].map(|i| i.to_string());
        assert_eq!(prefixed(0x11).as_deref(), Some("RL C"));
        assert_eq!(prefixed(0x37).as_deref(), Some("SWAP A"));
        assert_eq!(prefixed(0x7E).as_deref(), Some("BIT 7, (HL)"));
        assert_eq!(prefixed(0x80).as_deref(), Some("RES 0, B"));
        assert_eq!(prefixed(0xFF).as_deref(), Some("SET 7, A"));
    }

    #[test]
    fn families_decode_by_bits() {
        for op in 0x40..0x80u8 {
            if op == 0x76 {
                continue;
            }
            assert!(matches!(
                OP_LOOKUP[op as usize],
                Some(Instruction::Load(LoadOp::Basic { .. }))
            ));
        }
        for op in (0xC7..=0xFFu8).step_by(8) {
            assert_eq!(
                OP_LOOKUP[op as usize],
                Some(Instruction::Jump(JumpOp::Restart(op - 0xC7)))
            );
        }
    }
}
