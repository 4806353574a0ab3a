//! The flag-setting arithmetic shared by the instructions. Everything here is a pure function of
//! its operands and the incoming flags.

use crate::cpu::Flags;
use crate::instruction::AluOp;
use crate::instruction::Shift;

/// Runs a binary op against the accumulator and returns the new accumulator.
pub fn alu(op: AluOp, a: u8, val: u8, flags: &mut Flags) -> u8 {
    match op {
        AluOp::Add => add(a, val, false, flags),
        AluOp::Adc => add(a, val, flags.c, flags),
        AluOp::Sub => sub(a, val, false, flags),
        AluOp::Sbc => sub(a, val, flags.c, flags),
        AluOp::Cp => {
            sub(a, val, false, flags);
            a
        }
        AluOp::And => logical(a & val, true, flags),
        AluOp::Xor => logical(a ^ val, false, flags),
        AluOp::Or => logical(a | val, false, flags),
    }
}

fn add(a: u8, val: u8, carry: bool, flags: &mut Flags) -> u8 {
    let carry = carry as u8;
    let digest = a.wrapping_add(val).wrapping_add(carry);
    *flags = Flags {
        z: digest == 0,
        n: false,
        h: (a & 0xF) + (val & 0xF) + carry > 0xF,
        c: a as u16 + val as u16 + carry as u16 > 0xFF,
    };
    digest
}

fn sub(a: u8, val: u8, carry: bool, flags: &mut Flags) -> u8 {
    let carry = carry as u8;
    let digest = a.wrapping_sub(val).wrapping_sub(carry);
    *flags = Flags {
        z: digest == 0,
        n: true,
        h: (a & 0xF) < (val & 0xF) + carry,
        c: (a as u16) < val as u16 + carry as u16,
    };
    digest
}

fn logical(digest: u8, h: bool, flags: &mut Flags) -> u8 {
    *flags = Flags {
        z: digest == 0,
        n: false,
        h,
        c: false,
    };
    digest
}

/// 8-bit increment. The carry flag is left alone.
pub fn inc(val: u8, flags: &mut Flags) -> u8 {
    let digest = val.wrapping_add(1);
    flags.z = digest == 0;
    flags.n = false;
    flags.h = val & 0xF == 0xF;
    digest
}

/// 8-bit decrement. The carry flag is left alone.
pub fn dec(val: u8, flags: &mut Flags) -> u8 {
    let digest = val.wrapping_sub(1);
    flags.z = digest == 0;
    flags.n = true;
    flags.h = val & 0xF == 0;
    digest
}

/// `ADD HL, rr`. Carries are out of bits 11 and 15 and the zero flag is left alone.
pub fn add_hl(hl: u16, val: u16, flags: &mut Flags) -> u16 {
    flags.n = false;
    flags.h = (hl & 0xFFF) + (val & 0xFFF) > 0xFFF;
    flags.c = hl as u32 + val as u32 > 0xFFFF;
    hl.wrapping_add(val)
}

/// SP plus a signed offset, used by `ADD SP, e8` and `LD HL, SP + e8`. The flags come from the
/// unsigned addition of the low byte.
pub fn add_sp(sp: u16, offset: u8, flags: &mut Flags) -> u16 {
    *flags = Flags {
        z: false,
        n: false,
        h: (sp & 0xF) + (offset as u16 & 0xF) > 0xF,
        c: (sp & 0xFF) + offset as u16 > 0xFF,
    };
    sp.wrapping_add(offset as i8 as u16)
}

/// Adjusts the accumulator back into packed BCD after an addition or subtraction. The carry flag
/// is only ever set here, never cleared.
pub fn daa(a: u8, flags: &mut Flags) -> u8 {
    let mut correction = 0;
    if flags.h || (!flags.n && a & 0xF > 0x9) {
        correction |= 0x06;
    }
    if flags.c || (!flags.n && a > 0x99) {
        correction |= 0x60;
        flags.c = true;
    }
    let digest = if flags.n {
        a.wrapping_sub(correction)
    } else {
        a.wrapping_add(correction)
    };
    flags.z = digest == 0;
    flags.h = false;
    digest
}

/// The prefixed rotates and shifts. The zero flag reflects the result.
pub fn shift(shift: Shift, val: u8, flags: &mut Flags) -> u8 {
    let carry_in = flags.c as u8;
    let (digest, carry) = match shift {
        Shift::Rlc => (val.rotate_left(1), val & 0x80 != 0),
        Shift::Rrc => (val.rotate_right(1), val & 0x01 != 0),
        Shift::Rl => ((val << 1) | carry_in, val & 0x80 != 0),
        Shift::Rr => ((val >> 1) | (carry_in << 7), val & 0x01 != 0),
        Shift::Sla => (val << 1, val & 0x80 != 0),
        Shift::Sra => ((val >> 1) | (val & 0x80), val & 0x01 != 0),
        Shift::Swap => (val.rotate_left(4), false),
        Shift::Srl => (val >> 1, val & 0x01 != 0),
    };
    flags.set_for_byte_shift_op(digest == 0, carry);
    digest
}
