//! Integer datapath operations.
//!
//! Pure functions implementing the arithmetic, logical, shift,
//! multiply/divide, and AMO value semantics for both datapath widths. The
//! width rules:
//!
//! * W variants on XLEN=64 compute modulo 2^32 and sign-extend to 64 bits.
//! * On XLEN=32 every result is sign-extended from bit 31 (the register
//!   file keeps the closure invariant).
//! * Shift amounts mask to 5 bits for RV32/W forms and 6 bits otherwise;
//!   immediate shifts report a warning when mask-off bits are set.
//! * Division by zero yields all-ones quotient and the dividend as
//!   remainder; most-negative / −1 yields most-negative and 0.

use crate::common::bits::sext32;
use crate::config::Xlen;
use crate::isa::op::Op;

/// Register-register arithmetic and shifts (including W variants).
pub fn op_register(xlen: Xlen, op: Op, a: u64, b: u64) -> u64 {
    let w = matches!(op, Op::Addw | Op::Subw | Op::Sllw | Op::Srlw | Op::Sraw);
    let shift_mask = if xlen == Xlen::Rv32 || w { 0x1F } else { 0x3F };
    let sh = (b & shift_mask) as u32;

    let val = match op {
        Op::Add | Op::Addw => a.wrapping_add(b),
        Op::Sub | Op::Subw => a.wrapping_sub(b),
        Op::And => a & b,
        Op::Or => a | b,
        Op::Xor => a ^ b,
        Op::Sll | Op::Sllw => a.wrapping_shl(sh),
        Op::Srl => {
            let v = if xlen == Xlen::Rv32 { a & 0xFFFF_FFFF } else { a };
            v >> sh
        }
        Op::Srlw => (a & 0xFFFF_FFFF) >> sh,
        Op::Sra => ((a as i64) >> sh) as u64,
        Op::Sraw => ((sext32(a) as i64) >> sh) as u64,
        _ => 0,
    };

    if xlen == Xlen::Rv32 || w { sext32(val) } else { val }
}

/// Register-immediate arithmetic (ADDI family; shifts live in `shift_imm`).
pub fn op_immediate(xlen: Xlen, op: Op, a: u64, imm: i64) -> u64 {
    let imm = imm as u64;
    let val = match op {
        Op::Addi | Op::Addiw => a.wrapping_add(imm),
        Op::Andi => a & imm,
        Op::Ori => a | imm,
        Op::Xori => a ^ imm,
        _ => 0,
    };
    if xlen == Xlen::Rv32 || op == Op::Addiw {
        sext32(val)
    } else {
        val
    }
}

/// Immediate shifts. Returns `(result, shamt_warning)`; the warning fires
/// when the shift amount carries mask-off bits under RV32 or a W variant.
pub fn shift_imm(xlen: Xlen, op: Op, a: u64, shamt: u32) -> (u64, bool) {
    let w = matches!(op, Op::Slliw | Op::Srliw | Op::Sraiw);
    let warn = (xlen == Xlen::Rv32 || w) && (shamt >> 5) != 0;
    let sh = shamt & 0x3F;

    let val = match op {
        Op::Slli => {
            let v = a.wrapping_shl(sh);
            if xlen == Xlen::Rv32 { sext32(v) } else { v }
        }
        Op::Slliw => sext32(a.wrapping_shl(sh) & 0xFFFF_FFFF),
        Op::Srli => {
            if xlen == Xlen::Rv32 {
                sext32((a & 0xFFFF_FFFF) >> sh)
            } else {
                a >> sh
            }
        }
        Op::Srliw => sext32((a & 0xFFFF_FFFF) >> sh),
        Op::Srai => ((a as i64) >> sh) as u64,
        Op::Sraiw => ((sext32(a) as i64) >> sh) as u64,
        _ => 0,
    };

    (val, warn)
}

/// Multiply, divide, and remainder (including W variants).
pub fn muldiv(xlen: Xlen, op: Op, a: u64, b: u64) -> u64 {
    match op {
        Op::Mul => a.wrapping_mul(b),
        Op::Mulw => sext32(a.wrapping_mul(b)),

        Op::Mulh => match xlen {
            // A 64-bit multiply suffices when operands fit in 32 bits.
            Xlen::Rv32 => (((a as i64).wrapping_mul(b as i64)) >> 32) as u64,
            Xlen::Rv64 => (((a as i64 as i128).wrapping_mul(b as i64 as i128)) >> 64) as u64,
        },
        Op::Mulhsu => match xlen {
            Xlen::Rv32 => (((a as i64).wrapping_mul((b as u32) as i64)) >> 32) as u64,
            Xlen::Rv64 => (((a as i64 as i128).wrapping_mul(b as i128)) >> 64) as u64,
        },
        Op::Mulhu => match xlen {
            Xlen::Rv32 => ((a & 0xFFFF_FFFF).wrapping_mul(b & 0xFFFF_FFFF)) >> 32,
            Xlen::Rv64 => (((a as u128).wrapping_mul(b as u128)) >> 64) as u64,
        },

        Op::Div => {
            if b == 0 {
                u64::MAX
            } else {
                match xlen {
                    Xlen::Rv32 => (a as i32).wrapping_div(b as i32) as i64 as u64,
                    Xlen::Rv64 => (a as i64).wrapping_div(b as i64) as u64,
                }
            }
        }
        Op::Divu => {
            if b == 0 {
                u64::MAX
            } else {
                match xlen {
                    Xlen::Rv32 => ((a as u32) / (b as u32)) as u64,
                    Xlen::Rv64 => a / b,
                }
            }
        }
        Op::Divw => {
            if b as i32 == 0 {
                u64::MAX
            } else {
                sext32((a as i32).wrapping_div(b as i32) as u32 as u64)
            }
        }
        Op::Divuw => {
            if b as u32 == 0 {
                u64::MAX
            } else {
                sext32(((a as u32) / (b as u32)) as u64)
            }
        }

        Op::Rem => {
            if b == 0 {
                a
            } else {
                match xlen {
                    Xlen::Rv32 => (a as i32).wrapping_rem(b as i32) as i64 as u64,
                    Xlen::Rv64 => (a as i64).wrapping_rem(b as i64) as u64,
                }
            }
        }
        Op::Remu => {
            if b == 0 {
                a
            } else {
                match xlen {
                    Xlen::Rv32 => ((a as u32) % (b as u32)) as u64,
                    Xlen::Rv64 => a % b,
                }
            }
        }
        Op::Remw => {
            if b as i32 == 0 {
                sext32(a)
            } else {
                sext32((a as i32).wrapping_rem(b as i32) as u32 as u64)
            }
        }
        Op::Remuw => {
            if b as u32 == 0 {
                sext32(a)
            } else {
                sext32(((a as u32) % (b as u32)) as u64)
            }
        }

        _ => 0,
    }
}

/// Computes the value an AMO writes back, given the loaded value `t`
/// (already sign-extended for `.W`) and the `rs2` operand.
pub fn amo_value(op: Op, t: u64, rs2: u64) -> u64 {
    match op {
        Op::AmoswapD => rs2,
        Op::AmoswapW => sext32(rs2),
        Op::AmoaddD => t.wrapping_add(rs2),
        Op::AmoaddW => sext32(t.wrapping_add(rs2)),
        Op::AmoandD => t & rs2,
        Op::AmoandW => sext32(t & rs2),
        Op::AmoorD => t | rs2,
        Op::AmoorW => sext32(t | rs2),
        Op::AmoxorD => t ^ rs2,
        Op::AmoxorW => sext32(t ^ rs2),
        Op::AmominD => (t as i64).min(rs2 as i64) as u64,
        Op::AmominW => sext32((t as i32).min(rs2 as i32) as u32 as u64),
        Op::AmomaxD => (t as i64).max(rs2 as i64) as u64,
        Op::AmomaxW => sext32((t as i32).max(rs2 as i32) as u32 as u64),
        Op::AmominuD => t.min(rs2),
        Op::AmominuW => sext32((t as u32).min(rs2 as u32) as u64),
        Op::AmomaxuD => t.max(rs2),
        Op::AmomaxuW => sext32((t as u32).max(rs2 as u32) as u64),
        _ => 0,
    }
}
