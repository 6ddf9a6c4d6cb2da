//! Compressed Instruction Decoding.
//!
//! Maps each `{quadrant, funct3}` slot to the base mnemonic it abbreviates,
//! with the immediate scatter/gather and the +8 offset on 3-bit register
//! fields the C extension prescribes. Results are indistinguishable from the
//! 32-bit form after the execute phase, except that `pc` advances by 2.
//!
//! Illegal forms (`C.ADDI4SPN`/`C.LUI`/`C.ADDI16SP` with zero immediate,
//! reserved slots, the all-zero halfword) decode to `Op::Error`.

use super::constants::{QUADRANT_0, QUADRANT_1, QUADRANT_2, REG_OFFSET, q0, q1, q2};
use crate::config::Xlen;
use crate::isa::abi;
use crate::isa::instruction::Decoded;
use crate::isa::op::Op;

/// Decodes a 16-bit compressed instruction into the uniform record.
///
/// `xlen` disambiguates the one width-dependent slot: quadrant 1, funct3
/// `001` is `C.JAL` on RV32 and `C.ADDIW` on RV64.
pub fn decode16(ir: u16, xlen: Xlen) -> Decoded {
    let quadrant = ir & 0x3;
    let funct3 = (ir >> 13) & 0x7;

    // 3-bit register fields, already offset into x8-x15.
    let rd_c = ((ir >> 2) & 0x7) as usize + REG_OFFSET;
    let rs1_c = ((ir >> 7) & 0x7) as usize + REG_OFFSET;
    // Full 5-bit register fields.
    let rd_full = ((ir >> 7) & 0x1F) as usize;
    let rs2_full = ((ir >> 2) & 0x1F) as usize;

    match quadrant {
        QUADRANT_0 => match funct3 {
            q0::C_ADDI4SPN => {
                let imm = (((ir >> 6) & 1) << 2
                    | ((ir >> 5) & 1) << 3
                    | ((ir >> 11) & 0x3) << 4
                    | ((ir >> 7) & 0xF) << 6) as i64;
                if imm == 0 {
                    return Decoded::of(Op::Error);
                }
                Decoded {
                    op: Op::Addi,
                    rd: rd_c,
                    rs1: abi::REG_SP,
                    rs2: 0,
                    imm,
                    csr: 0,
                }
            }
            q0::C_LW => Decoded {
                op: Op::Lw,
                rd: rd_c,
                rs1: rs1_c,
                rs2: 0,
                imm: lw_imm(ir),
                csr: 0,
            },
            q0::C_LD => Decoded {
                op: Op::Ld,
                rd: rd_c,
                rs1: rs1_c,
                rs2: 0,
                imm: ld_imm(ir),
                csr: 0,
            },
            q0::C_SW => Decoded {
                op: Op::Sw,
                rd: 0,
                rs1: rs1_c,
                rs2: rd_c,
                imm: lw_imm(ir),
                csr: 0,
            },
            q0::C_SD => Decoded {
                op: Op::Sd,
                rd: 0,
                rs1: rs1_c,
                rs2: rd_c,
                imm: ld_imm(ir),
                csr: 0,
            },
            _ => Decoded::of(Op::Error),
        },

        QUADRANT_1 => match funct3 {
            q1::C_ADDI => Decoded {
                op: Op::Addi,
                rd: rd_full,
                rs1: rd_full,
                rs2: 0,
                imm: imm6(ir),
                csr: 0,
            },
            q1::C_JAL_ADDIW => {
                if xlen == Xlen::Rv32 {
                    Decoded {
                        op: Op::Jal,
                        rd: abi::REG_RA,
                        rs1: 0,
                        rs2: 0,
                        imm: j_imm(ir),
                        csr: 0,
                    }
                } else {
                    if rd_full == 0 {
                        return Decoded::of(Op::Error);
                    }
                    Decoded {
                        op: Op::Addiw,
                        rd: rd_full,
                        rs1: rd_full,
                        rs2: 0,
                        imm: imm6(ir),
                        csr: 0,
                    }
                }
            }
            q1::C_LI => Decoded {
                op: Op::Addi,
                rd: rd_full,
                rs1: 0,
                rs2: 0,
                imm: imm6(ir),
                csr: 0,
            },
            q1::C_LUI_ADDI16SP => {
                let w = ir as u32;
                if rd_full == abi::REG_SP {
                    let imm = sign_extend(
                        ((w >> 6) & 1) << 4
                            | ((w >> 2) & 1) << 5
                            | ((w >> 5) & 1) << 6
                            | ((w >> 3) & 3) << 7
                            | ((w >> 12) & 1) << 9,
                        10,
                    );
                    if imm == 0 {
                        return Decoded::of(Op::Error);
                    }
                    Decoded {
                        op: Op::Addi,
                        rd: abi::REG_SP,
                        rs1: abi::REG_SP,
                        rs2: 0,
                        imm,
                        csr: 0,
                    }
                } else {
                    let imm = sign_extend(((w >> 12) & 1) << 17 | ((w >> 2) & 0x1F) << 12, 18);
                    if imm == 0 {
                        return Decoded::of(Op::Error);
                    }
                    Decoded {
                        op: Op::Lui,
                        rd: rd_full,
                        rs1: 0,
                        rs2: 0,
                        imm,
                        csr: 0,
                    }
                }
            }
            q1::C_MISC_ALU => {
                let bit12 = (ir >> 12) & 1;
                let funct2 = (ir >> 10) & 0x3;
                match funct2 {
                    0 | 1 => Decoded {
                        op: if funct2 == 0 { Op::Srli } else { Op::Srai },
                        rd: rs1_c,
                        rs1: rs1_c,
                        rs2: 0,
                        imm: (bit12 << 5 | ((ir >> 2) & 0x1F)) as i64,
                        csr: 0,
                    },
                    2 => Decoded {
                        op: Op::Andi,
                        rd: rs1_c,
                        rs1: rs1_c,
                        rs2: 0,
                        imm: imm6(ir),
                        csr: 0,
                    },
                    _ => {
                        let op = match (bit12, (ir >> 5) & 0x3) {
                            (0, 0) => Op::Sub,
                            (0, 1) => Op::Xor,
                            (0, 2) => Op::Or,
                            (0, 3) => Op::And,
                            (1, 0) => Op::Subw,
                            (1, 1) => Op::Addw,
                            _ => return Decoded::of(Op::Error),
                        };
                        Decoded {
                            op,
                            rd: rs1_c,
                            rs1: rs1_c,
                            rs2: rd_c,
                            imm: 0,
                            csr: 0,
                        }
                    }
                }
            }
            q1::C_J => Decoded {
                op: Op::Jal,
                rd: 0,
                rs1: 0,
                rs2: 0,
                imm: j_imm(ir),
                csr: 0,
            },
            q1::C_BEQZ | q1::C_BNEZ => Decoded {
                op: if funct3 == q1::C_BEQZ { Op::Beq } else { Op::Bne },
                rd: 0,
                rs1: rs1_c,
                rs2: 0,
                imm: b_imm(ir),
                csr: 0,
            },
            _ => Decoded::of(Op::Error),
        },

        QUADRANT_2 => match funct3 {
            q2::C_SLLI => Decoded {
                op: Op::Slli,
                rd: rd_full,
                rs1: rd_full,
                rs2: 0,
                imm: (((ir >> 12) & 1) << 5 | ((ir >> 2) & 0x1F)) as i64,
                csr: 0,
            },
            q2::C_LWSP => {
                if rd_full == 0 {
                    return Decoded::of(Op::Error);
                }
                let imm =
                    (((ir >> 12) & 1) << 5 | ((ir >> 4) & 0x7) << 2 | ((ir >> 2) & 0x3) << 6) as i64;
                Decoded {
                    op: Op::Lw,
                    rd: rd_full,
                    rs1: abi::REG_SP,
                    rs2: 0,
                    imm,
                    csr: 0,
                }
            }
            q2::C_LDSP => {
                if rd_full == 0 {
                    return Decoded::of(Op::Error);
                }
                let imm =
                    (((ir >> 12) & 1) << 5 | ((ir >> 5) & 0x3) << 3 | ((ir >> 2) & 0x7) << 6) as i64;
                Decoded {
                    op: Op::Ld,
                    rd: rd_full,
                    rs1: abi::REG_SP,
                    rs2: 0,
                    imm,
                    csr: 0,
                }
            }
            q2::C_MISC_ALU => {
                let bit12 = (ir >> 12) & 1;
                if bit12 == 0 {
                    if rs2_full == 0 {
                        // C.JR; rs1 == 0 is reserved.
                        if rd_full == 0 {
                            return Decoded::of(Op::Error);
                        }
                        Decoded {
                            op: Op::Jalr,
                            rd: 0,
                            rs1: rd_full,
                            rs2: 0,
                            imm: 0,
                            csr: 0,
                        }
                    } else {
                        // C.MV expands to ADD rd, x0, rs2.
                        Decoded {
                            op: Op::Add,
                            rd: rd_full,
                            rs1: 0,
                            rs2: rs2_full,
                            imm: 0,
                            csr: 0,
                        }
                    }
                } else if rs2_full == 0 {
                    if rd_full == 0 {
                        Decoded::of(Op::Ebreak)
                    } else {
                        // C.JALR
                        Decoded {
                            op: Op::Jalr,
                            rd: abi::REG_RA,
                            rs1: rd_full,
                            rs2: 0,
                            imm: 0,
                            csr: 0,
                        }
                    }
                } else {
                    if rd_full == 0 {
                        return Decoded::of(Op::Error);
                    }
                    // C.ADD
                    Decoded {
                        op: Op::Add,
                        rd: rd_full,
                        rs1: rd_full,
                        rs2: rs2_full,
                        imm: 0,
                        csr: 0,
                    }
                }
            }
            q2::C_SWSP => Decoded {
                op: Op::Sw,
                rd: 0,
                rs1: abi::REG_SP,
                rs2: rs2_full,
                imm: (((ir >> 9) & 0xF) << 2 | ((ir >> 7) & 0x3) << 6) as i64,
                csr: 0,
            },
            q2::C_SDSP => Decoded {
                op: Op::Sd,
                rd: 0,
                rs1: abi::REG_SP,
                rs2: rs2_full,
                imm: (((ir >> 10) & 0x7) << 3 | ((ir >> 7) & 0x7) << 6) as i64,
                csr: 0,
            },
            _ => Decoded::of(Op::Error),
        },

        _ => Decoded::of(Op::Error),
    }
}

/// The 6-bit sign-extended immediate of C.ADDI/C.LI/C.ANDI/C.ADDIW.
fn imm6(ir: u16) -> i64 {
    let w = ir as u32;
    sign_extend(((w >> 12) & 1) << 5 | ((w >> 2) & 0x1F), 6)
}

/// The scaled offset of C.LW/C.SW (word-aligned, zero-extended).
fn lw_imm(ir: u16) -> i64 {
    let w = ir as u32;
    (((w >> 6) & 1) << 2 | ((w >> 10) & 0x7) << 3 | ((w >> 5) & 1) << 6) as i64
}

/// The scaled offset of C.LD/C.SD (doubleword-aligned, zero-extended).
fn ld_imm(ir: u16) -> i64 {
    let w = ir as u32;
    (((w >> 10) & 0x7) << 3 | ((w >> 5) & 0x3) << 6) as i64
}

/// The 12-bit sign-extended jump offset of C.J/C.JAL.
fn j_imm(ir: u16) -> i64 {
    let w = ir as u32;
    sign_extend(
        ((w >> 3) & 0x7) << 1
            | ((w >> 11) & 1) << 4
            | ((w >> 2) & 1) << 5
            | ((w >> 7) & 1) << 6
            | ((w >> 6) & 1) << 7
            | ((w >> 9) & 3) << 8
            | ((w >> 8) & 1) << 10
            | ((w >> 12) & 1) << 11,
        12,
    )
}

/// The 9-bit sign-extended branch offset of C.BEQZ/C.BNEZ.
fn b_imm(ir: u16) -> i64 {
    let w = ir as u32;
    sign_extend(
        ((w >> 3) & 0x3) << 1
            | ((w >> 10) & 0x3) << 3
            | ((w >> 2) & 1) << 5
            | ((w >> 5) & 0x3) << 6
            | ((w >> 12) & 1) << 8,
        9,
    )
}

/// Sign-extends the low `bits` of a scatter-gathered immediate to `i64`.
fn sign_extend(val: u32, bits: u32) -> i64 {
    let shift = 32 - bits;
    ((val << shift) as i32 >> shift) as i64
}
