//! 32-bit Instruction Decoder.
//!
//! Classifies a 32-bit encoding into a mnemonic and extracts its operands
//! and sign-extended immediate into the uniform `Decoded` record. The major
//! opcode (bits 6-0) selects a family; `funct3`/`funct7`/`funct5` select the
//! instruction within it. The decoder touches no hart state and its only
//! failure mode is the `Op::Error` sentinel.

use crate::isa::instruction::{Decoded, InstructionBits};
use crate::isa::op::Op;
use crate::isa::privileged::opcodes as sys;
use crate::isa::rva::funct5 as a_f5;
use crate::isa::rvi::{funct3, funct7, opcodes};
use crate::isa::rvm;

/// Decodes a 32-bit instruction into the uniform record.
pub fn decode32(ir: u32) -> Decoded {
    let opcode = ir.opcode();

    let imm = match opcode {
        opcodes::OP_IMM | opcodes::OP_LOAD | opcodes::OP_JALR | opcodes::OP_IMM_32 => i_imm(ir),
        opcodes::OP_STORE => s_imm(ir),
        opcodes::OP_BRANCH => b_imm(ir),
        opcodes::OP_LUI | opcodes::OP_AUIPC => u_imm(ir),
        opcodes::OP_JAL => j_imm(ir),
        _ => 0,
    };

    Decoded {
        op: classify(ir),
        rd: ir.rd(),
        rs1: ir.rs1(),
        rs2: ir.rs2(),
        imm,
        csr: ir.csr() as u16,
    }
}

/// Selects the mnemonic for a 32-bit encoding.
fn classify(ir: u32) -> Op {
    let f3 = ir.funct3();
    let f7 = ir.funct7();

    match ir.opcode() {
        opcodes::OP_REG => match f7 {
            funct7::DEFAULT => match f3 {
                funct3::ADD_SUB => Op::Add,
                funct3::SLL => Op::Sll,
                funct3::SLT => Op::Slt,
                funct3::SLTU => Op::Sltu,
                funct3::XOR => Op::Xor,
                funct3::SRL_SRA => Op::Srl,
                funct3::OR => Op::Or,
                funct3::AND => Op::And,
                _ => Op::Error,
            },
            funct7::ALT => match f3 {
                funct3::ADD_SUB => Op::Sub,
                funct3::SRL_SRA => Op::Sra,
                _ => Op::Error,
            },
            rvm::M_EXTENSION => match f3 {
                rvm::funct3::MUL => Op::Mul,
                rvm::funct3::MULH => Op::Mulh,
                rvm::funct3::MULHSU => Op::Mulhsu,
                rvm::funct3::MULHU => Op::Mulhu,
                rvm::funct3::DIV => Op::Div,
                rvm::funct3::DIVU => Op::Divu,
                rvm::funct3::REM => Op::Rem,
                rvm::funct3::REMU => Op::Remu,
                _ => Op::Error,
            },
            _ => Op::Error,
        },

        opcodes::OP_REG_32 => match f7 {
            funct7::DEFAULT => match f3 {
                funct3::ADD_SUB => Op::Addw,
                funct3::SLL => Op::Sllw,
                funct3::SRL_SRA => Op::Srlw,
                _ => Op::Error,
            },
            funct7::ALT => match f3 {
                funct3::ADD_SUB => Op::Subw,
                funct3::SRL_SRA => Op::Sraw,
                _ => Op::Error,
            },
            rvm::M_EXTENSION => match f3 {
                rvm::funct3::MUL => Op::Mulw,
                rvm::funct3::DIV => Op::Divw,
                rvm::funct3::DIVU => Op::Divuw,
                rvm::funct3::REM => Op::Remw,
                rvm::funct3::REMU => Op::Remuw,
                _ => Op::Error,
            },
            _ => Op::Error,
        },

        opcodes::OP_IMM => match f3 {
            funct3::ADD_SUB => Op::Addi,
            funct3::SLT => Op::Slti,
            funct3::SLTU => Op::Sltiu,
            funct3::XOR => Op::Xori,
            funct3::OR => Op::Ori,
            funct3::AND => Op::Andi,
            funct3::SLL => Op::Slli,
            // The shamt of an RV64 shift claims funct7 bit 0, so only the
            // upper six bits discriminate SRLI from SRAI.
            funct3::SRL_SRA => match f7 >> 1 {
                0b000000 => Op::Srli,
                0b010000 => Op::Srai,
                _ => Op::Error,
            },
            _ => Op::Error,
        },

        opcodes::OP_IMM_32 => match f3 {
            funct3::ADD_SUB => Op::Addiw,
            funct3::SLL => Op::Slliw,
            funct3::SRL_SRA => match f7 >> 1 {
                0b000000 => Op::Srliw,
                0b010000 => Op::Sraiw,
                _ => Op::Error,
            },
            _ => Op::Error,
        },

        opcodes::OP_LOAD => match f3 {
            funct3::LB => Op::Lb,
            funct3::LH => Op::Lh,
            funct3::LW => Op::Lw,
            funct3::LD => Op::Ld,
            funct3::LBU => Op::Lbu,
            funct3::LHU => Op::Lhu,
            funct3::LWU => Op::Lwu,
            _ => Op::Error,
        },

        opcodes::OP_STORE => match f3 {
            funct3::SB => Op::Sb,
            funct3::SH => Op::Sh,
            funct3::SW => Op::Sw,
            funct3::SD => Op::Sd,
            _ => Op::Error,
        },

        opcodes::OP_BRANCH => match f3 {
            funct3::BEQ => Op::Beq,
            funct3::BNE => Op::Bne,
            funct3::BLT => Op::Blt,
            funct3::BGE => Op::Bge,
            funct3::BLTU => Op::Bltu,
            funct3::BGEU => Op::Bgeu,
            _ => Op::Error,
        },

        opcodes::OP_JAL => Op::Jal,

        opcodes::OP_JALR => {
            if f3 == 0 {
                Op::Jalr
            } else {
                Op::Error
            }
        }

        opcodes::OP_LUI => Op::Lui,
        opcodes::OP_AUIPC => Op::Auipc,

        opcodes::OP_MISC_MEM => match f3 {
            funct3::FENCE => Op::Fence,
            funct3::FENCE_I => Op::FenceI,
            _ => Op::Error,
        },

        opcodes::OP_SYSTEM => match f3 {
            0 => {
                if f7 == sys::FUNCT7_SFENCE_VMA && ir.rd() == 0 {
                    Op::SfenceVma
                } else {
                    match ir.csr() {
                        sys::IMM_ECALL => Op::Ecall,
                        sys::IMM_EBREAK => Op::Ebreak,
                        sys::IMM_SRET => Op::Sret,
                        sys::IMM_WFI => Op::Wfi,
                        sys::IMM_MRET => Op::Mret,
                        _ => Op::Error,
                    }
                }
            }
            sys::CSRRW => Op::Csrrw,
            sys::CSRRS => Op::Csrrs,
            sys::CSRRC => Op::Csrrc,
            sys::CSRRWI => Op::Csrrwi,
            sys::CSRRSI => Op::Csrrsi,
            sys::CSRRCI => Op::Csrrci,
            _ => Op::Error,
        },

        opcodes::OP_AMO => {
            let d = f3 == funct3::AMO_D;
            if !d && f3 != funct3::AMO_W {
                return Op::Error;
            }
            match ir.funct5() {
                a_f5::AMOADD => {
                    if d {
                        Op::AmoaddD
                    } else {
                        Op::AmoaddW
                    }
                }
                a_f5::AMOSWAP => {
                    if d {
                        Op::AmoswapD
                    } else {
                        Op::AmoswapW
                    }
                }
                a_f5::AMOXOR => {
                    if d {
                        Op::AmoxorD
                    } else {
                        Op::AmoxorW
                    }
                }
                a_f5::AMOOR => {
                    if d {
                        Op::AmoorD
                    } else {
                        Op::AmoorW
                    }
                }
                a_f5::AMOAND => {
                    if d {
                        Op::AmoandD
                    } else {
                        Op::AmoandW
                    }
                }
                a_f5::AMOMIN => {
                    if d {
                        Op::AmominD
                    } else {
                        Op::AmominW
                    }
                }
                a_f5::AMOMAX => {
                    if d {
                        Op::AmomaxD
                    } else {
                        Op::AmomaxW
                    }
                }
                a_f5::AMOMINU => {
                    if d {
                        Op::AmominuD
                    } else {
                        Op::AmominuW
                    }
                }
                a_f5::AMOMAXU => {
                    if d {
                        Op::AmomaxuD
                    } else {
                        Op::AmomaxuW
                    }
                }
                _ => Op::Error,
            }
        }

        _ => Op::Error,
    }
}

/// Decodes the I-type immediate (bits 31-20, sign-extended).
fn i_imm(ir: u32) -> i64 {
    ((ir as i32) >> 20) as i64
}

/// Decodes the S-type immediate (imm[11:5] | imm[4:0], sign-extended).
fn s_imm(ir: u32) -> i64 {
    let low = (ir >> 7) & 0x1F;
    let high = (ir >> 25) & 0x7F;
    sign_extend((high << 5) | low, 12)
}

/// Decodes the B-type immediate (an even 13-bit branch offset).
fn b_imm(ir: u32) -> i64 {
    let bit_11 = (ir >> 7) & 1;
    let bits_4_1 = (ir >> 8) & 0xF;
    let bits_10_5 = (ir >> 25) & 0x3F;
    let bit_12 = (ir >> 31) & 1;

    let combined = (bit_12 << 12) | (bit_11 << 11) | (bits_10_5 << 5) | (bits_4_1 << 1);
    sign_extend(combined, 13)
}

/// Decodes the U-type immediate (bits 31-12, left-aligned).
fn u_imm(ir: u32) -> i64 {
    ((ir & 0xFFFF_F000) as i32) as i64
}

/// Decodes the J-type immediate (an even 21-bit jump offset).
fn j_imm(ir: u32) -> i64 {
    let bits_19_12 = (ir >> 12) & 0xFF;
    let bit_11 = (ir >> 20) & 1;
    let bits_10_1 = (ir >> 21) & 0x3FF;
    let bit_20 = (ir >> 31) & 1;

    let combined = (bit_20 << 20) | (bits_19_12 << 12) | (bit_11 << 11) | (bits_10_1 << 1);
    sign_extend(combined, 21)
}

/// Sign-extends a value of `bits` width to a 64-bit signed integer.
fn sign_extend(val: u32, bits: u32) -> i64 {
    let shift = 32 - bits;
    (((val << shift) as i32) >> shift) as i64
}
