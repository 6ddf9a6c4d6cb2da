//! Instruction Disassembler.
//!
//! A pure function from an encoded word (and the datapath width) to a
//! printable string, used in verbose-trace mode and test diagnostics. It
//! renders through the same decoders the execute phase uses, so the trace
//! can never disagree with what the core actually runs; compressed forms
//! print as their expanded mnemonic.

use crate::config::Xlen;
use crate::isa::decode::decode32;
use crate::isa::instruction::Decoded;
use crate::isa::op::Op;
use crate::isa::rvc::decode16;

/// ABI register names for x0-x31.
const REG_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Returns the ABI name for an integer register index.
#[inline]
fn xreg(idx: usize) -> &'static str {
    REG_NAMES.get(idx).copied().unwrap_or("x??")
}

/// Disassembles an encoded word (16-bit or 32-bit) into a printable string.
pub fn disassemble(ir: u32, xlen: Xlen) -> String {
    let d = if ir & 0b11 != 0b11 {
        decode16(ir as u16, xlen)
    } else {
        decode32(ir)
    };
    render(&d)
}

/// Renders a decoded record.
fn render(d: &Decoded) -> String {
    let mn = mnemonic(d.op);
    match d.op {
        Op::Error => "unknown".to_string(),

        Op::Add
        | Op::Sub
        | Op::Sll
        | Op::Slt
        | Op::Sltu
        | Op::Xor
        | Op::Srl
        | Op::Sra
        | Op::Or
        | Op::And
        | Op::Addw
        | Op::Subw
        | Op::Sllw
        | Op::Srlw
        | Op::Sraw
        | Op::Mul
        | Op::Mulh
        | Op::Mulhsu
        | Op::Mulhu
        | Op::Div
        | Op::Divu
        | Op::Rem
        | Op::Remu
        | Op::Mulw
        | Op::Divw
        | Op::Divuw
        | Op::Remw
        | Op::Remuw => {
            format!("{mn} {}, {}, {}", xreg(d.rd), xreg(d.rs1), xreg(d.rs2))
        }

        Op::Addi | Op::Slti | Op::Sltiu | Op::Xori | Op::Ori | Op::Andi | Op::Addiw => {
            format!("{mn} {}, {}, {}", xreg(d.rd), xreg(d.rs1), d.imm)
        }

        Op::Slli | Op::Srli | Op::Srai | Op::Slliw | Op::Srliw | Op::Sraiw => {
            format!("{mn} {}, {}, {}", xreg(d.rd), xreg(d.rs1), d.imm & 0x3F)
        }

        Op::Lb | Op::Lh | Op::Lw | Op::Ld | Op::Lbu | Op::Lhu | Op::Lwu => {
            format!("{mn} {}, {}({})", xreg(d.rd), d.imm, xreg(d.rs1))
        }

        Op::Sb | Op::Sh | Op::Sw | Op::Sd => {
            format!("{mn} {}, {}({})", xreg(d.rs2), d.imm, xreg(d.rs1))
        }

        Op::Beq | Op::Bne | Op::Blt | Op::Bge | Op::Bltu | Op::Bgeu => {
            format!("{mn} {}, {}, {}", xreg(d.rs1), xreg(d.rs2), d.imm)
        }

        Op::Jal => format!("{mn} {}, {}", xreg(d.rd), d.imm),
        Op::Jalr => format!("{mn} {}, {}({})", xreg(d.rd), d.imm, xreg(d.rs1)),

        Op::Lui | Op::Auipc => format!("{mn} {}, {:#x}", xreg(d.rd), (d.imm as u64) >> 12),

        Op::Csrrw | Op::Csrrs | Op::Csrrc => {
            format!("{mn} {}, {:#x}, {}", xreg(d.rd), d.csr, xreg(d.rs1))
        }
        Op::Csrrwi | Op::Csrrsi | Op::Csrrci => {
            format!("{mn} {}, {:#x}, {}", xreg(d.rd), d.csr, d.rs1)
        }

        op if op.is_amo() => {
            format!("{mn} {}, {}, ({})", xreg(d.rd), xreg(d.rs2), xreg(d.rs1))
        }

        // Operand-free system instructions and fences.
        _ => mn.to_string(),
    }
}

/// Returns the printable mnemonic for an op.
fn mnemonic(op: Op) -> &'static str {
    match op {
        Op::Error => "unknown",
        Op::Add => "add",
        Op::Sub => "sub",
        Op::Sll => "sll",
        Op::Slt => "slt",
        Op::Sltu => "sltu",
        Op::Xor => "xor",
        Op::Srl => "srl",
        Op::Sra => "sra",
        Op::Or => "or",
        Op::And => "and",
        Op::Addw => "addw",
        Op::Subw => "subw",
        Op::Sllw => "sllw",
        Op::Srlw => "srlw",
        Op::Sraw => "sraw",
        Op::Addi => "addi",
        Op::Slti => "slti",
        Op::Sltiu => "sltiu",
        Op::Xori => "xori",
        Op::Ori => "ori",
        Op::Andi => "andi",
        Op::Slli => "slli",
        Op::Srli => "srli",
        Op::Srai => "srai",
        Op::Addiw => "addiw",
        Op::Slliw => "slliw",
        Op::Srliw => "srliw",
        Op::Sraiw => "sraiw",
        Op::Lb => "lb",
        Op::Lh => "lh",
        Op::Lw => "lw",
        Op::Ld => "ld",
        Op::Lbu => "lbu",
        Op::Lhu => "lhu",
        Op::Lwu => "lwu",
        Op::Sb => "sb",
        Op::Sh => "sh",
        Op::Sw => "sw",
        Op::Sd => "sd",
        Op::Beq => "beq",
        Op::Bne => "bne",
        Op::Blt => "blt",
        Op::Bge => "bge",
        Op::Bltu => "bltu",
        Op::Bgeu => "bgeu",
        Op::Jal => "jal",
        Op::Jalr => "jalr",
        Op::Lui => "lui",
        Op::Auipc => "auipc",
        Op::Fence => "fence",
        Op::FenceI => "fence.i",
        Op::Ecall => "ecall",
        Op::Ebreak => "ebreak",
        Op::Mret => "mret",
        Op::Sret => "sret",
        Op::Wfi => "wfi",
        Op::SfenceVma => "sfence.vma",
        Op::Csrrw => "csrrw",
        Op::Csrrs => "csrrs",
        Op::Csrrc => "csrrc",
        Op::Csrrwi => "csrrwi",
        Op::Csrrsi => "csrrsi",
        Op::Csrrci => "csrrci",
        Op::Mul => "mul",
        Op::Mulh => "mulh",
        Op::Mulhsu => "mulhsu",
        Op::Mulhu => "mulhu",
        Op::Div => "div",
        Op::Divu => "divu",
        Op::Rem => "rem",
        Op::Remu => "remu",
        Op::Mulw => "mulw",
        Op::Divw => "divw",
        Op::Divuw => "divuw",
        Op::Remw => "remw",
        Op::Remuw => "remuw",
        Op::AmoswapW => "amoswap.w",
        Op::AmoaddW => "amoadd.w",
        Op::AmoxorW => "amoxor.w",
        Op::AmoandW => "amoand.w",
        Op::AmoorW => "amoor.w",
        Op::AmominW => "amomin.w",
        Op::AmomaxW => "amomax.w",
        Op::AmominuW => "amominu.w",
        Op::AmomaxuW => "amomaxu.w",
        Op::AmoswapD => "amoswap.d",
        Op::AmoaddD => "amoadd.d",
        Op::AmoxorD => "amoxor.d",
        Op::AmoandD => "amoand.d",
        Op::AmoorD => "amoor.d",
        Op::AmominD => "amomin.d",
        Op::AmomaxD => "amomax.d",
        Op::AmominuD => "amominu.d",
        Op::AmomaxuD => "amomaxu.d",
    }
}
