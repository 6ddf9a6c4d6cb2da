//! Disassembler spot checks.
//!
//! The disassembler renders through the execute-path decoders, so these
//! also pin the agreement between trace output and executed semantics,
//! including the compressed store/branch slots, which are easy to conflate.

use remu_core::config::Xlen;
use remu_core::isa::disasm::disassemble;

#[test]
fn renders_register_arithmetic() {
    // add a0, a1, a2
    assert_eq!(disassemble(0x00C5_8533, Xlen::Rv64), "add a0, a1, a2");
}

#[test]
fn renders_immediates_signed() {
    // addi a0, zero, -1
    assert_eq!(disassemble(0xFFF0_0513, Xlen::Rv64), "addi a0, zero, -1");
}

#[test]
fn renders_loads_and_stores() {
    // lw a0, 8(sp)
    assert_eq!(disassemble(0x0081_2503, Xlen::Rv64), "lw a0, 8(sp)");
    // sd a0, 0(sp)
    assert_eq!(disassemble(0x00A1_3023, Xlen::Rv64), "sd a0, 0(sp)");
}

#[test]
fn renders_system_instructions() {
    assert_eq!(disassemble(0x0000_0073, Xlen::Rv64), "ecall");
    assert_eq!(disassemble(0x3020_0073, Xlen::Rv64), "mret");
    assert_eq!(disassemble(0x1050_0073, Xlen::Rv64), "wfi");
}

#[test]
fn renders_amo_with_width_suffix() {
    // amoadd.w a0, a2, (a1): funct5=0, rs2=a2, rs1=a1, funct3=010, rd=a0
    let ir = (12u32 << 20) | (11 << 15) | (0b010 << 12) | (10 << 7) | 0b0101111;
    assert_eq!(disassemble(ir, Xlen::Rv64), "amoadd.w a0, a2, (a1)");
}

#[test]
fn unknown_encoding_renders_as_unknown() {
    assert_eq!(disassemble(0xFFFF_FFFF, Xlen::Rv64), "unknown");
}

#[test]
fn compressed_store_and_branch_slots_stay_distinct() {
    // c.sw x10, 8(x11) and c.beqz x10, +8 share neighbouring quadrant-0/1
    // slots; the trace must render them as their own expansions.
    assert_eq!(disassemble(0xC588, Xlen::Rv64), "sw a0, 8(a1)");
    assert_eq!(disassemble(0xC501, Xlen::Rv64), "beq a0, zero, 8");
}

#[test]
fn compressed_forms_render_as_expansions() {
    // c.addi x5, 3
    assert_eq!(disassemble(0x028D, Xlen::Rv64), "addi t0, t0, 3");
    // c.jal +0x20 on RV32 only
    assert_eq!(disassemble(0x2005, Xlen::Rv32), "jal ra, 32");
    assert_eq!(disassemble(0x2005, Xlen::Rv64), "unknown");
}
