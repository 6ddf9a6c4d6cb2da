//! Compressed (C) Extension Constants.
//!
//! Compressed instructions are divided into three quadrants by the lowest
//! two bits; the top three bits (funct3) select the slot within a quadrant.

/// Quadrant 0 (bits 1:0 = 00).
pub const QUADRANT_0: u16 = 0b00;
/// Quadrant 1 (bits 1:0 = 01).
pub const QUADRANT_1: u16 = 0b01;
/// Quadrant 2 (bits 1:0 = 10).
pub const QUADRANT_2: u16 = 0b10;

/// Offset applied to the 3-bit register fields of compressed formats.
///
/// Compressed encodings can only name x8-x15; the 3-bit field is the
/// register index minus 8.
pub const REG_OFFSET: usize = 8;

/// Instructions in Quadrant 0.
pub mod q0 {
    /// Add Immediate, scaled by 4, to Stack Pointer (C.ADDI4SPN).
    pub const C_ADDI4SPN: u16 = 0b000;
    /// Load Word (C.LW).
    pub const C_LW: u16 = 0b010;
    /// Load Double (C.LD, RV64).
    pub const C_LD: u16 = 0b011;
    /// Store Word (C.SW).
    pub const C_SW: u16 = 0b110;
    /// Store Double (C.SD, RV64).
    pub const C_SD: u16 = 0b111;
}

/// Instructions in Quadrant 1.
pub mod q1 {
    /// Add Immediate (C.ADDI).
    pub const C_ADDI: u16 = 0b000;
    /// Jump and Link on RV32; Add Immediate Word on RV64 (C.JAL / C.ADDIW).
    pub const C_JAL_ADDIW: u16 = 0b001;
    /// Load Immediate (C.LI).
    pub const C_LI: u16 = 0b010;
    /// Load Upper Immediate / Add Immediate 16 to SP (C.LUI / C.ADDI16SP).
    pub const C_LUI_ADDI16SP: u16 = 0b011;
    /// Miscellaneous ALU operations (C.SRLI, C.SRAI, C.ANDI, C.SUB, ...).
    pub const C_MISC_ALU: u16 = 0b100;
    /// Jump (C.J).
    pub const C_J: u16 = 0b101;
    /// Branch Equal Zero (C.BEQZ).
    pub const C_BEQZ: u16 = 0b110;
    /// Branch Not Equal Zero (C.BNEZ).
    pub const C_BNEZ: u16 = 0b111;
}

/// Instructions in Quadrant 2.
pub mod q2 {
    /// Shift Left Logical Immediate (C.SLLI).
    pub const C_SLLI: u16 = 0b000;
    /// Load Word from SP (C.LWSP).
    pub const C_LWSP: u16 = 0b010;
    /// Load Double from SP (C.LDSP, RV64).
    pub const C_LDSP: u16 = 0b011;
    /// Miscellaneous ALU / Jump (C.JR, C.MV, C.EBREAK, C.JALR, C.ADD).
    pub const C_MISC_ALU: u16 = 0b100;
    /// Store Word to SP (C.SWSP).
    pub const C_SWSP: u16 = 0b110;
    /// Store Double to SP (C.SDSP, RV64).
    pub const C_SDSP: u16 = 0b111;
}
