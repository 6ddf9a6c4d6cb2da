//! M-Extension Function Codes (funct3).
//!
//! Selects the multiply or divide operation when `funct7 == 1` under
//! `OP_REG` or `OP_REG_32`.

/// Multiply (signed x signed) -> lower XLEN bits.
pub const MUL: u32 = 0b000;

/// Multiply High (signed x signed) -> upper XLEN bits.
pub const MULH: u32 = 0b001;

/// Multiply High (signed x unsigned) -> upper XLEN bits.
pub const MULHSU: u32 = 0b010;

/// Multiply High (unsigned x unsigned) -> upper XLEN bits.
pub const MULHU: u32 = 0b011;

/// Divide (signed).
pub const DIV: u32 = 0b100;

/// Divide Unsigned.
pub const DIVU: u32 = 0b101;

/// Remainder (signed).
pub const REM: u32 = 0b110;

/// Remainder Unsigned.
pub const REMU: u32 = 0b111;
