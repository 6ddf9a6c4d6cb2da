//! Base Integer (I) Function Codes (funct7).
//!
//! The `funct7` field (bits 31-25) distinguishes R-type operations that
//! share a `funct3` (ADD vs SUB, SRL vs SRA).

/// Default operation (ADD, SRL, ...).
pub const DEFAULT: u32 = 0b0000000;

/// Alternate operation (SUB, SRA).
pub const ALT: u32 = 0b0100000;
