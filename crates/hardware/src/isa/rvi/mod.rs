//! Base Integer Instruction Set (I).
//!
//! Major opcodes and the funct3/funct7 minor codes for the base integer
//! instructions, shared by RV32I and RV64I.

/// Function code 3 definitions for base integer operations.
pub mod funct3;

/// Function code 7 definitions for base integer operations.
pub mod funct7;

/// Base integer instruction set opcodes.
pub mod opcodes;
