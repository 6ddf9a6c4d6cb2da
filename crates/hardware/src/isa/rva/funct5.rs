//! Atomic Extension (A) Function Codes (funct5).
//!
//! The `funct5` field (bits 31-27) selects the atomic operation; bits 26
//! and 25 are the `aq`/`rl` ordering hints, accepted and ignored on a
//! single-hart model.

/// Atomic Add.
pub const AMOADD: u32 = 0b00000;

/// Atomic Swap.
pub const AMOSWAP: u32 = 0b00001;

/// Atomic XOR.
pub const AMOXOR: u32 = 0b00100;

/// Atomic OR.
pub const AMOOR: u32 = 0b01000;

/// Atomic AND.
pub const AMOAND: u32 = 0b01100;

/// Atomic Minimum (signed).
pub const AMOMIN: u32 = 0b10000;

/// Atomic Maximum (signed).
pub const AMOMAX: u32 = 0b10100;

/// Atomic Minimum (unsigned).
pub const AMOMINU: u32 = 0b11000;

/// Atomic Maximum (unsigned).
pub const AMOMAXU: u32 = 0b11100;
