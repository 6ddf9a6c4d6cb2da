//! Privileged Architecture definitions.

/// Trap cause codes for `mcause`/`scause`.
pub mod cause;

/// System instruction encodings and CSR-access function codes.
pub mod opcodes;
