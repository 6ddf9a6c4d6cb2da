//! Shared test infrastructure.

/// Raw 32-bit instruction encoders (R/I/S/B/U/J/AMO/CSR forms).
pub mod encode;
