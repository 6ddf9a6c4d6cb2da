//! Atomic Instructions Extension (A).

/// Function code 5 definitions for atomic memory operations.
pub mod funct5;
