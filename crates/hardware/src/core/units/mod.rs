//! Functional units consulted by the execution core.

/// Memory management unit (Sv32/Sv39 page-table walker).
pub mod mmu;
