//! Memory Access Types.
//!
//! Classifies memory accesses so the trap machinery can raise the matching
//! page-fault cause (instruction, load, or store/AMO) when a translation
//! fails.

/// Type of memory access operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Instruction fetch.
    Fetch,

    /// Data read (loads, AMO read half).
    Read,

    /// Data write (stores, AMO write half).
    Write,
}
