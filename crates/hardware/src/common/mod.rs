//! Common utilities and types used throughout the emulator.
//!
//! This module provides fundamental building blocks shared across all
//! components:
//! 1. **Bit Utilities:** Field extraction/insertion and sign extension.
//! 2. **Address Types:** Strong types for virtual and physical addresses.
//! 3. **Constants:** System-wide constants for memory and instructions.
//! 4. **Memory Access:** Classification of accesses (Fetch/Read/Write).
//! 5. **Error Handling:** Guest trap representation and emulator-fatal errors.

/// Address type definitions (physical and virtual addresses).
pub mod addr;

/// Bit field extraction, insertion, and sign extension.
pub mod bits;

/// Common constants used throughout the emulator.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Guest trap and emulator error types.
pub mod error;

pub use addr::{PhysAddr, VirtAddr};
pub use data::AccessType;
pub use error::{EmulatorError, Trap};
