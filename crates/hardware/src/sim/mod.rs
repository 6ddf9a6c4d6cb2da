//! Emulation façade: program loading and the `Emulator` wrapper.

/// The top-level `Emulator` type.
pub mod emulator;

/// ELF and flat-binary loading.
pub mod loader;

pub use emulator::Emulator;
