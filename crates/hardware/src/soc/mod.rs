//! System-on-Chip components.
//!
//! The sparse physical memory store and the peripheral block (timer, UART,
//! to-host port, virtio block device). The peripherals never drive the hart:
//! the core polls them after each store and once per step for the timer, so
//! a store's side effects always complete before the next fetch.

/// Memory-mapped peripheral devices.
pub mod devices;

/// Sparse byte-addressable physical memory.
pub mod memory;

pub use devices::Peripherals;
pub use memory::SparseMemory;
