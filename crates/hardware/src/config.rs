//! Configuration for the emulator.
//!
//! A small record that fixes the datapath width and selects which host-side
//! conveniences run alongside the guest. Deserializable from JSON so test
//! harnesses and frontends can supply it; `Config::default()` gives the CLI
//! baseline.

use serde::Deserialize;

/// Width of the integer datapath, fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
pub enum Xlen {
    /// 32-bit datapath (RV32IMAC, Sv32 paging).
    Rv32,
    /// 64-bit datapath (RV64IMAC, Sv39 paging).
    #[default]
    Rv64,
}

impl Xlen {
    /// Returns the register width in bits (32 or 64).
    pub fn bits(self) -> u32 {
        match self {
            Xlen::Rv32 => 32,
            Xlen::Rv64 => 64,
        }
    }

    /// Returns the MXL field encoding (1 for RV32, 2 for RV64).
    pub fn mxl(self) -> u64 {
        match self {
            Xlen::Rv32 => 1,
            Xlen::Rv64 => 2,
        }
    }
}

/// Emulator configuration record.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bits of the integer datapath.
    pub xlen: Xlen,

    /// Treat writes to the `tohost` ports as the riscv-tests exit convention.
    pub host_emulation: bool,

    /// Run the timer, UART, and virtio block device.
    pub peripheral_emulation: bool,

    /// Handle `ECALL` with a host system-call shim instead of trapping.
    pub ecall_emulation: bool,

    /// Print one disassembled line and the register file per executed
    /// instruction.
    pub verbose: bool,

    /// Stop the run when two consecutive page faults report the identical
    /// address. Not architecturally required, but it keeps broken guests
    /// from spinning forever in the test suites.
    pub page_fault_watchdog: bool,

    /// Initial stack pointer handed to the guest, if any.
    pub initial_sp: Option<u64>,
}

impl Config {
    /// Deserializes a configuration from JSON (frontends and test
    /// harnesses supply overrides this way; missing fields default).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            xlen: Xlen::Rv64,
            host_emulation: true,
            peripheral_emulation: false,
            ecall_emulation: false,
            verbose: false,
            page_fault_watchdog: true,
            initial_sp: None,
        }
    }
}
