//! General-Purpose Register File.
//!
//! Thirty-two integer registers of up to 64 bits. Register `x0` is hardwired
//! to zero: reads return 0 and writes are ignored.

/// General-purpose register file.
pub struct Gpr {
    regs: [u64; 32],
}

impl Gpr {
    /// Creates a register file with all registers zeroed.
    pub fn new() -> Self {
        Self { regs: [0; 32] }
    }

    /// Reads register `idx`. Register `x0` always returns 0.
    #[inline(always)]
    pub fn read(&self, idx: usize) -> u64 {
        if idx == 0 { 0 } else { self.regs[idx] }
    }

    /// Writes `val` to register `idx`. Writes to `x0` are ignored.
    #[inline(always)]
    pub fn write(&mut self, idx: usize, val: u64) {
        if idx != 0 {
            self.regs[idx] = val;
        }
    }

    /// Dumps the register file to stdout, two registers per line.
    pub fn dump(&self) {
        for i in (0..32).step_by(2) {
            println!(
                "x{:<2}={:#018x} x{:<2}={:#018x}",
                i,
                self.regs[i],
                i + 1,
                self.regs[i + 1]
            );
        }
    }
}

impl Default for Gpr {
    fn default() -> Self {
        Self::new()
    }
}
