//! Host-Target Interface (to-host ports).
//!
//! Implements the riscv-tests termination convention over two memory-mapped
//! ports. A store to either port is latched; at the bottom of the step the
//! payload is read back from memory and interpreted:
//!
//! * payload bit 0 set: "exit with status `payload >> 1`";
//! * payload bit 0 clear on device 0: a host system-call request, which
//!   this emulator only logs;
//! * any other device/command pair on port 0 ends the run with an
//!   unsupported-command error.
//!
//! On a 64-bit hart the payload's top bits carry a device and command
//! selector; a 32-bit hart reads a 32-bit payload with both fields zero.

use tracing::warn;

use crate::config::Xlen;
use crate::soc::memory::SparseMemory;

/// First to-host port (exit/status and host commands).
pub const TOHOST0: u64 = 0x8000_1000;

/// Second to-host port (unconditional exit with `payload >> 1`).
pub const TOHOST1: u64 = 0x8000_3000;

/// From-host rendezvous address (reserved; never written by this emulator).
pub const FROMHOST: u64 = 0x8000_1040;

/// The to-host port device.
pub struct Htif {
    xlen: Xlen,
    write_flags: u8,
    value: u64,
    end: bool,
    unsupported: Option<(u8, u32)>,
}

impl Htif {
    /// Creates the device for the given payload width.
    pub fn new(xlen: Xlen) -> Self {
        Self {
            xlen,
            write_flags: 0,
            value: 0,
            end: false,
            unsupported: None,
        }
    }

    /// Latches a store that hit either port.
    pub fn check_store(&mut self, addr: u64) {
        if addr == TOHOST0 {
            self.write_flags |= 0b01;
        }
        if addr == TOHOST1 {
            self.write_flags |= 0b10;
        }
    }

    /// Interprets a latched to-host write.
    pub fn emulate(&mut self, mem: &mut SparseMemory) {
        if self.write_flags == 0 {
            return;
        }

        if self.write_flags & 0b10 != 0 {
            let payload = self.read_payload(mem, TOHOST1);
            self.value = payload >> 1;
            self.end = true;
            self.write_flags = 0;
            return;
        }

        let payload = self.read_payload(mem, TOHOST0);
        let (device, command) = match self.xlen {
            Xlen::Rv32 => (0u8, 0u32),
            Xlen::Rv64 => (((payload >> 56) & 0xFF) as u8, ((payload >> 48) & 0xFF) as u32),
        };

        match (device, command) {
            (0, 0) => {
                let value = payload & 0xFFFF_FFFF_FFFF;
                if value & 1 != 0 {
                    self.value = value >> 1;
                    self.end = true;
                } else {
                    warn!(payload, "to-host syscall proxying is not implemented");
                }
            }
            (0, command) => {
                self.unsupported = Some((0, command));
                self.end = true;
            }
            (1, 1) => {
                print!("{}", (payload & 0xFF) as u8 as char);
            }
            (1, 0) => {
                // Console read request; nothing queued to return.
            }
            (device, command) => {
                warn!(device, command, "unsupported to-host device");
            }
        }
        self.write_flags = 0;
    }

    fn read_payload(&self, mem: &SparseMemory, port: u64) -> u64 {
        match self.xlen {
            Xlen::Rv32 => mem.read_u32(port) as u64,
            Xlen::Rv64 => mem.read_u64(port),
        }
    }

    /// Returns whether the guest requested termination.
    pub fn end_requested(&self) -> bool {
        self.end
    }

    /// Returns the exit value the guest reported (`payload >> 1`).
    pub fn host_value(&self) -> u64 {
        self.value
    }

    /// Returns the unsupported device/command pair, if one ended the run.
    pub fn unsupported_command(&self) -> Option<(u8, u32)> {
        self.unsupported
    }
}
