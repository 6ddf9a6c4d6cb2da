//! Memory-mapped peripheral devices.
//!
//! The peripheral block the execution core consumes. Each device holds its
//! own state and borrows the memory store only for the duration of a call;
//! the core drives the block at three points per step:
//!
//! 1. `timer_tick` at the very top of the step, before fetch;
//! 2. `update_mmio` before each load (with the load's physical address, so
//!    the UART can tell a holding-register read from any other load);
//! 3. `check_store` after each store, to observe writes into MMIO windows,
//!    then `emulate` at the bottom of the step to apply their side effects.

/// Host-target interface (riscv-tests exit ports).
pub mod htif;

/// Machine timer.
pub mod timer;

/// UART transmit/receive.
pub mod uart;

/// Virtio block device (legacy MMIO).
pub mod virtio;

use crate::config::Xlen;
use crate::soc::memory::SparseMemory;

pub use htif::Htif;
pub use timer::Timer;
pub use uart::Uart;
pub use virtio::VirtioBlock;

/// The peripheral block: timer, UART, to-host port, and virtio disk.
pub struct Peripherals {
    /// Machine timer (cycle counter vs `mtimecmp`).
    pub timer: Timer,
    /// UART transmit sink and receive queue.
    pub uart: Uart,
    /// riscv-tests to-host exit ports.
    pub htif: Htif,
    /// Virtio block device.
    pub virtio: VirtioBlock,
    host_emulation: bool,
    device_emulation: bool,
    xlen: Xlen,
}

impl Peripherals {
    /// Creates the block. `host_emulation` enables the to-host exit
    /// convention; `device_emulation` enables the timer/UART/virtio side
    /// effects.
    pub fn new(xlen: Xlen, host_emulation: bool, device_emulation: bool) -> Self {
        Self {
            timer: Timer::new(),
            uart: Uart::new(),
            htif: Htif::new(xlen),
            virtio: VirtioBlock::new(),
            host_emulation,
            device_emulation,
            xlen,
        }
    }

    /// Publishes device reset values into the memory-mapped windows.
    pub fn init(&mut self, mem: &mut SparseMemory) {
        if self.device_emulation {
            self.uart.init(mem);
            self.virtio.init(mem);
        }
    }

    /// Advances the timer by one instruction; returns whether a machine
    /// timer interrupt fired this tick.
    pub fn timer_tick(&mut self, mem: &mut SparseMemory) -> bool {
        self.timer.tick(mem)
    }

    /// Publishes memory-mapped values (mtime, UART receive state) so the
    /// imminent load of `load_addr` observes them.
    pub fn update_mmio(&mut self, mem: &mut SparseMemory, load_addr: u64) {
        let load_addr = self.mask_address(load_addr);
        if self.device_emulation {
            self.timer.publish(mem);
            self.uart.publish(mem, load_addr);
        }
    }

    /// An RV32 guest computes addresses in sign-extended registers.
    fn mask_address(&self, addr: u64) -> u64 {
        match self.xlen {
            Xlen::Rv32 => addr & 0xFFFF_FFFF,
            Xlen::Rv64 => addr,
        }
    }

    /// Observes a completed store; latches writes that hit an MMIO window.
    pub fn check_store(&mut self, addr: u64, width: usize, value: u64) {
        let addr = self.mask_address(addr);
        if self.host_emulation {
            self.htif.check_store(addr);
        }
        if self.device_emulation {
            self.uart.check_store(addr, width, value);
            self.virtio.check_store(addr, value);
        }
    }

    /// Applies the side effects of any latched MMIO writes.
    pub fn emulate(&mut self, mem: &mut SparseMemory) {
        if self.host_emulation {
            self.htif.emulate(mem);
        }
        if self.device_emulation {
            self.uart.emulate();
            self.virtio.emulate(mem);
        }
    }

    /// Consumes a pending virtio completion interrupt.
    pub fn take_external_interrupt(&mut self) -> bool {
        self.virtio.take_interrupt()
    }
}
