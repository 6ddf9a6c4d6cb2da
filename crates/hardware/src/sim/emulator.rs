//! Top-level emulator façade.
//!
//! `Emulator` owns the hart and wires the external collaborators in: the
//! loader populates memory and supplies the entry point, a disk image feeds
//! the virtio device, and an optional host system-call shim services
//! `ECALL` when the configuration asks for it.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::common::EmulatorError;
use crate::config::Config;
use crate::core::Cpu;
use crate::core::cpu::SystemCallHandler;
use crate::isa::abi;
use crate::sim::loader::{self, LoadedImage};

/// The emulator: one hart plus its memory and peripherals.
pub struct Emulator {
    /// The hart.
    pub cpu: Cpu,
}

impl Emulator {
    /// Builds an emulator from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            cpu: Cpu::new(config),
        }
    }

    /// Loads an ELF executable, seeds the global pointer when the image
    /// names one, and returns the loaded-image record.
    pub fn load_elf_file(&mut self, path: &Path) -> Result<LoadedImage, EmulatorError> {
        let image = loader::load_elf_file(path, self.cpu.xlen, &mut self.cpu.memory)?;
        if let Some(gp) = image.global_pointer {
            self.cpu.write_reg(abi::REG_GP, gp);
        }
        Ok(image)
    }

    /// Attaches a disk image to the virtio block device.
    pub fn set_disk_image(&mut self, image: Vec<u8>) {
        self.cpu.peripherals.virtio.set_disk(image);
    }

    /// Installs the host system-call shim used when `ecall_emulation` is on.
    pub fn set_syscall_handler(&mut self, handler: Box<dyn SystemCallHandler>) {
        self.cpu.syscall = Some(handler);
    }

    /// Returns a flag that stops the run before its next step.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cpu.cancel_handle()
    }

    /// Runs from `start_pc` until a stop condition; returns the guest's
    /// exit value (`a0`).
    pub fn run(&mut self, start_pc: u64) -> Result<u64, EmulatorError> {
        self.cpu.run(start_pc)
    }
}
