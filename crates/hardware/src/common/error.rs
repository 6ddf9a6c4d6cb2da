//! Guest trap and emulator error definitions.
//!
//! Two distinct failure families exist and never mix:
//! 1. **Guest traps** (`Trap`): page faults, environment calls, interrupts.
//!    These are architecture-visible and are delivered through the trap
//!    machinery and the run loop keeps going.
//! 2. **Emulator-fatal conditions** (`EmulatorError`): decode failures,
//!    detected infinite loops, unsupported host commands, loader problems.
//!    These terminate `run` and are *not* visible to the guest.

use std::fmt;

/// Architecture-visible trap: a synchronous exception or an interrupt.
///
/// Covers the causes this emulator can raise. The associated value, where
/// present, becomes `mtval`/`stval` (faulting address or offending
/// instruction word).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trap {
    /// Illegal instruction; the value is the instruction encoding.
    IllegalInstruction(u32),

    /// Breakpoint (`EBREAK`).
    Breakpoint,

    /// `ECALL` executed in user mode.
    EnvironmentCallFromUMode,

    /// `ECALL` executed in supervisor mode.
    EnvironmentCallFromSMode,

    /// `ECALL` executed in machine mode.
    EnvironmentCallFromMMode,

    /// Instruction fetch page fault; the value is the faulting virtual address.
    InstructionPageFault(u64),

    /// Load page fault; the value is the faulting virtual address.
    LoadPageFault(u64),

    /// Store/AMO page fault; the value is the faulting virtual address.
    StorePageFault(u64),

    /// User software interrupt.
    UserSoftwareInterrupt,

    /// Supervisor software interrupt.
    SupervisorSoftwareInterrupt,

    /// Machine software interrupt.
    MachineSoftwareInterrupt,

    /// Supervisor timer interrupt.
    SupervisorTimerInterrupt,

    /// Machine timer interrupt.
    MachineTimerInterrupt,

    /// Machine external interrupt (virtio completion).
    MachineExternalInterrupt,
}

impl Trap {
    /// Returns `(is_interrupt, cause_code)` per the standard cause tables.
    ///
    /// The interrupt flag is *not* folded into the code; the trap machinery
    /// sets bit XLEN-1 itself because the position depends on the datapath
    /// width.
    pub fn code(&self) -> (bool, u64) {
        match self {
            Trap::IllegalInstruction(_) => (false, 2),
            Trap::Breakpoint => (false, 3),
            Trap::EnvironmentCallFromUMode => (false, 8),
            Trap::EnvironmentCallFromSMode => (false, 9),
            Trap::EnvironmentCallFromMMode => (false, 11),
            Trap::InstructionPageFault(_) => (false, 12),
            Trap::LoadPageFault(_) => (false, 13),
            Trap::StorePageFault(_) => (false, 15),
            Trap::UserSoftwareInterrupt => (true, 0),
            Trap::SupervisorSoftwareInterrupt => (true, 1),
            Trap::MachineSoftwareInterrupt => (true, 3),
            Trap::SupervisorTimerInterrupt => (true, 5),
            Trap::MachineTimerInterrupt => (true, 7),
            Trap::MachineExternalInterrupt => (true, 11),
        }
    }

    /// Returns the value to latch into `mtval`/`stval` for this trap.
    pub fn tval(&self) -> u64 {
        match self {
            Trap::InstructionPageFault(a) | Trap::LoadPageFault(a) | Trap::StorePageFault(a) => *a,
            Trap::IllegalInstruction(ir) => *ir as u64,
            _ => 0,
        }
    }

    /// Returns whether this trap is a page fault (any access kind).
    pub fn is_page_fault(&self) -> bool {
        matches!(
            self,
            Trap::InstructionPageFault(_) | Trap::LoadPageFault(_) | Trap::StorePageFault(_)
        )
    }
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trap::IllegalInstruction(ir) => write!(f, "IllegalInstruction({:#010x})", ir),
            Trap::InstructionPageFault(a) => write!(f, "InstructionPageFault({:#x})", a),
            Trap::LoadPageFault(a) => write!(f, "LoadPageFault({:#x})", a),
            Trap::StorePageFault(a) => write!(f, "StorePageFault({:#x})", a),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Emulator-fatal condition: stops the run without a guest-visible trap.
#[derive(Debug, thiserror::Error)]
pub enum EmulatorError {
    /// The decoder returned the error sentinel for a 32-bit encoding.
    #[error("undecodable instruction {ir:#010x} at pc {pc:#x}")]
    UndecodableInstruction {
        /// Program counter of the offending fetch.
        pc: u64,
        /// The raw instruction word.
        ir: u32,
    },

    /// An instruction produced `next_pc == pc` without branching or trapping.
    #[error("infinite loop detected at pc {pc:#x}")]
    InfiniteLoop {
        /// Program counter the hart is stuck at.
        pc: u64,
    },

    /// Two consecutive page faults at the identical address (watchdog).
    #[error("repeated page fault at {addr:#x}")]
    PageFaultLoop {
        /// The virtual address both faults reported.
        addr: u64,
    },

    /// The to-host port received a command this emulator does not implement.
    #[error("unsupported host command {command} for device {device}")]
    UnsupportedHostCommand {
        /// Host device selector (payload bits 63:56).
        device: u8,
        /// Host command selector (payload bits 55:48).
        command: u32,
    },

    /// The host system-call shim reported a fatal failure.
    #[error("system call emulation failed")]
    SystemCallFailed,

    /// Reading the executable image from disk failed.
    #[error("failed to read program image")]
    Io(#[from] std::io::Error),

    /// The executable image could not be parsed as an ELF file.
    #[error("failed to parse ELF image")]
    Elf(#[from] object::read::Error),

    /// The ELF image is not a RISC-V executable of the configured width.
    #[error("ELF image is {found}, expected a {expected} RISC-V executable")]
    WrongArchitecture {
        /// Architecture found in the image header.
        found: String,
        /// Architecture the emulator was configured for.
        expected: String,
    },
}
