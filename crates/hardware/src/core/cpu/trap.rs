//! Trap Handling Logic.
//!
//! Trap entry performs, in order: the enable gate (interrupts only), the
//! page-fault watchdog, the delegation decision (`medeleg`/`mideleg` when
//! running at or below supervisor), the cause/epc/tval writes, the vectored
//! target computation, the PIE/IE/PP bookkeeping on the `mstatus` shadow,
//! the pending-bit clear, and the re-projection of the status views.
//! `MRET`/`SRET` reverse the bookkeeping.

use tracing::warn;

use super::Cpu;
use crate::common::bits::{bit, bits, set_bits};
use crate::common::{EmulatorError, Trap};
use crate::core::arch::csr as csr_defs;
use crate::core::arch::mode::PrivilegeMode;

impl Cpu {
    /// Delivers a trap with `pc` as the faulting instruction address.
    ///
    /// Returns whether the trap was actually taken; a disabled interrupt is
    /// left undelivered and execution continues.
    pub(crate) fn trap(&mut self, cause: Trap) -> bool {
        let (is_interrupt, code) = cause.code();

        if is_interrupt {
            let global_mie = self.mstatus & csr_defs::MSTATUS_MIE != 0;
            let mie = self.csrs.read(csr_defs::MIE);
            if !global_mie || bit(mie, code as u32) == 0 {
                return false;
            }
        }

        if cause.is_page_fault() {
            let addr = cause.tval();
            if self.page_fault_watchdog && self.prev_page_fault && self.prev_faulting_address == addr
            {
                warn!(addr, "repeated page fault at the same address");
                self.fatal = Some(EmulatorError::PageFaultLoop { addr });
            }
            self.prev_page_fault = true;
            self.prev_faulting_address = addr;
            self.page_fault = false;
        }

        let deleg = if is_interrupt {
            self.csrs.read(csr_defs::MIDELEG)
        } else {
            self.csrs.read(csr_defs::MEDELEG)
        };
        let delegate = self.privilege <= PrivilegeMode::Supervisor && bit(deleg, code as u32) == 1;

        let tval = cause.tval();
        let interrupt_mask = if is_interrupt {
            1u64 << (self.xlen.bits() - 1)
        } else {
            0
        };

        if delegate {
            if is_interrupt {
                let global_sie = self.mstatus & csr_defs::MSTATUS_SIE != 0;
                let sie = self.csrs.read(csr_defs::SIE);
                if !global_sie || bit(sie, code as u32) == 0 {
                    return false;
                }
            }

            self.csr_store(csr_defs::SCAUSE, code | interrupt_mask);
            self.csr_store(csr_defs::SEPC, self.pc);
            self.csr_store(csr_defs::STVAL, tval);
            self.next_pc = vector_target(self.csrs.read(csr_defs::STVEC), is_interrupt, code);

            // SPIE <- SIE; SIE <- 0; SPP <- caller privilege.
            let old_sie = bit(self.mstatus, 1);
            self.mstatus = set_bits(self.mstatus, 1, 5, old_sie);
            self.mstatus = set_bits(self.mstatus, 1, 1, 0);
            self.mstatus = set_bits(self.mstatus, 1, 8, (self.privilege.to_u8() & 1) as u64);
            self.privilege = PrivilegeMode::Supervisor;
        } else {
            self.csr_store(csr_defs::MCAUSE, code | interrupt_mask);
            self.csr_store(csr_defs::MEPC, self.pc);
            self.csr_store(csr_defs::MTVAL, tval);
            self.next_pc = vector_target(self.csrs.read(csr_defs::MTVEC), is_interrupt, code);

            // MPIE <- MIE; MIE <- 0; MPP <- caller privilege.
            let old_mie = bit(self.mstatus, 3);
            self.mstatus = set_bits(self.mstatus, 1, 7, old_mie);
            self.mstatus = set_bits(self.mstatus, 1, 3, 0);
            self.mstatus = set_bits(
                self.mstatus,
                2,
                csr_defs::MSTATUS_MPP_SHIFT,
                self.privilege.to_u8() as u64,
            );
            self.privilege = PrivilegeMode::Machine;
        }

        if is_interrupt {
            self.clear_interrupt_pending(code as u32);
        }
        self.apply_mstatus();
        true
    }

    /// Clears the pending bit for a serviced interrupt and rewrites the
    /// `sip`/`uip` views.
    fn clear_interrupt_pending(&mut self, code: u32) {
        let mip = self.csrs.read(csr_defs::MIP) & !(1u64 << code);
        self.csrs.write(csr_defs::MIP, mip);
        self.csrs.write(csr_defs::SIP, mip & csr_defs::SIP_MASK);
        self.csrs.write(csr_defs::UIP, mip & csr_defs::UIP_MASK);
    }

    /// Takes the highest-priority pending, enabled interrupt; returns
    /// whether one was delivered.
    ///
    /// Posted bits stay latched in `mip` until the trap is actually taken,
    /// so an interrupt that fires inside a masked region is delivered at
    /// the top of the first step after the guest re-enables it.
    pub(crate) fn check_pending_interrupts(&mut self) -> bool {
        let pending = self.csrs.read(csr_defs::MIP) & self.csrs.read(csr_defs::MIE);
        if self.mstatus & csr_defs::MSTATUS_MIE == 0 || pending == 0 {
            return false;
        }
        if pending & csr_defs::MIP_MEIP != 0 {
            self.trap(Trap::MachineExternalInterrupt)
        } else if pending & csr_defs::MIP_MSIP != 0 {
            self.trap(Trap::MachineSoftwareInterrupt)
        } else if pending & csr_defs::MIP_MTIP != 0 {
            self.trap(Trap::MachineTimerInterrupt)
        } else if pending & csr_defs::MIP_SSIP != 0 {
            self.trap(Trap::SupervisorSoftwareInterrupt)
        } else if pending & csr_defs::MIP_STIP != 0 {
            self.trap(Trap::SupervisorTimerInterrupt)
        } else if pending & csr_defs::MIP_USIP != 0 {
            self.trap(Trap::UserSoftwareInterrupt)
        } else {
            false
        }
    }

    /// `MRET`: privilege <- MPP, MIE <- MPIE, MPIE <- 1, MPP <- 0,
    /// `next_pc` <- `mepc`.
    pub(crate) fn mret(&mut self) {
        let mpp = bits(self.mstatus, 2, csr_defs::MSTATUS_MPP_SHIFT);
        self.privilege = PrivilegeMode::from_u8(mpp as u8);

        let mpie = bit(self.mstatus, 7);
        self.mstatus = set_bits(self.mstatus, 1, 3, mpie);
        self.mstatus = set_bits(self.mstatus, 1, 7, 1);
        self.mstatus = set_bits(self.mstatus, 2, csr_defs::MSTATUS_MPP_SHIFT, 0);
        self.apply_mstatus();

        self.next_pc = self.csrs.read(csr_defs::MEPC);
    }

    /// `SRET`: privilege <- SPP, SIE <- SPIE, SPIE <- 1, SPP <- 0,
    /// `next_pc` <- `sepc`.
    pub(crate) fn sret(&mut self) {
        let spp = bit(self.mstatus, 8);
        self.privilege = PrivilegeMode::from_u8(spp as u8);

        let spie = bit(self.mstatus, 5);
        self.mstatus = set_bits(self.mstatus, 1, 1, spie);
        self.mstatus = set_bits(self.mstatus, 1, 5, 1);
        self.mstatus = set_bits(self.mstatus, 1, 8, 0);
        self.apply_mstatus();

        self.next_pc = self.csrs.read(csr_defs::SEPC);
    }
}

/// Computes the trap target from an `xtvec` value: the aligned base, plus
/// `4 * cause` only when the vector is in vectored mode and the trap is an
/// interrupt.
fn vector_target(tvec: u64, is_interrupt: bool, code: u64) -> u64 {
    let base = tvec & !0b11;
    if (tvec & 0b11) == 1 && is_interrupt {
        base + 4 * code
    } else {
        base
    }
}
