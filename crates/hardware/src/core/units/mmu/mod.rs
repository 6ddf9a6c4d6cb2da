//! Memory Management Unit (MMU).
//!
//! Translates virtual to physical addresses under the scheme `satp` selects:
//! Sv32 (two-level walk, 4-byte PTEs) on a 32-bit hart, Sv39 (three-level
//! walk, 8-byte PTEs) on a 64-bit hart. On a successful walk the Accessed
//! bit (and, for writes, the Dirty bit) is set and the PTE written back
//! before the translation returns.
//!
//! Faults are reported through the returned flag rather than an error type:
//! the caller knows the access kind and raises the matching instruction,
//! load, or store page fault with the virtual address latched for
//! `mtval`/`stval`.

/// Typed Sv32/Sv39 page-table entries.
pub mod pte;

use tracing::warn;

use self::pte::{Pte32, Pte64};
use crate::common::bits::bits;
use crate::common::constants::{PAGE_SHIFT, PAGE_SIZE};
use crate::common::{PhysAddr, VirtAddr};
use crate::config::Xlen;
use crate::core::arch::mode::PrivilegeMode;
use crate::soc::memory::SparseMemory;

/// Number of levels in an Sv32 walk.
const SV32_LEVELS: usize = 2;

/// Number of levels in an Sv39 walk.
const SV39_LEVELS: usize = 3;

/// Size of an Sv32 PTE in bytes.
const PTE_SIZE_32: u64 = 4;

/// Size of an Sv39 PTE in bytes.
const PTE_SIZE_64: u64 = 8;

/// Outcome of a translation.
#[derive(Clone, Copy, Debug)]
pub struct Translation {
    /// The translated physical address; equals the input when translation is
    /// off or when the walk faulted.
    pub paddr: PhysAddr,
    /// Set when the walk raised a page fault.
    pub page_fault: bool,
}

impl Translation {
    fn ok(paddr: u64) -> Self {
        Self {
            paddr: PhysAddr::new(paddr),
            page_fault: false,
        }
    }

    fn fault(paddr: u64) -> Self {
        Self {
            paddr: PhysAddr::new(paddr),
            page_fault: true,
        }
    }
}

/// Two-level (Sv32) / three-level (Sv39) page-table walker.
pub struct Mmu {
    xlen: Xlen,
}

impl Mmu {
    /// Creates a walker for the given datapath width.
    pub fn new(xlen: Xlen) -> Self {
        Self { xlen }
    }

    /// Translates `va` under `satp` for the given effective privilege.
    ///
    /// Machine mode bypasses translation entirely (the CPU substitutes the
    /// MPP privilege here when `mstatus.MPRV` is set). `write_access`
    /// controls whether the Dirty bit is set on the leaf PTE.
    pub fn translate(
        &self,
        va: VirtAddr,
        satp: u64,
        privilege: PrivilegeMode,
        write_access: bool,
        mem: &mut SparseMemory,
    ) -> Translation {
        if privilege == PrivilegeMode::Machine {
            return Translation::ok(va.val());
        }
        match self.xlen {
            Xlen::Rv32 => self.walk_sv32(va, satp, write_access, mem),
            Xlen::Rv64 => self.walk_sv39(va, satp, write_access, mem),
        }
    }

    /// Sv32: `satp` MODE in bit 31, 10+10 VPN split, 12-bit page offset.
    fn walk_sv32(
        &self,
        va: VirtAddr,
        satp: u64,
        write_access: bool,
        mem: &mut SparseMemory,
    ) -> Translation {
        if bits(satp, 1, 31) == 0 {
            return Translation::ok(va.val());
        }

        let mut ppn = bits(satp, 22, 0);
        let vpn = [bits(va.val(), 10, 12), bits(va.val(), 10, 22)];
        let offset = bits(va.val(), 12, 0);

        let mut level = SV32_LEVELS - 1;
        let (pte, pte_addr) = loop {
            let pte_addr = ppn * PAGE_SIZE + vpn[level] * PTE_SIZE_32;
            let pte = Pte32(mem.read_u32(pte_addr & !0b11));
            if !pte.is_valid() {
                return Translation::fault(va.val());
            }
            if pte.is_leaf() {
                break (pte, pte_addr);
            }
            if level == 0 {
                return Translation::fault(va.val());
            }
            ppn = pte.ppn();
            level -= 1;
        };

        // A superpage leaf must have its low PPN field clear.
        if level > 0 && pte.ppn0() != 0 {
            return Translation::fault(va.val());
        }

        let mut updated = pte.with_accessed();
        if write_access {
            updated = updated.with_dirty();
        }
        mem.write_u32(pte_addr & !0b11, updated.raw());

        let ppn0 = if level > 0 { vpn[0] } else { pte.ppn0() };
        let pa = (pte.ppn1() << 22) | (ppn0 << PAGE_SHIFT) | offset;
        Translation::ok(pa & 0xFFFF_FFFF)
    }

    /// Sv39: `satp` MODE in bits 63:60 (8 walks, 0 is bare, anything else
    /// faults), 9+9+9 VPN split, 12-bit page offset.
    fn walk_sv39(
        &self,
        va: VirtAddr,
        satp: u64,
        write_access: bool,
        mem: &mut SparseMemory,
    ) -> Translation {
        let mode = bits(satp, 4, 60);
        if mode == 0 {
            return Translation::ok(va.val());
        }
        if mode != 8 {
            warn!(mode, va = va.val(), "unsupported satp translation mode");
            return Translation::fault(va.val());
        }

        let mut ppn = bits(satp, 44, 0);
        let vpn = [
            bits(va.val(), 9, 12),
            bits(va.val(), 9, 21),
            bits(va.val(), 9, 30),
        ];
        let offset = bits(va.val(), 12, 0);

        let mut level = SV39_LEVELS - 1;
        let (pte, pte_addr) = loop {
            let pte_addr = ppn * PAGE_SIZE + vpn[level] * PTE_SIZE_64;
            let pte = Pte64(mem.read_u64(pte_addr & !0b111));
            if !pte.is_valid() {
                return Translation::fault(va.val());
            }
            if pte.is_leaf() {
                break (pte, pte_addr);
            }
            if level == 0 {
                return Translation::fault(va.val());
            }
            ppn = pte.ppn();
            level -= 1;
        };

        // Superpage leaves must have every lower PPN field clear.
        if (level > 0 && pte.ppn0() != 0) || (level > 1 && pte.ppn1() != 0) {
            return Translation::fault(va.val());
        }

        let mut updated = pte.with_accessed();
        if write_access {
            updated = updated.with_dirty();
        }
        mem.write_u64(pte_addr & !0b111, updated.raw());

        let ppn1 = if level > 1 { vpn[1] } else { pte.ppn1() };
        let ppn0 = if level > 0 { vpn[0] } else { pte.ppn0() };
        let pa = (pte.ppn2() << 30) | (ppn1 << 21) | (ppn0 << PAGE_SHIFT) | offset;
        Translation::ok(pa & 0x00FF_FFFF_FFFF_FFFF)
    }
}
