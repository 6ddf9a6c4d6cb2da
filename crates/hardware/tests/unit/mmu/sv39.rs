//! Sv39 page-table walker tests.
//!
//! Verifies three-level walks, superpages, Accessed/Dirty write-back (and
//! its monotonicity), bare/machine bypass, and fault reporting.

use remu_core::SparseMemory;
use remu_core::common::VirtAddr;
use remu_core::config::Xlen;
use remu_core::core::arch::mode::PrivilegeMode;
use remu_core::core::units::mmu::Mmu;

const ROOT_PPN: u64 = 0x80; // root table at 0x80000
const SATP_SV39: u64 = (8 << 60) | ROOT_PPN;

const V: u64 = 1 << 0;
const R: u64 = 1 << 1;
const W: u64 = 1 << 2;
const X: u64 = 1 << 3;
const A: u64 = 1 << 6;
const D: u64 = 1 << 7;

fn pte(ppn: u64, flags: u64) -> u64 {
    (ppn << 10) | flags | V
}

fn write_pte(mem: &mut SparseMemory, table_ppn: u64, index: u64, value: u64) {
    mem.write_u64((table_ppn << 12) + index * 8, value);
}

fn setup() -> (Mmu, SparseMemory) {
    (Mmu::new(Xlen::Rv64), SparseMemory::new())
}

#[test]
fn machine_mode_bypasses_translation() {
    let (mmu, mut mem) = setup();
    let t = mmu.translate(
        VirtAddr::new(0x1234_5678),
        SATP_SV39,
        PrivilegeMode::Machine,
        false,
        &mut mem,
    );
    assert!(!t.page_fault);
    assert_eq!(t.paddr.val(), 0x1234_5678);
}

#[test]
fn bare_mode_is_identity() {
    let (mmu, mut mem) = setup();
    let t = mmu.translate(
        VirtAddr::new(0xDEAD_B000),
        0,
        PrivilegeMode::Supervisor,
        false,
        &mut mem,
    );
    assert!(!t.page_fault);
    assert_eq!(t.paddr.val(), 0xDEAD_B000);
}

#[test]
fn unsupported_mode_faults() {
    let (mmu, mut mem) = setup();
    for mode in [1u64, 7, 9, 15] {
        let t = mmu.translate(
            VirtAddr::new(0x1000),
            (mode << 60) | ROOT_PPN,
            PrivilegeMode::Supervisor,
            false,
            &mut mem,
        );
        assert!(t.page_fault, "mode {mode} must fault");
    }
}

#[test]
fn three_level_walk_to_4k_page() {
    let (mmu, mut mem) = setup();
    // VA 0x4000_1234: VPN[2]=1, VPN[1]=0, VPN[0]=1, offset 0x234.
    let va = 0x4000_1234u64;
    let l1 = ROOT_PPN + 1;
    let l0 = ROOT_PPN + 2;
    let target = ROOT_PPN + 10;

    write_pte(&mut mem, ROOT_PPN, 1, pte(l1, 0));
    write_pte(&mut mem, l1, 0, pte(l0, 0));
    write_pte(&mut mem, l0, 1, pte(target, R | W | X));

    let t = mmu.translate(
        VirtAddr::new(va),
        SATP_SV39,
        PrivilegeMode::Supervisor,
        false,
        &mut mem,
    );
    assert!(!t.page_fault);
    assert_eq!(t.paddr.val(), (target << 12) | 0x234);
}

#[test]
fn megapage_walk() {
    let (mmu, mut mem) = setup();
    // VA 0x4020_0000: VPN[2]=1, VPN[1]=1.
    let l1 = ROOT_PPN + 1;
    let target = 0x200; // 2 MiB aligned (PPN[0] == 0)

    write_pte(&mut mem, ROOT_PPN, 1, pte(l1, 0));
    write_pte(&mut mem, l1, 1, pte(target, R | W | X));

    let t = mmu.translate(
        VirtAddr::new(0x4020_0456),
        SATP_SV39,
        PrivilegeMode::Supervisor,
        false,
        &mut mem,
    );
    assert!(!t.page_fault);
    assert_eq!(t.paddr.val(), (target << 12) | 0x456);
}

#[test]
fn gigapage_folds_in_vpn_bits() {
    let (mmu, mut mem) = setup();
    // VA 0x8040_2468: VPN[2]=2; VPN[1] and VPN[0] come from the address.
    let target = 0x80000; // 1 GiB aligned, identity for gigapage #2
    write_pte(&mut mem, ROOT_PPN, 2, pte(target, R | W | X));

    let t = mmu.translate(
        VirtAddr::new(0x8040_2468),
        SATP_SV39,
        PrivilegeMode::Supervisor,
        false,
        &mut mem,
    );
    assert!(!t.page_fault);
    // PPN[2] from the PTE, PPN[1]/PPN[0] from the VPN.
    assert_eq!(t.paddr.val(), 0x8040_2468);
}

#[test]
fn invalid_pte_faults() {
    let (mmu, mut mem) = setup();
    let t = mmu.translate(
        VirtAddr::new(0x1000),
        SATP_SV39,
        PrivilegeMode::Supervisor,
        false,
        &mut mem,
    );
    assert!(t.page_fault);
    // A faulted translation hands back the untranslated address.
    assert_eq!(t.paddr.val(), 0x1000);
}

#[test]
fn write_without_read_is_invalid() {
    let (mmu, mut mem) = setup();
    write_pte(&mut mem, ROOT_PPN, 0, pte(0x100, W));
    let t = mmu.translate(
        VirtAddr::new(0x1000),
        SATP_SV39,
        PrivilegeMode::Supervisor,
        false,
        &mut mem,
    );
    assert!(t.page_fault);
}

#[test]
fn pointer_at_level_zero_faults() {
    let (mmu, mut mem) = setup();
    let l1 = ROOT_PPN + 1;
    let l0 = ROOT_PPN + 2;
    write_pte(&mut mem, ROOT_PPN, 0, pte(l1, 0));
    write_pte(&mut mem, l1, 0, pte(l0, 0));
    // Level 0 entry that is itself a pointer.
    write_pte(&mut mem, l0, 0, pte(ROOT_PPN + 9, 0));

    let t = mmu.translate(
        VirtAddr::new(0x0),
        SATP_SV39,
        PrivilegeMode::Supervisor,
        false,
        &mut mem,
    );
    assert!(t.page_fault);
}

#[test]
fn misaligned_superpage_faults() {
    let (mmu, mut mem) = setup();
    let l1 = ROOT_PPN + 1;
    write_pte(&mut mem, ROOT_PPN, 1, pte(l1, 0));
    // Megapage leaf with a non-zero PPN[0].
    write_pte(&mut mem, l1, 0, pte(0x201, R | W | X));

    let t = mmu.translate(
        VirtAddr::new(0x4000_0000),
        SATP_SV39,
        PrivilegeMode::Supervisor,
        false,
        &mut mem,
    );
    assert!(t.page_fault);
}

#[test]
fn walk_sets_accessed_and_dirty() {
    let (mmu, mut mem) = setup();
    let target = 0x40000;
    write_pte(&mut mem, ROOT_PPN, 2, pte(target, R | W | X));
    let pte_addr = (ROOT_PPN << 12) + 2 * 8;

    // A read sets A but not D.
    let t = mmu.translate(
        VirtAddr::new(0x8000_0000),
        SATP_SV39,
        PrivilegeMode::Supervisor,
        false,
        &mut mem,
    );
    assert!(!t.page_fault);
    assert_eq!(mem.read_u64(pte_addr) & A, A);
    assert_eq!(mem.read_u64(pte_addr) & D, 0);

    // A write sets D as well, before the translation returns.
    let t = mmu.translate(
        VirtAddr::new(0x8000_0000),
        SATP_SV39,
        PrivilegeMode::Supervisor,
        true,
        &mut mem,
    );
    assert!(!t.page_fault);
    assert_eq!(mem.read_u64(pte_addr) & (A | D), A | D);
}

#[test]
fn accessed_and_dirty_are_monotonic() {
    let (mmu, mut mem) = setup();
    let target = 0x40000;
    write_pte(&mut mem, ROOT_PPN, 2, pte(target, R | W | X));
    let pte_addr = (ROOT_PPN << 12) + 2 * 8;

    let _ = mmu.translate(
        VirtAddr::new(0x8000_0000),
        SATP_SV39,
        PrivilegeMode::Supervisor,
        true,
        &mut mem,
    );
    assert_eq!(mem.read_u64(pte_addr) & (A | D), A | D);

    // A later read must not clear either bit.
    let _ = mmu.translate(
        VirtAddr::new(0x8000_0000),
        SATP_SV39,
        PrivilegeMode::Supervisor,
        false,
        &mut mem,
    );
    assert_eq!(mem.read_u64(pte_addr) & (A | D), A | D);
}
