//! Execution-loop tests: whole-program scenarios and per-step properties.

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use remu_core::config::{Config, Xlen};
use remu_core::core::arch::csr as csr_defs;

use crate::common::encode::{addi, b_type, i_type, j_type, nop, r_type, s_type, u_type};
use crate::common::harness::TestContext;

const CODE: u64 = 0x1000;
const DATA: u64 = 0x200;

#[test]
fn sum_one_to_ten() {
    // t0 = 0; for (t1 = 1; t1 != 11; t1++) t0 += t1; a0 = t0.
    let mut tc = TestContext::rv64();
    tc.write_program(
        CODE,
        &[
            addi(5, 0, 0),
            addi(6, 0, 1),
            addi(7, 0, 11),
            b_type(0b1100011, 0b000, 6, 7, 16), // beq t1, t2, done
            r_type(0b0110011, 5, 0, 5, 6, 0),   // add t0, t0, t1
            addi(6, 6, 1),
            j_type(0b1101111, 0, -12), // j loop
            addi(10, 5, 0),            // done: a0 = t0
        ],
    );
    let exit = tc.run(CODE);
    assert_eq!(exit, 55);
}

#[test]
fn bubble_sort_one_hundred_words() {
    let mut tc = TestContext::rv64();

    // Seed 100 pseudo-random u32 values at DATA.
    let mut seed: u32 = 0x1234_5678;
    for i in 0..100u64 {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        tc.cpu().memory.write_u32(DATA + 4 * i, seed);
    }

    tc.write_program(
        CODE,
        &[
            addi(11, 0, DATA as i32),          //      a1 = base
            addi(31, 0, 99),                   //      t6 = 99
            addi(5, 0, 0),                     //      t0 = 0 (pass counter)
            addi(6, 0, 0),                     // outer: t1 = 0
            addi(7, 11, 0),                    //      t2 = a1
            i_type(0b0000011, 28, 0b010, 7, 0), // inner: lw t3, 0(t2)
            i_type(0b0000011, 29, 0b010, 7, 4), //      lw t4, 4(t2)
            b_type(0b1100011, 0b111, 29, 28, 12), //    bgeu t4, t3, noswap
            s_type(0b0100011, 0b010, 7, 29, 0), //      sw t4, 0(t2)
            s_type(0b0100011, 0b010, 7, 28, 4), //      sw t3, 4(t2)
            addi(7, 7, 4),                     // noswap: t2 += 4
            addi(6, 6, 1),                     //      t1 += 1
            b_type(0b1100011, 0b100, 6, 31, -28), //   blt t1, t6, inner
            addi(5, 5, 1),                     //      t0 += 1
            b_type(0b1100011, 0b100, 5, 31, -44), //   blt t0, t6, outer
        ],
    );
    tc.run(CODE);

    for i in 0..99u64 {
        let lo = tc.cpu().memory.read_u32(DATA + 4 * i);
        let hi = tc.cpu().memory.read_u32(DATA + 4 * (i + 1));
        assert!(lo <= hi, "mem[{i}] = {lo:#x} > mem[{}] = {hi:#x}", i + 1);
    }
}

#[test]
fn rv32_srai_arithmetic() {
    let mut tc = TestContext::rv32();
    tc.cpu().set_register(5, 0x8000_0000);
    // srai x6, x5, 4
    tc.write_program(
        CODE,
        &[i_type(0b0010011, 6, 0b101, 5, (0b0100000 << 5) | 4)],
    );
    tc.run(CODE);
    assert_eq!(tc.cpu().regs.read(6) as u32, 0xF800_0000);
    // The register file keeps the RV32 sign-extension closure.
    assert_eq!(tc.cpu().regs.read(6), 0xFFFF_FFFF_F800_0000);
}

#[test]
fn rv64_addw_overflow_sign_extends() {
    let mut tc = TestContext::rv64();
    tc.cpu().set_register(5, 0x7FFF_FFFF);
    tc.cpu().set_register(6, 1);
    // addw x7, x5, x6
    tc.write_program(CODE, &[r_type(0b0111011, 7, 0, 5, 6, 0)]);
    tc.run(CODE);
    assert_eq!(tc.cpu().regs.read(7), 0xFFFF_FFFF_8000_0000);
}

#[test]
fn compressed_jal_links_past_the_halfword() {
    let mut tc = TestContext::rv32();
    // c.jal +0x20 at 0x1000.
    tc.cpu().memory.write_u16(0x1000, 0x2005);
    tc.step_n(0x1000, 1);

    assert_eq!(tc.cpu().regs.read(1), 0x1002, "ra holds pc + 2");
    assert_eq!(tc.cpu().resume_pc(), 0x1020);
}

#[test]
fn compressed_and_wide_forms_agree() {
    // One step of c.addi x5, 3 must equal one step of addi x5, x5, 3,
    // except that pc advances by 2 instead of 4.
    let mut narrow = TestContext::rv64();
    narrow.cpu().set_register(5, 10);
    narrow.cpu().memory.write_u16(CODE, 0x028D);
    narrow.step_n(CODE, 1);

    let mut wide = TestContext::rv64();
    wide.cpu().set_register(5, 10);
    wide.write_words(CODE, &[addi(5, 5, 3)]);
    wide.step_n(CODE, 1);

    assert_eq!(narrow.cpu().regs.read(5), wide.cpu().regs.read(5));
    assert_eq!(narrow.cpu().resume_pc(), CODE + 2);
    assert_eq!(wide.cpu().resume_pc(), CODE + 4);
}

#[test]
fn jal_links_following_instruction() {
    let mut tc = TestContext::rv64();
    tc.write_words(CODE, &[j_type(0b1101111, 1, 0x100)]);
    tc.step_n(CODE, 1);
    assert_eq!(tc.cpu().regs.read(1), CODE + 4);
    assert_eq!(tc.cpu().resume_pc(), CODE + 0x100);
}

#[test]
fn jalr_tolerates_rd_equal_rs1() {
    let mut tc = TestContext::rv64();
    tc.cpu().set_register(5, 0x2000);
    // jalr x5, 8(x5): the link value must be captured before rd is written.
    tc.write_words(CODE, &[i_type(0b1100111, 5, 0, 5, 8)]);
    tc.step_n(CODE, 1);
    assert_eq!(tc.cpu().regs.read(5), CODE + 4);
    assert_eq!(tc.cpu().resume_pc(), 0x2008);
}

#[test]
fn jalr_masks_target_bit_zero() {
    let mut tc = TestContext::rv64();
    tc.cpu().set_register(5, 0x2001);
    tc.write_words(CODE, &[i_type(0b1100111, 6, 0, 5, 0)]);
    tc.step_n(CODE, 1);
    assert_eq!(tc.cpu().resume_pc(), 0x2000);
}

#[test]
fn branch_not_taken_falls_through() {
    let mut tc = TestContext::rv64();
    tc.cpu().set_register(5, 1);
    tc.cpu().set_register(6, 2);
    tc.write_words(CODE, &[b_type(0b1100011, 0b000, 5, 6, 0x40)]); // beq
    tc.step_n(CODE, 1);
    assert_eq!(tc.cpu().resume_pc(), CODE + 4);
}

#[test]
fn signed_and_unsigned_branches_disagree_on_msb() {
    // x5 = -1 (unsigned max), x6 = 1.
    let mut tc = TestContext::rv64();
    tc.cpu().set_register(5, u64::MAX);
    tc.cpu().set_register(6, 1);
    // blt x5, x6 taken (signed -1 < 1).
    tc.write_words(CODE, &[b_type(0b1100011, 0b100, 5, 6, 0x40)]);
    tc.step_n(CODE, 1);
    assert_eq!(tc.cpu().resume_pc(), CODE + 0x40);

    // bltu x5, x6 not taken (unsigned max > 1).
    let mut tc = TestContext::rv64();
    tc.cpu().set_register(5, u64::MAX);
    tc.cpu().set_register(6, 1);
    tc.write_words(CODE, &[b_type(0b1100011, 0b110, 5, 6, 0x40)]);
    tc.step_n(CODE, 1);
    assert_eq!(tc.cpu().resume_pc(), CODE + 4);
}

#[test]
fn loads_sign_and_zero_extend() {
    let mut tc = TestContext::rv64();
    tc.cpu().memory.write_u8(DATA, 0x80);
    tc.cpu().memory.write_u16(DATA + 2, 0x8000);
    tc.cpu().set_register(5, DATA);
    tc.write_program(
        CODE,
        &[
            i_type(0b0000011, 6, 0b000, 5, 0), // lb x6, 0(x5)
            i_type(0b0000011, 7, 0b100, 5, 0), // lbu x7, 0(x5)
            i_type(0b0000011, 28, 0b001, 5, 2), // lh x28, 2(x5)
            i_type(0b0000011, 29, 0b101, 5, 2), // lhu x29, 2(x5)
        ],
    );
    tc.run(CODE);
    assert_eq!(tc.cpu().regs.read(6), 0xFFFF_FFFF_FFFF_FF80);
    assert_eq!(tc.cpu().regs.read(7), 0x80);
    assert_eq!(tc.cpu().regs.read(28), 0xFFFF_FFFF_FFFF_8000);
    assert_eq!(tc.cpu().regs.read(29), 0x8000);
}

#[test]
fn store_split_across_access_unit() {
    let mut tc = TestContext::rv64();
    tc.cpu().set_register(5, DATA);
    tc.cpu().set_register(6, 0x1122_3344_5566_7788);
    // sd x6, 4(x5): crosses the 64-bit access unit at DATA + 8.
    tc.write_program(CODE, &[s_type(0b0100011, 0b011, 5, 6, 4)]);
    tc.run(CODE);

    assert_eq!(tc.cpu().memory.read_u32(DATA + 4), 0x5566_7788);
    assert_eq!(tc.cpu().memory.read_u32(DATA + 8), 0x1122_3344);
}

#[test]
fn load_split_across_access_unit() {
    let mut tc = TestContext::rv64();
    tc.cpu().memory.write_u64(DATA, 0x8899_0000_0000_0000);
    tc.cpu().memory.write_u64(DATA + 8, 0x0000_0000_0000_7766);
    tc.cpu().set_register(5, DATA);
    // lw x6, 6(x5): two bytes either side of the unit boundary.
    tc.write_program(CODE, &[i_type(0b0000011, 6, 0b010, 5, 6)]);
    tc.run(CODE);
    assert_eq!(tc.cpu().regs.read(6), 0x7766_8899);
}

#[test]
fn lui_and_auipc() {
    let mut tc = TestContext::rv64();
    tc.write_program(
        CODE,
        &[
            u_type(0b0110111, 5, 0xDEADB), // lui x5
            u_type(0b0010111, 6, 0x1),     // auipc x6
        ],
    );
    tc.run(CODE);
    assert_eq!(tc.cpu().regs.read(5), 0xDEADB000u32 as i32 as i64 as u64);
    assert_eq!(tc.cpu().regs.read(6), CODE + 4 + 0x1000);
}

#[test]
fn writes_to_x0_are_discarded() {
    let mut tc = TestContext::rv64();
    tc.write_program(CODE, &[addi(0, 0, 42)]);
    tc.run(CODE);
    assert_eq!(tc.cpu().regs.read(0), 0);
}

#[test]
fn infinite_loop_is_fatal() {
    let mut tc = TestContext::rv64();
    tc.write_words(CODE, &[j_type(0b1101111, 0, 0)]); // j .
    match tc.emu.run(CODE) {
        Err(remu_core::common::EmulatorError::InfiniteLoop { pc }) => assert_eq!(pc, CODE),
        other => panic!("expected infinite-loop error, got {other:?}"),
    }
}

#[test]
fn undecodable_wide_instruction_is_fatal() {
    let mut tc = TestContext::rv64();
    tc.write_words(CODE, &[0xFFFF_FFFF]);
    match tc.emu.run(CODE) {
        Err(remu_core::common::EmulatorError::UndecodableInstruction { pc, ir }) => {
            assert_eq!(pc, CODE);
            assert_eq!(ir, 0xFFFF_FFFF);
        }
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn rv32_shift_amount_warning_is_observable() {
    let mut tc = TestContext::rv32();
    // slli x5, x5, 0x20: bit 5 of the shamt is outside the RV32 datapath.
    tc.write_words(CODE, &[i_type(0b0010011, 5, 0b001, 5, 0x20)]);
    tc.step_n(CODE, 1);
    assert!(tc.cpu().shift_amount_warning);
}

#[test]
fn timer_interrupt_fires_before_fetch() {
    let mut tc = TestContext::with_config(Config {
        xlen: Xlen::Rv64,
        host_emulation: false,
        peripheral_emulation: true,
        ..Config::default()
    });
    {
        let cpu = tc.cpu();
        cpu.memory.write_u64(0x0200_4000, 5); // mtimecmp
        cpu.csr_write(csr_defs::MTVEC, 0x5000);
        cpu.csr_write(csr_defs::MIE, 1 << 7);
        cpu.csr_write(csr_defs::MSTATUS, 1 << 3);
    }
    tc.write_words(CODE, &[nop(), nop(), nop(), nop(), nop(), nop()]);
    tc.step_n(CODE, 5);

    let cpu = tc.cpu();
    assert_eq!(cpu.csr_read(csr_defs::MCAUSE), (1 << 63) | 7);
    // Four instructions retired before the fifth tick reached mtimecmp.
    assert_eq!(cpu.csr_read(csr_defs::MEPC), CODE + 16);
    assert_eq!(cpu.resume_pc(), 0x5000);
}

#[test]
fn masked_timer_interrupt_is_delivered_after_reenable() {
    // The timer fires inside a critical section (mstatus.MIE clear). The
    // posted MTIP bit must wait in mip and be taken at the top of the
    // first step after the guest re-enables interrupts.
    let mut tc = TestContext::with_config(Config {
        xlen: Xlen::Rv64,
        host_emulation: false,
        peripheral_emulation: true,
        ..Config::default()
    });
    {
        let cpu = tc.cpu();
        cpu.memory.write_u64(0x0200_4000, 2); // mtimecmp: fires on step 2
        cpu.csr_write(csr_defs::MTVEC, 0x5000);
        cpu.csr_write(csr_defs::MIE, 1 << 7);
        // mstatus.MIE stays clear for the first three steps.
    }
    tc.write_program(
        CODE,
        &[
            nop(),
            nop(),
            // csrrsi x0, mstatus, 8: re-enable interrupts.
            i_type(0b1110011, 0, 0b110, 8, 0x300),
        ],
    );
    tc.step_n(CODE, 3);
    assert_eq!(
        tc.cpu().csr_read(csr_defs::MIP) & (1 << 7),
        1 << 7,
        "MTIP latched while masked"
    );

    tc.cpu().step();
    let cpu = tc.cpu();
    assert_eq!(cpu.csr_read(csr_defs::MCAUSE), (1 << 63) | 7);
    assert_eq!(cpu.csr_read(csr_defs::MEPC), CODE + 12);
    assert_eq!(cpu.resume_pc(), 0x5000);
    assert_eq!(cpu.csr_read(csr_defs::MIP) & (1 << 7), 0, "MTIP serviced");
}

#[test]
fn timer_fire_does_not_skip_the_instruction_when_masked() {
    // A tick that posts a masked interrupt must not cost the guest an
    // instruction slot; the step still fetches and executes.
    let mut tc = TestContext::with_config(Config {
        xlen: Xlen::Rv64,
        host_emulation: false,
        peripheral_emulation: true,
        ..Config::default()
    });
    {
        let cpu = tc.cpu();
        cpu.memory.write_u64(0x0200_4000, 1); // fires on the very first step
        cpu.csr_write(csr_defs::MIE, 1 << 7);
        cpu.set_register(5, 0);
    }
    tc.write_words(CODE, &[addi(5, 5, 1)]);
    tc.step_n(CODE, 1);
    assert_eq!(tc.cpu().regs.read(5), 1, "instruction executed on the fire tick");
}

#[test]
fn mtime_is_published_before_loads() {
    let mut tc = TestContext::with_config(Config {
        xlen: Xlen::Rv64,
        host_emulation: false,
        peripheral_emulation: true,
        ..Config::default()
    });
    // ld x6, 0(x5) with x5 = mtime address.
    tc.cpu().set_register(5, 0x0200_BFF8);
    tc.write_program(CODE, &[i_type(0b0000011, 6, 0b011, 5, 0)]);
    tc.run(CODE);
    // One tick had elapsed when the load sampled mtime.
    assert_eq!(tc.cpu().regs.read(6), 1);
}

proptest! {
    /// Register x0 reads zero after any single-instruction step.
    #[test]
    fn register_zero_invariant(ir in any::<u32>()) {
        let mut tc = TestContext::rv64();
        tc.cpu().memory.write_u32(CODE, ir);
        tc.step_n(CODE, 1);
        prop_assert_eq!(tc.cpu().regs.read(0), 0);
    }
}
