//! Main Execution Loop.
//!
//! One `step` per instruction: tick the timer, poll pending interrupts,
//! translate and fetch (16 or 32 bits, halves translated independently when
//! the fetch straddles a page), decode, dispatch, apply side effects, force
//! `x0`, advance `pc`, and let the peripheral block observe the step. There
//! are no suspension points inside an instruction.
//!
//! Interrupt sources (timer, virtio completion, guest software writes) only
//! ever *post* their bit in `mip`; delivery happens exclusively through the
//! pending poll at the top of the step, so a bit posted while the enables
//! are masked waits there instead of being dropped.
//!
//! Stop conditions: the `jalr x0, 0(ra)` sentinel with `ra == 0`, the
//! to-host port raising its end flag, cancellation, or an emulator-fatal
//! condition (decode error on a wide encoding, detected infinite loop,
//! page-fault watchdog, unsupported host command).

use tracing::warn;

use super::memory::access_width;
use super::{Cpu, alu};
use crate::common::bits::{mask, sext32, sign_extend};
use crate::common::constants::{INSTRUCTION_SIZE_16, INSTRUCTION_SIZE_32, WIDE_INSTRUCTION_BITS};
use crate::common::{EmulatorError, Trap};
use crate::core::arch::csr as csr_defs;
use crate::core::arch::mode::PrivilegeMode;
use crate::isa::abi;
use crate::isa::decode::decode32;
use crate::isa::instruction::Decoded;
use crate::isa::op::Op;
use crate::isa::rvc::decode16;

impl Cpu {
    /// Runs the hart from `start_pc` until a stop condition.
    ///
    /// Returns the guest's exit value (the contents of `a0`) on normal
    /// termination, or the emulator-fatal condition that ended the run.
    pub fn run(&mut self, start_pc: u64) -> Result<u64, EmulatorError> {
        self.end = false;
        self.fatal = None;
        self.next_pc = start_pc;

        while !self.end {
            if self.cancelled() {
                break;
            }
            self.step();
            if let Some(fatal) = self.fatal.take() {
                if self.verbose {
                    self.dump_state();
                }
                return Err(fatal);
            }
        }

        Ok(self.regs.read(abi::REG_A0))
    }

    /// Executes one instruction (or delivers one trap).
    ///
    /// Public so external collaborators (debuggers, test harnesses) can
    /// drive the hart at instruction boundaries; `run` is this in a loop.
    pub fn step(&mut self) {
        self.pc = self.next_pc;

        self.timer_step();
        if self.check_pending_interrupts() {
            return;
        }

        self.ir = self.load_cmd(self.pc);
        if self.verbose {
            self.dump_disassembly();
        }
        if self.page_fault {
            let va = self.faulting_address;
            self.trap(Trap::InstructionPageFault(va));
            return;
        }

        let compressed = self.ir & WIDE_INSTRUCTION_BITS != WIDE_INSTRUCTION_BITS;
        self.next_pc = self.pc.wrapping_add(if compressed {
            INSTRUCTION_SIZE_16
        } else {
            INSTRUCTION_SIZE_32
        });
        let decoded = if compressed {
            decode16(self.ir as u16, self.xlen)
        } else {
            decode32(self.ir)
        };

        self.execute(&decoded);

        if self.pc == self.next_pc && self.fatal.is_none() {
            warn!(pc = self.pc, "hart did not advance");
            self.fatal = Some(EmulatorError::InfiniteLoop { pc: self.pc });
        }

        self.regs.write(abi::REG_ZERO, 0);

        if self.verbose {
            self.regs.dump();
        }
        if self.host_emulation || self.peripheral_emulation {
            self.peripheral_emulations();
        }
    }

    /// Ticks the timer; posts the machine timer interrupt bit when the
    /// count reaches the compare register. Delivery is the pending poll's
    /// job, so a tick that fires while interrupts are masked is not lost.
    fn timer_step(&mut self) {
        if self.peripherals.timer_tick(&mut self.memory) {
            self.post_interrupt(csr_defs::MIP_MTIP);
        }
    }

    /// Latches an interrupt bit into `mip` and rewrites the masked views.
    fn post_interrupt(&mut self, bit: u64) {
        let mip = self.csrs.read(csr_defs::MIP) | bit;
        self.csrs.write(csr_defs::MIP, mip);
        self.update_interrupt_pending(csr_defs::MIP);
    }

    /// Fetches the instruction at `pc`: two or four bytes depending on the
    /// low opcode bits, with each 16-bit half translated independently when
    /// the word straddles a page boundary.
    fn load_cmd(&mut self, pc: u64) -> u32 {
        let pa = self.translate(pc, false);
        let mut cmd = self.memory.read_u32(pa & !0b11);
        if pc & 0b10 == 0b10 {
            cmd = (cmd >> 16) & 0xFFFF;
            if !self.page_fault && cmd & WIDE_INSTRUCTION_BITS == WIDE_INSTRUCTION_BITS {
                let pa_upper = self.translate(pc.wrapping_add(2), false);
                if !self.page_fault {
                    let upper = self.memory.read_u32(pa_upper & !0b11);
                    cmd |= (upper & 0xFFFF) << 16;
                }
            }
        }
        if cmd & WIDE_INSTRUCTION_BITS == WIDE_INSTRUCTION_BITS {
            cmd
        } else {
            cmd & 0xFFFF
        }
    }

    /// Dispatches one decoded instruction.
    fn execute(&mut self, d: &Decoded) {
        match d.op {
            Op::Error => {
                if self.ir & WIDE_INSTRUCTION_BITS != WIDE_INSTRUCTION_BITS {
                    // Illegal compressed encodings are guest-visible.
                    self.trap(Trap::IllegalInstruction(self.ir));
                } else {
                    warn!(pc = self.pc, ir = self.ir, "undecodable instruction");
                    self.fatal = Some(EmulatorError::UndecodableInstruction {
                        pc: self.pc,
                        ir: self.ir,
                    });
                }
            }

            Op::Add
            | Op::Sub
            | Op::Sll
            | Op::Xor
            | Op::Srl
            | Op::Sra
            | Op::Or
            | Op::And
            | Op::Addw
            | Op::Subw
            | Op::Sllw
            | Op::Srlw
            | Op::Sraw => {
                let a = self.regs.read(d.rs1);
                let b = self.regs.read(d.rs2);
                let value = alu::op_register(self.xlen, d.op, a, b);
                self.write_reg(d.rd, value);
            }

            Op::Addi | Op::Andi | Op::Ori | Op::Xori | Op::Addiw => {
                let a = self.regs.read(d.rs1);
                let value = alu::op_immediate(self.xlen, d.op, a, d.imm);
                self.write_reg(d.rd, value);
            }

            Op::Slli | Op::Srli | Op::Srai | Op::Slliw | Op::Srliw | Op::Sraiw => {
                let shamt = (d.imm & 0x3F) as u32;
                let a = self.regs.read(d.rs1);
                let (value, shamt_warning) = alu::shift_imm(self.xlen, d.op, a, shamt);
                if shamt_warning {
                    self.shift_amount_warning = true;
                    warn!(pc = self.pc, shamt, "shift amount exceeds datapath width");
                }
                self.write_reg(d.rd, value);
            }

            Op::Slt => {
                let cond = (self.regs.read(d.rs1) as i64) < (self.regs.read(d.rs2) as i64);
                self.write_reg(d.rd, cond as u64);
            }
            Op::Sltu => {
                let cond = self.regs.read(d.rs1) < self.regs.read(d.rs2);
                self.write_reg(d.rd, cond as u64);
            }
            Op::Slti => {
                let cond = (self.regs.read(d.rs1) as i64) < d.imm;
                self.write_reg(d.rd, cond as u64);
            }
            Op::Sltiu => {
                let cond = self.regs.read(d.rs1) < d.imm as u64;
                self.write_reg(d.rd, cond as u64);
            }

            Op::Beq | Op::Bne | Op::Blt | Op::Bge | Op::Bltu | Op::Bgeu => {
                let a = self.regs.read(d.rs1);
                let b = self.regs.read(d.rs2);
                let taken = match d.op {
                    Op::Beq => a == b,
                    Op::Bne => a != b,
                    Op::Blt => (a as i64) < (b as i64),
                    Op::Bge => (a as i64) >= (b as i64),
                    Op::Bltu => a < b,
                    _ => a >= b,
                };
                if taken {
                    self.next_pc = self.pc.wrapping_add(d.imm as u64);
                }
            }

            Op::Jal => {
                self.write_reg(d.rd, self.next_pc);
                self.next_pc = self.pc.wrapping_add(d.imm as u64);
            }
            Op::Jalr => {
                // Capture the link first so rd == rs1 behaves.
                let t = self.next_pc;
                self.next_pc = self.regs.read(d.rs1).wrapping_add(d.imm as u64) & !1;
                self.write_reg(d.rd, t);
                // The harness convention for "return to nowhere": an
                // unconditional return through a zero ra ends the run.
                if d.rd == abi::REG_ZERO
                    && d.rs1 == abi::REG_RA
                    && self.regs.read(abi::REG_RA) == 0
                    && d.imm == 0
                {
                    self.end = true;
                }
            }

            Op::Lui => self.write_reg(d.rd, d.imm as u64),
            Op::Auipc => self.write_reg(d.rd, self.pc.wrapping_add(d.imm as u64)),

            Op::Lb | Op::Lh | Op::Lw | Op::Ld | Op::Lbu | Op::Lhu | Op::Lwu => self.exec_load(d),
            Op::Sb | Op::Sh | Op::Sw | Op::Sd => self.exec_store(d),

            Op::Fence | Op::FenceI => {}
            // Single hart, no TLB: nothing to wait on, nothing to flush.
            Op::Wfi | Op::SfenceVma => {}

            Op::Ecall => self.exec_ecall(),
            Op::Ebreak => {
                self.trap(Trap::Breakpoint);
            }
            Op::Mret => self.mret(),
            Op::Sret => self.sret(),

            Op::Csrrw | Op::Csrrs | Op::Csrrc | Op::Csrrwi | Op::Csrrsi | Op::Csrrci => {
                self.exec_csr(d);
            }

            Op::Mul
            | Op::Mulh
            | Op::Mulhsu
            | Op::Mulhu
            | Op::Div
            | Op::Divu
            | Op::Rem
            | Op::Remu
            | Op::Mulw
            | Op::Divw
            | Op::Divuw
            | Op::Remw
            | Op::Remuw => {
                let a = self.regs.read(d.rs1);
                let b = self.regs.read(d.rs2);
                let value = alu::muldiv(self.xlen, d.op, a, b);
                self.write_reg(d.rd, value);
            }

            op if op.is_amo() => self.exec_amo(d),

            _ => {}
        }
    }

    /// Loads through the MMU, splitting at the 64-bit access unit.
    fn exec_load(&mut self, d: &Decoded) {
        let va = self.regs.read(d.rs1).wrapping_add(d.imm as u64);
        let pa = self.translate(va, false);
        if self.page_fault {
            self.trap(Trap::LoadPageFault(va));
            return;
        }

        // Publish memory-mapped values with the target address in hand, so
        // the UART can consume its receive queue on holding-register reads.
        self.peripherals.update_mmio(&mut self.memory, pa);

        let width = load_width(d.op);
        let first = access_width(width, va);
        let mut data = self.load_physical(pa, first);
        if first < width {
            let next_va = va.wrapping_add(first as u64);
            let next_pa = self.translate(next_va, false);
            if self.page_fault {
                self.trap(Trap::LoadPageFault(next_va));
                return;
            }
            let high = self.load_physical(next_pa, width - first);
            data |= high << (first * 8);
        }

        let value = match d.op {
            Op::Lb => sign_extend(data, 8),
            Op::Lh => sign_extend(data, 16),
            Op::Lw => sext32(data),
            Op::Lwu => data & 0xFFFF_FFFF,
            _ => data,
        };
        self.write_reg(d.rd, value);
    }

    /// Stores through the MMU, splitting at the 64-bit access unit, then
    /// lets the peripheral block observe the write.
    fn exec_store(&mut self, d: &Decoded) {
        let va = self.regs.read(d.rs1).wrapping_add(d.imm as u64);
        let pa = self.translate(va, true);
        if self.page_fault {
            self.trap(Trap::StorePageFault(va));
            return;
        }

        let width = store_width(d.op);
        let first = access_width(width, va);
        let value = self.regs.read(d.rs2);
        self.store_physical(pa, value & mask((first * 8) as u32), first);
        if first < width {
            let next_va = va.wrapping_add(first as u64);
            let next_pa = self.translate(next_va, true);
            if self.page_fault {
                self.trap(Trap::StorePageFault(next_va));
                return;
            }
            self.store_physical(next_pa, value >> (first * 8), width - first);
        }

        self.peripherals.check_store(pa, width, value);
    }

    /// Atomic read-modify-write. Translated once as a store/AMO access, so
    /// both A and D are set before the read half.
    fn exec_amo(&mut self, d: &Decoded) {
        let va = self.regs.read(d.rs1);
        let pa = self.translate(va, true);
        if self.page_fault {
            self.trap(Trap::StorePageFault(va));
            return;
        }

        let width = if d.op.is_amo_d() { 8 } else { 4 };
        let mut t = self.load_physical(pa, width);
        if width == 4 {
            t = sext32(t);
        }
        let new_value = alu::amo_value(d.op, t, self.regs.read(d.rs2));
        self.store_physical(pa, new_value, width);
        self.write_reg(d.rd, t);
    }

    /// Atomic CSR read-modify-write.
    fn exec_csr(&mut self, d: &Decoded) {
        let addr = d.csr as u32;
        let t = self.csr_read(addr);
        // The immediate forms carry a 5-bit zimm in the rs1 field.
        let operand = match d.op {
            Op::Csrrw | Op::Csrrs | Op::Csrrc => self.regs.read(d.rs1),
            _ => d.rs1 as u64,
        };
        let new_value = match d.op {
            Op::Csrrw | Op::Csrrwi => operand,
            Op::Csrrs | Op::Csrrsi => t | operand,
            _ => t & !operand,
        };
        self.csr_write(addr, new_value);
        self.write_reg(d.rd, t);
    }

    /// `ECALL`: host shim when enabled, architectural trap otherwise.
    fn exec_ecall(&mut self) {
        if self.ecall_emulation {
            if let Some(mut handler) = self.syscall.take() {
                let (fatal, end) = handler.ecall(&mut self.regs, &mut self.memory);
                self.syscall = Some(handler);
                if fatal {
                    self.fatal = Some(EmulatorError::SystemCallFailed);
                }
                if end {
                    self.end = true;
                }
                return;
            }
        }
        let cause = match self.privilege {
            PrivilegeMode::Machine => Trap::EnvironmentCallFromMMode,
            PrivilegeMode::Supervisor => Trap::EnvironmentCallFromSMode,
            PrivilegeMode::User => Trap::EnvironmentCallFromUMode,
        };
        self.trap(cause);
    }

    /// Bottom-of-step peripheral pass: apply latched MMIO side effects,
    /// pick up host exit and virtio completion.
    fn peripheral_emulations(&mut self) {
        self.peripherals.emulate(&mut self.memory);

        if self.peripherals.htif.end_requested() {
            let value = self.peripherals.htif.host_value();
            self.write_reg(abi::REG_A0, value);
            if let Some((device, command)) = self.peripherals.htif.unsupported_command() {
                self.fatal = Some(EmulatorError::UnsupportedHostCommand { device, command });
            }
            self.end = true;
        }
        if self.peripherals.take_external_interrupt() {
            self.post_interrupt(csr_defs::MIP_MEIP);
        }
    }
}

/// Access width in bytes for a load mnemonic.
fn load_width(op: Op) -> usize {
    match op {
        Op::Lb | Op::Lbu => 1,
        Op::Lh | Op::Lhu => 2,
        Op::Lw | Op::Lwu => 4,
        _ => 8,
    }
}

/// Access width in bytes for a store mnemonic.
fn store_width(op: Op) -> usize {
    match op {
        Op::Sb => 1,
        Op::Sh => 2,
        Op::Sw => 4,
        _ => 8,
    }
}
