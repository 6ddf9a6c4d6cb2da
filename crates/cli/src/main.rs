//! RISC-V emulator CLI.
//!
//! Loads a statically linked RISC-V ELF executable, picks the datapath
//! width from the image, and runs it to completion. The process exits 0 on
//! normal guest termination (the guest's `a0` exit value is printed) and 1
//! on an emulator-fatal condition.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use remu_core::Emulator;
use remu_core::config::Config;
use remu_core::sim::loader;

#[derive(Parser, Debug)]
#[command(
    name = "remu",
    version,
    about = "Instruction-accurate RISC-V RV32/RV64 IMAC emulator",
    long_about = "Run a statically linked RISC-V executable.\n\n\
        The datapath width (RV32/RV64) is taken from the ELF header. riscv-tests\n\
        binaries terminate through the tohost convention; xv6-style images need\n\
        --peripherals and usually --disk."
)]
struct Cli {
    /// RISC-V ELF executable to run.
    file: PathBuf,

    /// Print one disassembled line and the register file per instruction.
    #[arg(short, long)]
    verbose: bool,

    /// Disk image for the virtio block device.
    #[arg(long)]
    disk: Option<PathBuf>,

    /// Enable the timer/UART/virtio peripherals.
    #[arg(long)]
    peripherals: bool,

    /// Disable the riscv-tests tohost exit convention.
    #[arg(long)]
    no_host: bool,

    /// Disable the repeated-page-fault watchdog.
    #[arg(long)]
    no_watchdog: bool,

    /// Initial stack pointer handed to the guest.
    #[arg(long)]
    sp: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let image_data = match std::fs::read(&cli.file) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("remu: cannot read '{}': {}", cli.file.display(), err);
            process::exit(1);
        }
    };

    let xlen = match loader::detect_xlen(&image_data) {
        Ok(xlen) => xlen,
        Err(err) => {
            eprintln!("remu: '{}': {}", cli.file.display(), err);
            process::exit(1);
        }
    };

    let config = Config {
        xlen,
        host_emulation: !cli.no_host,
        peripheral_emulation: cli.peripherals,
        ecall_emulation: false,
        verbose: cli.verbose,
        page_fault_watchdog: !cli.no_watchdog,
        initial_sp: cli.sp,
    };

    let mut emulator = Emulator::new(&config);

    let image = match loader::load_elf(&image_data, xlen, &mut emulator.cpu.memory) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("remu: '{}': {}", cli.file.display(), err);
            process::exit(1);
        }
    };
    if let Some(gp) = image.global_pointer {
        emulator.cpu.set_register(remu_core::isa::abi::REG_GP, gp);
    }

    if let Some(disk_path) = &cli.disk {
        match std::fs::read(disk_path) {
            Ok(data) => emulator.set_disk_image(data),
            Err(err) => {
                eprintln!("remu: cannot read disk '{}': {}", disk_path.display(), err);
                process::exit(1);
            }
        }
    }

    eprintln!(
        "[*] {} (RV{}), entry {:#x}",
        cli.file.display(),
        xlen.bits(),
        image.entry
    );

    match emulator.run(image.entry) {
        Ok(exit_value) => {
            println!("[*] exit value {}", exit_value);
            process::exit(0);
        }
        Err(err) => {
            eprintln!("remu: fatal: {}", err);
            process::exit(1);
        }
    }
}
