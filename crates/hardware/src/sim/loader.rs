//! Program Loader.
//!
//! Populates the sparse memory store from a statically linked RISC-V ELF
//! executable (or a raw flat binary) and reports the numbers the core needs
//! to start: the entry point and, when the image carries one, the
//! conventional global-pointer symbol.

use std::fs;
use std::path::Path;

use object::{Architecture, Object, ObjectSegment, ObjectSymbol};

use crate::common::EmulatorError;
use crate::config::Xlen;
use crate::soc::memory::SparseMemory;

/// The numbers a loaded image hands to the core.
#[derive(Clone, Copy, Debug)]
pub struct LoadedImage {
    /// Entry point from the image header (or the load base for flat images).
    pub entry: u64,
    /// Address of the `__global_pointer$` symbol, when present.
    pub global_pointer: Option<u64>,
}

/// Returns the datapath width an ELF image was linked for.
pub fn detect_xlen(data: &[u8]) -> Result<Xlen, EmulatorError> {
    let file = object::File::parse(data)?;
    match file.architecture() {
        Architecture::Riscv32 => Ok(Xlen::Rv32),
        Architecture::Riscv64 => Ok(Xlen::Rv64),
        other => Err(EmulatorError::WrongArchitecture {
            found: format!("{:?}", other),
            expected: "Riscv32 or Riscv64".to_string(),
        }),
    }
}

/// Parses an ELF image and copies its segments into physical memory.
pub fn load_elf(
    data: &[u8],
    xlen: Xlen,
    mem: &mut SparseMemory,
) -> Result<LoadedImage, EmulatorError> {
    let file = object::File::parse(data)?;

    let expected = match xlen {
        Xlen::Rv32 => Architecture::Riscv32,
        Xlen::Rv64 => Architecture::Riscv64,
    };
    if file.architecture() != expected {
        return Err(EmulatorError::WrongArchitecture {
            found: format!("{:?}", file.architecture()),
            expected: format!("{:?}", expected),
        });
    }

    for segment in file.segments() {
        let bytes = segment.data()?;
        if !bytes.is_empty() {
            mem.write_bytes(segment.address(), bytes);
        }
    }

    let global_pointer = file
        .symbols()
        .find(|sym| sym.name() == Ok("__global_pointer$"))
        .map(|sym| sym.address());

    Ok(LoadedImage {
        entry: file.entry(),
        global_pointer,
    })
}

/// Reads and loads an ELF executable from disk.
pub fn load_elf_file(
    path: &Path,
    xlen: Xlen,
    mem: &mut SparseMemory,
) -> Result<LoadedImage, EmulatorError> {
    let data = fs::read(path)?;
    load_elf(&data, xlen, mem)
}

/// Copies a raw flat binary to `base`; the entry point is the base itself.
pub fn load_flat(data: &[u8], base: u64, mem: &mut SparseMemory) -> LoadedImage {
    mem.write_bytes(base, data);
    LoadedImage {
        entry: base,
        global_pointer: None,
    }
}
