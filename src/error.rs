//! Error types for the loader, executor and driver.
//!
//! Follows the teacher's pattern of one `thiserror`-derived enum per
//! concern, glued together with `From` impls so `?` composes cleanly
//! up to `main`.

use std::io;
use thiserror::Error;

/// Errors that abort loading the memory image, before simulation
/// begins (spec.md §7.1).
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("malformed address directive {0:?}")]
    BadAddress(String),
    #[error("byte value {0:?} is out of range 0..=255")]
    ByteOutOfRange(String),
    #[error("I/O error reading image: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while executing an already-loaded image (spec.md §7.3).
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("unknown instruction opcode 0b{opcode:07b} (0x{opcode:02x}) at pc = 0x{pc:08x}")]
    UnknownOpcode { opcode: u32, pc: u32 },
    #[error("address 0x{addr:08x} is outside the 32 KiB memory region")]
    AddressOutOfRange { addr: u32 },
}

/// Top-level error type `main` matches on to choose an exit code.
#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
