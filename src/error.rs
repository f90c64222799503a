//! Error types
//!
//! Every failure in the harness is fatal: a syscall that fails mid-trial
//! invalidates the measurement, so components return an [`Error`] and the
//! binary turns any error into a diagnostic plus a non-zero exit code.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing path, size mismatch, invalid settings
    Configuration,
    /// A syscall (open/seek/read/write/mmap/munmap/msync/close) failed
    Syscall,
    /// Input rejected before computation (empty samples, bad unit size)
    Precondition,
    /// The page cache could not be warmed or inspected
    CacheState,
}

/// Errors produced by the harness
#[derive(Error, Debug)]
pub enum Error {
    // The OS message is part of the display text, so there is no source chain
    #[error("{op}: {error}")]
    Syscall { op: &'static str, error: io::Error },

    #[error("{op}: transferred {actual} of {expected} bytes at offset {offset}")]
    ShortTransfer {
        op: &'static str,
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("{}: size is {actual} bytes, expected {expected}", path.display())]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("{}: only {resident} of {expected} bytes resident in page cache after warm-up", path.display())]
    NotResident {
        path: PathBuf,
        resident: u64,
        expected: u64,
    },

    #[error("cache inspector '{tool}' unavailable: {error}")]
    InspectorUnavailable { tool: String, error: io::Error },

    #[error("cache inspector '{tool}' exited with {status}: {stderr}")]
    InspectorFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("cache inspector '{tool}' produced unrecognised output: {output:?}")]
    InspectorOutput { tool: String, output: String },

    #[error("offset {offset} is outside the {len}-byte region")]
    OffsetOutOfRange { offset: u64, len: u64 },

    #[error("unit size {unit_size} must be non-zero and divide file size {file_size}")]
    InvalidUnitSize { unit_size: u64, file_size: u64 },

    #[error("position sequence uses unit size {actual}, experiment expects {expected}")]
    UnitSizeMismatch { expected: u64, actual: u64 },

    #[error("cannot summarize an empty sample set")]
    EmptySamples,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Build a [`Error::Syscall`] from `errno` of the call that just failed
    pub fn last_os_error(op: &'static str) -> Self {
        Error::Syscall {
            op,
            error: io::Error::last_os_error(),
        }
    }

    /// Build a [`Error::Syscall`] from an existing IO error
    pub fn syscall(op: &'static str, error: io::Error) -> Self {
        Error::Syscall { op, error }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Syscall { .. } | Error::ShortTransfer { .. } => ErrorKind::Syscall,
            Error::SizeMismatch { .. } | Error::Config(_) => ErrorKind::Configuration,
            Error::OffsetOutOfRange { .. }
            | Error::InvalidUnitSize { .. }
            | Error::UnitSizeMismatch { .. }
            | Error::EmptySamples => ErrorKind::Precondition,
            Error::NotResident { .. }
            | Error::InspectorUnavailable { .. }
            | Error::InspectorFailed { .. }
            | Error::InspectorOutput { .. } => ErrorKind::CacheState,
        }
    }

    /// Name of the failing operation, if this error came from a syscall
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Error::Syscall { op, .. } | Error::ShortTransfer { op, .. } => Some(op),
            _ => None,
        }
    }
}
