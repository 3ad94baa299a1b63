//! Error types for the duplicate check.
//!
//! The check fails fast: malformed input and abnormal worker termination
//! abort the whole run with no partial result. The enum is
//! `#[non_exhaustive]` to allow adding variants without breaking callers;
//! consumers should include a fallback match arm.
//!
//! # Design Notes
//! - `InvalidKey` carries the record index and the offending byte so the
//!   caller can point at the exact corrupt input position.
//! - A worker panic is fatal to the whole check (the barrier would
//!   otherwise never complete); it is surfaced, never swallowed.

use std::fmt;

use crate::key::InvalidCode;

/// Errors from a single duplicate-check invocation.
#[derive(Debug)]
#[non_exhaustive]
pub enum CheckError {
    /// A record's key bytes fall outside `A..=Z` / `0..=9`.
    InvalidKey {
        /// Index of the malformed record.
        record: usize,
        /// Byte position within the 6-byte code (0-5).
        position: usize,
        /// The offending byte value.
        byte: u8,
    },
    /// Input length is not a multiple of the record width.
    UnalignedInput { len: usize },
    /// A worker thread panicked before completing its partition.
    WorkerPanic { worker: u8 },
    /// Configured worker count is outside `1..=MAX_WORKERS`.
    WorkerCountOutOfRange { requested: usize, max: usize },
}

impl CheckError {
    /// Creates an `InvalidKey` variant from a record index and the
    /// encoder's position/byte diagnosis.
    #[inline]
    pub(crate) fn invalid_key(record: usize, source: InvalidCode) -> Self {
        Self::InvalidKey {
            record,
            position: source.position,
            byte: source.byte,
        }
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey {
                record,
                position,
                byte,
            } => write!(
                f,
                "record {record}: invalid byte 0x{byte:02x} at code position {position}"
            ),
            Self::UnalignedInput { len } => write!(
                f,
                "input length {len} is not a multiple of the record width"
            ),
            Self::WorkerPanic { worker } => {
                write!(f, "worker {worker} panicked before finishing its partition")
            }
            Self::WorkerCountOutOfRange { requested, max } => {
                write!(f, "worker count {requested} out of range (1..={max})")
            }
        }
    }
}

impl std::error::Error for CheckError {}
