//! Borrowed record view over a raw byte buffer.
//!
//! Input bytes arrive fully resident (read or memory-mapped by the
//! caller); this module only imposes the fixed-width record structure on
//! them. Alignment is validated once at construction so the hot loops can
//! slice without bounds concern beyond the record index.
//!
//! # Invariants
//! - `bytes.len() % RECORD_WIDTH == 0` (checked in [`Records::new`];
//!   nothing is silently truncated).
//! - `code(i)` is the first [`KEY_WIDTH`] bytes of record `i`; the 2
//!   trailing bytes per record are never inspected.

use crate::error::CheckError;
use crate::key::{KEY_WIDTH, RECORD_WIDTH};

/// Read-only view of a buffer as a sequence of fixed-width records.
#[derive(Debug, Clone, Copy)]
pub struct Records<'a> {
    bytes: &'a [u8],
}

impl<'a> Records<'a> {
    /// Wraps `bytes` as a record sequence.
    ///
    /// Returns [`CheckError::UnalignedInput`] if the length is not a
    /// multiple of [`RECORD_WIDTH`]. A ragged tail is rejected outright
    /// rather than dropped.
    pub fn new(bytes: &'a [u8]) -> Result<Self, CheckError> {
        if bytes.len() % RECORD_WIDTH != 0 {
            return Err(CheckError::UnalignedInput { len: bytes.len() });
        }
        Ok(Self { bytes })
    }

    /// Number of records in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / RECORD_WIDTH
    }

    /// Whether the buffer holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The 6-byte code of record `record`.
    ///
    /// # Panics
    ///
    /// Panics if `record >= len()`.
    #[inline]
    pub fn code(&self, record: usize) -> &'a [u8; KEY_WIDTH] {
        let bytes = self.bytes;
        let start = record * RECORD_WIDTH;
        let slice = &bytes[start..start + KEY_WIDTH];
        // Infallible: the slice above is exactly KEY_WIDTH bytes.
        slice.try_into().expect("slice is KEY_WIDTH bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_buffer_is_accepted() {
        let buf = b"ABC123\r\nDEF456\r\n";
        let records = Records::new(buf).unwrap();
        assert_eq!(records.len(), 2);
        assert!(!records.is_empty());
        assert_eq!(records.code(0), b"ABC123");
        assert_eq!(records.code(1), b"DEF456");
    }

    #[test]
    fn empty_buffer_is_accepted() {
        let records = Records::new(b"").unwrap();
        assert_eq!(records.len(), 0);
        assert!(records.is_empty());
    }

    #[test]
    fn ragged_tail_is_rejected() {
        let buf = b"ABC123\r\nDEF4";
        match Records::new(buf) {
            Err(CheckError::UnalignedInput { len }) => assert_eq!(len, 12),
            other => panic!("expected UnalignedInput, got {other:?}"),
        }
    }

    #[test]
    #[should_panic]
    fn out_of_range_record_panics() {
        let records = Records::new(b"ABC123\r\n").unwrap();
        let _ = records.code(1);
    }
}
