//! Mixed-radix perfect-hash key encoding for fixed-width records.
//!
//! A record's identity is its 6-byte code: 3 uppercase ASCII letters
//! followed by 3 ASCII digits. [`encode`] maps a well-formed code to a
//! dense integer in `[0, KEY_SPACE)` using digit weights
//! `[26²·1000, 26·1000, 1000, 100, 10, 1]`; [`decode`] is its exact
//! inverse. The pair is a bijection over the well-formed domain, which is
//! what lets the presence table be a flat array instead of a hash table.
//!
//! # Invariants
//! - `encode(c).unwrap() < KEY_SPACE` for every well-formed `c`.
//! - `decode(encode(c)) == c` and `encode(&decode(k)) == Ok(k)` over the
//!   full domain.
//! - Malformed bytes are rejected with [`InvalidCode`]; no out-of-range
//!   index can ever reach the presence table.

use std::fmt;

/// Bytes of a record that carry identity (3 letters + 3 digits).
pub const KEY_WIDTH: usize = 6;

/// Total bytes per record: the 6-byte code plus 2 trailing bytes
/// (typically `\r\n`).
pub const RECORD_WIDTH: usize = 8;

/// Number of distinct keys: `26³ × 10³`.
pub const KEY_SPACE: u32 = 17_576_000;

/// Positional weights for the three letter bytes.
const LETTER_WEIGHTS: [u32; 3] = [26 * 26 * 1000, 26 * 1000, 1000];

/// Positional weights for the three digit bytes.
const DIGIT_WEIGHTS: [u32; 3] = [100, 10, 1];

/// A code byte outside its expected range (`A..=Z` for positions 0-2,
/// `0..=9` for positions 3-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCode {
    /// Byte position within the code (0-5).
    pub position: usize,
    /// The offending byte value.
    pub byte: u8,
}

impl fmt::Display for InvalidCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid byte 0x{:02x} at code position {}",
            self.byte, self.position
        )
    }
}

impl std::error::Error for InvalidCode {}

/// Encodes a 6-byte code into its dense key.
///
/// Returns `Err(InvalidCode)` on the first byte outside its expected
/// range. Pure and deterministic: any caller can re-derive the same key
/// from the same bytes.
#[inline]
pub fn encode(code: &[u8; KEY_WIDTH]) -> Result<u32, InvalidCode> {
    let mut key = 0u32;
    for (position, &byte) in code[..3].iter().enumerate() {
        if !byte.is_ascii_uppercase() {
            return Err(InvalidCode { position, byte });
        }
        key += u32::from(byte - b'A') * LETTER_WEIGHTS[position];
    }
    for (offset, &byte) in code[3..].iter().enumerate() {
        if !byte.is_ascii_digit() {
            return Err(InvalidCode {
                position: offset + 3,
                byte,
            });
        }
        key += u32::from(byte - b'0') * DIGIT_WEIGHTS[offset];
    }
    debug_assert!(key < KEY_SPACE);
    Ok(key)
}

/// Decodes a key back into its original 6-byte code.
///
/// Inverse of [`encode`]; used for duplicate reporting and round-trip
/// tests.
///
/// # Panics
///
/// Panics if `key >= KEY_SPACE`.
#[inline]
pub fn decode(key: u32) -> [u8; KEY_WIDTH] {
    assert!(key < KEY_SPACE, "key out of domain");
    let letters = key / 1000;
    let digits = key % 1000;
    [
        b'A' + (letters / (26 * 26)) as u8,
        b'A' + (letters / 26 % 26) as u8,
        b'A' + (letters % 26) as u8,
        b'0' + (digits / 100) as u8,
        b'0' + (digits / 10 % 10) as u8,
        b'0' + (digits % 10) as u8,
    ]
}
