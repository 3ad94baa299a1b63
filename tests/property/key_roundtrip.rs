//! Property tests for the perfect-hash key bijection.
//!
//! Encoding any well-formed code and decoding the result must reproduce
//! the code exactly; every malformed byte must be rejected with its
//! position.

use proptest::prelude::*;

use dupscan_rs::key::{decode, encode, KEY_SPACE, KEY_WIDTH};

fn well_formed_code() -> impl Strategy<Value = [u8; KEY_WIDTH]> {
    (
        b'A'..=b'Z',
        b'A'..=b'Z',
        b'A'..=b'Z',
        b'0'..=b'9',
        b'0'..=b'9',
        b'0'..=b'9',
    )
        .prop_map(|(a, b, c, d, e, f)| [a, b, c, d, e, f])
}

proptest! {
    #[test]
    fn encode_decode_roundtrip(code in well_formed_code()) {
        let key = encode(&code).expect("well-formed code must encode");
        prop_assert!(key < KEY_SPACE);
        prop_assert_eq!(decode(key), code);
    }

    #[test]
    fn decode_encode_roundtrip(key in 0..KEY_SPACE) {
        let code = decode(key);
        prop_assert_eq!(encode(&code), Ok(key));
    }

    #[test]
    fn distinct_codes_get_distinct_keys(a in well_formed_code(), b in well_formed_code()) {
        let ka = encode(&a).unwrap();
        let kb = encode(&b).unwrap();
        prop_assert_eq!(a == b, ka == kb, "bijection: keys equal iff codes equal");
    }

    /// Corrupting any single position of a well-formed code with an
    /// out-of-range byte must be rejected at that position.
    #[test]
    fn corrupted_byte_is_rejected(
        code in well_formed_code(),
        position in 0usize..KEY_WIDTH,
        byte in any::<u8>(),
    ) {
        let valid = if position < 3 {
            byte.is_ascii_uppercase()
        } else {
            byte.is_ascii_digit()
        };
        prop_assume!(!valid);

        let mut corrupted = code;
        corrupted[position] = byte;
        let err = encode(&corrupted).expect_err("corrupted code must not encode");
        // Earlier positions may also be corrupt only if we corrupted them;
        // here exactly one byte changed, so the report must name it.
        prop_assert_eq!(err.position, position);
        prop_assert_eq!(err.byte, byte);
    }
}
