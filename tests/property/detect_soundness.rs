//! Property tests for end-to-end duplicate detection.
//!
//! The check must agree with a naive set-based oracle for every worker
//! count and both mark policies: no false negatives, no false positives,
//! and the same boolean regardless of concurrency.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use proptest::prelude::*;

use dupscan_rs::key::RECORD_WIDTH;
use dupscan_rs::{Checker, Config};

/// One shared checker: the table allocation is the dominant cost, and
/// proptest runs cases sequentially.
fn checker() -> &'static Mutex<Checker> {
    static CHECKER: OnceLock<Mutex<Checker>> = OnceLock::new();
    CHECKER.get_or_init(|| Mutex::new(Checker::new()))
}

fn code_strategy() -> impl Strategy<Value = [u8; 6]> {
    // A deliberately small code space so random inputs actually collide.
    (
        b'A'..=b'C',
        b'A'..=b'B',
        b'A'..=b'B',
        b'0'..=b'2',
        b'0'..=b'1',
        b'0'..=b'1',
    )
        .prop_map(|(a, b, c, d, e, f)| [a, b, c, d, e, f])
}

fn buffer_from(codes: &[[u8; 6]]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(codes.len() * RECORD_WIDTH);
    for code in codes {
        bytes.extend_from_slice(code);
        bytes.extend_from_slice(b"\r\n");
    }
    bytes
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn matches_oracle_for_all_worker_counts(codes in prop::collection::vec(code_strategy(), 0..48)) {
        let bytes = buffer_from(&codes);
        let mut seen = HashSet::new();
        let expect_duplicate = codes.iter().any(|code| !seen.insert(*code));

        let mut checker = checker().lock().unwrap();
        for worker_count in [1, 2, 3, 8] {
            for strict in [true, false] {
                let config = Config {
                    worker_count,
                    strict_intra_partition_check: strict,
                };
                let outcome = checker.run(&bytes, &config).unwrap();
                prop_assert_eq!(
                    outcome.duplicate_found,
                    expect_duplicate,
                    "workers={} strict={}",
                    worker_count,
                    strict
                );
                // The reported key must itself be a real duplicate.
                if let Some(reported) = outcome.first_duplicate {
                    let occurrences = codes.iter().filter(|c| **c == reported).count();
                    prop_assert!(occurrences >= 2, "reported key occurs {} times", occurrences);
                }
            }
        }
    }

    #[test]
    fn idempotent_across_repeated_runs(codes in prop::collection::vec(code_strategy(), 0..32)) {
        let bytes = buffer_from(&codes);
        let config = Config::default();
        let mut checker = checker().lock().unwrap();
        let first = checker.run(&bytes, &config).unwrap().duplicate_found;
        let second = checker.run(&bytes, &config).unwrap().duplicate_found;
        prop_assert_eq!(first, second);
    }
}
