//! Orchestration of one duplicate-check invocation.
//!
//! The [`Checker`] owns the presence table and nothing else survives an
//! invocation: barrier, duplicate flag, and first-duplicate slot are
//! stack-local per run and shared with workers by reference through
//! `thread::scope`. Independent [`Checker`] instances can therefore run
//! concurrently, and one instance can run repeatedly (the table is reset
//! between runs while no worker is live).
//!
//! Workers are joined before any result is read; a panicked worker fails
//! the whole check with [`CheckError::WorkerPanic`].

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;

use crate::barrier::SpinBarrier;
use crate::error::CheckError;
use crate::key::{self, KEY_WIDTH};
use crate::partition::partitions;
use crate::presence::{PresenceTable, MAX_OWNERS};
use crate::records::Records;
use crate::worker::{self, MarkPolicy, SharedState, WorkerError, NO_DUPLICATE};

/// Most workers a single check can run: owner ids live in one byte with
/// one sentinel value reserved.
pub const MAX_WORKERS: usize = MAX_OWNERS;

/// Tuning knobs for a check invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of parallel workers (`1..=MAX_WORKERS`). Clamped down to
    /// the record count so no partition is empty.
    pub worker_count: usize,
    /// Abort a worker's mark pass on any previously marked cell
    /// (strict), or only on a cell the worker itself already owns,
    /// leaving cross-worker detection to the verify pass (lazy). Either
    /// way the result is the same; strict merely exits earlier on
    /// duplicate-heavy input.
    pub strict_intra_partition_check: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_count: 8,
            strict_intra_partition_check: true,
        }
    }
}

/// Result of a completed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Whether any two records share a key.
    pub duplicate_found: bool,
    /// The 6-byte code of the first duplicate observed, if any. Which of
    /// several duplicates is "first" depends on scheduling; the flag
    /// itself does not.
    pub first_duplicate: Option<[u8; KEY_WIDTH]>,
}

impl Outcome {
    fn clean() -> Self {
        Self {
            duplicate_found: false,
            first_duplicate: None,
        }
    }
}

/// Reusable duplicate checker holding the presence table.
///
/// Allocating the table is the expensive part of a run (~17.6 MB), so
/// callers checking many buffers should reuse one `Checker`.
#[derive(Debug)]
pub struct Checker {
    table: PresenceTable,
}

impl Checker {
    /// Creates a checker with a full-domain presence table.
    pub fn new() -> Self {
        Self {
            table: PresenceTable::for_key_space(),
        }
    }

    /// Checks `bytes` for duplicate record keys.
    ///
    /// Takes `&mut self` because the run resets and then owns the table;
    /// the borrow checker enforces the no-concurrent-runs contract of
    /// [`PresenceTable::reset`].
    pub fn run(&mut self, bytes: &[u8], config: &Config) -> Result<Outcome, CheckError> {
        if config.worker_count == 0 || config.worker_count > MAX_WORKERS {
            return Err(CheckError::WorkerCountOutOfRange {
                requested: config.worker_count,
                max: MAX_WORKERS,
            });
        }
        let records = Records::new(bytes)?;
        if records.is_empty() {
            return Ok(Outcome::clean());
        }
        self.table.reset();

        let worker_count = config.worker_count.min(records.len());
        let ranges = partitions(records.len(), worker_count);
        let barrier = SpinBarrier::new(worker_count);
        let duplicate_found = AtomicBool::new(false);
        let first_duplicate = AtomicU32::new(NO_DUPLICATE);
        let policy = if config.strict_intra_partition_check {
            MarkPolicy::Strict
        } else {
            MarkPolicy::Lazy
        };
        let shared = SharedState {
            records,
            table: &self.table,
            barrier: &barrier,
            duplicate_found: &duplicate_found,
            first_duplicate: &first_duplicate,
        };

        let results: Vec<thread::Result<Result<(), WorkerError>>> = thread::scope(|s| {
            let handles: Vec<_> = ranges
                .into_iter()
                .enumerate()
                .map(|(worker, range)| {
                    let shared = &shared;
                    s.spawn(move || worker::run(shared, worker as u8, range, policy))
                })
                .collect();
            handles.into_iter().map(|h| h.join()).collect()
        });

        // Panics first: they void the run and explain any poison errors.
        for (worker, result) in results.iter().enumerate() {
            if result.is_err() {
                return Err(CheckError::WorkerPanic {
                    worker: worker as u8,
                });
            }
        }
        // Then encoding failures, lowest record index first so the report
        // is deterministic regardless of worker interleaving.
        let mut key_failure: Option<(usize, key::InvalidCode)> = None;
        for result in &results {
            match result {
                Ok(Err(WorkerError::Key { record, source })) => {
                    if key_failure.map_or(true, |(prev, _)| *record < prev) {
                        key_failure = Some((*record, *source));
                    }
                }
                Ok(Err(WorkerError::Poisoned { worker })) => {
                    // Poison without a corresponding join failure cannot
                    // happen (only the unwind path poisons), but surface
                    // it rather than trust that reasoning forever.
                    return Err(CheckError::WorkerPanic { worker: *worker });
                }
                _ => {}
            }
        }
        if let Some((record, source)) = key_failure {
            return Err(CheckError::invalid_key(record, source));
        }

        let first = first_duplicate.load(Ordering::Acquire);
        Ok(Outcome {
            duplicate_found: duplicate_found.load(Ordering::Acquire),
            first_duplicate: (first != NO_DUPLICATE).then(|| key::decode(first)),
        })
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot convenience: allocates a fresh [`Checker`] and runs it once.
pub fn find_duplicates(bytes: &[u8], config: &Config) -> Result<Outcome, CheckError> {
    Checker::new().run(bytes, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(codes: &[&str]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for code in codes {
            bytes.extend_from_slice(code.as_bytes());
            bytes.extend_from_slice(b"\r\n");
        }
        bytes
    }

    #[test]
    fn empty_input_is_clean() {
        let outcome = find_duplicates(b"", &Config::default()).unwrap();
        assert_eq!(outcome, Outcome::clean());
    }

    #[test]
    fn worker_count_bounds_are_enforced() {
        let bytes = buffer(&["ABC123"]);
        for worker_count in [0, MAX_WORKERS + 1] {
            let config = Config {
                worker_count,
                ..Config::default()
            };
            match find_duplicates(&bytes, &config) {
                Err(CheckError::WorkerCountOutOfRange { requested, max }) => {
                    assert_eq!(requested, worker_count);
                    assert_eq!(max, MAX_WORKERS);
                }
                other => panic!("expected range error, got {other:?}"),
            }
        }
    }

    #[test]
    fn worker_count_clamps_to_record_count() {
        // 2 records, 8 workers requested: must still work (and be clean).
        let bytes = buffer(&["ABC123", "DEF456"]);
        let config = Config {
            worker_count: 8,
            ..Config::default()
        };
        let outcome = find_duplicates(&bytes, &config).unwrap();
        assert!(!outcome.duplicate_found);
    }

    #[test]
    fn unaligned_input_is_rejected() {
        match find_duplicates(b"ABC123\r\nDEF", &Config::default()) {
            Err(CheckError::UnalignedInput { len }) => assert_eq!(len, 11),
            other => panic!("expected UnalignedInput, got {other:?}"),
        }
    }

    #[test]
    fn invalid_key_reports_lowest_record() {
        // Two malformed records in different partitions; the report must
        // name the lower index whichever worker finishes first.
        let bytes = buffer(&["ABC123", "A?C123", "DEF456", "D?F456"]);
        let config = Config {
            worker_count: 2,
            strict_intra_partition_check: false,
        };
        match find_duplicates(&bytes, &config) {
            Err(CheckError::InvalidKey {
                record,
                position,
                byte,
            }) => {
                assert_eq!(record, 1);
                assert_eq!(position, 1);
                assert_eq!(byte, b'?');
            }
            other => panic!("expected InvalidKey, got {other:?}"),
        }
    }

    #[test]
    fn checker_is_reusable_and_idempotent() {
        let mut checker = Checker::new();
        let dup = buffer(&["ABC123", "ABC123"]);
        let clean = buffer(&["ABC123", "DEF456"]);
        let config = Config::default();

        assert!(checker.run(&dup, &config).unwrap().duplicate_found);
        // Stale marks from the previous run must not leak into this one.
        assert!(!checker.run(&clean, &config).unwrap().duplicate_found);
        assert!(checker.run(&dup, &config).unwrap().duplicate_found);
    }

    #[test]
    fn first_duplicate_is_decoded() {
        let bytes = buffer(&["QRS507", "QRS507"]);
        let outcome = find_duplicates(&bytes, &Config::default()).unwrap();
        assert!(outcome.duplicate_found);
        assert_eq!(outcome.first_duplicate, Some(*b"QRS507"));
    }
}
