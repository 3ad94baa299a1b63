//! Contiguous record-range partitioning across workers.
//!
//! Splits `[0, record_count)` into `worker_count` contiguous ranges, one
//! per worker. Each range has `⌊R/W⌋` records except the last, which
//! absorbs the remainder. Purely arithmetic and deterministic given
//! `(R, W)`.
//!
//! # Invariants
//! - Ranges are contiguous, non-overlapping, and cover `[0, R)` exactly.
//! - `partitions(r, w).len() == w` for every `w >= 1`.
//! - When `w > r` some leading ranges are empty; the orchestrator clamps
//!   the worker count to the record count so this does not arise in
//!   practice, but the formula stays total.

use std::ops::Range;

/// Splits `record_count` records into `worker_count` contiguous ranges.
///
/// # Panics
///
/// Panics if `worker_count` is zero.
pub fn partitions(record_count: usize, worker_count: usize) -> Vec<Range<usize>> {
    assert!(worker_count > 0, "worker_count must be > 0");
    let per_worker = record_count / worker_count;
    let mut ranges = Vec::with_capacity(worker_count);
    for worker in 0..worker_count {
        let start = worker * per_worker;
        let end = if worker + 1 == worker_count {
            record_count
        } else {
            start + per_worker
        };
        ranges.push(start..end);
    }
    ranges
}
