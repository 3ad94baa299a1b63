//! Property tests for the record partitioner.
//!
//! For any `(record_count, worker_count)` the ranges must be contiguous,
//! non-overlapping, cover every record exactly once, and be stable across
//! calls.

use proptest::prelude::*;

use dupscan_rs::partition::partitions;

proptest! {
    #[test]
    fn covering_and_contiguous(record_count in 0usize..100_000, worker_count in 1usize..255) {
        let ranges = partitions(record_count, worker_count);
        prop_assert_eq!(ranges.len(), worker_count);

        let mut next = 0usize;
        let mut total = 0usize;
        for range in &ranges {
            prop_assert_eq!(range.start, next, "gap or overlap at {}", next);
            prop_assert!(range.start <= range.end);
            total += range.end - range.start;
            next = range.end;
        }
        prop_assert_eq!(next, record_count);
        prop_assert_eq!(total, record_count, "sizes must sum to the record count");
    }

    #[test]
    fn all_but_last_have_floor_size(record_count in 0usize..100_000, worker_count in 1usize..255) {
        let ranges = partitions(record_count, worker_count);
        let floor = record_count / worker_count;
        for range in &ranges[..worker_count - 1] {
            prop_assert_eq!(range.end - range.start, floor);
        }
        let last = &ranges[worker_count - 1];
        prop_assert_eq!(last.end - last.start, floor + record_count % worker_count);
    }

    #[test]
    fn deterministic(record_count in 0usize..100_000, worker_count in 1usize..255) {
        prop_assert_eq!(
            partitions(record_count, worker_count),
            partitions(record_count, worker_count)
        );
    }
}
