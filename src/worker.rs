//! Per-partition worker protocol: mark, rendezvous, verify.
//!
//! Each worker runs the same two-pass state machine over its assigned
//! record range:
//!
//! 1. **Mark** — encode every record's key and write the worker's own id
//!    into the presence table at that key.
//! 2. **Rendezvous** — publish arrival, then wait for all workers.
//! 3. **Verify** — re-read every one of its keys; a foreign owner id
//!    means some other record mapped to the same key, i.e. a duplicate.
//!
//! Marking is unconditional and overwriting: after the barrier, each
//! contested cell holds the id of whichever worker wrote last. At most
//! one contributor can then see itself there, so every other contributor
//! reports the duplicate in verify. A key seen exactly once across all
//! partitions is only ever written by its own worker, so verify cannot
//! produce a false positive.
//!
//! Verify is blind to one case: both occurrences of a key inside the
//! *same* partition leave the worker's own id in the cell, which verifies
//! as a clean self-match. The mark phase therefore checks the previous
//! owner under both policies — strict aborts on any previous owner, lazy
//! only on its own id.
//!
//! The keys computed during marking are cached in a per-worker scratch
//! vector and replayed in verify, so each record is encoded once.
//!
//! # Exit discipline
//!
//! The barrier arrival must happen exactly once on *every* path out of
//! the mark phase — normal completion, strict-policy early abort, and
//! encoding failure — otherwise sibling workers spin forever. Unwinds are
//! covered by a drop guard that poisons the barrier instead.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::barrier::SpinBarrier;
use crate::key::{self, InvalidCode};
use crate::presence::PresenceTable;
use crate::records::Records;

/// Sentinel for the first-duplicate slot: no duplicate recorded yet.
/// Outside the key domain, so it can never collide with a real key.
pub(crate) const NO_DUPLICATE: u32 = u32::MAX;

/// Intra-partition duplicate handling during the mark phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkPolicy {
    /// Abort the worker as soon as a mark lands on an already-marked
    /// cell. Catches intra-partition duplicates before the barrier.
    Strict,
    /// Overwrite and keep marking; cross-worker detection is deferred to
    /// the verify phase. A cell already carrying the worker's own id
    /// still stops the pass: both occurrences would verify as
    /// self-consistent, so the mark phase is the only place an
    /// intra-partition duplicate is visible.
    Lazy,
}

/// Worker-stage failures. The orchestrator maps these onto the public
/// error type.
#[derive(Debug)]
pub(crate) enum WorkerError {
    /// A record in this worker's partition failed key encoding.
    Key { record: usize, source: InvalidCode },
    /// A sibling worker unwound before arriving; this run is void.
    Poisoned { worker: u8 },
}

/// Shared state for one check invocation, borrowed by every worker.
pub(crate) struct SharedState<'a> {
    pub records: Records<'a>,
    pub table: &'a PresenceTable,
    pub barrier: &'a SpinBarrier,
    /// Monotonic within a run: set by any worker, never cleared.
    pub duplicate_found: &'a AtomicBool,
    /// CAS-once slot holding the key of the first duplicate observed.
    pub first_duplicate: &'a AtomicU32,
}

impl SharedState<'_> {
    /// Raises the duplicate flag and records `key` if it is the first.
    fn report_duplicate(&self, dup_key: u32) {
        self.duplicate_found.store(true, Ordering::Release);
        // First reporter wins; later duplicates keep the original key.
        let _ = self.first_duplicate.compare_exchange(
            NO_DUPLICATE,
            dup_key,
            Ordering::AcqRel,
            Ordering::Relaxed,
        );
    }
}

/// Poisons the barrier if the worker unwinds before arriving.
struct ArrivalGuard<'a> {
    barrier: &'a SpinBarrier,
    worker: u8,
}

impl<'a> ArrivalGuard<'a> {
    fn new(barrier: &'a SpinBarrier, worker: u8) -> Self {
        Self { barrier, worker }
    }

    /// Publishes arrival and disarms the guard.
    fn arrive(self) {
        self.barrier.arrive(self.worker);
        std::mem::forget(self);
    }
}

impl Drop for ArrivalGuard<'_> {
    fn drop(&mut self) {
        // Reached only on unwind: release the siblings with an error
        // instead of deadlocking them.
        self.barrier.poison(self.worker);
    }
}

/// Runs the full worker protocol for one partition.
///
/// Returns `Ok(())` whether or not a duplicate was found — duplicates are
/// reported through the shared flag, not the return value. `Err` means
/// the run as a whole is invalid.
pub(crate) fn run(
    shared: &SharedState<'_>,
    worker: u8,
    range: Range<usize>,
    policy: MarkPolicy,
) -> Result<(), WorkerError> {
    let mut keys: Vec<u32> = Vec::with_capacity(range.len());
    let guard = ArrivalGuard::new(shared.barrier, worker);

    // Mark phase.
    for record in range {
        let dup_key = match key::encode(shared.records.code(record)) {
            Ok(k) => k,
            Err(source) => {
                guard.arrive();
                return Err(WorkerError::Key { record, source });
            }
        };
        keys.push(dup_key);
        match policy {
            MarkPolicy::Strict => {
                // Any previous owner — foreign or our own earlier record —
                // proves a duplicate; the cell now carries our id either way.
                if shared.table.claim(dup_key as usize, worker).is_some() {
                    shared.report_duplicate(dup_key);
                    guard.arrive();
                    return Ok(());
                }
            }
            MarkPolicy::Lazy => {
                // A foreign previous owner may be a transient race and is
                // left to the verify phase. Our own id can only mean an
                // earlier record of this partition hit the same key, and
                // verify cannot distinguish that from a clean self-match.
                if shared.table.claim(dup_key as usize, worker) == Some(worker) {
                    shared.report_duplicate(dup_key);
                    guard.arrive();
                    return Ok(());
                }
            }
        }
    }

    // Rendezvous: every mark must land before anyone verifies.
    guard.arrive();
    shared
        .barrier
        .wait()
        .map_err(|p| WorkerError::Poisoned { worker: p.worker })?;

    // Verify phase: a foreign owner on any of our keys means another
    // record collided with it after we marked.
    for dup_key in keys {
        if shared.table.owner(dup_key as usize) != Some(worker) {
            shared.report_duplicate(dup_key);
            return Ok(());
        }
    }
    Ok(())
}
