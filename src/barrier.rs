//! Spin rendezvous separating the mark phase from the verify phase.
//!
//! Every worker publishes its arrival exactly once; no worker leaves
//! [`SpinBarrier::wait`] until all arrivals are visible. Waiting spins
//! briefly then yields the scheduler (crossbeam's `Backoff`), so a full
//! complement of workers on few cores still makes progress.
//!
//! # Ordering rationale
//!
//! ```text
//! Worker stores marks (Relaxed), then Release-stores its arrival slot
//!   →  waiter Acquire-loads every slot, then reads marked cells
//! ```
//!
//! This establishes happens-before between every worker's marks and every
//! worker's verify reads — the visibility requirement the whole
//! correctness argument rests on. The presence table itself can then stay
//! `Relaxed`.
//!
//! # Poisoning
//!
//! A worker that unwinds before arriving poisons its slot instead. Waiters
//! observe the poisoned slot and bail out with [`BarrierPoisoned`] rather
//! than spinning forever. There is deliberately no wall-clock timeout:
//! yield-based waiting has no timing-dependent behavior to tune, and the
//! only non-arrival cause — abnormal worker termination — is covered by
//! poisoning.

#[cfg(loom)]
use loom::sync::atomic::{AtomicU8, Ordering};
#[cfg(not(loom))]
use std::sync::atomic::{AtomicU8, Ordering};

use std::fmt;

#[cfg(not(loom))]
use crossbeam_utils::Backoff;
use crossbeam_utils::CachePadded;

/// Slot states. A slot moves PENDING → ARRIVED (normal) or
/// PENDING → POISONED (unwind before arrival); never backwards within a
/// run.
const PENDING: u8 = 0;
const ARRIVED: u8 = 1;
const POISONED: u8 = 2;

/// A waiter observed a poisoned slot: that worker terminated abnormally
/// before finishing its mark phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierPoisoned {
    /// Id of the worker whose slot is poisoned.
    pub worker: u8,
}

impl fmt::Display for BarrierPoisoned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "barrier poisoned by worker {}", self.worker)
    }
}

impl std::error::Error for BarrierPoisoned {}

/// All-to-all rendezvous over per-worker arrival slots.
///
/// Slots are cache-line padded: each worker Release-stores its own slot
/// while every worker polls all of them, and padding keeps the stores
/// from invalidating each other's lines.
pub struct SpinBarrier {
    slots: Box<[CachePadded<AtomicU8>]>,
}

impl fmt::Debug for SpinBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinBarrier")
            .field("workers", &self.slots.len())
            .finish()
    }
}

impl SpinBarrier {
    /// Creates a barrier for `worker_count` workers, all slots pending.
    ///
    /// # Panics
    ///
    /// Panics if `worker_count` is zero.
    pub fn new(worker_count: usize) -> Self {
        assert!(worker_count > 0, "SpinBarrier requires worker_count > 0");
        let mut slots = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            slots.push(CachePadded::new(AtomicU8::new(PENDING)));
        }
        Self {
            slots: slots.into_boxed_slice(),
        }
    }

    /// Number of workers the barrier rendezvouses.
    #[inline]
    pub fn worker_count(&self) -> usize {
        self.slots.len()
    }

    /// Publishes `worker`'s arrival. Must be called exactly once per
    /// worker per run, after all of that worker's marks.
    ///
    /// # Panics
    ///
    /// Panics (debug) if the slot was not pending.
    #[inline]
    pub fn arrive(&self, worker: u8) {
        let prev = self.slots[worker as usize].swap(ARRIVED, Ordering::Release);
        debug_assert_eq!(prev, PENDING, "worker {worker} arrived twice");
    }

    /// Marks `worker`'s slot poisoned, releasing any waiters with an
    /// error. Called from the unwind path only.
    #[inline]
    pub fn poison(&self, worker: u8) {
        self.slots[worker as usize].store(POISONED, Ordering::Release);
    }

    /// Blocks until every slot is arrived, yielding between polls.
    ///
    /// Returns `Err(BarrierPoisoned)` as soon as any poisoned slot is
    /// observed.
    pub fn wait(&self) -> Result<(), BarrierPoisoned> {
        #[cfg(not(loom))]
        let backoff = Backoff::new();
        loop {
            let mut all_arrived = true;
            for (worker, slot) in self.slots.iter().enumerate() {
                match slot.load(Ordering::Acquire) {
                    ARRIVED => {}
                    POISONED => {
                        return Err(BarrierPoisoned {
                            worker: worker as u8,
                        })
                    }
                    _ => {
                        all_arrived = false;
                        break;
                    }
                }
            }
            if all_arrived {
                return Ok(());
            }
            #[cfg(loom)]
            loom::thread::yield_now();
            #[cfg(not(loom))]
            backoff.snooze();
        }
    }

}

// ---------------------------------------------------------------------------
// Loom concurrency tests
// ---------------------------------------------------------------------------

#[cfg(loom)]
mod loom_tests {
    use super::*;
    use loom::thread;

    /// Two workers arrive and wait — both must leave the barrier.
    #[test]
    fn both_workers_pass() {
        loom::model(|| {
            let barrier = loom::sync::Arc::new(SpinBarrier::new(2));
            let b2 = barrier.clone();

            let h = thread::spawn(move || {
                b2.arrive(1);
                b2.wait()
            });

            barrier.arrive(0);
            let main_result = barrier.wait();
            let thread_result = h.join().unwrap();

            assert_eq!(main_result, Ok(()));
            assert_eq!(thread_result, Ok(()));
        });
    }

    /// A poisoned slot releases a waiter with an error instead of
    /// spinning forever.
    #[test]
    fn poison_releases_waiter() {
        loom::model(|| {
            let barrier = loom::sync::Arc::new(SpinBarrier::new(2));
            let b2 = barrier.clone();

            let h = thread::spawn(move || b2.poison(1));

            barrier.arrive(0);
            let result = barrier.wait();
            h.join().unwrap();

            assert_eq!(result, Err(BarrierPoisoned { worker: 1 }));
        });
    }
}

// ---------------------------------------------------------------------------
// Concurrent smoke tests
// ---------------------------------------------------------------------------
