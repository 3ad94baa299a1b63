//! Concurrent duplicate detection over fixed-width records.
//!
//! ## Scope
//! This crate answers one question about a buffer of 8-byte records
//! (6-byte `AAA000`-style code plus 2 trailing bytes): do any two records
//! share a code? It does so with a dense perfect-hash owner table instead
//! of a general hash table, and a lock-free two-phase protocol instead of
//! locks.
//!
//! ## Key invariants
//! - The code → key mapping is a bijection onto `[0, 17_576_000)`; the
//!   presence table has exactly one cell per key, so marking and reading
//!   are single O(1) atomic operations.
//! - Marking is unconditional last-writer-wins; the barrier's
//!   Release/Acquire edge makes every mark visible before any verify
//!   read. After the barrier, at most one contributor to a contested cell
//!   sees its own id there — every other contributor reports the
//!   duplicate. No false negatives, no false positives.
//! - Every worker reaches the barrier exactly once on every exit path;
//!   a panicking worker poisons it instead, failing the run rather than
//!   deadlocking it.
//!
//! ## Check flow (one invocation)
//! 1) Validate config and record alignment, reset the owner table.
//! 2) Partition `[0, R)` contiguously across `W` workers.
//! 3) Each worker marks its records' keys with its own id.
//! 4) All workers rendezvous at the spin barrier.
//! 5) Each worker re-reads its keys; any foreign owner id is a duplicate.
//! 6) Join all workers, aggregate the monotonic duplicate flag.
//!
//! ## Notable entry points
//! - [`find_duplicates`] / [`Checker`]: run a check over a byte buffer.
//! - [`Config`]: worker count and mark-phase policy.
//! - [`key::encode`] / [`key::decode`]: the perfect-hash bijection.
//! - [`InputFile`]: memory-mapped file loading for the CLI.
//!
//! ## Design trade-offs
//! The owner table costs ~17.6 MB regardless of input size; in exchange
//! there is no hashing, no probing, and no resizing, and the concurrent
//! protocol needs only relaxed per-cell atomics plus one barrier.

pub mod barrier;
pub mod key;
pub mod partition;
pub mod presence;
pub mod records;

mod check;
mod error;
mod input;
mod worker;

pub use check::{find_duplicates, Checker, Config, Outcome, MAX_WORKERS};
pub use error::CheckError;
pub use input::InputFile;
pub use records::Records;
pub use worker::MarkPolicy;
