//! Property-based soundness tests.
//!
//! Run with: `cargo test --test property`

mod detect_soundness;
mod key_roundtrip;
mod partition_coverage;
