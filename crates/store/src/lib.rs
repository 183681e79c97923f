//! Durable job and result storage.
//!
//! [`JobStore`] is the single source of truth for job state. It keeps two
//! JSON array files under a data directory -- `jobs.json` for live job state
//! and `results.json` for completed results -- loaded at startup and written
//! through on every mutation. A write is durable (temp file, fsync, rename)
//! before the mutating call returns, so a state transition a viewer has been
//! told about is never rolled back by a crash.

pub mod persist;
pub mod store;

pub use store::{JobStore, StoreError};
