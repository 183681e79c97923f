//! Job-change event infrastructure.
//!
//! Every job store write is followed by exactly one [`JobEvent`] emission.
//! The event travels through a [`Notifier`]:
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, consumed by the gateway's notification
//!   router when pipeline and gateway share a process.
//! - [`HttpNotifier`] -- fire-and-forget HTTP POST to a gateway's internal
//!   notify endpoint, for deployments where the pipeline runs in a
//!   separate process.
//!
//! Delivery is best-effort on every path: a failed notification is logged
//! and swallowed, never escalated to the pipeline or the store.

pub mod bus;
pub mod notify;

pub use bus::{EventBus, JobEvent};
pub use notify::{HttpNotifier, Notifier};
