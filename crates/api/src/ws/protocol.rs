//! The push protocol between the gateway and connected viewers.
//!
//! Two message shapes only: a full snapshot on connect, and an
//! incremental single-job update on every state transition (including
//! the synthetic `deleted` pseudo-status). Delivery is at-most-once and
//! best-effort; a reconnecting viewer reconciles through a fresh
//! snapshot.

use axum::extract::ws::Message;
use boardcast_core::Job;
use serde::Serialize;

/// A message pushed to viewers.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMessage {
    /// Full current job list, sent once per new connection.
    Snapshot { jobs: Vec<Job> },
    /// Single-job update, sent once per state transition.
    JobUpdate { job: Job },
}

impl PushMessage {
    /// Serialize into a WebSocket text frame.
    pub fn to_ws_message(&self) -> Message {
        // Serialization of these shapes cannot fail.
        let json = serde_json::to_string(self).expect("push message serialization");
        Message::Text(json.into())
    }
}
