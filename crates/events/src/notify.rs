//! The notification seam between state writes and the push layer.
//!
//! [`Notifier::notify`] is fire-and-forget: implementations log delivery
//! failures and return normally, because a failed notification must never
//! fail the state write that triggered it. Viewers that miss an update
//! reconcile through the snapshot they receive on (re)connect.

use std::time::Duration;

use async_trait::async_trait;

use crate::bus::{EventBus, JobEvent};

/// HTTP request timeout for a single bridge delivery.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One-way "job changed" signal sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `event` best-effort. Never fails, never blocks for long.
    async fn notify(&self, event: JobEvent);
}

/// The in-process bus is itself a notifier.
#[async_trait]
impl Notifier for EventBus {
    async fn notify(&self, event: JobEvent) {
        self.publish(event);
    }
}

// ---------------------------------------------------------------------------
// HttpNotifier
// ---------------------------------------------------------------------------

/// Cross-process bridge: POSTs each event to a gateway's internal notify
/// endpoint.
///
/// Used when the pipeline worker runs in a different process than the
/// viewer-facing gateway. Delivery failures are logged and swallowed.
pub struct HttpNotifier {
    client: reqwest::Client,
    url: String,
}

impl HttpNotifier {
    /// Create a notifier targeting `url` (e.g.
    /// `http://localhost:3000/internal/notify`).
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, event: JobEvent) {
        let result = self.client.post(&self.url).json(&event).send().await;

        match result {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(
                    url = %self.url,
                    status = response.status().as_u16(),
                    job_id = %event.job.job_id,
                    "Notify bridge returned non-success status"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    url = %self.url,
                    error = %e,
                    job_id = %event.job.job_id,
                    "Notify bridge delivery failed"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use boardcast_core::Job;

    #[tokio::test]
    async fn bus_notifier_publishes() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.notify(JobEvent::for_job(Job::new("job_1", "ws_demo"))).await;

        assert_eq!(rx.recv().await.unwrap().job.job_id, "job_1");
    }

    #[tokio::test]
    async fn http_notifier_swallows_connection_failure() {
        // Nothing listens on this port; notify must log and return.
        let notifier = HttpNotifier::new("http://127.0.0.1:9/internal/notify");
        notifier
            .notify(JobEvent::for_job(Job::new("job_1", "ws_demo")))
            .await;
    }
}
