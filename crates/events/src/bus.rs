//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`JobEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` across the application.

use boardcast_core::Job;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// JobEvent
// ---------------------------------------------------------------------------

/// A "job changed" signal, emitted after every job store write.
///
/// The serialized form is also the wire shape of the cross-process notify
/// bridge: `{ "job": {...}, "channel_id": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEvent {
    /// The job as written (or, for deletes, the removed job with the
    /// synthetic `deleted` status).
    pub job: Job,
    /// The workshop channel whose viewers should receive the update.
    pub channel_id: String,
}

impl JobEvent {
    /// Build an event for `job`, taking the channel from the job itself.
    pub fn for_job(job: Job) -> Self {
        let channel_id = job.channel_id.clone();
        Self { job, channel_id }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`JobEvent`].
pub struct EventBus {
    sender: broadcast::Sender<JobEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers observe a `RecvError::Lagged`. Viewers reconcile
    /// through snapshots, so a dropped update is tolerable.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// An event published with no active subscribers is silently dropped.
    pub fn publish(&self, event: JobEvent) {
        // Ignore the SendError -- it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use boardcast_core::JobStatus;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let job = Job::new("job_1", "ws_demo");
        bus.publish(JobEvent::for_job(job));

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.job.job_id, "job_1");
        assert_eq!(received.channel_id, "ws_demo");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(JobEvent::for_job(Job::new("job_1", "ws_demo")));

        assert_eq!(rx1.recv().await.unwrap().job.job_id, "job_1");
        assert_eq!(rx2.recv().await.unwrap().job.job_id, "job_1");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(JobEvent::for_job(Job::new("orphan", "ws_demo")));
    }

    #[test]
    fn event_wire_shape() {
        let mut job = Job::new("job_1", "ws_demo");
        job.transition(JobStatus::Analyzing).unwrap();
        let json = serde_json::to_value(JobEvent::for_job(job)).unwrap();

        assert_eq!(json["channel_id"], "ws_demo");
        assert_eq!(json["job"]["job_id"], "job_1");
        assert_eq!(json["job"]["status"], "analyzing");
        assert_eq!(json["job"]["progress"], 10);
    }
}
