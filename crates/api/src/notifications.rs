//! The bus-to-hub bridge.
//!
//! [`NotificationRouter`] consumes job-change events from the in-process
//! event bus and pushes each one to every viewer connected to the
//! event's channel. This is the in-process form of the "job changed"
//! bridge; the cross-process form arrives through the internal notify
//! route, which publishes to the hub directly.

use std::sync::Arc;

use boardcast_events::JobEvent;
use tokio::sync::broadcast;

use crate::ws::{PushMessage, WsManager};

/// Routes job-change events to connected viewers.
pub struct NotificationRouter {
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the routing loop.
    ///
    /// Subscribes via `receiver` and forwards every event. The loop
    /// exits when the channel closes (the bus was dropped during
    /// shutdown). Delivery problems never propagate anywhere -- a lagged
    /// or missed update is reconciled by the viewer's next snapshot.
    pub async fn run(self, mut receiver: broadcast::Receiver<JobEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let delivered = self
                        .ws_manager
                        .publish(
                            &event.channel_id,
                            PushMessage::JobUpdate { job: event.job }.to_ws_message(),
                        )
                        .await;
                    tracing::debug!(
                        channel_id = %event.channel_id,
                        delivered,
                        "Forwarded job update"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }
}
