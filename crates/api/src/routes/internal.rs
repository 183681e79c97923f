//! The cross-process notify bridge receiver.
//!
//! A pipeline worker running in a separate process reports job changes
//! by POSTing the event here; the gateway fans it out to the channel's
//! viewers. Delivery is one-way and unacknowledged beyond the HTTP
//! status -- the sender fires and forgets.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use boardcast_events::JobEvent;

use crate::state::AppState;
use crate::ws::PushMessage;

/// Routes mounted at root level (not under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/internal/notify", post(notify))
}

/// POST /internal/notify -- push a job update to the event's channel.
async fn notify(State(state): State<AppState>, Json(event): Json<JobEvent>) -> StatusCode {
    let delivered = state
        .ws_manager
        .publish(
            &event.channel_id,
            PushMessage::JobUpdate { job: event.job }.to_ws_message(),
        )
        .await;

    tracing::debug!(channel_id = %event.channel_id, delivered, "Bridged job update");
    StatusCode::OK
}
