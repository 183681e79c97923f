use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::state::AppState;
use crate::ws::protocol::PushMessage;

/// Query parameters required at connect time.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    channel_id: Option<String>,
}

/// HTTP handler that upgrades the connection to WebSocket.
///
/// A connection must name its workshop channel; requests without a
/// `channel_id` are rejected before the upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    let Some(channel_id) = params.channel_id.filter(|c| !c.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "channel_id query parameter required").into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, channel_id))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Registers the connection with the hub, sends the initial snapshot,
/// then forwards hub messages to the sink until the viewer disconnects.
///
/// The snapshot is read from the store *after* registration: any update
/// published in between is both queued behind the snapshot and already
/// contained in it, so the viewer never starts from stale data.
async fn handle_socket(socket: WebSocket, state: AppState, channel_id: String) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, channel_id = %channel_id, "WebSocket connected");

    let mut rx = state.ws_manager.subscribe(&channel_id, conn_id.clone()).await;

    // Initial snapshot, scoped to the connecting channel.
    let jobs = state.store.list_channel(&channel_id).await;
    let snapshot = PushMessage::Snapshot { jobs }.to_ws_message();
    state.ws_manager.send_to(&channel_id, &conn_id, snapshot).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward hub messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: viewers send nothing meaningful; watch for close.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_msg) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: remove the connection and stop the sender task.
    state.ws_manager.unsubscribe(&channel_id, &conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, channel_id = %channel_id, "WebSocket disconnected");
}
