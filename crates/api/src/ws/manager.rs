use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Manages all active WebSocket connections, grouped by workshop channel.
///
/// A connection belongs to exactly one channel for its lifetime. Channel
/// entries are created on first subscribe and discarded when the last
/// connection leaves, so an idle channel holds no memory.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// passed explicitly to the gateway and the notification router.
pub struct WsManager {
    channels: RwLock<HashMap<String, HashMap<String, WsSender>>>,
}

impl WsManager {
    /// Create a new, empty connection hub.
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection under a channel.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn subscribe(
        &self,
        channel_id: &str,
        conn_id: String,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.channels
            .write()
            .await
            .entry(channel_id.to_string())
            .or_default()
            .insert(conn_id, tx);
        rx
    }

    /// Remove a connection from its channel.
    ///
    /// Safe to call twice; the second call is a no-op. The channel entry
    /// is dropped together with its last connection.
    pub async fn unsubscribe(&self, channel_id: &str, conn_id: &str) {
        let mut channels = self.channels.write().await;
        if let Some(conns) = channels.get_mut(channel_id) {
            conns.remove(conn_id);
            if conns.is_empty() {
                channels.remove(channel_id);
            }
        }
    }

    /// Send a message to one specific connection on a channel.
    ///
    /// Returns `false` when the connection is unknown or its send channel
    /// is closed.
    pub async fn send_to(&self, channel_id: &str, conn_id: &str, message: Message) -> bool {
        let channels = self.channels.read().await;
        match channels.get(channel_id).and_then(|c| c.get(conn_id)) {
            Some(sender) => sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Push a message to every connection on a channel.
    ///
    /// Connections whose send channels are closed are silently skipped --
    /// they are pruned when their receive loop unsubscribes. Returns the
    /// number of connections the message was handed to.
    pub async fn publish(&self, channel_id: &str, message: Message) -> usize {
        let channels = self.channels.read().await;
        let Some(conns) = channels.get(channel_id) else {
            return 0;
        };

        let mut count = 0;
        for sender in conns.values() {
            if sender.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Total number of active connections across all channels.
    pub async fn connection_count(&self) -> usize {
        self.channels.read().await.values().map(|c| c.len()).sum()
    }

    /// Number of channels with at least one connection.
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Send a Ping frame to every connected client.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let channels = self.channels.read().await;
        for conns in channels.values() {
            for sender in conns.values() {
                let _ = sender.send(Message::Ping(Bytes::new()));
            }
        }
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops.
    pub async fn shutdown_all(&self) {
        let mut channels = self.channels.write().await;
        let count: usize = channels.values().map(|c| c.len()).sum();
        for conns in channels.values() {
            for sender in conns.values() {
                let _ = sender.send(Message::Close(None));
            }
        }
        channels.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
