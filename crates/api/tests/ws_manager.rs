//! Unit tests for `WsManager`.
//!
//! These tests exercise the channel-scoped connection hub directly,
//! without performing any HTTP upgrades. They verify subscribe/unsubscribe
//! semantics, channel-scoped publish, lifecycle of empty channels, and
//! graceful shutdown behaviour.

use axum::extract::ws::Message;
use boardcast_api::ws::WsManager;

// ---------------------------------------------------------------------------
// Test: new manager starts empty
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_manager_has_zero_connections() {
    let manager = WsManager::new();

    assert_eq!(manager.connection_count().await, 0);
    assert_eq!(manager.channel_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: subscribe() registers the connection under its channel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn subscribe_registers_connection() {
    let manager = WsManager::new();

    let _rx = manager.subscribe("ws_demo", "conn-1".to_string()).await;

    assert_eq!(manager.connection_count().await, 1);
    assert_eq!(manager.channel_count().await, 1);
}

// ---------------------------------------------------------------------------
// Test: unsubscribe() removes the connection and drops the empty channel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsubscribe_drops_empty_channel() {
    let manager = WsManager::new();

    let _rx = manager.subscribe("ws_demo", "conn-1".to_string()).await;
    manager.unsubscribe("ws_demo", "conn-1").await;

    assert_eq!(manager.connection_count().await, 0);
    assert_eq!(manager.channel_count().await, 0, "empty channel must be discarded");
}

// ---------------------------------------------------------------------------
// Test: unsubscribe() is safe to call twice
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsubscribe_twice_is_noop() {
    let manager = WsManager::new();

    let _rx = manager.subscribe("ws_demo", "conn-1".to_string()).await;
    manager.unsubscribe("ws_demo", "conn-1").await;
    manager.unsubscribe("ws_demo", "conn-1").await;

    assert_eq!(manager.connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: channel with remaining connections survives an unsubscribe
// ---------------------------------------------------------------------------

#[tokio::test]
async fn channel_survives_while_occupied() {
    let manager = WsManager::new();

    let _rx1 = manager.subscribe("ws_demo", "conn-1".to_string()).await;
    let _rx2 = manager.subscribe("ws_demo", "conn-2".to_string()).await;
    manager.unsubscribe("ws_demo", "conn-1").await;

    assert_eq!(manager.connection_count().await, 1);
    assert_eq!(manager.channel_count().await, 1);
}

// ---------------------------------------------------------------------------
// Test: publish() reaches every connection on the channel, and only them
// ---------------------------------------------------------------------------

#[tokio::test]
async fn publish_is_scoped_to_the_channel() {
    let manager = WsManager::new();

    let mut rx1 = manager.subscribe("ws_demo", "conn-1".to_string()).await;
    let mut rx2 = manager.subscribe("ws_demo", "conn-2".to_string()).await;
    let mut other = manager.subscribe("ws_other", "conn-3".to_string()).await;

    let delivered = manager
        .publish("ws_demo", Message::Text("update".into()))
        .await;

    assert_eq!(delivered, 2);
    assert!(matches!(rx1.recv().await, Some(Message::Text(t)) if t.as_str() == "update"));
    assert!(matches!(rx2.recv().await, Some(Message::Text(t)) if t.as_str() == "update"));
    assert!(
        other.try_recv().is_err(),
        "viewer on another channel must not receive the update"
    );
}

// ---------------------------------------------------------------------------
// Test: publish() to an unknown channel delivers nothing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn publish_to_unknown_channel_is_noop() {
    let manager = WsManager::new();

    let delivered = manager.publish("ghost", Message::Text("update".into())).await;

    assert_eq!(delivered, 0);
}

// ---------------------------------------------------------------------------
// Test: a dropped receiver is skipped without error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn closed_connection_is_skipped_on_publish() {
    let manager = WsManager::new();

    let rx1 = manager.subscribe("ws_demo", "conn-1".to_string()).await;
    let mut rx2 = manager.subscribe("ws_demo", "conn-2".to_string()).await;
    drop(rx1);

    let delivered = manager
        .publish("ws_demo", Message::Text("update".into()))
        .await;

    assert_eq!(delivered, 1, "closed connection skipped, open one reached");
    assert!(matches!(rx2.recv().await, Some(Message::Text(t)) if t.as_str() == "update"));
}

// ---------------------------------------------------------------------------
// Test: send_to() targets a single connection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_to_reaches_only_the_target() {
    let manager = WsManager::new();

    let mut rx1 = manager.subscribe("ws_demo", "conn-1".to_string()).await;
    let mut rx2 = manager.subscribe("ws_demo", "conn-2".to_string()).await;

    let sent = manager
        .send_to("ws_demo", "conn-1", Message::Text("snapshot".into()))
        .await;

    assert!(sent);
    assert!(matches!(rx1.recv().await, Some(Message::Text(t)) if t.as_str() == "snapshot"));
    assert!(rx2.try_recv().is_err());
}

#[tokio::test]
async fn send_to_unknown_connection_reports_failure() {
    let manager = WsManager::new();

    let sent = manager
        .send_to("ws_demo", "ghost", Message::Text("snapshot".into()))
        .await;

    assert!(!sent);
}

// ---------------------------------------------------------------------------
// Test: shutdown_all() sends Close and clears all channels
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();

    let mut rx1 = manager.subscribe("ws_demo", "conn-1".to_string()).await;
    let mut rx2 = manager.subscribe("ws_other", "conn-2".to_string()).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.shutdown_all().await;

    assert_eq!(manager.connection_count().await, 0);
    assert_eq!(manager.channel_count().await, 0);

    let msg1 = rx1.recv().await.expect("rx1 should receive Close");
    assert!(matches!(msg1, Message::Close(None)), "expected Close(None), got: {msg1:?}");

    let msg2 = rx2.recv().await.expect("rx2 should receive Close");
    assert!(matches!(msg2, Message::Close(None)), "expected Close(None), got: {msg2:?}");

    // After Close, the channels are closed (no more messages).
    assert!(rx1.recv().await.is_none());
}

// ---------------------------------------------------------------------------
// Test: ping_all() reaches every connection on every channel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ping_all_reaches_all_channels() {
    let manager = WsManager::new();

    let mut rx1 = manager.subscribe("ws_demo", "conn-1".to_string()).await;
    let mut rx2 = manager.subscribe("ws_other", "conn-2".to_string()).await;

    manager.ping_all().await;

    assert!(matches!(rx1.recv().await, Some(Message::Ping(_))));
    assert!(matches!(rx2.recv().await, Some(Message::Ping(_))));
}
