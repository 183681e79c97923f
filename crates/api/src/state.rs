use std::sync::Arc;

use boardcast_events::{EventBus, Notifier};
use boardcast_pipeline::Pipeline;
use boardcast_store::JobStore;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable; inner data is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The durable job store -- single source of truth for job state.
    pub store: Arc<JobStore>,
    /// Channel-scoped WebSocket connection hub.
    pub ws_manager: Arc<WsManager>,
    /// In-process job-change event bus.
    pub event_bus: Arc<EventBus>,
    /// The notifier every state mutation reports through (the bus, or
    /// the HTTP bridge in split deployments).
    pub notifier: Arc<dyn Notifier>,
    /// Pipeline run scheduler.
    pub pipeline: Pipeline,
}
