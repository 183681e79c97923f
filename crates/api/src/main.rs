use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, StatusCode};
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boardcast_api::config::ServerConfig;
use boardcast_api::notifications::NotificationRouter;
use boardcast_api::{routes, state, ws};
use boardcast_events::{EventBus, HttpNotifier, Notifier};
use boardcast_google::{CloudTts, GeminiVision};
use boardcast_pipeline::Pipeline;
use boardcast_store::JobStore;

use state::AppState;

/// Maximum accepted upload size (whiteboard photos).
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "boardcast_api=debug,boardcast_pipeline=debug,boardcast_store=debug,\
                     boardcast_events=debug,tower_http=debug"
                        .into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Job store ---
    let store = Arc::new(
        JobStore::open(&config.data_dir)
            .await
            .expect("Failed to open job store"),
    );

    tokio::fs::create_dir_all(&config.audio_dir)
        .await
        .expect("Failed to create audio output directory");

    // --- CORS ---
    let cors = build_cors_layer(&config);

    // --- WebSocket hub ---
    let ws_manager = Arc::new(ws::WsManager::new());

    // --- Heartbeat ---
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Event bus + notification router ---
    let event_bus = Arc::new(EventBus::default());
    let router_handle = tokio::spawn(
        NotificationRouter::new(Arc::clone(&ws_manager)).run(event_bus.subscribe()),
    );

    // State mutations report through the bus in-process, or through the
    // HTTP bridge when the gateway runs elsewhere.
    let notifier: Arc<dyn Notifier> = match &config.notify_url {
        Some(url) => {
            tracing::info!(url = %url, "Using HTTP notify bridge");
            Arc::new(HttpNotifier::new(url.clone()))
        }
        None => {
            let bus: Arc<dyn Notifier> = event_bus.clone();
            bus
        }
    };

    // --- Providers + pipeline ---
    let vision = Arc::new(GeminiVision::new(config.gemini_api_key.clone()));
    let speech = Arc::new(CloudTts::new(config.tts_api_key.clone()));
    let pipeline = Pipeline::new(
        Arc::clone(&store),
        Arc::clone(&notifier),
        vision,
        speech,
        config.pipeline_config(),
    );
    tracing::info!("Pipeline ready");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::clone(&store),
        ws_manager: Arc::clone(&ws_manager),
        event_bus: Arc::clone(&event_bus),
        notifier,
        pipeline,
    };

    // --- Router ---
    let app = Router::new()
        // Health check and the internal bridge at root level.
        .merge(routes::health::router())
        .merge(routes::internal::router())
        // API v1 routes.
        .nest("/api/v1", routes::api_routes())
        // Viewer WebSocket endpoint.
        .route("/ws", get(ws::ws_handler))
        // Synthesized audio artifacts (byte ranges handled by ServeDir).
        .nest_service("/audio", ServeDir::new(&config.audio_dir))
        // -- Middleware stack (applied bottom-up) --
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Drop the event bus sender so the notification router drains and exits.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), router_handle).await;
    tracing::info!("Notification router shut down");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Build the CORS middleware layer from server configuration.
///
/// Panics at startup if any configured origin is invalid -- we want
/// misconfiguration to fail fast.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}
