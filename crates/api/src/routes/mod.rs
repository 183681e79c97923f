//! Route definitions for the gateway's HTTP surface.

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod internal;
pub mod jobs;
pub mod uploads;

/// Routes mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/uploads", uploads::router())
}
