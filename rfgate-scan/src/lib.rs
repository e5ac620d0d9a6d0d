//! rfgate-scan library interface
//!
//! Streaming tag ingestion and batch dispatch for one RFID gate station.
//! Exposes the engine and the control router for integration testing.

pub mod api;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod stream;

pub use crate::engine::{Collaborators, ReaderStatus, ScanEngine, ScanHandle};
pub use crate::error::{ApiError, ApiResult, ScanError, ScanResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Engine bound to this station
    pub engine: Arc<ScanEngine>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: Arc<ScanEngine>) -> Self {
        Self {
            engine,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::scan_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
