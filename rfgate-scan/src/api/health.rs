//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use rfgate_common::events::SessionState;
use serde::Serialize;

use crate::{AppState, ReaderStatus};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" after an unconfirmed reader command or once the
    /// reader stream has closed
    pub status: String,
    pub module: String,
    pub version: String,
    pub gate_id: String,
    pub session_state: SessionState,
    pub reader: ReaderStatus,
    pub uptime_seconds: u64,
    /// Why the reader stream closed, else the last unconfirmed reader command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let snapshot = state.engine.session().snapshot().await;
    let reader = state.engine.reader_status();
    let last_error = match &reader {
        ReaderStatus::Closed { reason } => Some(format!("reader stream closed: {}", reason)),
        ReaderStatus::NotConnected | ReaderStatus::Connected => snapshot
            .last_failure
            .map(|failure| format!("{}: {}", failure.command, failure.message)),
    };

    Json(HealthResponse {
        status: if last_error.is_some() { "degraded" } else { "ok" }.to_string(),
        module: "rfgate-scan".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        gate_id: state.engine.gate_id().to_string(),
        session_state: snapshot.state,
        reader,
        uptime_seconds,
        last_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
