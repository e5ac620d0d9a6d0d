//! Scanning session API handlers
//!
//! GET /scan/session, POST /scan/start, POST /scan/stop,
//! GET /scan/records, POST /scan/dispatch

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::engine::SessionSnapshot;
use crate::error::ApiResult;
use crate::models::{DispatchReport, TagRecord};
use crate::AppState;

/// GET /scan/records query
#[derive(Debug, Default, Deserialize)]
pub struct RecordsQuery {
    /// Case-insensitive filter on EPC, PID, name, location and destination
    #[serde(default)]
    pub search: String,
}

/// GET /scan/records response
#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    /// Matching records
    pub count: usize,
    /// Working set size before filtering
    pub total: usize,
    pub records: Vec<TagRecord>,
}

/// GET /scan/session
pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.engine.session().snapshot().await)
}

/// POST /scan/start
///
/// 502 when the reader does not confirm; the request may be retried.
pub async fn start_scanning(State(state): State<AppState>) -> ApiResult<Json<SessionSnapshot>> {
    let snapshot = state.engine.start_scanning().await?;
    Ok(Json(snapshot))
}

/// POST /scan/stop
///
/// 502 when the reader does not confirm; the working set is kept.
pub async fn stop_scanning(State(state): State<AppState>) -> ApiResult<Json<SessionSnapshot>> {
    let snapshot = state.engine.stop_scanning().await?;
    Ok(Json(snapshot))
}

/// GET /scan/records?search=
pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> Json<RecordsResponse> {
    let total = state.engine.working_set().len().await;
    let records = state.engine.records(&query.search).await;

    Json(RecordsResponse {
        count: records.len(),
        total,
        records,
    })
}

/// POST /scan/dispatch
///
/// Always 200: per-record failures are listed in `result.failed`.
pub async fn dispatch(State(state): State<AppState>) -> Json<DispatchReport> {
    let report = state.engine.dispatch_all().await;

    tracing::info!(
        succeeded = report.result.succeeded.len(),
        failed = report.result.failed.len(),
        handoff = %report.handoff,
        "Dispatch requested via API"
    );

    Json(report)
}

/// Build scanning session routes
pub fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/scan/session", get(get_session))
        .route("/scan/start", post(start_scanning))
        .route("/scan/stop", post(stop_scanning))
        .route("/scan/records", get(list_records))
        .route("/scan/dispatch", post(dispatch))
}
