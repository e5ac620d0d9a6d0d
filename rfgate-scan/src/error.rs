//! Error types for rfgate-scan
//!
//! `ScanError` is the engine error taxonomy. Per-item failures (lookup,
//! dispatch) are contained at the item boundary and only logged or
//! aggregated; transport and command failures surface to the caller.
//! `ApiError` maps engine errors onto the control API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rfgate_common::events::ScanCommand;
use serde_json::json;
use thiserror::Error;

use crate::services::{CommandError, InboundError, LookupError};

/// Engine error type
#[derive(Debug, Error)]
pub enum ScanError {
    /// Reader socket could not be opened or failed while open
    #[error("Reader transport error: {0}")]
    Transport(String),

    /// Binary frame is not valid UTF-8 text
    #[error("Frame decode error: {0}")]
    Decode(String),

    /// Frame or sub-object is not valid JSON
    #[error("Event parse error: {0}")]
    Parse(String),

    /// Tag lookup failed for one sighting
    #[error("Tag lookup failed for {identifier}: {source}")]
    Lookup {
        identifier: String,
        #[source]
        source: LookupError,
    },

    /// Start/stop command not confirmed by the reader
    #[error("Scan {command} command failed: {source}")]
    Command {
        command: ScanCommand,
        #[source]
        source: CommandError,
    },

    /// Inbound dispatch failed for one record
    #[error("Inbound dispatch failed for {record_id}: {source}")]
    Dispatch {
        record_id: String,
        #[source]
        source: InboundError,
    },
}

/// Convenience Result type using ScanError
pub type ScanResult<T> = Result<T, ScanError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upstream reader/backend rejected or failed the request (502)
    #[error("Upstream error: {0}")]
    BadGateway(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Command { .. } | ScanError::Transport(_) => {
                ApiError::BadGateway(err.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
