//! External collaborators
//!
//! The engine talks to three remote parties through these traits:
//! - **ScanCommands** - reader start/stop (`PUT /api/cloud/{start,stop}`)
//! - **TagLookup** - EPC → business record (`POST /rfid-tags/read`)
//! - **InboundSink** - record inbound at a gate (`POST /gate/{id}`)
//!
//! The reqwest-backed clients are the production implementations; tests
//! substitute in-process fakes.

pub mod inbound_client;
pub mod reader_client;
pub mod tag_lookup_client;

pub use inbound_client::{InboundClient, InboundError};
pub use reader_client::{CommandError, ReaderCommandClient};
pub use tag_lookup_client::{LookupError, TagLookupClient};

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::models::{RecordId, TagRecord};

pub(crate) const USER_AGENT: &str = concat!("rfgate-scan/", env!("CARGO_PKG_VERSION"));

/// Remote start/stop of the physical scanning session
#[async_trait]
pub trait ScanCommands: Send + Sync {
    async fn start(&self) -> Result<(), CommandError>;
    async fn stop(&self) -> Result<(), CommandError>;
}

/// Tag identifier → business record
#[async_trait]
pub trait TagLookup: Send + Sync {
    /// `Ok(None)` when the backend has no record for the tag
    async fn lookup(&self, epc: &str) -> Result<Option<TagRecord>, LookupError>;
}

/// Inbound-processing endpoint
#[async_trait]
pub trait InboundSink: Send + Sync {
    /// Record one tag as inbound at `gate_id`
    async fn submit(&self, gate_id: &str, record_id: &RecordId) -> Result<(), InboundError>;
}

pub(crate) fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// Human-readable message from an error response body
///
/// Accepts `{"message": ..}`, `{"error": ..}`, `{"error": {"message": ..}}`
/// or plain text.
pub(crate) fn error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let candidates = [
            value.get("message"),
            value.get("error").and_then(|e| e.get("message")),
            value.get("error"),
        ];
        for candidate in candidates.into_iter().flatten() {
            if let Some(text) = candidate.as_str() {
                return text.to_string();
            }
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_variants() {
        assert_eq!(error_message(r#"{"message":"Reader busy"}"#), "Reader busy");
        assert_eq!(error_message(r#"{"error":"unauthorized"}"#), "unauthorized");
        assert_eq!(
            error_message(r#"{"error":{"code":5,"message":"radio off"}}"#),
            "radio off"
        );
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message(""), "empty response body");
        assert_eq!(error_message(r#"{"code":1}"#), r#"{"code":1}"#);
    }
}
