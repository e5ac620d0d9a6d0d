//! Tag lookup client
//!
//! `POST /rfid-tags/read` with `{"EPC": <id>}`. The record is wrapped in the
//! response `data` field; a missing, null or empty `data` means the backend
//! has no record for the tag.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use super::{build_http_client, error_message, TagLookup};
use crate::models::TagRecord;

/// Tag lookup errors
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct LookupEnvelope {
    #[serde(default)]
    data: Option<Value>,
}

/// Backend tag lookup client
pub struct TagLookupClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

impl TagLookupClient {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let http_client =
            build_http_client(timeout).map_err(|e| LookupError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl TagLookup for TagLookupClient {
    async fn lookup(&self, epc: &str) -> Result<Option<TagRecord>, LookupError> {
        let url = format!("{}/rfid-tags/read", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "EPC": epc }))
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Api(status.as_u16(), error_message(&body)));
        }

        let envelope: LookupEnvelope = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        unwrap_record(envelope.data)
    }
}

fn unwrap_record(data: Option<Value>) -> Result<Option<TagRecord>, LookupError> {
    match data {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) if map.is_empty() => Ok(None),
        Some(Value::Object(map)) => serde_json::from_value(Value::Object(map))
            .map(Some)
            .map_err(|e| LookupError::Parse(e.to_string())),
        Some(other) => Err(LookupError::Parse(format!(
            "expected record object in data, got {}",
            other
        ))),
    }
}
