//! Inbound dispatch client
//!
//! `POST /gate/{gate_id}` with `{"rfid_tag_id": <record id>, "gate": <gate id>}`, the record id
//! echoed in the JSON type the lookup returned it in.
//! The backend confirms with `{"success": true}`; anything else is a failure.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use super::{build_http_client, error_message, InboundSink};
use crate::models::RecordId;

/// Inbound dispatch errors
#[derive(Debug, Error)]
pub enum InboundError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Inbound not accepted: {0}")]
    NotAccepted(String),
}

#[derive(Debug, Deserialize)]
struct InboundResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
}

/// Backend inbound-processing client
pub struct InboundClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

impl InboundClient {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InboundError> {
        let http_client =
            build_http_client(timeout).map_err(|e| InboundError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl InboundSink for InboundClient {
    async fn submit(&self, gate_id: &str, record_id: &RecordId) -> Result<(), InboundError> {
        let url = format!("{}/gate/{}", self.base_url, gate_id);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "rfid_tag_id": record_id, "gate": gate_id }))
            .send()
            .await
            .map_err(|e| InboundError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InboundError::Api(status.as_u16(), error_message(&body)));
        }

        let body: InboundResponse = response
            .json()
            .await
            .map_err(|e| InboundError::Parse(e.to_string()))?;

        match body.success {
            Some(true) => {
                tracing::debug!(gate_id = %gate_id, record_id = %record_id, "Inbound accepted");
                Ok(())
            }
            _ => Err(InboundError::NotAccepted(
                body.message
                    .unwrap_or_else(|| "response did not report success".to_string()),
            )),
        }
    }
}
