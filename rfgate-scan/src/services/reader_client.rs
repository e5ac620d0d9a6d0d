//! Reader command client
//!
//! `PUT /api/cloud/start` and `PUT /api/cloud/stop`, authorized with the
//! reader bearer token. Any 2xx confirms the command.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use rfgate_common::events::ScanCommand;
use std::time::Duration;
use thiserror::Error;

use super::{build_http_client, error_message, ScanCommands};

/// Reader command errors
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Reader rejected command ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Reader command API client
pub struct ReaderCommandClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

impl ReaderCommandClient {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CommandError> {
        let http_client =
            build_http_client(timeout).map_err(|e| CommandError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    async fn send(&self, command: ScanCommand) -> Result<(), CommandError> {
        let url = format!("{}/api/cloud/{}", self.base_url, command);

        tracing::debug!(command = %command, "Sending reader command");

        let response = self
            .http_client
            .put(&url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| CommandError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(command = %command, status = status.as_u16(), "Reader command accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(command = %command, status = status.as_u16(), body = %body, "Reader command rejected");

        Err(CommandError::Rejected {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }
}

#[async_trait]
impl ScanCommands for ReaderCommandClient {
    async fn start(&self) -> Result<(), CommandError> {
        self.send(ScanCommand::Start).await
    }

    async fn stop(&self) -> Result<(), CommandError> {
        self.send(ScanCommand::Stop).await
    }
}
