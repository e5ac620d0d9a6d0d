//! Configuration loading and config file resolution
//!
//! Bootstrap configuration lives in a single TOML file (`rfgate.toml`).
//! The file is located using this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `RFGATE_CONFIG` environment variable
//! 3. User config directory (`~/.config/rfgate/rfgate.toml` on Linux)
//! 4. System config (`/etc/rfgate/rfgate.toml`)
//!
//! Credentials may additionally be supplied through `RFGATE_READER_TOKEN` and
//! `RFGATE_BACKEND_TOKEN`, which take precedence over the file.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "RFGATE_CONFIG";
/// Environment override for the reader bearer token
pub const READER_TOKEN_ENV_VAR: &str = "RFGATE_READER_TOKEN";
/// Environment override for the backend bearer token
pub const BACKEND_TOKEN_ENV_VAR: &str = "RFGATE_BACKEND_TOKEN";

const CONFIG_FILE_NAME: &str = "rfgate.toml";

/// Bootstrap configuration loaded from TOML file
///
/// Cannot change while the service is running.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Gate this scanning station records inbound tags against
    pub gate_id: String,

    /// Control API listen address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Physical reader connection
    pub reader: ReaderConfig,

    /// Business backend (tag lookup, inbound processing)
    pub backend: BackendConfig,

    /// Engine tuning (optional)
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Reader device settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReaderConfig {
    /// Reader host (and optional port), used for `wss://<host>/ws`
    pub host: String,

    /// Bearer token issued by the reader
    #[serde(default)]
    pub token: String,

    /// Base URL for start/stop commands. Defaults to `https://<host>`.
    #[serde(default)]
    pub api_base_url: Option<String>,
}

impl ReaderConfig {
    /// Base URL used for `/api/cloud/start` and `/api/cloud/stop`
    pub fn command_base_url(&self) -> String {
        match &self.api_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}", self.host),
        }
    }
}

/// Backend API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL of the backend API
    pub base_url: String,

    /// Bearer token already issued for the backend
    #[serde(default)]
    pub token: String,
}

/// Engine tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Maximum number of tag lookups in flight at once
    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,

    /// Capacity of the queue between the reader stream and the lookup workers
    #[serde(default = "default_sighting_queue")]
    pub sighting_queue: usize,

    /// Timeout applied to every outbound HTTP request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// View the UI should show after a batch dispatch
    #[serde(default = "default_handoff_view")]
    pub handoff_view: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookup_concurrency: default_lookup_concurrency(),
            sighting_queue: default_sighting_queue(),
            request_timeout_ms: default_request_timeout_ms(),
            handoff_view: default_handoff_view(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5780".to_string()
}

fn default_lookup_concurrency() -> usize {
    4
}

fn default_sighting_queue() -> usize {
    256
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_handoff_view() -> String {
    "/receiving".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration from TOML text (no env overrides, no validation)
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load, apply environment overrides and validate
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read config {} failed: {}", path.display(), e))
        })?;

        let mut config = Self::parse(&content)?;
        config.apply_env_overrides();
        config.validate()?;

        info!(path = %path.display(), gate_id = %config.gate_id, "Configuration loaded");
        Ok(config)
    }

    /// Replace tokens with environment values when those are set
    pub fn apply_env_overrides(&mut self) {
        if let Some(token) = env_value(READER_TOKEN_ENV_VAR) {
            if is_valid_value(&self.reader.token) {
                warn!("Reader token found in config file and environment; using environment");
            }
            self.reader.token = token;
        }

        if let Some(token) = env_value(BACKEND_TOKEN_ENV_VAR) {
            if is_valid_value(&self.backend.token) {
                warn!("Backend token found in config file and environment; using environment");
            }
            self.backend.token = token;
        }
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("gate_id", self.gate_id.as_str()),
            ("reader.host", self.reader.host.as_str()),
            ("reader.token", self.reader.token.as_str()),
            ("backend.base_url", self.backend.base_url.as_str()),
            ("backend.token", self.backend.token.as_str()),
        ];

        for (key, value) in required {
            if !is_valid_value(value) {
                return Err(Error::Config(format!("{} must not be empty", key)));
            }
        }

        if self.engine.lookup_concurrency == 0 {
            return Err(Error::Config(
                "engine.lookup_concurrency must be at least 1".to_string(),
            ));
        }
        if self.engine.sighting_queue == 0 {
            return Err(Error::Config(
                "engine.sighting_queue must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Resolve the config file path following the documented priority order
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        debug!(path = %path.display(), "Config path from command line");
        return Ok(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Some(path) = env_value(CONFIG_ENV_VAR) {
        debug!(path = %path, "Config path from {}", CONFIG_ENV_VAR);
        return Ok(PathBuf::from(path));
    }

    // Priority 3 and 4: user, then system config
    let candidates = default_config_candidates();
    for candidate in &candidates {
        if candidate.exists() {
            return Ok(candidate.clone());
        }
    }

    Err(Error::Config(format!(
        "No config file found. Pass --config, set {} or create one of: {}",
        CONFIG_ENV_VAR,
        candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )))
}

/// Platform config file locations, user directory first
pub fn default_config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("rfgate").join(CONFIG_FILE_NAME));
    }
    if cfg!(unix) {
        candidates.push(PathBuf::from("/etc/rfgate").join(CONFIG_FILE_NAME));
    }

    candidates
}

/// Non-empty, non-whitespace
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| is_valid_value(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        gate_id = "7"

        [reader]
        host = "10.0.0.20"
        token = "reader-token"

        [backend]
        base_url = "https://backend.local/api"
        token = "backend-token"
    "#;

    #[test]
    fn test_parse_applies_defaults() {
        let config = TomlConfig::parse(MINIMAL).unwrap();

        assert_eq!(config.gate_id, "7");
        assert_eq!(config.bind, "127.0.0.1:5780");
        assert_eq!(config.engine.lookup_concurrency, 4);
        assert_eq!(config.engine.sighting_queue, 256);
        assert_eq!(config.engine.request_timeout_ms, 30_000);
        assert_eq!(config.engine.handoff_view, "/receiving");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_command_base_url_defaults_to_reader_host() {
        let config = TomlConfig::parse(MINIMAL).unwrap();
        assert_eq!(config.reader.command_base_url(), "https://10.0.0.20");

        let mut reader = config.reader.clone();
        reader.api_base_url = Some("http://proxy.local:8080/".to_string());
        assert_eq!(reader.command_base_url(), "http://proxy.local:8080");
    }

    #[test]
    fn test_validate_rejects_blank_token() {
        let mut config = TomlConfig::parse(MINIMAL).unwrap();
        config.backend.token = "   ".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("backend.token"));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = TomlConfig::parse(MINIMAL).unwrap();
        config.engine.lookup_concurrency = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_reports_missing_section() {
        let err = TomlConfig::parse("gate_id = \"1\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_is_valid_value() {
        assert!(is_valid_value("abc"));
        assert!(!is_valid_value(""));
        assert!(!is_valid_value(" \t"));
    }
}
