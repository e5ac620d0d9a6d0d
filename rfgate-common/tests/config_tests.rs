//! Integration tests for config file resolution and loading
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate RFGATE_* variables are marked with #[serial].

use rfgate_common::config::{
    resolve_config_path, TomlConfig, BACKEND_TOKEN_ENV_VAR, CONFIG_ENV_VAR, READER_TOKEN_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

const SAMPLE: &str = r#"
gate_id = "12"
bind = "0.0.0.0:5780"

[reader]
host = "reader.local"
token = "file-reader-token"

[backend]
base_url = "https://backend.local"
token = "file-backend-token"

[engine]
lookup_concurrency = 8
handoff_view = "/receiving/12"

[logging]
level = "debug"
"#;

fn write_sample(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("rfgate.toml");
    std::fs::write(&path, content).unwrap();
    path
}

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(READER_TOKEN_ENV_VAR);
    env::remove_var(BACKEND_TOKEN_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_argument_has_highest_priority() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/ignored-rfgate.toml");

    let cli = PathBuf::from("/tmp/cli-rfgate.toml");
    let resolved = resolve_config_path(Some(&cli)).unwrap();
    assert_eq!(resolved, cli);

    clear_env();
}

#[test]
#[serial]
fn test_env_var_used_without_cli_argument() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/env-rfgate.toml");

    let resolved = resolve_config_path(None).unwrap();
    assert_eq!(resolved, PathBuf::from("/tmp/env-rfgate.toml"));

    clear_env();
}

#[test]
#[serial]
fn test_load_reads_file_values() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir, SAMPLE);

    let config = TomlConfig::load(&path).unwrap();

    assert_eq!(config.gate_id, "12");
    assert_eq!(config.bind, "0.0.0.0:5780");
    assert_eq!(config.reader.token, "file-reader-token");
    assert_eq!(config.engine.lookup_concurrency, 8);
    // Unspecified engine fields keep defaults
    assert_eq!(config.engine.sighting_queue, 256);
    assert_eq!(config.engine.handoff_view, "/receiving/12");
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_env_tokens_override_file() {
    clear_env();
    env::set_var(READER_TOKEN_ENV_VAR, "env-reader-token");
    env::set_var(BACKEND_TOKEN_ENV_VAR, "env-backend-token");

    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir, SAMPLE);
    let config = TomlConfig::load(&path).unwrap();

    assert_eq!(config.reader.token, "env-reader-token");
    assert_eq!(config.backend.token, "env-backend-token");

    clear_env();
}

#[test]
#[serial]
fn test_env_token_fills_missing_file_token() {
    clear_env();
    env::set_var(READER_TOKEN_ENV_VAR, "env-only");

    let content = SAMPLE.replace("token = \"file-reader-token\"\n", "");
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir, &content);
    let config = TomlConfig::load(&path).unwrap();

    assert_eq!(config.reader.token, "env-only");

    clear_env();
}

#[test]
#[serial]
fn test_load_fails_without_tokens() {
    clear_env();

    let content = SAMPLE.replace("token = \"file-backend-token\"\n", "");
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir, &content);

    let err = TomlConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("backend.token"));
}

#[test]
#[serial]
fn test_load_missing_file_is_config_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let err = TomlConfig::load(&dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, rfgate_common::Error::Config(_)));
}
