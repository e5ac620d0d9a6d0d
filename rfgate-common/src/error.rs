//! Common error types for RFGate

use thiserror::Error;

/// Common result type for RFGate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across RFGate crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
