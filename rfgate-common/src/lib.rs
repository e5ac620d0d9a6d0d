//! # RFGate Common Library
//!
//! Shared code for the RFGate gate-scanning services:
//! - Configuration loading and path resolution (`rfgate.toml`)
//! - Event types (GateEvent enum) and the broadcast EventBus
//! - Common error type

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{EventBus, GateEvent};
