//! Event types for the RFGate event system
//!
//! Provides shared event definitions and the EventBus used to push engine
//! changes to observers (control API SSE stream, logging).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Scanning session state
///
/// `Idle` → `Scanning` on a confirmed start, `Scanning` → `StoppedCleared` on a
/// confirmed stop (working set emptied), `StoppedCleared` → `Scanning` on re-arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Scanning,
    StoppedCleared,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Scanning => write!(f, "scanning"),
            SessionState::StoppedCleared => write!(f, "stopped_cleared"),
        }
    }
}

/// Remote reader command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanCommand {
    Start,
    Stop,
}

impl std::fmt::Display for ScanCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanCommand::Start => write!(f, "start"),
            ScanCommand::Stop => write!(f, "stop"),
        }
    }
}

/// RFGate event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GateEvent {
    /// Session state changed after a confirmed remote command
    SessionStateChanged {
        old_state: SessionState,
        new_state: SessionState,
        /// Session id of the new state (None once stopped)
        session_id: Option<Uuid>,
        timestamp: DateTime<Utc>,
    },

    /// A start/stop command was not confirmed by the reader
    ///
    /// Local state is left unchanged; the command may be retried.
    ScanCommandFailed {
        command: ScanCommand,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A sighting was resolved and appended to the working set
    TagResolved {
        epc: String,
        record_id: String,
        working_set_len: usize,
        timestamp: DateTime<Utc>,
    },

    /// A batch dispatch finished (every call settled)
    DispatchCompleted {
        gate_id: String,
        succeeded: Vec<String>,
        failed: Vec<String>,
        /// View the UI should hand off to
        handoff: String,
        timestamp: DateTime<Utc>,
    },

    /// Reader stream closed (remote close, transport error or local teardown)
    ReaderConnectionClosed {
        code: Option<u16>,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl GateEvent {
    /// Event type name, used as the SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            GateEvent::SessionStateChanged { .. } => "SessionStateChanged",
            GateEvent::ScanCommandFailed { .. } => "ScanCommandFailed",
            GateEvent::TagResolved { .. } => "TagResolved",
            GateEvent::DispatchCompleted { .. } => "DispatchCompleted",
            GateEvent::ReaderConnectionClosed { .. } => "ReaderConnectionClosed",
        }
    }
}

/// Broadcast bus for GateEvent
///
/// Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GateEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<GateEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: GateEvent) {
        let _ = self.tx.send(event);
    }
}
