//! Scanning session state machine
//!
//! Idle → Scanning → StoppedCleared → Scanning ...
//!
//! Every transition is a request to the reader. Local state only moves after
//! the reader confirms; an unconfirmed command leaves the state where it was
//! and records a `CommandFailure` for the UI to surface. The working set is
//! cleared only after a confirmed stop.

use chrono::{DateTime, Utc};
use rfgate_common::events::{EventBus, GateEvent, ScanCommand, SessionState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::engine::working_set::WorkingSet;
use crate::error::{ScanError, ScanResult};
use crate::services::ScanCommands;

/// Last unconfirmed start/stop command (degraded indicator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandFailure {
    pub command: ScanCommand,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Point-in-time view of the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// Present while scanning
    pub session_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub record_count: usize,
    pub last_failure: Option<CommandFailure>,
}

#[derive(Debug)]
struct Session {
    state: SessionState,
    session_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    last_failure: Option<CommandFailure>,
}

impl Session {
    fn idle() -> Self {
        Self {
            state: SessionState::Idle,
            session_id: None,
            started_at: None,
            last_failure: None,
        }
    }

    /// Move to `new_state`; returns the change event
    fn transition_to(&mut self, new_state: SessionState) -> GateEvent {
        let old_state = self.state;
        self.state = new_state;
        self.last_failure = None;

        match new_state {
            SessionState::Scanning => {
                self.session_id = Some(Uuid::new_v4());
                self.started_at = Some(Utc::now());
            }
            SessionState::Idle | SessionState::StoppedCleared => {
                self.session_id = None;
                self.started_at = None;
            }
        }

        GateEvent::SessionStateChanged {
            old_state,
            new_state,
            session_id: self.session_id,
            timestamp: Utc::now(),
        }
    }
}

/// Owns the session state and drives the reader start/stop commands
pub struct SessionController {
    commands: Arc<dyn ScanCommands>,
    working_set: Arc<WorkingSet>,
    event_bus: EventBus,
    session: RwLock<Session>,
    /// Serializes start/stop so commands never race each other
    command_lock: Mutex<()>,
}

impl SessionController {
    pub fn new(
        commands: Arc<dyn ScanCommands>,
        working_set: Arc<WorkingSet>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            commands,
            working_set,
            event_bus,
            session: RwLock::new(Session::idle()),
            command_lock: Mutex::new(()),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.session.read().await.state
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.read().await;
        SessionSnapshot {
            state: session.state,
            session_id: session.session_id,
            started_at: session.started_at,
            record_count: self.working_set.len().await,
            last_failure: session.last_failure.clone(),
        }
    }

    /// Working set generation to resolve a sighting against
    ///
    /// `None` unless scanning. State and generation are read under the same
    /// lock that a confirmed stop holds while clearing, so a sighting admitted
    /// here can never append into the next session.
    pub async fn admission(&self) -> Option<u64> {
        let session = self.session.read().await;
        if session.state != SessionState::Scanning {
            return None;
        }
        Some(self.working_set.generation().await)
    }

    /// Ask the reader to start scanning
    ///
    /// Already scanning: no command is sent and the current session is kept.
    pub async fn start_scanning(&self) -> ScanResult<SessionSnapshot> {
        let _guard = self.command_lock.lock().await;

        if self.state().await == SessionState::Scanning {
            tracing::debug!("Start requested while already scanning");
            return Ok(self.snapshot().await);
        }

        if let Err(source) = self.commands.start().await {
            return Err(self.record_failure(ScanCommand::Start, source).await);
        }

        let event = self.session.write().await.transition_to(SessionState::Scanning);
        tracing::info!(event = ?event, "Scanning started");
        self.event_bus.emit_lossy(event);

        Ok(self.snapshot().await)
    }

    /// Ask the reader to stop; clears the working set once confirmed
    ///
    /// Safe to call in any state. On failure nothing is cleared and the state
    /// is unchanged.
    pub async fn stop_scanning(&self) -> ScanResult<SessionSnapshot> {
        let _guard = self.command_lock.lock().await;

        if let Err(source) = self.commands.stop().await {
            return Err(self.record_failure(ScanCommand::Stop, source).await);
        }

        let (event, cleared) = {
            let mut session = self.session.write().await;
            let cleared = self.working_set.clear().await;
            (session.transition_to(SessionState::StoppedCleared), cleared)
        };
        tracing::info!(cleared, "Scanning stopped, working set cleared");
        self.event_bus.emit_lossy(event);

        Ok(self.snapshot().await)
    }

    async fn record_failure(
        &self,
        command: ScanCommand,
        source: crate::services::CommandError,
    ) -> ScanError {
        let message = source.to_string();
        tracing::error!(command = %command, error = %message, "Scan command not confirmed");

        self.session.write().await.last_failure = Some(CommandFailure {
            command,
            message: message.clone(),
            at: Utc::now(),
        });

        self.event_bus.emit_lossy(GateEvent::ScanCommandFailed {
            command,
            message,
            timestamp: Utc::now(),
        });

        ScanError::Command { command, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TagRecord;
    use crate::services::CommandError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeReader {
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ScanCommands for FakeReader {
        async fn start(&self) -> Result<(), CommandError> {
            self.respond()
        }

        async fn stop(&self) -> Result<(), CommandError> {
            self.respond()
        }
    }

    impl FakeReader {
        fn respond(&self) -> Result<(), CommandError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(CommandError::Rejected {
                    status: 500,
                    message: "reader offline".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn controller() -> (Arc<FakeReader>, Arc<WorkingSet>, SessionController) {
        let reader = Arc::new(FakeReader::default());
        let working_set = Arc::new(WorkingSet::new());
        let controller =
            SessionController::new(reader.clone(), working_set.clone(), EventBus::new(16));
        (reader, working_set, controller)
    }

    #[tokio::test]
    async fn test_start_opens_session() {
        let (_, _, controller) = controller();
        assert_eq!(controller.state().await, SessionState::Idle);
        assert!(controller.admission().await.is_none());

        let snapshot = controller.start_scanning().await.unwrap();
        assert_eq!(snapshot.state, SessionState::Scanning);
        assert!(snapshot.session_id.is_some());
        assert!(controller.admission().await.is_some());
    }

    #[tokio::test]
    async fn test_start_failure_is_retryable() {
        let (reader, _, controller) = controller();
        reader.fail.store(true, Ordering::SeqCst);

        let err = controller.start_scanning().await.unwrap_err();
        assert!(matches!(err, ScanError::Command { command: ScanCommand::Start, .. }));

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.state, SessionState::Idle);
        assert_eq!(snapshot.last_failure.unwrap().command, ScanCommand::Start);

        reader.fail.store(false, Ordering::SeqCst);
        let snapshot = controller.start_scanning().await.unwrap();
        assert_eq!(snapshot.state, SessionState::Scanning);
        assert!(snapshot.last_failure.is_none());
    }

    #[tokio::test]
    async fn test_start_while_scanning_sends_nothing() {
        let (reader, _, controller) = controller();
        let first = controller.start_scanning().await.unwrap();
        let second = controller.start_scanning().await.unwrap();

        assert_eq!(reader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.session_id, second.session_id);
    }

    #[tokio::test]
    async fn test_stop_clears_working_set() {
        let (_, working_set, controller) = controller();
        controller.start_scanning().await.unwrap();
        working_set.append(TagRecord::new("1", "A1")).await;
        working_set.append(TagRecord::new("2", "B2")).await;

        let snapshot = controller.stop_scanning().await.unwrap();
        assert_eq!(snapshot.state, SessionState::StoppedCleared);
        assert_eq!(snapshot.record_count, 0);
        assert!(working_set.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_stop_keeps_records() {
        let (reader, working_set, controller) = controller();
        controller.start_scanning().await.unwrap();
        working_set.append(TagRecord::new("1", "A1")).await;
        reader.fail.store(true, Ordering::SeqCst);

        assert!(controller.stop_scanning().await.is_err());
        assert_eq!(controller.state().await, SessionState::Scanning);
        assert_eq!(working_set.len().await, 1);
    }

    #[tokio::test]
    async fn test_rearm_opens_new_session() {
        let (_, _, controller) = controller();
        let first = controller.start_scanning().await.unwrap();
        controller.stop_scanning().await.unwrap();
        let second = controller.start_scanning().await.unwrap();

        assert_eq!(second.state, SessionState::Scanning);
        assert_ne!(first.session_id, second.session_id);
    }

    #[tokio::test]
    async fn test_transitions_emit_events() {
        let reader = Arc::new(FakeReader::default());
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let controller = SessionController::new(reader, Arc::new(WorkingSet::new()), bus);

        controller.start_scanning().await.unwrap();
        match rx.recv().await.unwrap() {
            GateEvent::SessionStateChanged { old_state, new_state, .. } => {
                assert_eq!(old_state, SessionState::Idle);
                assert_eq!(new_state, SessionState::Scanning);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
