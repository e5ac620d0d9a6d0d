//! Scanning engine
//!
//! Ties the reader stream to the session, the working set and the batch
//! dispatcher for the lifetime of one scanning station.
//!
//! # Modules
//! - **working_set** - Append-only record set with atomic clear
//! - **search** - Case-insensitive working set filter
//! - **resolver** - Bounded-concurrency tag lookups
//! - **session** - Idle / Scanning / StoppedCleared state machine
//! - **dispatcher** - Batch inbound dispatch with failure partition
//!
//! # Lifecycle
//! [`ScanEngine::open`] connects to the reader and returns a [`ScanHandle`].
//! The handle owns the reader task and the resolver worker; [`ScanHandle::close`]
//! sends a close frame and waits for both, and dropping the handle without
//! closing still cancels them, so the connection is released on every exit path.

pub mod dispatcher;
pub mod resolver;
pub mod search;
pub mod session;
pub mod working_set;

pub use dispatcher::BatchDispatcher;
pub use resolver::TagResolver;
pub use session::{CommandFailure, SessionController, SessionSnapshot};
pub use working_set::WorkingSet;

use chrono::Utc;
use futures::stream::SplitSink;
use futures::{SinkExt, Stream, StreamExt};
use rfgate_common::config::{EngineConfig, ReaderConfig, TomlConfig};
use rfgate_common::events::{EventBus, GateEvent};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;

use crate::error::{ScanError, ScanResult};
use crate::models::{DispatchReport, TagRecord};
use crate::services::{
    InboundClient, InboundSink, ReaderCommandClient, ScanCommands, TagLookup, TagLookupClient,
};
use crate::stream::connection::{connect_reader, ReaderSocket};
use crate::stream::{decode_frame, sightings, StreamFrame};

/// The three remote parties the engine depends on
#[derive(Clone)]
pub struct Collaborators {
    pub commands: Arc<dyn ScanCommands>,
    pub lookup: Arc<dyn TagLookup>,
    pub inbound: Arc<dyn InboundSink>,
}

impl Collaborators {
    /// reqwest-backed clients for the configured reader and backend
    pub fn from_config(config: &TomlConfig) -> ScanResult<Self> {
        let timeout = Duration::from_millis(config.engine.request_timeout_ms);

        let commands = ReaderCommandClient::new(
            config.reader.command_base_url(),
            &config.reader.token,
            timeout,
        )
        .map_err(|e| ScanError::Transport(e.to_string()))?;
        let lookup = TagLookupClient::new(&config.backend.base_url, &config.backend.token, timeout)
            .map_err(|e| ScanError::Transport(e.to_string()))?;
        let inbound = InboundClient::new(&config.backend.base_url, &config.backend.token, timeout)
            .map_err(|e| ScanError::Transport(e.to_string()))?;

        Ok(Self {
            commands: Arc::new(commands),
            lookup: Arc::new(lookup),
            inbound: Arc::new(inbound),
        })
    }
}

/// Reader stream state as seen by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReaderStatus {
    /// No stream opened yet
    NotConnected,
    Connected,
    /// Open failed or the stream ended; there is no reconnect
    Closed { reason: String },
}

/// Engine instance bound to one scanning station
///
/// Owns the working set and the session; nothing is shared across instances.
pub struct ScanEngine {
    working_set: Arc<WorkingSet>,
    session: SessionController,
    dispatcher: BatchDispatcher,
    lookup: Arc<dyn TagLookup>,
    event_bus: EventBus,
    settings: EngineConfig,
    reader: watch::Sender<ReaderStatus>,
}

impl ScanEngine {
    pub fn new(
        gate_id: impl Into<String>,
        settings: EngineConfig,
        collaborators: Collaborators,
        event_bus: EventBus,
    ) -> Arc<Self> {
        let working_set = Arc::new(WorkingSet::new());
        let session = SessionController::new(
            collaborators.commands,
            Arc::clone(&working_set),
            event_bus.clone(),
        );
        let dispatcher = BatchDispatcher::new(
            collaborators.inbound,
            Arc::clone(&working_set),
            gate_id,
            settings.handoff_view.clone(),
            event_bus.clone(),
        );

        Arc::new(Self {
            working_set,
            session,
            dispatcher,
            lookup: collaborators.lookup,
            event_bus,
            settings,
            reader: watch::channel(ReaderStatus::NotConnected).0,
        })
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn gate_id(&self) -> &str {
        self.dispatcher.gate_id()
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn working_set(&self) -> &Arc<WorkingSet> {
        &self.working_set
    }

    pub fn reader_status(&self) -> ReaderStatus {
        self.reader.borrow().clone()
    }

    /// Start a session
    ///
    /// Refused without a remote call once the reader stream has closed, since
    /// no sightings could arrive.
    pub async fn start_scanning(&self) -> ScanResult<SessionSnapshot> {
        if let ReaderStatus::Closed { reason } = self.reader_status() {
            return Err(ScanError::Transport(format!(
                "reader stream closed: {}",
                reason
            )));
        }
        self.session.start_scanning().await
    }

    pub async fn stop_scanning(&self) -> ScanResult<SessionSnapshot> {
        self.session.stop_scanning().await
    }

    /// Dispatch the working set and stop the session (see [`BatchDispatcher`])
    pub async fn dispatch_all(&self) -> DispatchReport {
        self.dispatcher.dispatch_all(&self.session).await
    }

    /// Working set records matching `term` (empty term: all records)
    pub async fn records(&self, term: &str) -> Vec<TagRecord> {
        self.working_set.search(term).await
    }

    /// Connect to the reader and start ingesting sightings
    pub async fn open(self: &Arc<Self>, reader: &ReaderConfig) -> ScanResult<ScanHandle> {
        let socket = match connect_reader(&reader.host, &reader.token).await {
            Ok(socket) => socket,
            Err(e) => {
                self.reader.send_replace(ReaderStatus::Closed {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };
        let (sink, stream) = socket.split();

        let mut handle = self.attach(stream);
        handle.sink = Some(sink);
        Ok(handle)
    }

    /// Ingest from an already-open message stream
    pub fn attach<S>(self: &Arc<Self>, stream: S) -> ScanHandle
    where
        S: Stream<Item = Result<Message, WsError>> + Send + Unpin + 'static,
    {
        let cancel = CancellationToken::new();
        self.reader.send_replace(ReaderStatus::Connected);

        let (resolver, resolver_task) = TagResolver::spawn(
            Arc::clone(&self.lookup),
            Arc::clone(&self.working_set),
            self.event_bus.clone(),
            self.settings.sighting_queue,
            self.settings.lookup_concurrency,
            cancel.child_token(),
        );

        let reader_task = tokio::spawn(read_frames(
            Arc::clone(self),
            stream,
            resolver,
            cancel.clone(),
        ));

        ScanHandle {
            cancel,
            reader_task: Some(reader_task),
            resolver_task: Some(resolver_task),
            sink: None,
        }
    }

    /// Decode one frame and queue its sightings
    ///
    /// Bad frames are logged and dropped; this never fails.
    async fn handle_frame(&self, frame: StreamFrame, resolver: &TagResolver) {
        let text = match decode_frame(frame).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Frame dropped");
                return;
            }
        };

        let found: Vec<_> = sightings(&text).collect();
        for sighting in found {
            let Some(generation) = self.session.admission().await else {
                tracing::debug!(epc = %sighting.identifier, "Not scanning, sighting ignored");
                continue;
            };
            if !resolver.submit(sighting, generation).await {
                tracing::debug!("Resolver stopped, remaining sightings ignored");
                return;
            }
        }
    }
}

async fn read_frames<S>(
    engine: Arc<ScanEngine>,
    mut stream: S,
    resolver: TagResolver,
    cancel: CancellationToken,
) where
    S: Stream<Item = Result<Message, WsError>> + Send + Unpin,
{
    tracing::info!(gate_id = %engine.gate_id(), "Reader stream attached");

    let (code, reason) = loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break (None, "closed by engine".to_string()),
            message = stream.next() => message,
        };

        match message {
            Some(Ok(Message::Close(frame))) => {
                break match frame {
                    Some(frame) => (Some(u16::from(frame.code)), frame.reason.to_string()),
                    None => (None, "closed by reader".to_string()),
                };
            }
            Some(Ok(message)) => {
                if let Some(frame) = StreamFrame::from_message(message) {
                    engine.handle_frame(frame, &resolver).await;
                }
            }
            Some(Err(e)) => {
                let err = ScanError::Transport(e.to_string());
                tracing::error!(error = %err, "Reader stream failed");
                break (None, err.to_string());
            }
            None => break (None, "stream ended".to_string()),
        }
    };

    tracing::info!(code = ?code, reason = %reason, "Reader stream closed");
    engine.reader.send_replace(ReaderStatus::Closed {
        reason: reason.clone(),
    });
    engine.event_bus.emit_lossy(GateEvent::ReaderConnectionClosed {
        code,
        reason,
        timestamp: Utc::now(),
    });
}

/// Scoped reader connection
///
/// Dropping the handle cancels the reader task and the resolver worker.
pub struct ScanHandle {
    cancel: CancellationToken,
    reader_task: Option<JoinHandle<()>>,
    resolver_task: Option<JoinHandle<()>>,
    sink: Option<SplitSink<ReaderSocket, Message>>,
}

impl ScanHandle {
    /// Close the reader connection and stop ingesting
    ///
    /// Lookups still in flight are abandoned.
    pub async fn close(mut self) {
        self.cancel.cancel();

        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.send(Message::Close(None)).await {
                tracing::debug!(error = %e, "Close frame not sent");
            }
            if let Err(e) = sink.close().await {
                tracing::debug!(error = %e, "Reader socket not closed cleanly");
            }
        }

        self.join().await;
    }

    /// Wait for the reader stream to end on its own and queued sightings
    /// to finish resolving
    pub async fn finished(mut self) {
        self.join().await;
    }

    async fn join(&mut self) {
        for task in [self.reader_task.take(), self.resolver_task.take()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Engine task panicked");
            }
        }
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
