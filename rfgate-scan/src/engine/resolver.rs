//! Tag resolver
//!
//! Sightings are queued on a bounded channel and resolved by a single worker
//! with at most `concurrency` lookups in flight. A full queue applies
//! backpressure to the reader task instead of piling up requests.
//!
//! One lookup per sighting. Failures and empty payloads drop the sighting;
//! nothing is retried. Records land in the working set in completion order.

use chrono::Utc;
use futures::StreamExt;
use rfgate_common::events::{EventBus, GateEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::engine::working_set::WorkingSet;
use crate::error::ScanError;
use crate::models::TagSighting;
use crate::services::TagLookup;

/// Sighting admitted during a scanning session
#[derive(Debug, Clone)]
struct Admitted {
    sighting: TagSighting,
    /// Working set generation at admission
    generation: u64,
}

struct ResolverContext {
    lookup: Arc<dyn TagLookup>,
    working_set: Arc<WorkingSet>,
    event_bus: EventBus,
}

/// Producer side of the resolution queue
#[derive(Clone)]
pub struct TagResolver {
    tx: mpsc::Sender<Admitted>,
}

impl TagResolver {
    /// Start the resolver worker
    ///
    /// The worker stops taking sightings when `cancel` fires and abandons
    /// lookups still in flight.
    pub fn spawn(
        lookup: Arc<dyn TagLookup>,
        working_set: Arc<WorkingSet>,
        event_bus: EventBus,
        queue_capacity: usize,
        concurrency: usize,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let ctx = Arc::new(ResolverContext {
            lookup,
            working_set,
            event_bus,
        });

        let handle = tokio::spawn(run(ctx, rx, concurrency.max(1), cancel));
        (Self { tx }, handle)
    }

    /// Queue a sighting; waits while the queue is full
    ///
    /// Returns `false` once the worker has shut down.
    pub async fn submit(&self, sighting: TagSighting, generation: u64) -> bool {
        self.tx
            .send(Admitted {
                sighting,
                generation,
            })
            .await
            .is_ok()
    }
}

async fn run(
    ctx: Arc<ResolverContext>,
    rx: mpsc::Receiver<Admitted>,
    concurrency: usize,
    cancel: CancellationToken,
) {
    tracing::debug!(concurrency, "Tag resolver started");

    ReceiverStream::new(rx)
        .take_until(cancel.clone().cancelled_owned())
        .for_each_concurrent(concurrency, |admitted| {
            let ctx = Arc::clone(&ctx);
            let cancel = cancel.clone();
            let epc = admitted.sighting.identifier.clone();
            async move {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!(epc = %epc, "Lookup abandoned");
                    }
                    _ = ctx.resolve_one(admitted) => {}
                }
            }
        })
        .await;

    tracing::debug!("Tag resolver stopped");
}

impl ResolverContext {
    async fn resolve_one(&self, admitted: Admitted) {
        let epc = admitted.sighting.identifier;

        let record = match self.lookup.lookup(&epc).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!(epc = %epc, "No record for tag, sighting dropped");
                return;
            }
            Err(source) => {
                let err = ScanError::Lookup {
                    identifier: epc,
                    source,
                };
                tracing::warn!(error = %err, "Sighting dropped");
                return;
            }
        };

        let record_id = record.id.to_string();
        match self
            .working_set
            .append_if_current(admitted.generation, record)
            .await
        {
            Some(working_set_len) => {
                tracing::debug!(epc = %epc, record_id = %record_id, working_set_len, "Tag resolved");
                self.event_bus.emit_lossy(GateEvent::TagResolved {
                    epc,
                    record_id,
                    working_set_len,
                    timestamp: Utc::now(),
                });
            }
            None => {
                tracing::debug!(epc = %epc, "Session cleared during lookup, record discarded");
            }
        }
    }
}
