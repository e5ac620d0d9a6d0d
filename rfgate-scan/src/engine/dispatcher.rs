//! Batch dispatcher
//!
//! Submits every record in the working set to the inbound endpoint at once,
//! waits for all calls to settle, then partitions record ids into succeeded
//! and failed. The session is stopped afterwards whatever the outcome.

use chrono::Utc;
use futures::future::join_all;
use rfgate_common::events::{EventBus, GateEvent};
use std::sync::Arc;

use crate::engine::session::SessionController;
use crate::engine::working_set::WorkingSet;
use crate::error::ScanError;
use crate::models::{DispatchReport, DispatchResult, TagRecord};
use crate::services::InboundSink;

pub struct BatchDispatcher {
    sink: Arc<dyn InboundSink>,
    working_set: Arc<WorkingSet>,
    gate_id: String,
    handoff: String,
    event_bus: EventBus,
}

impl BatchDispatcher {
    pub fn new(
        sink: Arc<dyn InboundSink>,
        working_set: Arc<WorkingSet>,
        gate_id: impl Into<String>,
        handoff: impl Into<String>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            sink,
            working_set,
            gate_id: gate_id.into(),
            handoff: handoff.into(),
            event_bus,
        }
    }

    pub fn gate_id(&self) -> &str {
        &self.gate_id
    }

    /// Dispatch the current working set, then stop the session
    ///
    /// Never fails: per-record failures land in `result.failed`, and a stop
    /// the reader does not confirm is reported in `stop_error` (the working
    /// set is then left as it was).
    pub async fn dispatch_all(&self, session: &SessionController) -> DispatchReport {
        let records = self.working_set.snapshot().await;
        tracing::info!(gate_id = %self.gate_id, records = records.len(), "Dispatching working set");

        let result = self.dispatch_records(&records).await;

        let stop_error = match session.stop_scanning().await {
            Ok(_) => None,
            Err(e) => {
                tracing::error!(error = %e, "Stop after dispatch not confirmed");
                Some(e.to_string())
            }
        };

        tracing::info!(
            gate_id = %self.gate_id,
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            "Dispatch completed"
        );

        self.event_bus.emit_lossy(GateEvent::DispatchCompleted {
            gate_id: self.gate_id.clone(),
            succeeded: result.succeeded.clone(),
            failed: result.failed.clone(),
            handoff: self.handoff.clone(),
            timestamp: Utc::now(),
        });

        DispatchReport {
            result,
            stop_error,
            handoff: self.handoff.clone(),
        }
    }

    /// Fan out one submit per record; partitions keep input order
    pub async fn dispatch_records(&self, records: &[TagRecord]) -> DispatchResult {
        let calls = records.iter().map(|record| async move {
            let outcome = self.sink.submit(&self.gate_id, &record.id).await;
            (record.id.to_string(), outcome)
        });

        let mut result = DispatchResult::default();
        for (record_id, outcome) in join_all(calls).await {
            match outcome {
                Ok(()) => result.succeeded.push(record_id),
                Err(source) => {
                    let err = ScanError::Dispatch {
                        record_id: record_id.clone(),
                        source,
                    };
                    tracing::warn!(error = %err, "Record not dispatched");
                    result.failed.push(record_id);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;
    use crate::services::InboundError;
    use async_trait::async_trait;

    /// Accepts even record ids
    struct EvenSink;

    #[async_trait]
    impl InboundSink for EvenSink {
        async fn submit(&self, _gate_id: &str, record_id: &RecordId) -> Result<(), InboundError> {
            match record_id {
                RecordId::Num(n) if n % 2 == 0 => Ok(()),
                _ => Err(InboundError::NotAccepted("odd".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_partition_preserves_order() {
        let dispatcher = BatchDispatcher::new(
            Arc::new(EvenSink),
            Arc::new(WorkingSet::new()),
            "G1",
            "/receiving",
            EventBus::new(16),
        );
        let records: Vec<_> = (1..=5i64)
            .map(|i| TagRecord::new(i, format!("E{}", i)))
            .collect();

        let result = dispatcher.dispatch_records(&records).await;
        assert_eq!(result.succeeded, vec!["2", "4"]);
        assert_eq!(result.failed, vec!["1", "3", "5"]);
        assert_eq!(result.total(), 5);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let dispatcher = BatchDispatcher::new(
            Arc::new(EvenSink),
            Arc::new(WorkingSet::new()),
            "G1",
            "/receiving",
            EventBus::new(16),
        );

        let result = dispatcher.dispatch_records(&[]).await;
        assert!(result.all_succeeded());
        assert_eq!(result.total(), 0);
    }
}
