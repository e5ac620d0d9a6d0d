//! Shared test fakes for the collaborator traits

#![allow(dead_code)]

use async_trait::async_trait;
use rfgate_common::config::EngineConfig;
use rfgate_common::events::EventBus;
use rfgate_scan::models::{RecordId, TagRecord};
use rfgate_scan::services::{
    CommandError, InboundError, InboundSink, LookupError, ScanCommands, TagLookup,
};
use rfgate_scan::{Collaborators, ScanEngine};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Reader whose start/stop can be made to fail
#[derive(Default)]
pub struct FakeReader {
    pub fail_start: AtomicBool,
    pub fail_stop: AtomicBool,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

#[async_trait]
impl ScanCommands for FakeReader {
    async fn start(&self) -> Result<(), CommandError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(CommandError::Rejected {
                status: 503,
                message: "reader offline".to_string(),
            });
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), CommandError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(CommandError::Network("connection reset".to_string()));
        }
        Ok(())
    }
}

/// Resolves every EPC except those in `missing`; EPCs in `broken` error
#[derive(Default)]
pub struct FakeLookup {
    pub missing: Mutex<HashSet<String>>,
    pub broken: Mutex<HashSet<String>>,
    pub calls: AtomicUsize,
}

impl FakeLookup {
    pub fn with_missing(epcs: &[&str]) -> Self {
        let lookup = Self::default();
        lookup
            .missing
            .lock()
            .unwrap()
            .extend(epcs.iter().map(|e| e.to_string()));
        lookup
    }
}

#[async_trait]
impl TagLookup for FakeLookup {
    async fn lookup(&self, epc: &str) -> Result<Option<TagRecord>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken.lock().unwrap().contains(epc) {
            return Err(LookupError::Api(500, "lookup exploded".to_string()));
        }
        if self.missing.lock().unwrap().contains(epc) {
            return Ok(None);
        }
        Ok(Some(record_for(epc)))
    }
}

/// Rejects the record ids in `reject`, records every submission
#[derive(Default)]
pub struct FakeSink {
    pub reject: Mutex<HashSet<String>>,
    pub submitted: Mutex<Vec<(String, String)>>,
}

impl FakeSink {
    pub fn rejecting(ids: &[&str]) -> Self {
        let sink = Self::default();
        sink.reject
            .lock()
            .unwrap()
            .extend(ids.iter().map(|i| i.to_string()));
        sink
    }
}

#[async_trait]
impl InboundSink for FakeSink {
    async fn submit(&self, gate_id: &str, record_id: &RecordId) -> Result<(), InboundError> {
        let record_id = record_id.to_string();
        self.submitted
            .lock()
            .unwrap()
            .push((gate_id.to_string(), record_id.clone()));
        if self.reject.lock().unwrap().contains(&record_id) {
            return Err(InboundError::NotAccepted("gate closed".to_string()));
        }
        Ok(())
    }
}

/// Record id derived from the EPC so tests can predict it
pub fn record_for(epc: &str) -> TagRecord {
    TagRecord::new(format!("rec-{}", epc), epc)
}

/// Put records straight into the current session's working set
pub async fn seed(engine: &ScanEngine, epcs: &[&str]) {
    let working_set = engine.working_set();
    for epc in epcs {
        let generation = working_set.generation().await;
        working_set
            .append_if_current(generation, record_for(epc))
            .await
            .expect("working set cleared while seeding");
    }
}

pub fn sighting_json(epc: &str) -> String {
    format!(
        r#"{{"type":"SIMPLE","timestamp":"2024-11-02T08:15:00.000+0700","data":{{"format":"epc","idHex":"{}"}}}}"#,
        epc
    )
}

pub struct Harness {
    pub reader: Arc<FakeReader>,
    pub lookup: Arc<FakeLookup>,
    pub sink: Arc<FakeSink>,
    pub engine: Arc<ScanEngine>,
}

pub fn harness(lookup: FakeLookup, sink: FakeSink) -> Harness {
    let reader = Arc::new(FakeReader::default());
    let lookup = Arc::new(lookup);
    let sink = Arc::new(sink);

    let engine = ScanEngine::new(
        "G7",
        EngineConfig::default(),
        Collaborators {
            commands: reader.clone(),
            lookup: lookup.clone(),
            inbound: sink.clone(),
        },
        EventBus::new(256),
    );

    Harness {
        reader,
        lookup,
        sink,
        engine,
    }
}
