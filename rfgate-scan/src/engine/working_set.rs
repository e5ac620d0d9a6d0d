//! Session-scoped working set of resolved tag records
//!
//! Append-only between clears; a clear empties the set atomically and bumps
//! the generation so lookups that started before the clear cannot leak
//! records into the next scan.
//!
//! Records appear in lookup-completion order, which need not match the order
//! tags were sighted. Repeated sightings of one tag are kept as separate rows.

use tokio::sync::RwLock;

use crate::engine::search::filter_records;
use crate::models::TagRecord;

/// Ordered, concurrently appendable record set
#[derive(Debug, Default)]
pub struct WorkingSet {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    records: Vec<TagRecord>,
    generation: u64,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation (incremented by every clear)
    pub async fn generation(&self) -> u64 {
        self.inner.read().await.generation
    }

    /// Append unconditionally; returns the new length
    #[cfg(test)]
    pub(crate) async fn append(&self, record: TagRecord) -> usize {
        let mut inner = self.inner.write().await;
        inner.records.push(record);
        inner.records.len()
    }

    /// Append only if no clear happened since `generation` was read
    ///
    /// Returns the new length, or `None` if the record was discarded.
    pub async fn append_if_current(&self, generation: u64, record: TagRecord) -> Option<usize> {
        let mut inner = self.inner.write().await;
        if inner.generation != generation {
            return None;
        }
        inner.records.push(record);
        Some(inner.records.len())
    }

    /// Empty the set; returns how many records were removed
    pub async fn clear(&self) -> usize {
        let mut inner = self.inner.write().await;
        inner.generation += 1;
        let removed = inner.records.len();
        inner.records.clear();
        removed
    }

    /// Copy of all records in insertion order
    pub async fn snapshot(&self) -> Vec<TagRecord> {
        self.inner.read().await.records.clone()
    }

    /// Records matching a search term (see [`crate::engine::search`])
    pub async fn search(&self, term: &str) -> Vec<TagRecord> {
        filter_records(&self.inner.read().await.records, term)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}
