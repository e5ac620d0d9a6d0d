//! Working set search filter
//!
//! Case-insensitive substring match against EPC, PID, item name, location
//! name and destination name. An empty term matches everything.

use crate::models::TagRecord;

/// Whether `record` matches `term`
pub fn matches(record: &TagRecord, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();

    [
        record.epc.as_deref(),
        record.pid.as_deref(),
        record.item_name.as_deref(),
        record.location_name(),
        record.destination_name(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Matching records, original order preserved
pub fn filter_records(records: &[TagRecord], term: &str) -> Vec<TagRecord> {
    records
        .iter()
        .filter(|record| matches(record, term))
        .cloned()
        .collect()
}
