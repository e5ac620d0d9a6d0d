//! Batch dispatch results

use serde::{Deserialize, Serialize};

/// Success/failure partition of one batch dispatch
///
/// Identifiers are record ids, listed in working-set order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl DispatchResult {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of `dispatch_all`, including the forced session stop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    pub result: DispatchResult,
    /// Set when the follow-up stop command was not confirmed
    /// (the working set is then left intact)
    pub stop_error: Option<String>,
    /// View the UI should hand off to
    pub handoff: String,
}
