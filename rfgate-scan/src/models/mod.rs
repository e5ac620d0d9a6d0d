//! Data models for the scanning engine

pub mod dispatch;
pub mod tag_record;

pub use dispatch::{DispatchReport, DispatchResult};
pub use rfgate_common::events::SessionState;
pub use tag_record::{Actor, Place, RecordId, TagRecord};

/// Normalized tag sighting forwarded to resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSighting {
    /// EPC as reported by the reader (`idHex`)
    pub identifier: String,
}
