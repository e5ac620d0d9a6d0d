//! Resolved tag record as returned by the backend lookup
//!
//! Field names follow the backend wire format (`EPC`, `PID`, snake_case for
//! the rest). Numeric-looking descriptive fields arrive as either JSON numbers
//! or strings depending on how the tag was registered, so they are normalized
//! to strings.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Business record for a sighted tag
///
/// Never mutated once appended to the working set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    /// Backend record id, sent back unchanged as `rfid_tag_id` on inbound dispatch
    pub id: RecordId,

    #[serde(rename = "EPC", default)]
    pub epc: Option<String>,

    #[serde(rename = "PID", default)]
    pub pid: Option<String>,

    #[serde(default)]
    pub item_name: Option<String>,

    #[serde(default)]
    pub item_description: Option<String>,

    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub quantity: Option<String>,

    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub weight: Option<String>,

    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub seal_number: Option<String>,

    #[serde(default)]
    pub location: Option<Place>,

    #[serde(default)]
    pub destination: Option<Place>,

    #[serde(default)]
    pub updated_by: Option<Actor>,
}

/// Backend record id in its original JSON type
///
/// `7` and `"007"` are different ids; neither is converted into the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Num(i64),
    Str(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Num(n) => write!(f, "{}", n),
            RecordId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Num(n)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Str(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Str(s.to_string())
    }
}

/// Location or destination reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Actor who last updated the record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

impl TagRecord {
    /// Minimal record, mostly useful for tests and fakes
    pub fn new(id: impl Into<RecordId>, epc: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            epc: Some(epc.into()),
            pid: None,
            item_name: None,
            item_description: None,
            quantity: None,
            weight: None,
            seal_number: None,
            location: None,
            destination: None,
            updated_by: None,
        }
    }

    /// Location name, if any
    pub fn location_name(&self) -> Option<&str> {
        self.location.as_ref().and_then(|p| p.name.as_deref())
    }

    /// Destination name, if any
    pub fn destination_name(&self) -> Option<&str> {
        self.destination.as_ref().and_then(|p| p.name.as_deref())
    }
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}
