//! Reader event shapes

use serde_json::Value;

/// `type` value of tag-read events
pub const SIMPLE_KIND: &str = "SIMPLE";

/// Decoded reader event
///
/// Known kinds get a typed variant; everything else is kept as
/// `Unrecognized` and ignored downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    Simple(SimpleEvent),
    Unrecognized(Value),
}

/// `{"type":"SIMPLE","timestamp":..,"data":{..}}`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleEvent {
    pub timestamp: Option<String>,
    pub data: Option<SimpleData>,
}

/// Payload of a SIMPLE event
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleData {
    pub format: Option<String>,
    pub id_hex: Option<String>,
    pub antenna: Option<u64>,
    pub peak_rssi: Option<i64>,
}

impl RawEvent {
    /// Lift a parsed JSON value into an event
    ///
    /// Fields of the wrong JSON type are treated as absent.
    pub fn from_value(value: Value) -> Self {
        if value.get("type").and_then(Value::as_str) != Some(SIMPLE_KIND) {
            return RawEvent::Unrecognized(value);
        }

        let data = value.get("data").filter(|d| d.is_object()).map(|d| SimpleData {
            format: d.get("format").and_then(Value::as_str).map(str::to_owned),
            id_hex: d.get("idHex").and_then(Value::as_str).map(str::to_owned),
            antenna: d.get("antenna").and_then(Value::as_u64),
            peak_rssi: d.get("peakRssi").and_then(Value::as_i64),
        });

        RawEvent::Simple(SimpleEvent {
            timestamp: value
                .get("timestamp")
                .and_then(Value::as_str)
                .map(str::to_owned),
            data,
        })
    }

    /// The `type` tag, if the event carried one
    pub fn kind(&self) -> Option<&str> {
        match self {
            RawEvent::Simple(_) => Some(SIMPLE_KIND),
            RawEvent::Unrecognized(value) => value.get("type").and_then(Value::as_str),
        }
    }
}
