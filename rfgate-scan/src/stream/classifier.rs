//! Event classifier
//!
//! Only `SIMPLE` events in `epc` format with a non-empty `idHex` are tag
//! sightings. Every other shape is ignored without error.

use crate::models::TagSighting;
use crate::stream::event::{RawEvent, SimpleEvent};
use crate::stream::extractor::extract_events;

/// `data.format` value for EPC reads
pub const EPC_FORMAT: &str = "epc";

/// Tag sighting carried by an event, if any
pub fn classify(event: &RawEvent) -> Option<TagSighting> {
    match event {
        RawEvent::Simple(SimpleEvent {
            data: Some(data), ..
        }) if data.format.as_deref() == Some(EPC_FORMAT) => {
            let identifier = data.id_hex.as_deref()?.trim();
            if identifier.is_empty() {
                return None;
            }
            Some(TagSighting {
                identifier: identifier.to_string(),
            })
        }
        RawEvent::Simple(_) | RawEvent::Unrecognized(_) => None,
    }
}

/// All sightings in one decoded frame, in source order
pub fn sightings(text: &str) -> impl Iterator<Item = TagSighting> + '_ {
    extract_events(text).filter_map(|event| {
        let sighting = classify(&event);
        if sighting.is_none() {
            tracing::trace!(kind = ?event.kind(), "Event ignored");
        }
        sighting
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: serde_json::Value) -> RawEvent {
        RawEvent::from_value(value)
    }

    #[test]
    fn test_epc_simple_event_is_sighting() {
        let sighting = classify(&event(json!({
            "type": "SIMPLE",
            "data": { "format": "epc", "idHex": "E28011700000020A" }
        })));
        assert_eq!(
            sighting,
            Some(TagSighting {
                identifier: "E28011700000020A".to_string()
            })
        );
    }

    #[test]
    fn test_other_type_ignored() {
        assert!(classify(&event(json!({
            "type": "GPI",
            "data": { "format": "epc", "idHex": "A1" }
        })))
        .is_none());
    }

    #[test]
    fn test_other_format_ignored() {
        assert!(classify(&event(json!({
            "type": "SIMPLE",
            "data": { "format": "tid", "idHex": "A1" }
        })))
        .is_none());
    }

    #[test]
    fn test_missing_or_empty_id_ignored() {
        assert!(classify(&event(json!({
            "type": "SIMPLE",
            "data": { "format": "epc" }
        })))
        .is_none());
        assert!(classify(&event(json!({
            "type": "SIMPLE",
            "data": { "format": "epc", "idHex": "  " }
        })))
        .is_none());
        assert!(classify(&event(json!({ "type": "SIMPLE" }))).is_none());
    }

    #[test]
    fn test_sightings_from_concatenated_frame() {
        let frame = concat!(
            r#"{"type":"SIMPLE","data":{"format":"epc","idHex":"A1"}}"#,
            r#"{"type":"HEARTBEAT"}"#,
            r#"{"type":"SIMPLE","data":{"format":"epc","idHex":"B2"}}"#
        );
        let ids: Vec<_> = sightings(frame).map(|s| s.identifier).collect();
        assert_eq!(ids, vec!["A1", "B2"]);
    }
}
