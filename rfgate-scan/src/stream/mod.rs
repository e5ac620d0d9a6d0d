//! Reader stream decoding
//!
//! frame → UTF-8 text → zero or more raw events → tag sightings.
//!
//! # Modules
//! - **frame** - Normalize text/binary WebSocket frames into text
//! - **extractor** - Recover JSON objects from concatenated or corrupt text
//! - **event** - Tagged union over the reader event kinds
//! - **classifier** - Select EPC sightings
//! - **connection** - Open the reader WebSocket

pub mod classifier;
pub mod connection;
pub mod event;
pub mod extractor;
pub mod frame;

pub use classifier::{classify, sightings};
pub use event::{RawEvent, SimpleData, SimpleEvent};
pub use extractor::{extract_events, Events};
pub use frame::{decode_frame, StreamFrame};
