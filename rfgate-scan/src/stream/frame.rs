//! Frame decoder
//!
//! Each WebSocket frame is a complete, independently decodable unit; nothing
//! is buffered across frames.

use tokio_tungstenite::tungstenite::Message;

use crate::error::{ScanError, ScanResult};

/// Raw payload received on the reader socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    Text(String),
    Binary(Vec<u8>),
}

impl StreamFrame {
    /// Data frames only; control messages (ping/pong/close) yield `None`
    pub fn from_message(message: Message) -> Option<Self> {
        match message {
            Message::Text(text) => Some(StreamFrame::Text(text)),
            Message::Binary(bytes) => Some(StreamFrame::Binary(bytes)),
            Message::Ping(_) | Message::Pong(_) | Message::Close(_) | Message::Frame(_) => None,
        }
    }
}

/// Decode a frame into UTF-8 text
///
/// Text frames pass through. Binary frames must be valid UTF-8 (a leading
/// byte-order mark is stripped) or the frame fails with `ScanError::Decode`.
pub async fn decode_frame(frame: StreamFrame) -> ScanResult<String> {
    match frame {
        StreamFrame::Text(text) => Ok(text),
        StreamFrame::Binary(bytes) => decode_binary(bytes).await,
    }
}

async fn decode_binary(bytes: Vec<u8>) -> ScanResult<String> {
    let mut text = String::from_utf8(bytes).map_err(|e| {
        ScanError::Decode(format!(
            "binary frame is not UTF-8 (valid up to byte {})",
            e.utf8_error().valid_up_to()
        ))
    })?;

    if text.starts_with('\u{feff}') {
        text.remove(0);
    }

    Ok(text)
}
