//! Resilient event extractor
//!
//! Readers may push several JSON objects back-to-back in one frame with no
//! delimiter, or emit a corrupted fragment next to good data. Extraction
//! recovers every object it can:
//!
//! 1. The whole frame is parsed as one JSON value. On success that value is
//!    the only event.
//! 2. Otherwise the text is scanned for balanced `{ ... }` candidates
//!    (string literals and escapes are respected, nesting is tracked).
//!    Each candidate is parsed on its own, in source order.
//! 3. A candidate that fails to parse is dropped and scanning resumes just
//!    after its opening brace, so objects nested inside a corrupt wrapper are
//!    still found. An opening brace that never balances is skipped the same way.
//!
//! Resuming after a failed candidate is quadratic in the worst case; reader
//! frames are small.

use serde_json::Value;
use tracing::debug;

use crate::error::{ScanError, ScanResult};
use crate::stream::event::RawEvent;

/// Lazy, single-pass sequence of events recovered from one frame
pub fn extract_events(input: &str) -> Events<'_> {
    Events {
        input,
        state: State::Whole,
    }
}

/// Iterator returned by [`extract_events`]
#[derive(Debug)]
pub struct Events<'a> {
    input: &'a str,
    state: State,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Whole,
    Scan { pos: usize },
    Done,
}

impl<'a> Iterator for Events<'a> {
    type Item = RawEvent;

    fn next(&mut self) -> Option<RawEvent> {
        loop {
            match self.state {
                State::Whole => match serde_json::from_str::<Value>(self.input) {
                    Ok(value) => {
                        self.state = State::Done;
                        return Some(RawEvent::from_value(value));
                    }
                    Err(e) => {
                        debug!(
                            error = %e,
                            len = self.input.len(),
                            "Frame is not a single JSON value, scanning for objects"
                        );
                        self.state = State::Scan { pos: 0 };
                    }
                },
                State::Scan { pos } => {
                    let Some(start) = find_open_brace(self.input, pos) else {
                        self.state = State::Done;
                        return None;
                    };

                    match balanced_end(self.input.as_bytes(), start) {
                        Some(end) => match parse_candidate(&self.input[start..=end]) {
                            Ok(event) => {
                                self.state = State::Scan { pos: end + 1 };
                                return Some(event);
                            }
                            Err(e) => {
                                debug!(offset = start, error = %e, "Dropping malformed object");
                                self.state = State::Scan { pos: start + 1 };
                            }
                        },
                        None => {
                            debug!(offset = start, "Dropping unbalanced object fragment");
                            self.state = State::Scan { pos: start + 1 };
                        }
                    }
                }
                State::Done => return None,
            }
        }
    }
}

fn find_open_brace(input: &str, from: usize) -> Option<usize> {
    input.get(from..)?.find('{').map(|offset| from + offset)
}

/// Index of the `}` balancing the `{` at `start`
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}

fn parse_candidate(candidate: &str) -> ScanResult<RawEvent> {
    serde_json::from_str::<Value>(candidate)
        .map(RawEvent::from_value)
        .map_err(|e| ScanError::Parse(e.to_string()))
}
