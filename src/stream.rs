//! Incremental decoder for the chat endpoint's server-sent-event stream.
//!
//! Bytes arrive in arbitrary chunks. [`StreamAssembler::feed`] turns each
//! chunk into the events whose frames it completed; the unterminated tail
//! stays buffered until the next chunk. Whatever is still buffered when the
//! stream ends is dropped by [`StreamAssembler::finish`].

use crate::protocol::StreamEvent;
use serde_json::Value;

const FRAME_DELIMITER: &str = "\n\n";
const DATA_PREFIX: &str = "data: ";

#[derive(Debug, Default)]
pub struct StreamAssembler {
    decoder: Utf8Decoder,
    buffer: String,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let text = self.decoder.decode(chunk, false);
        self.buffer.push_str(&text);

        let mut events = Vec::new();
        while let Some(idx) = self.buffer.find(FRAME_DELIMITER) {
            let frame: String = self.buffer.drain(..idx).collect();
            self.buffer.drain(..FRAME_DELIMITER.len());

            if let Some(event) = decode_frame(&frame) {
                events.push(event);
            }
        }

        events
    }

    /// Ends the stream. An incomplete trailing frame is never emitted.
    pub fn finish(&mut self) {
        let tail = self.decoder.decode(&[], true);
        self.buffer.push_str(&tail);

        if !self.buffer.is_empty() {
            tracing::debug!(
                bytes = self.buffer.len(),
                "discarding incomplete trailing frame"
            );
            self.buffer.clear();
        }
    }

    /// Text received but not yet resolved into a complete frame.
    pub fn residual(&self) -> &str {
        &self.buffer
    }
}

fn decode_frame(frame: &str) -> Option<StreamEvent> {
    let Some(payload) = frame.strip_prefix(DATA_PREFIX) else {
        tracing::trace!(frame, "ignoring non-data frame");
        return None;
    };

    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(%err, payload, "failed to parse stream frame");
            return None;
        }
    };

    match value.get("type").and_then(Value::as_str) {
        Some("token" | "sources" | "done") => match serde_json::from_value(value) {
            Ok(event) => Some(event),
            Err(err) => {
                tracing::warn!(%err, payload, "malformed stream event");
                None
            }
        },
        Some(other) => {
            tracing::debug!(kind = other, "ignoring unknown stream event");
            None
        }
        None => {
            tracing::warn!(payload, "stream frame has no type");
            None
        }
    }
}

/// UTF-8 decoder that holds back a multi-byte sequence cut off at the end of
/// a chunk. Invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, chunk: &[u8], last: bool) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(chunk);

        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            if last {
                                out.push(char::REPLACEMENT_CHARACTER);
                            } else {
                                self.pending = after.to_vec();
                            }
                            break;
                        }
                    }
                }
            }
        }

        out
    }
}
