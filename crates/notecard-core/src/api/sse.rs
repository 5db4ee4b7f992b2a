//! Incremental Server-Sent-Events decoder.
//!
//! Bytes arrive in arbitrary chunks. UTF-8 sequences and `data:` lines may be
//! split anywhere, so both the byte tail and the text tail are carried over
//! between calls to [`SseDecoder::feed`].

use serde_json::Value;

const SEGMENT_DELIMITER: &str = "\n\n";
const DATA_PREFIX: &str = "data:";

#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of an incomplete UTF-8 sequence from the previous chunk.
    pending_bytes: Vec<u8>,
    /// Decoded text not yet terminated by a blank line.
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns every JSON payload completed by it, in order.
    ///
    /// Payloads that are not valid JSON are dropped; the stream carries on.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.decode_utf8(chunk);

        let mut payloads = Vec::new();
        while let Some(end) = self.buffer.find(SEGMENT_DELIMITER) {
            let segment = self.buffer[..end].to_string();
            self.buffer.drain(..end + SEGMENT_DELIMITER.len());
            payloads.extend(parse_segment(&segment));
        }
        payloads
    }

    /// Text buffered after the last complete segment.
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    fn decode_utf8(&mut self, chunk: &[u8]) {
        self.pending_bytes.extend_from_slice(chunk);
        let bytes = std::mem::take(&mut self.pending_bytes);

        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    break;
                }
                Err(error) => {
                    let (valid, after) = rest.split_at(error.valid_up_to());
                    // `valid_up_to` guarantees this prefix is UTF-8.
                    self.buffer
                        .push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match error.error_len() {
                        Some(invalid) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[invalid..];
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more bytes.
                            self.pending_bytes = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
    }
}

fn parse_segment(segment: &str) -> Vec<Value> {
    segment
        .split('\n')
        .filter_map(|line| line.trim().strip_prefix(DATA_PREFIX))
        .map(str::trim)
        .filter(|data| !data.is_empty())
        .filter_map(|data| match serde_json::from_str::<Value>(data) {
            Ok(payload) => Some(payload),
            Err(error) => {
                tracing::trace!(%error, "Dropping non-JSON SSE payload");
                None
            }
        })
        .collect()
}
