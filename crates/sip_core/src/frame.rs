//! Incremental decoding of the `data: `-framed response body.

use encoding_rs::{CoderResult, Decoder, UTF_8};

/// Prefix marking a data-bearing line.
pub const DATA_MARKER: &str = "data: ";

/// Turns transport chunks into frame payloads.
///
/// UTF-8 sequences split across chunks are completed by the next chunk. Lines
/// are split per chunk as soon as the chunk is decoded; an unterminated
/// trailing line is only carried into the next chunk when line carry is enabled.
pub struct FrameDecoder {
    decoder: Decoder,
    carry_partial_lines: bool,
    pending: String,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_line_carry(false)
    }

    pub fn with_line_carry(carry_partial_lines: bool) -> Self {
        Self {
            decoder: UTF_8.new_decoder(),
            carry_partial_lines,
            pending: String::new(),
        }
    }

    /// Decodes one chunk and returns the payloads of its data lines, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.decode(chunk, false);
        self.split(text)
    }

    /// Flushes any buffered bytes or carried line at end of stream.
    pub fn finish(&mut self) -> Vec<String> {
        let mut text = std::mem::take(&mut self.pending);
        text.push_str(&self.decode(&[], true));
        text.split('\n').filter_map(frame_payload).collect()
    }

    fn decode(&mut self, chunk: &[u8], last: bool) -> String {
        let mut text = String::new();
        let mut remaining = chunk;
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(remaining.len())
                .unwrap_or(remaining.len() * 3 + 16);
            text.reserve(needed);
            let (result, read, _had_errors) =
                self.decoder.decode_to_string(remaining, &mut text, last);
            remaining = &remaining[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
        text
    }

    fn split(&mut self, text: String) -> Vec<String> {
        if !self.carry_partial_lines {
            return text.split('\n').filter_map(frame_payload).collect();
        }

        self.pending.push_str(&text);
        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);
        complete.split('\n').filter_map(frame_payload).collect()
    }
}

/// Payload of a single line: marker stripped and trimmed; `None` for
/// non-data lines and empty payloads.
pub fn frame_payload(line: &str) -> Option<String> {
    let payload = line.strip_prefix(DATA_MARKER)?.trim();
    if payload.is_empty() {
        None
    } else {
        Some(payload.to_string())
    }
}
