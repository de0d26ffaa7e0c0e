//! SSE (Server-Sent Events) decoding for chat-completion streams
//!
//! Turns raw body chunks into text deltas. Chunk boundaries can fall anywhere,
//! including inside a UTF-8 sequence, so incomplete lines are carried over as
//! bytes until their newline arrives.

use serde_json::Value;
use tracing::{debug, warn};

/// One decoded SSE data payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// `choices[0].delta.content`
    TextDelta(String),
    /// Provider-reported error inside an otherwise successful stream
    Error(String),
    /// `[DONE]` marker
    Done,
}

/// Incremental line decoder for an SSE body
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Accumulated partial line from previous chunks
    partial_line: Vec<u8>,
    event_count: usize,
    bytes_received: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a chunk of bytes, returning the events completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.bytes_received += chunk.len();
        self.partial_line.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.partial_line.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.partial_line.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(line.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a final line that arrived without a trailing newline
    pub fn finish(&mut self) -> Option<SseEvent> {
        if self.partial_line.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.partial_line);
        let line = String::from_utf8_lossy(&line);
        self.process_line(line.trim_end_matches('\r'))
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        // Skip empty lines and SSE comments (OpenRouter sends ": OPENROUTER PROCESSING")
        if line.is_empty() || line.starts_with(':') {
            return None;
        }

        let data = line.strip_prefix("data:")?.trim_start();
        self.event_count += 1;

        if data == "[DONE]" {
            debug!(
                events = self.event_count,
                bytes = self.bytes_received,
                "SSE stream [DONE] marker received"
            );
            return Some(SseEvent::Done);
        }

        let json: Value = match serde_json::from_str(data) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Skipping malformed SSE payload");
                return None;
            }
        };

        if let Some(error) = json.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Some(SseEvent::Error(message));
        }

        json.get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("delta"))
            .and_then(|delta| delta.get("content"))
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .map(|t| SseEvent::TextDelta(t.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(text: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": text}}]})
        )
    }

    #[test]
    fn test_decodes_deltas_and_done() {
        let mut decoder = SseDecoder::new();
        let body = format!("{}{}data: [DONE]\n\n", delta("## Pur"), delta("pose\n"));
        assert_eq!(
            decoder.push(body.as_bytes()),
            vec![
                SseEvent::TextDelta("## Pur".into()),
                SseEvent::TextDelta("pose\n".into()),
                SseEvent::Done,
            ]
        );
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let body = delta("héllo");
        let bytes = body.as_bytes();
        // Split inside the two-byte 'é'
        let split = body.find('é').unwrap() + 1;

        assert!(decoder.push(&bytes[..split]).is_empty());
        assert_eq!(
            decoder.push(&bytes[split..]),
            vec![SseEvent::TextDelta("héllo".into())]
        );
    }

    #[test]
    fn test_skips_comments_roles_and_garbage() {
        let mut decoder = SseDecoder::new();
        let body = concat!(
            ": OPENROUTER PROCESSING\n\n",
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {not json\n\n",
            "event: ping\n\n",
        );
        assert!(decoder.push(body.as_bytes()).is_empty());
    }

    #[test]
    fn test_error_payload() {
        let mut decoder = SseDecoder::new();
        let body = "data: {\"error\":{\"message\":\"Rate limited\",\"code\":429}}\n";
        assert_eq!(
            decoder.push(body.as_bytes()),
            vec![SseEvent::Error("Rate limited".into())]
        );
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: [DONE]").is_empty());
        assert_eq!(decoder.finish(), Some(SseEvent::Done));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_crlf_lines() {
        let mut decoder = SseDecoder::new();
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\r\n\r\n";
        assert_eq!(decoder.push(body.as_bytes()), vec![SseEvent::TextDelta("x".into())]);
    }
}
