//! Server-Sent Events decoding
//!
//! Incremental decoder for `text/event-stream` bodies. Bytes arrive in
//! arbitrary chunks; complete events are returned as their joined `data`
//! payloads. Comment lines (keep-alives) and other fields are skipped.

use super::error::{BackendError, BackendResult};

/// Longest line accepted before the stream is treated as corrupt
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// Incremental `text/event-stream` decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of the current, not yet terminated line
    pending: Vec<u8>,
    /// `data` lines collected for the event being built
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the body and return the payloads of every event it
    /// completes.
    ///
    /// Fails with [`BackendError::Decode`] once an unterminated line grows
    /// past [`MAX_LINE_BYTES`]; the decoder is reset and the stream should be
    /// abandoned.
    pub fn feed(&mut self, chunk: &[u8]) -> BackendResult<Vec<String>> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw);
            let line = text.trim_end_matches(|c| c == '\n' || c == '\r');

            if line.is_empty() {
                // Blank line dispatches the event
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }

            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };

            if field == "data" {
                self.data.push(value.to_string());
            }
        }

        if self.pending.len() > MAX_LINE_BYTES {
            let length = self.pending.len();
            self.pending.clear();
            self.data.clear();
            return Err(BackendError::Decode(format!(
                "event stream line exceeds {} bytes ({} buffered)",
                MAX_LINE_BYTES, length
            )));
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: {\"items\":[]}\n\n").unwrap();
        assert_eq!(events, vec!["{\"items\":[]}".to_string()]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"ite").unwrap().is_empty());
        assert!(decoder.feed(b"ms\":[]}\n").unwrap().is_empty());
        let events = decoder.feed(b"\n").unwrap();
        assert_eq!(events, vec!["{\"items\":[]}".to_string()]);
    }

    #[test]
    fn test_keep_alive_comments_ignored() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b":keep-alive\n\n:keep-alive\n\ndata: x\n\n").unwrap();
        assert_eq!(events, vec!["x".to_string()]);
    }

    #[test]
    fn test_multiline_data_and_crlf() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: snapshot\r\ndata: a\r\ndata: b\r\n\r\n").unwrap();
        assert_eq!(events, vec!["a\nb".to_string()]);
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: 1\n\ndata: 2\n\nid: 7\ndata:3\n\n").unwrap();
        assert_eq!(events, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_unterminated_line_is_capped() {
        let mut decoder = SseDecoder::new();
        let chunk = vec![b'x'; 64 * 1024];

        let mut fed = 0;
        let err = loop {
            match decoder.feed(&chunk) {
                Ok(events) => assert!(events.is_empty()),
                Err(e) => break e,
            }
            fed += chunk.len();
            assert!(fed <= MAX_LINE_BYTES, "line was never rejected");
        };
        assert!(matches!(err, BackendError::Decode(_)));

        // Buffer was dropped; a fresh event decodes normally
        let events = decoder.feed(b"data: ok\n\n").unwrap();
        assert_eq!(events, vec!["ok".to_string()]);
    }
}
