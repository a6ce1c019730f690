//! Incremental decoder for the upstream event-stream wire format.
//!
//! Chat completion streams arrive as `data: {json}` lines terminated by a
//! `data: [DONE]` sentinel. Network chunks split lines arbitrarily, so the
//! decoder buffers only up to the next newline and emits events as complete
//! lines become available.

use serde::Deserialize;

/// A decoded stream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A text fragment from the model reply.
    Delta(String),
    /// End-of-stream sentinel.
    Done,
}

/// Stateful line-buffering decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    /// Creates a new decoder with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a raw network chunk and returns the events completed by it.
    ///
    /// Fragments are returned in arrival order. Lines that are not valid
    /// delta payloads (keep-alives, comments, empty deltas) are skipped.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.buffer.push_str(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            if let Some(event) = parse_line(line.trim_end()) {
                events.push(event);
            }
        }
        events
    }
}

fn parse_line(line: &str) -> Option<SseEvent> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(data).ok()?;
    let content = chunk.choices.into_iter().next()?.delta.content?;
    if content.is_empty() {
        None
    } else {
        Some(SseEvent::Delta(content))
    }
}

/// Streaming chunk wire format.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_single_delta_line() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n",
        );
        assert_eq!(events, vec![SseEvent::Delta("Hello".to_string())]);
    }

    #[test]
    fn buffers_lines_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let first = decoder.feed("data: {\"choices\":[{\"delta\":{\"con");
        assert!(first.is_empty());

        let second = decoder.feed("tent\":\" world\"}}]}\n");
        assert_eq!(second, vec![SseEvent::Delta(" world".to_string())]);
    }

    #[test]
    fn emits_done_sentinel() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed("data: [DONE]\n");
        assert_eq!(events, vec![SseEvent::Done]);
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed("\n: keep-alive\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn skips_empty_deltas() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(
            "data: {\"choices\":[{\"delta\":{}}]}\ndata: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n",
        );
        assert!(events.is_empty());
    }

    #[test]
    fn multiple_events_in_one_chunk_preserve_order() {
        let mut decoder = SseDecoder::new();
        let chunk = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n",
            "\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n",
            "data: [DONE]\n",
        );
        let events = decoder.feed(chunk);
        assert_eq!(
            events,
            vec![
                SseEvent::Delta("a".to_string()),
                SseEvent::Delta("b".to_string()),
                SseEvent::Done,
            ]
        );
    }

    #[test]
    fn crlf_lines_are_handled() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed("data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\r\n");
        assert_eq!(events, vec![SseEvent::Delta("x".to_string())]);
    }
}
