//! Incremental decoder for the gateway's server-sent event stream.
//!
//! Frames look like `data: {"choices":[{"delta":{"content":"..."}}]}`, one
//! per line, terminated by `data: [DONE]`. Network chunks split lines (and
//! UTF-8 sequences) at arbitrary byte offsets, so bytes are held until a
//! newline arrives.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A non-empty piece of assistant text.
    Delta(String),
    /// The `[DONE]` sentinel. Nothing after it is decoded.
    Done,
}

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one network chunk, returning every event completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        if self.done {
            return vec![];
        }
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(nl) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=nl).collect();
            if let Some(ev) = self.decode_line(&line[..nl]) {
                let done = ev == SseEvent::Done;
                events.push(ev);
                if done {
                    self.buf.clear();
                    break;
                }
            }
        }
        events
    }

    /// Flush a final line that arrived without a trailing newline.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        if self.done || self.buf.is_empty() {
            return vec![];
        }
        let line = std::mem::take(&mut self.buf);
        self.decode_line(&line).into_iter().collect()
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<SseEvent> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = match std::str::from_utf8(raw) {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(error = %e, "dropping non-UTF-8 event line");
                return None;
            }
        };
        if line.is_empty() || line.starts_with(':') {
            return None;
        }
        // event:, id: and retry: fields carry nothing we use
        let data = line.strip_prefix("data:")?;
        let data = data.strip_prefix(' ').unwrap_or(data).trim_end();

        if data == "[DONE]" {
            self.done = true;
            return Some(SseEvent::Done);
        }

        match serde_json::from_str::<ChunkPayload>(data) {
            Ok(payload) => {
                let text: String = payload
                    .choices
                    .into_iter()
                    .filter_map(|c| c.delta.and_then(|d| d.content))
                    .collect();
                (!text.is_empty()).then_some(SseEvent::Delta(text))
            }
            Err(e) => {
                tracing::warn!(error = %e, line = data, "skipping malformed event payload");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(s: &str) -> SseEvent {
        SseEvent::Delta(s.to_string())
    }

    #[test]
    fn decodes_complete_lines() {
        let mut d = SseDecoder::new();
        let events = d.feed(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\
data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\
data: [DONE]\n",
        );
        assert_eq!(events, vec![delta("Hel"), delta("lo"), SseEvent::Done]);
        assert!(d.is_done());
    }

    #[test]
    fn holds_partial_json_until_newline() {
        let mut d = SseDecoder::new();
        assert!(d.feed(b"data: {\"choices\":[{\"del").is_empty());
        assert!(d.feed(b"ta\":{\"content\":\"belt\"}}").is_empty());
        assert_eq!(d.feed(b"]}\r\n"), vec![delta("belt")]);
    }

    #[test]
    fn holds_split_utf8_sequences() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"±5°\"}}]}\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xC2).unwrap() + 1;
        let mut d = SseDecoder::new();
        assert!(d.feed(&line[..split]).is_empty());
        assert_eq!(d.feed(&line[split..]), vec![delta("±5°")]);
    }

    #[test]
    fn skips_comments_blank_lines_and_other_fields() {
        let mut d = SseDecoder::new();
        let events = d.feed(
            b": keep-alive\n\nevent: message\nid: 7\n\
data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\
data:{\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n",
        );
        assert_eq!(events, vec![delta("x")]);
    }

    #[test]
    fn malformed_complete_line_is_skipped() {
        let mut d = SseDecoder::new();
        let events = d.feed(
            b"data: {not json}\ndata: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n",
        );
        assert_eq!(events, vec![delta("ok")]);
    }

    #[test]
    fn ignores_everything_after_done() {
        let mut d = SseDecoder::new();
        let events = d.feed(
            b"data: [DONE]\ndata: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n",
        );
        assert_eq!(events, vec![SseEvent::Done]);
        assert!(d.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"later\"}}]}\n").is_empty());
        assert!(d.finish().is_empty());
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut d = SseDecoder::new();
        assert!(d.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}").is_empty());
        assert_eq!(d.finish(), vec![delta("tail")]);
        assert!(d.finish().is_empty());
    }
}
