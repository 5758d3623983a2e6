//! Server-Sent Events (SSE) wire parser.
//!
//! Follows the EventSource processing model: `data:` lines accumulate until
//! a blank line dispatches the event, `id:` survives across events (and
//! across reconnects, when seeded), `retry:` changes the reconnection delay,
//! and lines starting with `:` are keep-alive comments.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::trace;

/// Event type assumed when the server sends no `event:` field.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// A single SSE event parsed from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The `event:` field, if the server set one.
    pub event: Option<String>,
    /// The event data, multi-line values joined with `\n`.
    pub data: String,
    /// Last event id in effect when this event was dispatched.
    pub id: Option<String>,
}

impl SseEvent {
    /// The effective event type (`"message"` when unset).
    pub fn event_type(&self) -> &str {
        self.event.as_deref().unwrap_or(DEFAULT_EVENT_TYPE)
    }
}

/// Something the stream produced that the connection loop cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseItem {
    Event(SseEvent),
    /// The server asked for a new reconnection delay.
    Retry(Duration),
}

/// Incremental line parser. Feed it one line at a time, without the line
/// terminator.
#[derive(Debug, Default)]
pub struct SseParser {
    event: Option<String>,
    data: String,
    last_event_id: Option<String>,
    retry: Option<Duration>,
    started: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser that resumes with a last event id from a previous connection.
    pub fn with_last_event_id(last_event_id: Option<String>) -> Self {
        Self {
            last_event_id,
            ..Self::default()
        }
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Take the pending `retry:` value, if one was seen since the last call.
    pub fn take_retry(&mut self) -> Option<Duration> {
        self.retry.take()
    }

    /// Process one line. Returns an event when the line completes one.
    pub fn feed_line(&mut self, line: &str) -> Option<SseEvent> {
        let line = if self.started {
            line
        } else {
            self.started = true;
            line.strip_prefix('\u{feff}').unwrap_or(line)
        };

        if line.is_empty() {
            return self.dispatch();
        }

        if let Some(comment) = line.strip_prefix(':') {
            trace!(comment, "SSE comment");
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = (!value.is_empty()).then(|| value.to_string());
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(ms) = value.parse::<u64>() {
                        self.retry = Some(Duration::from_millis(ms));
                    }
                }
            }
            // Unknown fields are ignored.
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }

        let mut data = std::mem::take(&mut self.data);
        data.pop();
        Some(SseEvent {
            event,
            data,
            id: self.last_event_id.clone(),
        })
    }
}

/// Async reader turning a byte stream into [`SseItem`]s.
///
/// `next_item` is cancel-safe: all partial state lives in `self`, so it can
/// be raced against other futures in `tokio::select!`. Lines are decoded
/// lossily; invalid UTF-8 becomes U+FFFD instead of failing the stream.
pub struct SseStream<R> {
    reader: R,
    line: Vec<u8>,
    parser: SseParser,
}

impl<R: AsyncBufRead + Unpin> SseStream<R> {
    pub fn new(reader: R) -> Self {
        Self::with_last_event_id(reader, None)
    }

    pub fn with_last_event_id(reader: R, last_event_id: Option<String>) -> Self {
        Self {
            reader,
            line: Vec::new(),
            parser: SseParser::with_last_event_id(last_event_id),
        }
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.parser.last_event_id()
    }

    /// Next event or retry directive. `Ok(None)` means the server closed
    /// the stream; an unterminated trailing event is discarded.
    pub async fn next_item(&mut self) -> std::io::Result<Option<SseItem>> {
        loop {
            if let Some(retry) = self.parser.take_retry() {
                return Ok(Some(SseItem::Retry(retry)));
            }
            // Bytes read before a cancellation stay in `self.line`.
            let read = self.reader.read_until(b'\n', &mut self.line).await?;
            if read == 0 && self.line.is_empty() {
                return Ok(None);
            }
            let text = decode_line(&self.line);
            self.line.clear();
            if let Some(event) = self.parser.feed_line(&text) {
                return Ok(Some(SseItem::Event(event)));
            }
        }
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &str) -> Vec<SseEvent> {
        let mut parser = SseParser::new();
        input.lines().filter_map(|l| parser.feed_line(l)).collect()
    }

    async fn collect(input: &'static str) -> Vec<SseItem> {
        collect_bytes(input.as_bytes()).await
    }

    async fn collect_bytes(input: &'static [u8]) -> Vec<SseItem> {
        let mut stream = SseStream::new(input);
        let mut items = Vec::new();
        while let Some(item) = stream.next_item().await.unwrap() {
            items.push(item);
        }
        items
    }

    #[test]
    fn single_data_line() {
        let events = parse_all("data: {\"id\":\"0x1A0\"}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "{\"id\":\"0x1A0\"}");
        assert_eq!(events[0].event_type(), "message");
        assert_eq!(events[0].id, None);
    }

    #[test]
    fn multi_line_data_is_joined_with_newline() {
        let events = parse_all("data: first\ndata: second\n\n");
        assert_eq!(events[0].data, "first\nsecond");
    }

    #[test]
    fn space_after_colon_is_optional() {
        let events = parse_all("data:tight\n\ndata:  two spaces\n\n");
        assert_eq!(events[0].data, "tight");
        assert_eq!(events[1].data, " two spaces");
    }

    #[test]
    fn named_event_type() {
        let events = parse_all("event: frame\ndata: 1\n\ndata: 2\n\n");
        assert_eq!(events[0].event_type(), "frame");
        // Event type does not leak into the next event.
        assert_eq!(events[1].event_type(), "message");
    }

    #[test]
    fn comments_and_unknown_fields_are_ignored() {
        let events = parse_all(": keep-alive\nfoo: bar\ndata: x\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn blank_line_without_data_dispatches_nothing() {
        let events = parse_all("event: ping\n\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn empty_data_field_dispatches_empty_payload() {
        let events = parse_all("data\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "");
    }

    #[test]
    fn id_persists_across_events_and_resets_when_blank() {
        let events = parse_all("id: 7\ndata: a\n\ndata: b\n\nid\ndata: c\n\n");
        assert_eq!(events[0].id.as_deref(), Some("7"));
        assert_eq!(events[1].id.as_deref(), Some("7"));
        assert_eq!(events[2].id, None);
    }

    #[test]
    fn id_with_nul_is_ignored() {
        let mut parser = SseParser::new();
        parser.feed_line("id: 1");
        parser.feed_line("id: bad\0id");
        assert_eq!(parser.last_event_id(), Some("1"));
    }

    #[test]
    fn retry_accepts_only_digits() {
        let mut parser = SseParser::new();
        parser.feed_line("retry: 2500");
        assert_eq!(parser.take_retry(), Some(Duration::from_millis(2500)));
        assert_eq!(parser.take_retry(), None);

        parser.feed_line("retry: 10s");
        parser.feed_line("retry:");
        assert_eq!(parser.take_retry(), None);
    }

    #[test]
    fn leading_bom_is_stripped() {
        let events = parse_all("\u{feff}data: x\n\n");
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn seeded_last_event_id() {
        let mut parser = SseParser::with_last_event_id(Some("41".into()));
        let event = {
            parser.feed_line("data: y");
            parser.feed_line("").unwrap()
        };
        assert_eq!(event.id.as_deref(), Some("41"));
    }

    #[tokio::test]
    async fn stream_handles_crlf_and_retry() {
        let items = collect("retry: 100\r\ndata: a\r\n\r\ndata: b\r\n\r\n").await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], SseItem::Retry(Duration::from_millis(100)));
        assert!(matches!(&items[1], SseItem::Event(e) if e.data == "a"));
        assert!(matches!(&items[2], SseItem::Event(e) if e.data == "b"));
    }

    #[tokio::test]
    async fn stream_discards_unterminated_event_at_eof() {
        let items = collect("data: complete\n\ndata: partial").await;
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], SseItem::Event(e) if e.data == "complete"));
    }

    #[tokio::test]
    async fn stream_preserves_order() {
        let items = collect("data: 1\n\ndata: 2\n\ndata: 3\n\n").await;
        let data: Vec<_> = items
            .iter()
            .filter_map(|i| match i {
                SseItem::Event(e) => Some(e.data.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(data, ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced_not_fatal() {
        let items = collect_bytes(b"data: caf\xff\n\ndata: next\r\n\r\n").await;
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], SseItem::Event(e) if e.data == "caf\u{fffd}"));
        assert!(matches!(&items[1], SseItem::Event(e) if e.data == "next"));
    }

    #[test]
    fn decode_line_strips_one_terminator() {
        assert_eq!(decode_line(b"data: x\r\n"), "data: x");
        assert_eq!(decode_line(b"data: x\n"), "data: x");
        assert_eq!(decode_line(b"data: x"), "data: x");
        assert_eq!(decode_line(b"\xfe"), "\u{fffd}");
    }
}
