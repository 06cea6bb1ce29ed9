//! Server-Sent Events framing.
//!
//! Incremental parser for `text/event-stream` bodies:
//!
//! - `data: <json>` lines accumulate into the event payload
//! - `id: <cursor>` sets the event id
//! - `event: <name>` sets the event type
//! - `retry: <ms>` carries the server's reconnect hint
//! - lines starting with `:` are comments (keep-alives)
//! - an empty line dispatches the event
//!
//! Chunks may split anywhere, including inside a UTF-8 sequence or between
//! `\r` and `\n`.

use std::collections::VecDeque;

use futures::stream::{self, BoxStream, Stream, StreamExt};

use crate::error::TransportError;

/// One dispatched event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// The `id` field, which Horizon sets to the record's paging token.
    pub id: Option<String>,
    /// The `event` field; `None` means the default `message` type.
    pub event: Option<String>,
    /// Data lines joined with `\n`.
    pub data: String,
    /// Reconnect delay hint in milliseconds.
    pub retry: Option<u64>,
}

impl SseEvent {
    /// An event carrying only data.
    pub fn message(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    /// Set the event id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the retry hint.
    pub fn with_retry(mut self, retry_ms: u64) -> Self {
        self.retry = Some(retry_ms);
        self
    }
}

/// Incremental event-stream decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    pending_cr: bool,
    id: Option<String>,
    event: Option<String>,
    data: Vec<String>,
    retry: Option<u64>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();
        for &byte in chunk {
            if self.pending_cr {
                self.pending_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }
            match byte {
                b'\n' => self.end_line(&mut events),
                b'\r' => {
                    self.pending_cr = true;
                    self.end_line(&mut events);
                }
                _ => self.buffer.push(byte),
            }
        }
        events
    }

    fn end_line(&mut self, events: &mut Vec<SseEvent>) {
        let line = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();

        if line.is_empty() {
            if let Some(event) = self.dispatch() {
                events.push(event);
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_str(), ""),
        };
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            // ids containing NUL are ignored
            "id" if !value.contains('\0') => self.id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse() {
                    self.retry = Some(ms);
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let data = std::mem::take(&mut self.data);
        let event = self.event.take();
        let id = self.id.take();
        let retry = self.retry.take();

        // A block without data lines still delivers a retry hint.
        if data.is_empty() && retry.is_none() {
            return None;
        }
        Some(SseEvent {
            id,
            event,
            data: data.join("\n"),
            retry,
        })
    }
}

/// Turn a byte stream into an event stream.
///
/// The stream ends when the body ends; a partially received event is dropped.
pub fn decode_event_stream<S, B>(body: S) -> BoxStream<'static, Result<SseEvent, TransportError>>
where
    S: Stream<Item = Result<B, TransportError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = (body.boxed(), SseDecoder::new(), VecDeque::new());
    stream::unfold(state, |(mut body, mut decoder, mut ready)| async move {
        loop {
            if let Some(event) = ready.pop_front() {
                return Some((Ok(event), (body, decoder, ready)));
            }
            match body.next().await {
                Some(Ok(chunk)) => ready.extend(decoder.feed(chunk.as_ref())),
                Some(Err(e)) => return Some((Err(e), (body, decoder, ready))),
                None => return None,
            }
        }
    })
    .boxed()
}
