//! Streaming frame decoder.
//!
//! Turns a byte-oriented source into a lazy, ordered, finite sequence of
//! [`Event`]s. The framing is line-delimited: complete lines are split off a
//! growable byte buffer on `\n`, so a frame arriving in ten one-byte reads
//! decodes identically to the same frame arriving whole. The trailing
//! fragment, which may end mid-UTF-8-sequence, stays buffered until more
//! bytes arrive.
//!
//! Termination: an explicit `done`, an explicit server error, a malformed
//! payload, a transport failure, or natural end-of-stream. After a terminal
//! event the iterator is fused and never reads again. Dropping the decoder
//! drops the source, which is the cancellation path.

use std::collections::VecDeque;
use std::io::Read;

use tracing::{debug, trace, warn};

use crate::error::ErrorCode;
use crate::stream::chunk::{ChatChunk, RefineChunk};
use crate::stream::Event;

/// The prefix marking a meaningful frame. Everything else is keep-alive.
pub const DATA_PREFIX: &str = "data: ";

const READ_CHUNK: usize = 8 * 1024;

/// Terminal decode failures, surfaced as the final [`Event::Error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The byte source failed mid-read (network reset, closed pipe).
    #[error("transport read failed: {0}")]
    Transport(String),

    /// A frame payload was structurally invalid beyond plausible truncation.
    #[error("malformed frame payload: {0}")]
    MalformedFrame(String),

    /// The server put an explicit error value in a well-formed frame.
    #[error("server signaled error: {0}")]
    Server(String),
}

impl StreamError {
    /// The stable machine-readable code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Transport(_) => ErrorCode::TransportFailure,
            Self::MalformedFrame(_) => ErrorCode::MalformedFrame,
            Self::Server(_) => ErrorCode::ServerSignaledError,
        }
    }
}

/// Which payload shape the frames of a stream carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// `{"content": ...}` / `{"done": true}` / `{"error": ...}`.
    Chat,
    /// `{"type": ..., "data": ...}`.
    Refine,
}

/// Why a frame payload failed to parse.
enum FrameFault {
    /// The JSON ends mid-value: truncation-shaped. Skip and wait for more.
    Truncated,
    /// Broken beyond truncation: terminal.
    Malformed(String),
}

impl Grammar {
    /// Parse one frame payload into at most one event.
    ///
    /// `Ok(None)` means the frame was well-formed but carried nothing to
    /// surface (an empty chat chunk, for example).
    fn parse_payload(self, payload: &str) -> Result<Option<Event>, FrameFault> {
        match self {
            Self::Chat => {
                let chunk: ChatChunk = serde_json::from_str(payload).map_err(classify)?;
                if let Some(message) = chunk.error {
                    return Ok(Some(Event::Error(StreamError::Server(message))));
                }
                if chunk.done {
                    return Ok(Some(Event::Done));
                }
                Ok(chunk.content.map(Event::Content))
            }
            Self::Refine => {
                let chunk: RefineChunk = serde_json::from_str(payload).map_err(classify)?;
                Ok(Some(match chunk {
                    RefineChunk::Progress(n) => Event::Progress(n),
                    RefineChunk::Suggestion(payload) => Event::SuggestionAdded(payload),
                    RefineChunk::Score(score) => Event::Score(score),
                    RefineChunk::Summary(text) => Event::Summary(text),
                    RefineChunk::Done => Event::Done,
                    RefineChunk::Error(message) => {
                        Event::Error(StreamError::Server(message))
                    }
                }))
            }
        }
    }
}

/// Split truncation-shaped JSON failures from genuinely broken payloads.
fn classify(err: serde_json::Error) -> FrameFault {
    if err.classify() == serde_json::error::Category::Eof {
        FrameFault::Truncated
    } else {
        FrameFault::Malformed(err.to_string())
    }
}

/// Decode a byte source into a lazy sequence of [`Event`]s.
///
/// Convenience wrapper around [`Decoder::new`]; mirrors the shape
/// `decode(source, grammar)`.
pub fn decode<R: Read>(source: R, grammar: Grammar) -> Decoder<R> {
    Decoder::new(source, grammar)
}

/// A pull-based decoder over any [`Read`] source.
///
/// Implements [`Iterator`]: each `next()` drains already-decoded events
/// first, then reads more bytes. The iterator is finite and fused; see the
/// module docs for the termination rules.
#[derive(Debug)]
pub struct Decoder<R: Read> {
    source: R,
    grammar: Grammar,
    /// Raw bytes carried across reads; never contains a complete line.
    buf: Vec<u8>,
    /// Events decoded but not yet yielded.
    pending: VecDeque<Event>,
    finished: bool,
}

impl<R: Read> Decoder<R> {
    pub fn new(source: R, grammar: Grammar) -> Self {
        Self {
            source,
            grammar,
            buf: Vec::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Pull one chunk from the source and decode every complete line in the
    /// buffer. Pushes decoded events onto `pending`.
    fn fill(&mut self) {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.source.read(&mut chunk) {
                Ok(0) => {
                    // Natural end of stream. Unparsed trailing bytes are
                    // discarded without error.
                    if !self.buf.is_empty() {
                        trace!(bytes = self.buf.len(), "discarding trailing fragment");
                        self.buf.clear();
                    }
                    self.finished = true;
                    return;
                }
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    self.drain_lines();
                    return;
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
                Err(err) => {
                    self.buf.clear();
                    self.pending
                        .push_back(Event::Error(StreamError::Transport(err.to_string())));
                    return;
                }
            }
        }
    }

    /// Split complete lines off the byte buffer and parse each one.
    ///
    /// `\n` is a single byte that can never appear inside a multi-byte UTF-8
    /// sequence, so splitting at the byte level is safe; only the trailing
    /// fragment can hold an incomplete sequence, and it stays buffered.
    fn drain_lines(&mut self) {
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line);
            let text = text.trim_end_matches(['\n', '\r']);

            let Some(payload) = text.strip_prefix(DATA_PREFIX) else {
                if !text.is_empty() {
                    trace!(line = text, "skipping non-data line");
                }
                continue;
            };

            match self.grammar.parse_payload(payload) {
                Ok(Some(event)) => self.pending.push_back(event),
                Ok(None) => {}
                Err(FrameFault::Truncated) => {
                    debug!(payload, "truncation-shaped payload, waiting for more bytes");
                }
                Err(FrameFault::Malformed(details)) => {
                    warn!(payload, %details, "malformed frame payload");
                    self.pending
                        .push_back(Event::Error(StreamError::MalformedFrame(details)));
                    return;
                }
            }
        }
    }
}

impl<R: Read> Iterator for Decoder<R> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                if event.is_terminal() {
                    // Nothing after a terminal event, even if more bytes or
                    // already-decoded events follow.
                    self.finished = true;
                    self.pending.clear();
                    self.buf.clear();
                }
                return Some(event);
            }
            if self.finished {
                return None;
            }
            self.fill();
        }
    }
}
