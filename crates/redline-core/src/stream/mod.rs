//! Stream frame decoding for review feedback.
//!
//! The feedback service delivers its output as a line-delimited text
//! protocol: each meaningful line is `data: <json>` and everything else is
//! keep-alive noise. Two grammars share the framing:
//!
//! - **Chat**: `{"content": ...}` fragments, then `{"done": true}`.
//! - **Refine**: `{"type": "progress"|"suggestion"|"score"|"summary"|
//!   "done"|"error", "data": ...}`.
//!
//! [`Decoder`] turns any [`std::io::Read`] source into a lazy, ordered,
//! finite sequence of [`Event`]s. Frames may arrive split at any byte
//! boundary, including mid-UTF-8; the decoder reassembles them. The decoder
//! knows nothing about annotations; routing events into the engine is the
//! caller's job (see [`crate::engine::Engine::ingest`]).

pub mod chunk;
pub mod decoder;

pub use chunk::{ChatChunk, IssueBatch, IssuePayload, RefineBatch, RefineChunk, SuggestionPayload};
pub use decoder::{decode, Decoder, Grammar, StreamError, DATA_PREFIX};

use std::fmt;

/// A decoded, typed unit of meaning derived from one frame.
///
/// Events are immutable once constructed and never retained by the decoder
/// after emission. [`Event::Done`] and [`Event::Error`] are terminal: the
/// decoder yields nothing after them.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A fragment of generated chat text.
    Content(String),
    /// Cumulative count of characters generated so far (refine stream).
    Progress(u64),
    /// A refinement suggestion arrived.
    SuggestionAdded(SuggestionPayload),
    /// The overall score for the article, 0-10.
    Score(f64),
    /// The reviewer's closing summary.
    Summary(String),
    /// The stream finished successfully.
    Done,
    /// The stream failed; no further events follow.
    Error(StreamError),
}

impl Event {
    /// Returns `true` if no further events can follow this one.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(text) => {
                let preview = if text.chars().count() > 40 {
                    let cut: String = text.chars().take(40).collect();
                    format!("{cut}...")
                } else {
                    text.clone()
                };
                write!(f, "content: {preview}")
            }
            Self::Progress(n) => write!(f, "progress: {n}"),
            Self::SuggestionAdded(s) => {
                write!(f, "suggestion: [{}] {} -> {}", s.category, s.field, s.suggested)
            }
            Self::Score(score) => write!(f, "score: {score:.1}"),
            Self::Summary(text) => write!(f, "summary: {text}"),
            Self::Done => write!(f, "done"),
            Self::Error(err) => write!(f, "error: {err}"),
        }
    }
}
