//! Wire payload types for the two stream grammars and their batch twins.
//!
//! These map 1:1 to the JSON the feedback service emits. Field defaults
//! mirror the service's own fallbacks (category `clarity`, field `content`,
//! severity `warning`) so a sparse payload still decodes.

use serde::{Deserialize, Serialize};

use crate::model::{Category, Field, Severity};

/// One chat stream payload: `{"content": ...}`, `{"done": true}`, or
/// `{"error": ...}`.
///
/// The fields are not mutually exclusive on the wire; precedence when
/// interpreting is `error`, then `done`, then `content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChatChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One refine stream payload: `{"type": ..., "data": ...}`.
///
/// The discriminant is adjacent to the data, matching the wire exactly.
/// `done` carries `"data": null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum RefineChunk {
    /// Cumulative characters generated so far.
    Progress(u64),
    Suggestion(SuggestionPayload),
    Score(f64),
    Summary(String),
    Done,
    Error(String),
}

/// The body of a `suggestion` chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionPayload {
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub suggested: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default = "default_field")]
    pub field: Field,
}

/// The body of one grammar issue in a grammar-check batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuePayload {
    /// Start offset in characters.
    pub position: usize,
    /// Range length in characters.
    pub length: usize,
    pub message: String,
    /// Candidate replacement texts, best first.
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub severity: Severity,
    pub original_text: String,
}

/// Authoritative non-streaming refine response.
///
/// When the caller has one, it supersedes whatever partial state the stream
/// produced (see [`crate::engine::Engine::reconcile_refine`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineBatch {
    pub suggestions: Vec<SuggestionPayload>,
    pub overall_score: f64,
    pub summary: String,
}

/// One-shot grammar check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueBatch {
    pub issues: Vec<IssuePayload>,
    /// The text the service checked. May differ from the live buffer if the
    /// author kept typing.
    pub checked_text: String,
}

const fn default_field() -> Field {
    Field::Content
}
