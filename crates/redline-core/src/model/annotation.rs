use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Identifier for an annotation within one editing session.
///
/// Assigned sequentially by the engine; never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub u64);

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

/// The article field an annotation is anchored to.
///
/// Each field is an independent text buffer under edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Summary,
    Content,
}

impl Field {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Summary => "summary",
            Self::Content => "content",
        }
    }
}

/// The three lifecycle states of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Open,
    Applied,
    Dismissed,
}

impl Status {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Applied => "applied",
            Self::Dismissed => "dismissed",
        }
    }

    /// Returns `true` once the annotation has left the live set.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Applied | Self::Dismissed)
    }

    /// Validate whether a transition from self to `target` is allowed.
    ///
    /// Valid transitions:
    /// - `open -> applied`
    /// - `open -> dismissed`
    ///
    /// Terminal states never transition again.
    pub fn can_transition_to(&self, target: Status) -> Result<(), InvalidTransition> {
        if self.is_terminal() || target == Self::Open {
            Err(InvalidTransition {
                from: *self,
                to: target,
                reason: "annotations only move open -> applied or open -> dismissed",
            })
        } else {
            Ok(())
        }
    }
}

/// How strongly a grammar issue should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Warning
    }
}

/// What aspect of the writing a refinement suggestion targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Style,
    Structure,
    Clarity,
    Tone,
    Engagement,
}

impl Category {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Structure => "structure",
            Self::Clarity => "clarity",
            Self::Tone => "tone",
            Self::Engagement => "engagement",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Clarity
    }
}

/// A grammar issue anchored by exact character offsets.
///
/// `start` and `len` count Unicode scalar values in the field's text at the
/// time the issue was created; the engine rebases `start` after every edit
/// it performs so the anchor stays valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionedIssue {
    pub id: AnnotationId,
    pub field: Field,
    /// Start offset in characters.
    pub start: usize,
    /// Anchored range length in characters.
    pub len: usize,
    pub message: String,
    /// Candidate replacement texts, best first.
    pub candidates: Vec<String>,
    pub severity: Severity,
    /// The text the range covered when the issue was produced. Display-only;
    /// the anchor is `start`/`len`, not this string.
    pub original_text: String,
    pub status: Status,
}

/// A refinement suggestion anchored by content match.
///
/// No offset is stored: the first occurrence of `original` is resolved
/// against the field's current text at apply time, because the field may
/// have drifted since the suggestion was generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSuggestion {
    pub id: AnnotationId,
    pub field: Field,
    pub original: String,
    pub suggested: String,
    pub explanation: String,
    pub category: Category,
    pub status: Status,
}

/// One piece of feedback anchored to the article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum Annotation {
    Issue(PositionedIssue),
    Suggestion(SearchSuggestion),
}

impl Annotation {
    #[must_use]
    pub const fn id(&self) -> AnnotationId {
        match self {
            Self::Issue(a) => a.id,
            Self::Suggestion(a) => a.id,
        }
    }

    #[must_use]
    pub const fn field(&self) -> Field {
        match self {
            Self::Issue(a) => a.field,
            Self::Suggestion(a) => a.field,
        }
    }

    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::Issue(a) => a.status,
            Self::Suggestion(a) => a.status,
        }
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        match self {
            Self::Issue(a) => a.status = status,
            Self::Suggestion(a) => a.status = status,
        }
    }
}

/// Error returned when a status transition is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: Status,
    pub to: Status,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid transition {} -> {}: {}", self.from, self.to, self.reason)
    }
}

impl std::error::Error for InvalidTransition {}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "title" => Ok(Self::Title),
            "summary" => Ok(Self::Summary),
            "content" => Ok(Self::Content),
            _ => Err(ParseEnumError {
                expected: "field",
                got: s.to_string(),
            }),
        }
    }
}
