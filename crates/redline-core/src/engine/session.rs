//! The annotation patch engine.
//!
//! One [`Engine`] per editing session. It owns the three article field
//! buffers and the full annotation history; the *live set* is the Open
//! subset. Applying an exact-offset issue splices the field text and rebases
//! every other open issue strictly after the edit point; applying a search
//! suggestion re-resolves its target at apply time and always makes forward
//! progress.
//!
//! Not safe for unsynchronized concurrent use; one logical owner calls in.
//! Wrap with external mutual exclusion if that ever changes.

use serde::Serialize;
use tracing::{debug, warn};

use crate::engine::document::Document;
use crate::error::ErrorCode;
use crate::model::{
    Annotation, AnnotationId, Category, Field, PositionedIssue, SearchSuggestion, Severity, Status,
};
use crate::stream::{Event, IssueBatch, IssuePayload, RefineBatch, StreamError, SuggestionPayload};

/// Engine-side failures. Local to one operation; the documents and the rest
/// of the collection stay intact and usable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("annotation {0} not found")]
    NotFound(AnnotationId),

    /// A positioned apply was attempted against a stale or out-of-bounds
    /// anchor. The document is unchanged.
    #[error("annotation {id} anchors {start}+{len} but {field} holds {text_len} characters")]
    InvalidAnchor {
        id: AnnotationId,
        field: Field,
        start: usize,
        len: usize,
        text_len: usize,
    },

    #[error("annotation {id} is a {actual}, operation expects a {expected}")]
    WrongKind {
        id: AnnotationId,
        expected: &'static str,
        actual: &'static str,
    },
}

impl EngineError {
    /// The stable machine-readable code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::AnnotationNotFound,
            Self::InvalidAnchor { .. } => ErrorCode::InvalidAnchor,
            Self::WrongKind { .. } => ErrorCode::WrongAnnotationKind,
        }
    }
}

/// Result of an apply or dismiss call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyOutcome {
    /// The annotation transitioned to a terminal state.
    Resolved,
    /// The annotation was already terminal; nothing changed.
    AlreadyResolved,
}

/// A scalar recorded from the stream, last-write-wins.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Score(f64),
    Summary(String),
    Progress(u64),
}

/// What [`Engine::ingest`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new open annotation was added.
    Annotated(AnnotationId),
    /// A scalar was recorded.
    Recorded,
    /// The stream finished; the session is complete.
    Completed,
    /// The stream failed; partial state is retained and still actionable.
    Failed,
    /// The event carries nothing the engine tracks (chat content).
    Ignored,
}

/// A new annotation before the engine assigns it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
    Issue {
        field: Field,
        start: usize,
        len: usize,
        message: String,
        candidates: Vec<String>,
        severity: Severity,
        original_text: String,
    },
    Suggestion {
        field: Field,
        original: String,
        suggested: String,
        explanation: String,
        category: Category,
    },
}

impl Draft {
    /// Build an issue draft from a grammar-check batch entry.
    #[must_use]
    pub fn from_issue(field: Field, payload: IssuePayload) -> Self {
        Self::Issue {
            field,
            start: payload.position,
            len: payload.length,
            message: payload.message,
            candidates: payload.suggestions,
            severity: payload.severity,
            original_text: payload.original_text,
        }
    }

    /// Build a suggestion draft from a refine stream payload.
    #[must_use]
    pub fn from_suggestion(payload: SuggestionPayload) -> Self {
        Self::Suggestion {
            field: payload.field,
            original: payload.original,
            suggested: payload.suggested,
            explanation: payload.explanation,
            category: payload.category,
        }
    }
}

/// Immutable view of the session for rendering: field texts, the live
/// annotation set, and the recorded scalars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub title: String,
    pub summary: String,
    pub content: String,
    /// Open annotations only, in insertion order.
    pub annotations: Vec<Annotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_error: Option<String>,
    pub completed: bool,
}

/// The annotation patch engine for one editing session.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    title: Document,
    summary: Document,
    content: Document,
    /// Full history; the live set is the Open subset.
    annotations: Vec<Annotation>,
    next_id: u64,
    overall_score: Option<f64>,
    review_summary: Option<String>,
    progress: Option<u64>,
    stream_error: Option<StreamError>,
    completed: bool,
}

impl Engine {
    pub fn new(
        title: impl Into<String>,
        summary: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: Document::new(title),
            summary: Document::new(summary),
            content: Document::new(content),
            ..Self::default()
        }
    }

    /// The current text of a field.
    #[must_use]
    pub fn field_text(&self, field: Field) -> &str {
        self.doc(field).as_str()
    }

    /// Look up an annotation by id, terminal ones included.
    #[must_use]
    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id() == id)
    }

    /// The live set: open annotations in insertion order.
    pub fn open_annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations
            .iter()
            .filter(|a| a.status() == Status::Open)
    }

    /// Insert a new open annotation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidAnchor`] if an issue draft's range does
    /// not lie within its field's current text.
    pub fn add_annotation(&mut self, draft: Draft) -> Result<AnnotationId, EngineError> {
        let id = AnnotationId(self.next_id);
        let annotation = match draft {
            Draft::Issue {
                field,
                start,
                len,
                message,
                candidates,
                severity,
                original_text,
            } => {
                if !self.doc(field).in_bounds(start, len) {
                    return Err(EngineError::InvalidAnchor {
                        id,
                        field,
                        start,
                        len,
                        text_len: self.doc(field).char_len(),
                    });
                }
                Annotation::Issue(PositionedIssue {
                    id,
                    field,
                    start,
                    len,
                    message,
                    candidates,
                    severity,
                    original_text,
                    status: Status::Open,
                })
            }
            Draft::Suggestion {
                field,
                original,
                suggested,
                explanation,
                category,
            } => Annotation::Suggestion(SearchSuggestion {
                id,
                field,
                original,
                suggested,
                explanation,
                category,
                status: Status::Open,
            }),
        };
        self.next_id += 1;
        debug!(%id, field = %annotation.field(), "annotation added");
        self.annotations.push(annotation);
        Ok(id)
    }

    /// Dismiss an annotation: `open -> dismissed`, no document effect.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for an unknown id.
    pub fn dismiss(&mut self, id: AnnotationId) -> Result<ApplyOutcome, EngineError> {
        let idx = self.index_of(id)?;
        if self.annotations[idx]
            .status()
            .can_transition_to(Status::Dismissed)
            .is_err()
        {
            return Ok(ApplyOutcome::AlreadyResolved);
        }
        self.annotations[idx].set_status(Status::Dismissed);
        debug!(%id, "annotation dismissed");
        Ok(ApplyOutcome::Resolved)
    }

    /// Apply a positioned issue: splice its exact range out of the field and
    /// insert `replacement`, then rebase every other open issue in the same
    /// field that starts strictly after the edit point.
    ///
    /// Issues at or before the edit point never move: an edit can only
    /// affect text positions after its own start. Issues whose ranges
    /// overlap the edited range are not invalidated; they may end up
    /// anchored to shifted text (known limitation, preserved deliberately).
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotFound`] for an unknown id.
    /// - [`EngineError::WrongKind`] if the annotation is a search suggestion.
    /// - [`EngineError::InvalidAnchor`] if the stored range is out of bounds
    ///   (the document changed outside the engine). The document is left
    ///   unchanged; never a partial splice.
    pub fn apply_positioned(
        &mut self,
        id: AnnotationId,
        replacement: &str,
    ) -> Result<ApplyOutcome, EngineError> {
        let idx = self.index_of(id)?;
        if self.annotations[idx]
            .status()
            .can_transition_to(Status::Applied)
            .is_err()
        {
            return Ok(ApplyOutcome::AlreadyResolved);
        }
        let (field, start, len) = match &self.annotations[idx] {
            Annotation::Issue(issue) => (issue.field, issue.start, issue.len),
            Annotation::Suggestion(_) => {
                return Err(EngineError::WrongKind {
                    id,
                    expected: "positioned issue",
                    actual: "search suggestion",
                })
            }
        };

        let delta = self
            .doc_mut(field)
            .splice(start, len, replacement)
            .map_err(|oob| EngineError::InvalidAnchor {
                id,
                field,
                start: oob.start,
                len: oob.len,
                text_len: oob.text_len,
            })?;

        self.annotations[idx].set_status(Status::Applied);
        debug!(%id, %field, delta, "positioned issue applied");

        // Only anchors strictly after the edit point shift.
        for annotation in &mut self.annotations {
            if let Annotation::Issue(other) = annotation {
                if other.status == Status::Open && other.field == field && other.start > start {
                    other.start = other.start.saturating_add_signed(delta);
                }
            }
        }
        self.restore_invariant(field);
        Ok(ApplyOutcome::Resolved)
    }

    /// Apply a search suggestion: replace the first occurrence of its
    /// original text in the field. When the field has drifted and no longer
    /// contains it, replace the whole field with the suggested text.
    ///
    /// Never fails on a missing match; the fallback always makes forward
    /// progress.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotFound`] for an unknown id.
    /// - [`EngineError::WrongKind`] if the annotation is a positioned issue.
    pub fn apply_search(&mut self, id: AnnotationId) -> Result<ApplyOutcome, EngineError> {
        let idx = self.index_of(id)?;
        if self.annotations[idx]
            .status()
            .can_transition_to(Status::Applied)
            .is_err()
        {
            return Ok(ApplyOutcome::AlreadyResolved);
        }
        let (field, original, suggested) = match &self.annotations[idx] {
            Annotation::Suggestion(s) => (s.field, s.original.clone(), s.suggested.clone()),
            Annotation::Issue(_) => {
                return Err(EngineError::WrongKind {
                    id,
                    expected: "search suggestion",
                    actual: "positioned issue",
                })
            }
        };

        let doc = self.doc_mut(field);
        if doc.replace_first(&original, &suggested) {
            debug!(%id, %field, "suggestion applied at first occurrence");
        } else {
            doc.replace_all(suggested);
            debug!(%id, %field, "field drifted; replaced whole field text");
        }

        self.annotations[idx].set_status(Status::Applied);
        self.restore_invariant(field);
        Ok(ApplyOutcome::Resolved)
    }

    /// Record a stream scalar, overwriting any previous value.
    pub fn record_scalar(&mut self, scalar: Scalar) {
        match scalar {
            Scalar::Score(score) => self.overall_score = Some(score),
            Scalar::Summary(text) => self.review_summary = Some(text),
            Scalar::Progress(n) => self.progress = Some(n),
        }
    }

    /// Route one decoded event into the engine, in arrival order.
    pub fn ingest(&mut self, event: Event) -> IngestOutcome {
        match event {
            Event::SuggestionAdded(payload) => {
                match self.add_annotation(Draft::from_suggestion(payload)) {
                    Ok(id) => IngestOutcome::Annotated(id),
                    // Suggestion drafts carry no offsets and cannot fail
                    // validation today; keep the arm for future draft rules.
                    Err(err) => {
                        warn!(%err, "dropping suggestion event");
                        IngestOutcome::Ignored
                    }
                }
            }
            Event::Score(score) => {
                self.record_scalar(Scalar::Score(score));
                IngestOutcome::Recorded
            }
            Event::Summary(text) => {
                self.record_scalar(Scalar::Summary(text));
                IngestOutcome::Recorded
            }
            Event::Progress(n) => {
                self.record_scalar(Scalar::Progress(n));
                IngestOutcome::Recorded
            }
            Event::Done => {
                self.completed = true;
                IngestOutcome::Completed
            }
            Event::Error(err) => {
                warn!(%err, "stream failed; keeping partial review state");
                self.stream_error = Some(err);
                IngestOutcome::Failed
            }
            Event::Content(_) => IngestOutcome::Ignored,
        }
    }

    /// Replace the optimistically streamed refine state with the
    /// authoritative batch: every open suggestion is dropped and re-added
    /// from the batch, and score/summary are overwritten.
    ///
    /// Open positioned issues and resolved history are untouched.
    pub fn reconcile_refine(&mut self, batch: RefineBatch) -> Vec<AnnotationId> {
        self.annotations
            .retain(|a| !(matches!(a, Annotation::Suggestion(_)) && a.status() == Status::Open));

        let mut ids = Vec::with_capacity(batch.suggestions.len());
        for payload in batch.suggestions {
            match self.add_annotation(Draft::from_suggestion(payload)) {
                Ok(id) => ids.push(id),
                Err(err) => warn!(%err, "dropping batch suggestion"),
            }
        }
        self.record_scalar(Scalar::Score(batch.overall_score));
        self.record_scalar(Scalar::Summary(batch.summary));
        debug!(count = ids.len(), "reconciled refine batch");
        ids
    }

    /// Load a one-shot grammar-check batch as open annotations against
    /// `field`. Issues whose ranges no longer fit the current text are
    /// skipped rather than failing the whole batch.
    pub fn load_issue_batch(&mut self, field: Field, batch: IssueBatch) -> Vec<AnnotationId> {
        if batch.checked_text != self.doc(field).as_str() {
            warn!(%field, "field text drifted since the grammar check ran");
        }
        let mut ids = Vec::with_capacity(batch.issues.len());
        for payload in batch.issues {
            match self.add_annotation(Draft::from_issue(field, payload)) {
                Ok(id) => ids.push(id),
                Err(err) => warn!(%err, "skipping out-of-bounds issue"),
            }
        }
        ids
    }

    /// Current field texts plus the live annotation set, for rendering.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            title: self.title.as_str().to_string(),
            summary: self.summary.as_str().to_string(),
            content: self.content.as_str().to_string(),
            annotations: self.open_annotations().cloned().collect(),
            overall_score: self.overall_score,
            review_summary: self.review_summary.clone(),
            progress: self.progress,
            stream_error: self.stream_error.as_ref().map(ToString::to_string),
            completed: self.completed,
        }
    }

    /// The terminal stream error, if the last ingested stream failed.
    #[must_use]
    pub const fn stream_error(&self) -> Option<&StreamError> {
        self.stream_error.as_ref()
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    fn index_of(&self, id: AnnotationId) -> Result<usize, EngineError> {
        self.annotations
            .iter()
            .position(|a| a.id() == id)
            .ok_or(EngineError::NotFound(id))
    }

    const fn doc(&self, field: Field) -> &Document {
        match field {
            Field::Title => &self.title,
            Field::Summary => &self.summary,
            Field::Content => &self.content,
        }
    }

    const fn doc_mut(&mut self, field: Field) -> &mut Document {
        match field {
            Field::Title => &mut self.title,
            Field::Summary => &mut self.summary,
            Field::Content => &mut self.content,
        }
    }

    /// Re-establish the collection invariant for one field after a mutation:
    /// every open issue's range must lie within the field's current text.
    /// Ranges pushed out of bounds by an overlapping edit are clamped, not
    /// invalidated; they stay open and may point at shifted text.
    fn restore_invariant(&mut self, field: Field) {
        let text_len = self.doc(field).char_len();
        for annotation in &mut self.annotations {
            if let Annotation::Issue(issue) = annotation {
                if issue.status != Status::Open || issue.field != field {
                    continue;
                }
                if issue.start > text_len {
                    debug!(id = %issue.id, "clamping issue start to buffer end");
                    issue.start = text_len;
                }
                if issue.start + issue.len > text_len {
                    debug!(id = %issue.id, "clamping issue length to buffer end");
                    issue.len = text_len - issue.start;
                }
            }
        }
    }
}
