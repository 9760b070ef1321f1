//! Domain model for annotations anchored to article text.

pub mod annotation;

pub use annotation::{
    Annotation, AnnotationId, Category, Field, InvalidTransition, ParseEnumError,
    PositionedIssue, SearchSuggestion, Severity, Status,
};
