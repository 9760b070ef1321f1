//! The annotation patch engine: owns the article's text buffers and the
//! live annotation collection, and applies feedback while keeping every
//! remaining anchor valid.
//!
//! Two apply strategies, because the two annotation kinds anchor
//! differently:
//!
//! - [`Engine::apply_positioned`] — exact-offset splice with offset
//!   rebasing of the other open issues.
//! - [`Engine::apply_search`] — first-occurrence substring replace resolved
//!   at apply time, with a whole-field fallback when the text has drifted.

pub mod document;
pub mod session;

pub use document::{Document, OutOfBounds};
pub use session::{ApplyOutcome, Draft, Engine, EngineError, IngestOutcome, Scalar, Snapshot};
