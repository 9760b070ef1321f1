//! redline-core library.
//!
//! Two halves, built bottom-up:
//!
//! - [`stream`] — decodes a line-delimited byte stream into typed
//!   [`Event`](stream::Event)s, tolerant of frames split across chunk
//!   boundaries.
//! - [`engine`] — owns the article's text buffers and the live annotation
//!   collection, and applies feedback while keeping every remaining
//!   annotation's anchor valid.
//!
//! # Conventions
//!
//! - **Errors**: typed enums via `thiserror` at the library boundary;
//!   every error maps to a stable [`error::ErrorCode`].
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod engine;
pub mod error;
pub mod model;
pub mod stream;

pub use engine::{ApplyOutcome, Engine, EngineError, IngestOutcome, Scalar, Snapshot};
pub use error::ErrorCode;
pub use stream::{decode, Decoder, Event, Grammar, StreamError};
