//! Core types for the spandb trace engine
//!
//! This crate defines the data model shared by every layer of the engine:
//!
//! - Identifiers: [`TraceId`], [`SpanId`]
//! - Raw span data: [`Endpoint`], [`Annotation`], [`BinaryAnnotation`], [`Span`]
//! - Assembled shapes: [`Trace`], [`TraceSummary`], [`TraceTimeline`], [`TraceCombo`]
//! - Query vocabulary: [`Order`], [`Adjust`]
//! - The canonical [`Error`] type and the [`Clock`] seam
//!
//! Everything here is plain owned data with serde derives. Behavior
//! (storage, indexing, assembly, skew correction) lives in the layer
//! crates.

pub mod clock;
pub mod error;
pub mod query;
pub mod span;
pub mod trace;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use query::{Adjust, IndexedTrace, Order};
pub use span::{annotations, Annotation, AnnotationType, BinaryAnnotation, Endpoint, Span};
pub use trace::{TimelineAnnotation, Trace, TraceCombo, TraceSummary, TraceTimeline};
pub use types::{Micros, SpanId, TraceId};
