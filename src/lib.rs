//! # spandb
//!
//! Query and storage engine for distributed traces.
//!
//! spandb ingests completed spans grouped by trace id, indexes them by
//! service name, span name and annotation, and answers the analytical
//! queries a tracing UI needs: "find traces for service X", "reconstruct
//! trace Y", "summarize trace Y's timeline with clock skew corrected".
//!
//! ## Quick Start
//!
//! ```ignore
//! use spandb::prelude::*;
//!
//! // Open an in-memory engine with default retention (one week)
//! let db = SpanDb::ephemeral()?;
//!
//! // Ingest completed spans
//! db.spans.report(span)?;
//!
//! // Find recent traces for a service
//! let ids = db.query.trace_ids_by_service_name("web", now, 10, Order::TimestampDesc)?;
//!
//! // Reconstruct them with clock skew corrected
//! let combos = db.query.trace_combos_by_ids(&ids, &[Adjust::TimeSkew])?;
//!
//! // Tighten retention for one trace
//! db.retention.set_trace_ttl(ids[0], 3600)?;
//! ```
//!
//! ## Areas
//!
//! - [`Spans`] - span ingestion and direct trace access
//! - [`Query`] - dimension lookups, by-id fetches, metadata
//! - [`Retention`] - per-trace TTL overrides and reclamation
//!
//! ## Errors
//!
//! The query surface reports a single error kind, [`QueryError`],
//! carrying a message. Missing traces are never errors: by-id fetches
//! omit them, lookups simply don't return them.

#![warn(missing_docs)]

mod database;
mod error;
mod primitives;

pub mod prelude;

// Re-export main entry points
pub use database::{SpanDb, SpanDbBuilder};
pub use error::{QueryError, Result};

// Re-export area facades
pub use primitives::{Query, Retention, Spans};

// Re-export the data model
pub use spandb_core::{
    annotations, Adjust, Annotation, AnnotationType, BinaryAnnotation, Clock, Endpoint,
    ManualClock, Micros, Order, Span, SpanId, SystemClock, TimelineAnnotation, Trace, TraceCombo,
    TraceId, TraceSummary, TraceTimeline,
};
