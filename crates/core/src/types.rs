//! Identifier types used throughout the engine
//!
//! Trace and span ids are fixed-width 64-bit integers, the form the
//! external contract exchanges. They are rendered as 16-digit lower hex,
//! which is how trace tooling conventionally prints them.

use serde::{Deserialize, Serialize};

/// Microsecond-resolution timestamp or duration.
///
/// All timestamps in the engine are microseconds since the UNIX epoch;
/// all durations are microsecond counts.
pub type Micros = i64;

/// Unique identifier for a trace.
///
/// Every span carries the id of the trace it belongs to; the span store
/// keys its shards by this id, and index lookups resolve dimensions to
/// ordered sequences of it.
///
/// Ordering is numeric and is used as the deterministic tie-break in
/// index lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TraceId(pub i64);

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Unique identifier for a span within a trace.
///
/// Spans form a forest via `parent_id` references to other span ids.
/// References are weak: a parent id that resolves to no span in the trace
/// marks its span as a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpanId(pub i64);

impl std::fmt::Display for SpanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
