//! Assembled trace shapes
//!
//! A [`Trace`] is the full span set sharing one trace id. The three
//! derived shapes — [`TraceSummary`], [`TraceTimeline`], [`TraceCombo`] —
//! are never stored; the engine recomputes them from the current span set
//! on every read so there is no second source of truth to go stale.

use crate::span::{BinaryAnnotation, Endpoint, Span};
use crate::types::{Micros, SpanId, TraceId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// The complete set of spans sharing a trace id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Member spans, ordered by start timestamp then span id.
    pub spans: Vec<Span>,
}

impl Trace {
    /// Create a trace from spans.
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    /// The trace id, taken from the first span. `None` for an empty trace.
    pub fn trace_id(&self) -> Option<TraceId> {
        self.spans.first().map(|s| s.trace_id)
    }

    /// Whether the trace holds no spans.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Number of spans in the trace.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Look up a span by id.
    pub fn span(&self, id: SpanId) -> Option<&Span> {
        self.spans.iter().find(|s| s.id == id)
    }

    /// Earliest annotation timestamp across all spans.
    pub fn start_timestamp(&self) -> Option<Micros> {
        self.spans.iter().filter_map(|s| s.start_timestamp()).min()
    }

    /// Latest annotation timestamp across all spans.
    pub fn end_timestamp(&self) -> Option<Micros> {
        self.spans.iter().filter_map(|s| s.end_timestamp()).max()
    }

    /// End-to-end duration covered by the trace's annotations.
    pub fn duration(&self) -> Option<Micros> {
        match (self.start_timestamp(), self.end_timestamp()) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

/// Aggregate facts about one trace, computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    /// The summarized trace.
    pub trace_id: TraceId,
    /// Earliest annotation timestamp.
    pub start_timestamp: Micros,
    /// Latest annotation timestamp.
    pub end_timestamp: Micros,
    /// `end_timestamp - start_timestamp`.
    pub duration_micros: Micros,
    /// Span count per service, attributed by each span's first annotation.
    pub service_counts: BTreeMap<String, u32>,
    /// Distinct endpoints seen anywhere in the trace.
    pub endpoints: Vec<Endpoint>,
}

/// An annotation flattened for chronological display.
///
/// Carries enough span context (span id, parent, service, span name) that
/// a timeline row renders without a join back to the span set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineAnnotation {
    /// Event time, possibly skew-adjusted.
    pub timestamp: Micros,
    /// Event value, e.g. `"cs"`.
    pub value: String,
    /// The host that recorded the event.
    pub endpoint: Endpoint,
    /// The span the event was recorded on.
    pub span_id: SpanId,
    /// That span's parent, if any.
    pub parent_id: Option<SpanId>,
    /// Service name of the recording endpoint.
    pub service_name: String,
    /// Name of the span the event was recorded on.
    pub span_name: String,
}

/// A trace flattened into chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceTimeline {
    /// The trace this timeline renders.
    pub trace_id: TraceId,
    /// The root-most span of the parent forest.
    pub root_span_id: SpanId,
    /// All annotations, ascending by (adjusted) timestamp.
    pub annotations: Vec<TimelineAnnotation>,
    /// All binary annotations, unadjusted and unordered by time.
    pub binary_annotations: Vec<BinaryAnnotation>,
}

/// A trace bundled with its derived shapes.
///
/// The optional fields are `None` exactly when the trace has no spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceCombo {
    /// The (possibly skew-adjusted) trace.
    pub trace: Trace,
    /// Summary, absent for an empty trace.
    pub summary: Option<TraceSummary>,
    /// Timeline, absent for an empty trace.
    pub timeline: Option<TraceTimeline>,
    /// Depth of each span in the parent forest: roots at 0.
    pub span_depths: Option<HashMap<SpanId, u32>>,
}
