//! Trace assembly: the derived output shapes
//!
//! Summaries, timelines and combos are recomputed from the current span
//! set on every read — they are views, not state. Callers adjust the
//! trace first (see [`crate::skew`]) when skew correction was requested;
//! assembly itself is adjustment-agnostic.

use crate::forest::SpanForest;
use spandb_core::{
    Trace, TraceCombo, TraceSummary, TraceTimeline, TimelineAnnotation,
};
use std::collections::{BTreeMap, BTreeSet};

/// Summarize a trace: time window, per-service span counts, endpoints.
///
/// Returns `None` when the trace has no spans, or when no span carries an
/// annotation (the window is undefined without timestamps).
pub fn summary(trace: &Trace) -> Option<TraceSummary> {
    let trace_id = trace.trace_id()?;
    let start = trace.start_timestamp()?;
    let end = trace.end_timestamp()?;

    let mut service_counts: BTreeMap<String, u32> = BTreeMap::new();
    let mut endpoints: BTreeSet<_> = BTreeSet::new();
    for span in &trace.spans {
        if let Some(first) = span.first_annotation() {
            *service_counts
                .entry(first.endpoint.service_name.clone())
                .or_insert(0) += 1;
        }
        for annotation in &span.annotations {
            endpoints.insert(annotation.endpoint.clone());
        }
        for binary in &span.binary_annotations {
            endpoints.insert(binary.endpoint.clone());
        }
    }

    Some(TraceSummary {
        trace_id,
        start_timestamp: start,
        end_timestamp: end,
        duration_micros: end - start,
        service_counts,
        endpoints: endpoints.into_iter().collect(),
    })
}

/// Flatten a trace into chronological order.
///
/// Annotations are enriched with their span's id, parent, and name, then
/// sorted ascending by timestamp with ties broken by span id and original
/// sequence. Binary annotations are carried through untouched — they have
/// no inherent time order, so no adjustment ever applies to them.
pub fn timeline(trace: &Trace) -> Option<TraceTimeline> {
    let trace_id = trace.trace_id()?;
    let forest = SpanForest::new(&trace.spans);
    let root_span_id = forest.root_span()?.id;

    let mut annotations: Vec<TimelineAnnotation> = Vec::new();
    let mut binary_annotations = Vec::new();
    for span in &trace.spans {
        for annotation in &span.annotations {
            annotations.push(TimelineAnnotation {
                timestamp: annotation.timestamp,
                value: annotation.value.clone(),
                endpoint: annotation.endpoint.clone(),
                span_id: span.id,
                parent_id: span.parent_id,
                service_name: annotation.endpoint.service_name.clone(),
                span_name: span.name.clone(),
            });
        }
        binary_annotations.extend(span.binary_annotations.iter().cloned());
    }
    // Stable sort: equal (timestamp, span id) pairs keep their original
    // reported sequence.
    annotations.sort_by_key(|a| (a.timestamp, a.span_id));

    Some(TraceTimeline {
        trace_id,
        root_span_id,
        annotations,
        binary_annotations,
    })
}

/// Bundle a trace with its summary, timeline and span depths.
///
/// The optional fields are all absent exactly when the trace has no
/// spans; a trace with spans but no annotations still gets depths.
pub fn combo(trace: Trace) -> TraceCombo {
    if trace.is_empty() {
        return TraceCombo {
            trace,
            summary: None,
            timeline: None,
            span_depths: None,
        };
    }
    let summary = summary(&trace);
    let timeline = timeline(&trace);
    let span_depths = Some(SpanForest::new(&trace.spans).depths());
    TraceCombo {
        trace,
        summary,
        timeline,
        span_depths,
    }
}
