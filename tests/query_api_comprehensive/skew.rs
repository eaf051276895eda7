//! Clock-skew adjustment tests
//!
//! The NOTHING passthrough, the full two-service scenario with a skewed
//! server clock, and graceful degradation on malformed traces.

use crate::*;

/// The canonical scenario: a root span on `web` at t=100..200, and a
/// child span whose server host's clock runs 50µs behind, so its raw
/// `sr` (t=50) lands before the client's `cs` (t=100).
fn skewed_trace(db: &SpanDb) {
    db.spans.report(root_span(1, "web", "get", 100, 200)).unwrap();

    let web = endpoint("web");
    let backend = endpoint_at("backend", 2);
    let mut child = Span::new(TraceId(1), SpanId(2), "lookup");
    child.parent_id = Some(SpanId(1));
    child
        .annotations
        .push(Annotation::new(100, annotations::CLIENT_SEND, web.clone()));
    child
        .annotations
        .push(Annotation::new(50, annotations::SERVER_RECV, backend.clone()));
    child
        .annotations
        .push(Annotation::new(150, annotations::SERVER_SEND, backend));
    child
        .annotations
        .push(Annotation::new(200, annotations::CLIENT_RECV, web));
    db.spans.report(child).unwrap();
}

fn timeline_values(timeline: &TraceTimeline) -> Vec<(Micros, String)> {
    timeline
        .annotations
        .iter()
        .map(|a| (a.timestamp, a.value.clone()))
        .collect()
}

/// With NOTHING (or an empty adjust list) the timeline shows raw
/// timestamps, skew and all.
#[test]
fn test_nothing_preserves_raw_order() {
    let (db, _clock) = test_db();
    skewed_trace(&db);

    for adjust in [vec![], vec![Adjust::Nothing]] {
        let timelines = db
            .query
            .trace_timelines_by_ids(&[TraceId(1)], &adjust)
            .unwrap();
        let values = timeline_values(&timelines[0]);
        // Raw order: the skewed sr comes first.
        assert_eq!(values[0], (50, "sr".to_string()));
    }
}

/// TIME_SKEW pulls the server annotations into causal position: sr ≥ cs,
/// ss ≤ cr, and the summary duration collapses to the true 100µs.
#[test]
fn test_time_skew_restores_causal_order() {
    let (db, _clock) = test_db();
    skewed_trace(&db);

    let combos = db
        .query
        .trace_combos_by_ids(&[TraceId(1)], &[Adjust::TimeSkew])
        .unwrap();
    let combo = &combos[0];

    // Adjusted child span: sr moved from 50 to ≥ cs.
    let child = combo.trace.span(SpanId(2)).unwrap();
    let ts_of = |value: &str| {
        child
            .annotations
            .iter()
            .find(|a| a.value == value)
            .unwrap()
            .timestamp
    };
    assert!(ts_of("sr") >= ts_of("cs"));
    assert!(ts_of("ss") <= ts_of("cr"));
    assert_eq!(ts_of("sr"), 100);
    assert_eq!(ts_of("ss"), 200);

    // Summary is computed over adjusted timestamps: 100..200.
    let summary = combo.summary.as_ref().unwrap();
    assert_eq!(summary.duration_micros, 100);

    // Depths are unaffected by adjustment.
    let depths = combo.span_depths.as_ref().unwrap();
    assert_eq!(depths[&SpanId(1)], 0);
    assert_eq!(depths[&SpanId(2)], 1);

    // And the timeline is causally ordered.
    let timeline = combo.timeline.as_ref().unwrap();
    let times: Vec<Micros> = timeline.annotations.iter().map(|a| a.timestamp).collect();
    let mut sorted = times.clone();
    sorted.sort_unstable();
    assert_eq!(times, sorted);
}

/// Adjustment never rewrites stored spans: a NOTHING read after a
/// TIME_SKEW read still sees raw timestamps.
#[test]
fn test_adjustment_is_read_only() {
    let (db, _clock) = test_db();
    skewed_trace(&db);

    db.query
        .trace_combos_by_ids(&[TraceId(1)], &[Adjust::TimeSkew])
        .unwrap();
    let timelines = db
        .query
        .trace_timelines_by_ids(&[TraceId(1)], &[Adjust::Nothing])
        .unwrap();
    assert_eq!(timeline_values(&timelines[0])[0], (50, "sr".to_string()));
}

/// Hosts without a complete cs/sr/ss/cr quartet are left unadjusted.
#[test]
fn test_incomplete_pair_leaves_span_unadjusted() {
    let (db, _clock) = test_db();
    db.spans.report(root_span(1, "web", "get", 100, 200)).unwrap();
    let mut child = Span::new(TraceId(1), SpanId(2), "lookup");
    child.parent_id = Some(SpanId(1));
    child.annotations.push(Annotation::new(
        50,
        annotations::SERVER_RECV,
        endpoint_at("backend", 2),
    ));
    db.spans.report(child).unwrap();

    let traces = db
        .query
        .traces_by_ids(&[TraceId(1)], &[Adjust::TimeSkew])
        .unwrap();
    let child = traces[0].span(SpanId(2)).unwrap();
    assert_eq!(child.annotations[0].timestamp, 50);
}

/// A parent cycle degrades to unadjusted timestamps, never an error.
#[test]
fn test_cycle_degrades_gracefully() {
    let (db, _clock) = test_db();
    db.spans
        .report(client_span(1, 1, Some(2), "web", "a", 100, 200))
        .unwrap();
    db.spans
        .report(client_span(1, 2, Some(1), "web", "b", 150, 180))
        .unwrap();

    let traces = db
        .query
        .traces_by_ids(&[TraceId(1)], &[Adjust::TimeSkew])
        .unwrap();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].len(), 2);
}
