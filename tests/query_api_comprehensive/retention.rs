//! Retention tests
//!
//! TTL reads and overrides, the invalid-ttl error, and expiry visibility
//! across every query operation — all on a manual clock, never sleeping.

use crate::*;

#[test]
fn test_default_ttl_applies_without_override() {
    let (db, _clock) = test_db();
    assert_eq!(db.retention.default_ttl_secs().unwrap(), 7 * 24 * 3600);
    // An untouched trace reports the default.
    assert_eq!(db.retention.trace_ttl(TraceId(1)).unwrap(), 7 * 24 * 3600);
}

#[test]
fn test_override_is_readable_back() {
    let (db, _clock) = test_db();
    db.spans.report(root_span(1, "web", "get", 100, 200)).unwrap();
    db.retention.set_trace_ttl(TraceId(1), 3600).unwrap();
    assert_eq!(db.retention.trace_ttl(TraceId(1)).unwrap(), 3600);
    // Other traces keep the default.
    assert_eq!(db.retention.trace_ttl(TraceId(2)).unwrap(), 7 * 24 * 3600);
}

#[test]
fn test_nonpositive_ttl_is_the_query_exception() {
    let (db, _clock) = test_db();
    for bad in [0, -1, -3600] {
        let err = db.retention.set_trace_ttl(TraceId(1), bad).unwrap_err();
        assert!(
            err.message().starts_with("invalid ttl"),
            "ttl {} gave: {}",
            bad,
            err
        );
    }
}

/// After `set_trace_ttl(id, 1)` and one elapsed second, every operation
/// behaves as if the trace never existed — and none of them throw.
#[test]
fn test_expiry_makes_trace_invisible_everywhere() {
    let (db, clock) = test_db();
    db.spans.report(root_span(1, "web", "get", 100, 200)).unwrap();
    db.retention.set_trace_ttl(TraceId(1), 1).unwrap();

    clock.advance_secs(1);

    assert!(db
        .query
        .trace_ids_by_service_name("web", Micros::MAX, 10, Order::TimestampDesc)
        .unwrap()
        .is_empty());
    assert!(db
        .query
        .trace_ids_by_span_name("web", "get", Micros::MAX, 10, Order::TimestampDesc)
        .unwrap()
        .is_empty());
    assert!(db
        .query
        .trace_ids_by_annotation("web", "cs", None, Micros::MAX, 10, Order::TimestampDesc)
        .unwrap()
        .is_empty());
    assert!(db.query.traces_by_ids(&[TraceId(1)], &[]).unwrap().is_empty());
    assert!(db
        .query
        .trace_summaries_by_ids(&[TraceId(1)], &[])
        .unwrap()
        .is_empty());
    assert!(db
        .query
        .trace_timelines_by_ids(&[TraceId(1)], &[])
        .unwrap()
        .is_empty());
    assert!(db
        .query
        .trace_combos_by_ids(&[TraceId(1)], &[])
        .unwrap()
        .is_empty());
    assert!(db.query.service_names().unwrap().is_empty());
    assert!(db.query.span_names("web").unwrap().is_empty());
}

/// A live trace is unaffected by a sibling's expiry.
#[test]
fn test_expiry_is_per_trace() {
    let (db, clock) = test_db();
    db.spans.report(root_span(1, "web", "get", 100, 200)).unwrap();
    db.spans.report(root_span(2, "web", "get", 300, 400)).unwrap();
    db.retention.set_trace_ttl(TraceId(1), 1).unwrap();

    clock.advance_secs(2);

    let ids = db
        .query
        .trace_ids_by_service_name("web", Micros::MAX, 10, Order::TimestampDesc)
        .unwrap();
    assert_eq!(ids, vec![TraceId(2)]);
    let traces = db
        .query
        .traces_by_ids(&[TraceId(1), TraceId(2)], &[])
        .unwrap();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].trace_id(), Some(TraceId(2)));
}

/// Extending a TTL keeps a trace alive past the default horizon.
#[test]
fn test_extended_ttl_outlives_default() {
    // Short default so the extension is observable.
    let clock = Arc::new(ManualClock::starting_at(0));
    let db = SpanDb::builder()
        .default_ttl_secs(10)
        .clock(clock.clone())
        .build()
        .unwrap();
    db.spans.report(root_span(1, "web", "get", 100, 200)).unwrap();
    db.retention.set_trace_ttl(TraceId(1), 3600).unwrap();

    clock.advance_secs(60);
    assert_eq!(db.query.traces_by_ids(&[TraceId(1)], &[]).unwrap().len(), 1);
}

/// A new write refreshes the retention basis.
#[test]
fn test_write_refreshes_retention() {
    let clock = Arc::new(ManualClock::starting_at(0));
    let db = SpanDb::builder()
        .default_ttl_secs(10)
        .clock(clock.clone())
        .build()
        .unwrap();
    db.spans.report(root_span(1, "web", "get", 100, 200)).unwrap();

    clock.advance_secs(8);
    db.spans
        .report(client_span(1, 2, Some(1), "web", "child", 150, 180))
        .unwrap();

    // 8s after the second write the trace is still inside its window.
    clock.advance_secs(8);
    assert_eq!(db.query.traces_by_ids(&[TraceId(1)], &[]).unwrap().len(), 1);

    clock.advance_secs(3);
    assert!(db.query.traces_by_ids(&[TraceId(1)], &[]).unwrap().is_empty());
}

/// Eager reclamation drains expired traces without changing visibility.
#[test]
fn test_purge_expired_reclaims_storage() {
    let (db, clock) = test_db();
    db.spans.report(root_span(1, "web", "get", 100, 200)).unwrap();
    db.spans.report(root_span(2, "api", "get", 100, 200)).unwrap();
    db.retention.set_trace_ttl(TraceId(1), 1).unwrap();

    clock.advance_secs(2);
    assert!(db.retention.purge_expired().unwrap() > 0);

    let services: Vec<String> = db.query.service_names().unwrap().into_iter().collect();
    assert_eq!(services, vec!["api".to_string()]);
    // Purging again finds nothing.
    assert_eq!(db.retention.purge_expired().unwrap(), 0);
}
