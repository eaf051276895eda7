//! Dimension lookup tests
//!
//! Ordering modes, the exclusive `end_ts` bound, limit capping,
//! deterministic tie-breaks, cursor pagination, and metadata queries.

use crate::*;
use proptest::prelude::*;

fn seeded_db() -> SpanDb {
    let (db, _clock) = test_db();
    // Traces 1..=5 at timestamps 100, 200, ..., 500, with durations
    // 50, 100, ..., 250.
    for t in 1..=5i64 {
        db.spans
            .report(root_span(t, "web", "get", t * 100, t * 100 + t * 50))
            .unwrap();
    }
    db
}

#[test]
fn test_timestamp_orders() {
    let db = seeded_db();
    let desc = db
        .query
        .trace_ids_by_service_name("web", Micros::MAX, 10, Order::TimestampDesc)
        .unwrap();
    assert_eq!(
        desc,
        vec![TraceId(5), TraceId(4), TraceId(3), TraceId(2), TraceId(1)]
    );

    let asc = db
        .query
        .trace_ids_by_service_name("web", Micros::MAX, 10, Order::TimestampAsc)
        .unwrap();
    assert_eq!(
        asc,
        vec![TraceId(1), TraceId(2), TraceId(3), TraceId(4), TraceId(5)]
    );
}

#[test]
fn test_duration_orders() {
    let db = seeded_db();
    let desc = db
        .query
        .trace_ids_by_service_name("web", Micros::MAX, 10, Order::DurationDesc)
        .unwrap();
    assert_eq!(
        desc,
        vec![TraceId(5), TraceId(4), TraceId(3), TraceId(2), TraceId(1)]
    );

    let asc = db
        .query
        .trace_ids_by_service_name("web", Micros::MAX, 10, Order::DurationAsc)
        .unwrap();
    assert_eq!(asc.first(), Some(&TraceId(1)));
}

#[test]
fn test_order_none_is_stable_trace_id_ascending() {
    let db = seeded_db();
    let ids = db
        .query
        .trace_ids_by_service_name("web", Micros::MAX, 10, Order::None)
        .unwrap();
    assert_eq!(
        ids,
        vec![TraceId(1), TraceId(2), TraceId(3), TraceId(4), TraceId(5)]
    );
}

#[test]
fn test_end_ts_bound_is_exclusive() {
    let db = seeded_db();
    // end_ts = 300 excludes the trace whose representative timestamp is
    // exactly 300.
    let ids = db
        .query
        .trace_ids_by_service_name("web", 300, 10, Order::TimestampDesc)
        .unwrap();
    assert_eq!(ids, vec![TraceId(2), TraceId(1)]);
}

#[test]
fn test_limit_caps_results() {
    let db = seeded_db();
    let ids = db
        .query
        .trace_ids_by_service_name("web", Micros::MAX, 2, Order::TimestampDesc)
        .unwrap();
    assert_eq!(ids, vec![TraceId(5), TraceId(4)]);

    let none = db
        .query
        .trace_ids_by_service_name("web", Micros::MAX, 0, Order::TimestampDesc)
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_equal_timestamps_break_ties_by_trace_id() {
    let (db, _clock) = test_db();
    for t in [9i64, 2, 5] {
        db.spans.report(root_span(t, "web", "get", 100, 200)).unwrap();
    }
    let ids = db
        .query
        .trace_ids_by_service_name("web", Micros::MAX, 10, Order::TimestampDesc)
        .unwrap();
    assert_eq!(ids, vec![TraceId(2), TraceId(5), TraceId(9)]);
}

/// Feeding the last returned timestamp back as `end_ts` pages backwards
/// through history with no duplicates and no gaps.
#[test]
fn test_cursor_pagination_walks_history() {
    let (db, _clock) = test_db();
    for t in 1..=10i64 {
        db.spans
            .report(root_span(t, "web", "get", t * 100, t * 100 + 50))
            .unwrap();
    }

    let mut seen = Vec::new();
    let mut end_ts = Micros::MAX;
    loop {
        let page = db
            .query
            .trace_ids_by_service_name("web", end_ts, 3, Order::TimestampDesc)
            .unwrap();
        if page.is_empty() {
            break;
        }
        seen.extend(page.iter().copied());
        // Cursor: representative timestamp of the last entry.
        end_ts = page.last().unwrap().0 * 100;
    }

    let expected: Vec<TraceId> = (1..=10i64).rev().map(TraceId).collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_span_name_lookup_and_fallback() {
    let (db, _clock) = test_db();
    db.spans.report(root_span(1, "web", "get", 100, 200)).unwrap();
    db.spans
        .report(client_span(2, 1, None, "web", "post", 300, 400))
        .unwrap();

    let ids = db
        .query
        .trace_ids_by_span_name("web", "post", Micros::MAX, 10, Order::TimestampDesc)
        .unwrap();
    assert_eq!(ids, vec![TraceId(2)]);

    // Empty span name means the service-only lookup.
    let ids = db
        .query
        .trace_ids_by_span_name("web", "", Micros::MAX, 10, Order::TimestampDesc)
        .unwrap();
    assert_eq!(ids, vec![TraceId(2), TraceId(1)]);
}

#[test]
fn test_annotation_lookup_timestamp_and_binary() {
    let (db, _clock) = test_db();
    let mut span = root_span(1, "web", "get", 100, 200);
    span.annotations
        .push(Annotation::new(150, "error", endpoint("web")));
    span.binary_annotations.push(BinaryAnnotation::string(
        "http.path",
        "/users",
        endpoint("web"),
    ));
    db.spans.report(span).unwrap();
    db.spans.report(root_span(2, "web", "get", 300, 400)).unwrap();

    // Timestamp annotation: key only.
    let ids = db
        .query
        .trace_ids_by_annotation("web", "error", None, Micros::MAX, 10, Order::TimestampDesc)
        .unwrap();
    assert_eq!(ids, vec![TraceId(1)]);

    // Binary annotation: exact key/value.
    let ids = db
        .query
        .trace_ids_by_annotation(
            "web",
            "http.path",
            Some(b"/users"),
            Micros::MAX,
            10,
            Order::TimestampDesc,
        )
        .unwrap();
    assert_eq!(ids, vec![TraceId(1)]);

    // A key that only exists as a binary annotation does not match the
    // timestamp form, and vice versa.
    let ids = db
        .query
        .trace_ids_by_annotation("web", "http.path", None, Micros::MAX, 10, Order::TimestampDesc)
        .unwrap();
    assert!(ids.is_empty());
}

#[test]
fn test_metadata_queries() {
    let (db, _clock) = test_db();
    db.spans.report(root_span(1, "web", "get", 100, 200)).unwrap();
    db.spans
        .report(client_span(1, 2, Some(1), "backend", "lookup", 120, 180))
        .unwrap();

    let services: Vec<String> = db.query.service_names().unwrap().into_iter().collect();
    assert_eq!(services, vec!["backend".to_string(), "web".to_string()]);

    let names: Vec<String> = db.query.span_names("backend").unwrap().into_iter().collect();
    assert_eq!(names, vec!["lookup".to_string()]);
    assert!(db.query.span_names("nosuch").unwrap().is_empty());
}

#[test]
fn test_empty_service_name_is_the_query_exception() {
    let (db, _clock) = test_db();
    let err = db
        .query
        .trace_ids_by_service_name("", Micros::MAX, 10, Order::TimestampDesc)
        .unwrap_err();
    assert!(err.message().starts_with("invalid argument"));
}

proptest! {
    /// Pagination monotonicity: for any set of distinct timestamps,
    /// walking TIMESTAMP_DESC pages via the end_ts cursor visits every
    /// trace exactly once, in strictly descending timestamp order.
    #[test]
    fn prop_cursor_pagination_is_complete_and_duplicate_free(
        raw_timestamps in proptest::collection::btree_set(1i64..100_000, 1..60),
        page_size in 1usize..7,
    ) {
        let (db, _clock) = test_db();
        let timestamps: Vec<Micros> = raw_timestamps.into_iter().collect();
        for (i, &ts) in timestamps.iter().enumerate() {
            db.spans
                .report(root_span(i as i64 + 1, "web", "get", ts, ts + 10))
                .unwrap();
        }

        let mut seen_ts = Vec::new();
        let mut end_ts = Micros::MAX;
        loop {
            let page = db
                .query
                .trace_ids_by_service_name("web", end_ts, page_size, Order::TimestampDesc)
                .unwrap();
            if page.is_empty() {
                break;
            }
            for id in &page {
                // Recover the trace's timestamp from its seeded position.
                let ts = timestamps[(id.0 - 1) as usize];
                seen_ts.push(ts);
            }
            end_ts = *seen_ts.last().unwrap();
        }

        let mut expected = timestamps.clone();
        expected.sort_unstable_by(|a, b| b.cmp(a));
        prop_assert_eq!(seen_ts, expected);
    }
}
