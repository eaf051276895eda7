//! The index manager
//!
//! Write path: [`IndexManager::index`] registers one span's dimensions.
//! Read path: the three `by_*` lookups plus the metadata queries, all of
//! which see only non-expired traces.
//!
//! Lookups collect matching postings, then sort and truncate. Collect +
//! sort is deliberate: lookups are off the ingestion hot path, and the
//! bucket guard is held only long enough to copy the postings out.
//! Expired postings found while the guard is held are dropped in place.

use dashmap::DashMap;
use rustc_hash::FxHashMap;
use spandb_core::{IndexedTrace, Micros, Order, Span, TraceId};
use spandb_storage::TtlManager;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

/// Dimension key of the annotation index.
///
/// A timestamp annotation posts under `value: None` (the annotation's
/// value string is the key); a binary annotation posts under its key with
/// the exact value bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AnnotationKey {
    service: String,
    key: String,
    value: Option<Vec<u8>>,
}

/// Earliest start / latest end seen for a trace, across all its spans.
///
/// Duration ordering uses `max_end - min_start`, updated lazily as spans
/// arrive; a trace's duration is "not yet known" only in the sense that
/// later spans may still widen it.
#[derive(Debug, Clone, Copy)]
struct TraceWindow {
    min_start: Micros,
    max_end: Micros,
}

impl TraceWindow {
    fn duration(&self) -> Micros {
        self.max_end - self.min_start
    }
}

type Bucket = FxHashMap<TraceId, Micros>;

/// The three dimension indices plus the shared duration windows.
pub struct IndexManager {
    by_service: DashMap<String, Bucket>,
    by_span_name: DashMap<(String, String), Bucket>,
    by_annotation: DashMap<AnnotationKey, Bucket>,
    windows: DashMap<TraceId, TraceWindow>,
    ttl: Arc<TtlManager>,
}

impl IndexManager {
    /// Create an index manager consulting the given TTL manager on reads.
    pub fn new(ttl: Arc<TtlManager>) -> Self {
        Self {
            by_service: DashMap::new(),
            by_span_name: DashMap::new(),
            by_annotation: DashMap::new(),
            windows: DashMap::new(),
            ttl,
        }
    }

    // ========================================================================
    // Write path
    // ========================================================================

    /// Register a span's dimensions against its trace id.
    ///
    /// The representative timestamp of every posting is the span's
    /// earliest annotation timestamp. A span with no timestamp annotations
    /// is not indexed: there is nothing to order or bound it by. Postings
    /// merge monotonically (timestamps only ever move earlier, windows
    /// only ever widen), so re-indexing a span is a no-op.
    pub fn index(&self, span: &Span) {
        let (Some(start), Some(end)) = (span.start_timestamp(), span.end_timestamp()) else {
            trace!(trace_id = %span.trace_id, span_id = %span.id, "span has no annotations, skipping index");
            return;
        };
        let trace_id = span.trace_id;

        self.windows
            .entry(trace_id)
            .and_modify(|w| {
                w.min_start = w.min_start.min(start);
                w.max_end = w.max_end.max(end);
            })
            .or_insert(TraceWindow {
                min_start: start,
                max_end: end,
            });

        for service in span.service_names() {
            if !span.name.is_empty() {
                post(
                    &self.by_span_name,
                    (service.clone(), span.name.clone()),
                    trace_id,
                    start,
                );
            }
            post(&self.by_service, service, trace_id, start);
        }

        for annotation in &span.annotations {
            post(
                &self.by_annotation,
                AnnotationKey {
                    service: annotation.endpoint.service_name.clone(),
                    key: annotation.value.clone(),
                    value: None,
                },
                trace_id,
                start,
            );
        }
        for binary in &span.binary_annotations {
            post(
                &self.by_annotation,
                AnnotationKey {
                    service: binary.endpoint.service_name.clone(),
                    key: binary.key.clone(),
                    value: Some(binary.value.clone()),
                },
                trace_id,
                start,
            );
        }
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Traces that touched a service, most recent first by default.
    pub fn by_service_name(
        &self,
        service: &str,
        end_ts: Micros,
        limit: usize,
        order: Order,
        now: Micros,
    ) -> Vec<TraceId> {
        let candidates = self.collect(self.by_service.get_mut(service), end_ts, now);
        rank(candidates, order, limit)
    }

    /// Traces containing a span of the given name within a service.
    pub fn by_service_and_span_name(
        &self,
        service: &str,
        span_name: &str,
        end_ts: Micros,
        limit: usize,
        order: Order,
        now: Micros,
    ) -> Vec<TraceId> {
        let key = (service.to_string(), span_name.to_string());
        let candidates = self.collect(self.by_span_name.get_mut(&key), end_ts, now);
        rank(candidates, order, limit)
    }

    /// Traces carrying an annotation within a service.
    ///
    /// With `value` absent this matches a timestamp annotation whose value
    /// equals `key`; with `value` present it matches a binary annotation
    /// with that exact key and value.
    pub fn by_annotation(
        &self,
        service: &str,
        key: &str,
        value: Option<&[u8]>,
        end_ts: Micros,
        limit: usize,
        order: Order,
        now: Micros,
    ) -> Vec<TraceId> {
        let key = AnnotationKey {
            service: service.to_string(),
            key: key.to_string(),
            value: value.map(|v| v.to_vec()),
        };
        let candidates = self.collect(self.by_annotation.get_mut(&key), end_ts, now);
        rank(candidates, order, limit)
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// All service names with at least one non-expired trace.
    pub fn service_names(&self, now: Micros) -> BTreeSet<String> {
        self.by_service
            .iter()
            .filter(|entry| self.has_live_posting(entry.value(), now))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// All span names recorded for a service, non-expired data only.
    pub fn span_names(&self, service: &str, now: Micros) -> BTreeSet<String> {
        self.by_span_name
            .iter()
            .filter(|entry| entry.key().0 == service && self.has_live_posting(entry.value(), now))
            .map(|entry| entry.key().1.clone())
            .collect()
    }

    // ========================================================================
    // Reclamation
    // ========================================================================

    /// Remove every posting for a trace. Used when a trace is deleted or
    /// reaped after expiry.
    pub fn purge(&self, trace_id: TraceId) {
        self.windows.remove(&trace_id);
        self.by_service.retain(|_, bucket| {
            bucket.remove(&trace_id);
            !bucket.is_empty()
        });
        self.by_span_name.retain(|_, bucket| {
            bucket.remove(&trace_id);
            !bucket.is_empty()
        });
        self.by_annotation.retain(|_, bucket| {
            bucket.remove(&trace_id);
            !bucket.is_empty()
        });
        trace!(trace_id = %trace_id, "purged from indices");
    }

    /// Sweep every expired trace out of the indices.
    ///
    /// Optional maintenance: lookups already filter expired postings, so
    /// this only reclaims memory earlier than reads would.
    pub fn purge_expired(&self, now: Micros) -> usize {
        let expired: Vec<TraceId> = self
            .windows
            .iter()
            .map(|entry| *entry.key())
            .filter(|&id| self.ttl.is_expired(id, now))
            .collect();
        for &id in &expired {
            self.purge(id);
        }
        expired.len()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Copy live postings below `end_ts` out of a bucket, dropping expired
    /// postings while the entry guard is already held.
    fn collect<K: std::hash::Hash + Eq>(
        &self,
        bucket: Option<dashmap::mapref::one::RefMut<'_, K, Bucket>>,
        end_ts: Micros,
        now: Micros,
    ) -> Vec<IndexedTrace> {
        let Some(mut bucket) = bucket else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(bucket.len());
        bucket.retain(|&trace_id, &mut timestamp| {
            if self.ttl.is_expired(trace_id, now) {
                return false;
            }
            if timestamp < end_ts {
                let duration = self
                    .windows
                    .get(&trace_id)
                    .map(|w| w.duration())
                    .unwrap_or(0);
                out.push(IndexedTrace {
                    trace_id,
                    timestamp,
                    duration,
                });
            }
            true
        });
        out
    }

    fn has_live_posting(&self, bucket: &Bucket, now: Micros) -> bool {
        bucket.keys().any(|&id| !self.ttl.is_expired(id, now))
    }
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager")
            .field("services", &self.by_service.len())
            .field("span_names", &self.by_span_name.len())
            .field("annotations", &self.by_annotation.len())
            .field("traces", &self.windows.len())
            .finish()
    }
}

fn post<K: std::hash::Hash + Eq>(
    map: &DashMap<K, Bucket>,
    key: K,
    trace_id: TraceId,
    timestamp: Micros,
) {
    let mut bucket = map.entry(key).or_default();
    bucket
        .entry(trace_id)
        .and_modify(|ts| *ts = (*ts).min(timestamp))
        .or_insert(timestamp);
}

/// Sort per the requested order and cap at `limit`.
///
/// Ties are broken by trace id ascending in every mode, so pagination at
/// an `end_ts` boundary is deterministic. `Order::None` is the documented
/// policy default: stable ascending trace id.
fn rank(mut candidates: Vec<IndexedTrace>, order: Order, limit: usize) -> Vec<TraceId> {
    match order {
        Order::TimestampDesc => candidates
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.trace_id.cmp(&b.trace_id))),
        Order::TimestampAsc => candidates
            .sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.trace_id.cmp(&b.trace_id))),
        Order::DurationDesc => candidates
            .sort_by(|a, b| b.duration.cmp(&a.duration).then(a.trace_id.cmp(&b.trace_id))),
        Order::DurationAsc => candidates
            .sort_by(|a, b| a.duration.cmp(&b.duration).then(a.trace_id.cmp(&b.trace_id))),
        Order::None => candidates.sort_by(|a, b| a.trace_id.cmp(&b.trace_id)),
    }
    candidates.truncate(limit);
    candidates.into_iter().map(|c| c.trace_id).collect()
}
