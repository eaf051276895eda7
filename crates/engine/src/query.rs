//! Query engine: orchestration of the external contract
//!
//! Composes the span store, index manager, TTL manager and skew adjuster
//! into the fixed query surface. Two rules shape every operation here:
//!
//! - Absence is never an error. Unknown, empty and expired traces are
//!   silently omitted from list results; only storage failures and
//!   invalid arguments surface as errors.
//! - One malformed trace never fails its batch. Assembly and adjustment
//!   degrade per trace.
//!
//! Ingest applies store-then-index synchronously, so a lookup issued
//! after `ingest` returns reflects the write for that trace id. Nothing
//! is guaranteed across different trace ids, per the contract.

use crate::assemble;
use crate::config::EngineConfig;
use crate::skew::adjust_trace;
use spandb_core::{
    Adjust, Clock, Error, Micros, Order, Result, Span, Trace, TraceCombo, TraceId, TraceSummary,
    TraceTimeline,
};
use spandb_index::IndexManager;
use spandb_storage::{SpanStore, TtlManager};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// The engine behind the query contract.
///
/// Cheap to share: wrap it in an `Arc` and call from as many threads as
/// needed. All interior state is sharded per trace id or per index key.
pub struct QueryEngine {
    ttl: Arc<TtlManager>,
    store: SpanStore,
    index: IndexManager,
    clock: Arc<dyn Clock>,
}

impl QueryEngine {
    /// Build an engine from configuration and a clock.
    ///
    /// Fails when the configured default TTL is not positive.
    pub fn new(config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        if config.default_ttl_secs <= 0 {
            return Err(Error::InvalidTtl(format!(
                "default ttl must be positive, got {}",
                config.default_ttl_secs
            )));
        }
        let ttl = Arc::new(TtlManager::new(config.default_ttl_secs));
        Ok(Self {
            store: SpanStore::new(ttl.clone()),
            index: IndexManager::new(ttl.clone()),
            ttl,
            clock,
        })
    }

    fn now(&self) -> Micros {
        self.clock.now_micros()
    }

    // ========================================================================
    // Ingest
    // ========================================================================

    /// Store one completed span and register its dimensions.
    ///
    /// Names and services are normalized (lowercased) on the way in.
    /// Resubmitting an identical span changes nothing; a differing report
    /// under an existing span id merges into it.
    pub fn ingest(&self, mut span: Span) -> Result<()> {
        span.normalize();
        let now = self.now();
        self.ttl.touch(span.trace_id, now);
        let outcome = self.store.put(span.clone());
        self.index.index(&span);
        debug!(trace_id = %span.trace_id, span_id = %span.id, ?outcome, "span ingested");
        Ok(())
    }

    // ========================================================================
    // Dimension lookups
    // ========================================================================

    /// Trace ids for a service, bounded and ordered.
    pub fn trace_ids_by_service_name(
        &self,
        service: &str,
        end_ts: Micros,
        limit: usize,
        order: Order,
    ) -> Result<Vec<TraceId>> {
        let service = lookup_name(service, "service name")?;
        Ok(self
            .index
            .by_service_name(&service, end_ts, limit, order, self.now()))
    }

    /// Trace ids for a (service, span name) pair.
    ///
    /// An empty span name degrades to the service-only lookup, per the
    /// contract.
    pub fn trace_ids_by_span_name(
        &self,
        service: &str,
        span_name: &str,
        end_ts: Micros,
        limit: usize,
        order: Order,
    ) -> Result<Vec<TraceId>> {
        if span_name.is_empty() {
            return self.trace_ids_by_service_name(service, end_ts, limit, order);
        }
        let service = lookup_name(service, "service name")?;
        let span_name = span_name.to_ascii_lowercase();
        Ok(self.index.by_service_and_span_name(
            &service,
            &span_name,
            end_ts,
            limit,
            order,
            self.now(),
        ))
    }

    /// Trace ids carrying an annotation within a service.
    ///
    /// With `value` absent this matches timestamp annotations equal to
    /// `key`; with `value` present, binary annotations with that exact
    /// key and value.
    pub fn trace_ids_by_annotation(
        &self,
        service: &str,
        key: &str,
        value: Option<&[u8]>,
        end_ts: Micros,
        limit: usize,
        order: Order,
    ) -> Result<Vec<TraceId>> {
        let service = lookup_name(service, "service name")?;
        let key = lookup_name(key, "annotation key")?;
        Ok(self
            .index
            .by_annotation(&service, &key, value, end_ts, limit, order, self.now()))
    }

    // ========================================================================
    // By-id fetches
    // ========================================================================

    /// Full traces for the given ids, misses omitted, input order kept.
    pub fn traces_by_ids(&self, trace_ids: &[TraceId], adjust: &[Adjust]) -> Result<Vec<Trace>> {
        Ok(self
            .live_traces(trace_ids)
            .map(|trace| adjust_trace(trace, adjust))
            .collect())
    }

    /// Summaries for the given ids, misses omitted, input order kept.
    pub fn trace_summaries_by_ids(
        &self,
        trace_ids: &[TraceId],
        adjust: &[Adjust],
    ) -> Result<Vec<TraceSummary>> {
        Ok(self
            .live_traces(trace_ids)
            .filter_map(|trace| assemble::summary(&adjust_trace(trace, adjust)))
            .collect())
    }

    /// Timelines for the given ids, misses omitted, input order kept.
    pub fn trace_timelines_by_ids(
        &self,
        trace_ids: &[TraceId],
        adjust: &[Adjust],
    ) -> Result<Vec<TraceTimeline>> {
        Ok(self
            .live_traces(trace_ids)
            .filter_map(|trace| assemble::timeline(&adjust_trace(trace, adjust)))
            .collect())
    }

    /// Combos for the given ids, misses omitted, input order kept.
    pub fn trace_combos_by_ids(
        &self,
        trace_ids: &[TraceId],
        adjust: &[Adjust],
    ) -> Result<Vec<TraceCombo>> {
        Ok(self
            .live_traces(trace_ids)
            .map(|trace| assemble::combo(adjust_trace(trace, adjust)))
            .collect())
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// All service names with live data.
    pub fn service_names(&self) -> Result<BTreeSet<String>> {
        Ok(self.index.service_names(self.now()))
    }

    /// All span names recorded for a service, live data only.
    pub fn span_names(&self, service: &str) -> Result<BTreeSet<String>> {
        let service = lookup_name(service, "service name")?;
        Ok(self.index.span_names(&service, self.now()))
    }

    // ========================================================================
    // Retention
    // ========================================================================

    /// Override the TTL for one trace. Fails for non-positive TTLs.
    pub fn set_trace_ttl(&self, trace_id: TraceId, ttl_secs: i64) -> Result<()> {
        self.ttl.set_ttl(trace_id, ttl_secs, self.now())
    }

    /// Effective TTL for a trace: the override if set, else the default.
    pub fn trace_ttl(&self, trace_id: TraceId) -> Result<i64> {
        Ok(self.ttl.ttl_secs(trace_id))
    }

    /// The process-wide default TTL.
    pub fn default_ttl_secs(&self) -> i64 {
        self.ttl.default_ttl_secs()
    }

    /// Physically reclaim every expired trace.
    ///
    /// Optional maintenance: reads already filter expired data, so this
    /// only releases memory earlier than the read paths would.
    pub fn purge_expired(&self) -> usize {
        let now = self.now();
        let expired: Vec<TraceId> = self
            .store
            .trace_ids()
            .into_iter()
            .filter(|&id| self.ttl.is_expired(id, now))
            .collect();
        for &id in &expired {
            self.reap(id);
        }
        self.index.purge_expired(now) + expired.len()
    }

    /// Delete one trace everywhere: spans, index postings, TTL state.
    pub fn remove_trace(&self, trace_id: TraceId) -> bool {
        let existed = self.store.remove(trace_id);
        self.index.purge(trace_id);
        self.ttl.forget(trace_id);
        if existed {
            debug!(trace_id = %trace_id, "trace removed");
        }
        existed
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Live traces for the ids, in input order. Expired traces are reaped
    /// on the way through, which keeps the reclamation path co-located
    /// with the one place that already knows all three components.
    fn live_traces<'a>(&'a self, trace_ids: &'a [TraceId]) -> impl Iterator<Item = Trace> + 'a {
        let now = self.now();
        trace_ids.iter().filter_map(move |&id| {
            if self.ttl.is_expired(id, now) {
                self.reap(id);
                return None;
            }
            self.store.get(id, now)
        })
    }

    fn reap(&self, trace_id: TraceId) {
        let existed = self.store.remove(trace_id);
        self.index.purge(trace_id);
        self.ttl.forget(trace_id);
        if existed {
            debug!(trace_id = %trace_id, "expired trace reaped");
        }
    }
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("store", &self.store)
            .field("index", &self.index)
            .finish()
    }
}

/// Validate and normalize a lookup name.
fn lookup_name(name: &str, what: &str) -> Result<String> {
    if name.is_empty() {
        return Err(Error::InvalidArgument(format!("{} must not be empty", what)));
    }
    Ok(name.to_ascii_lowercase())
}
