//! Query facade: the read side of the external contract.

use crate::error::Result;
use spandb_core::{
    Adjust, Micros, Order, Trace, TraceCombo, TraceId, TraceSummary, TraceTimeline,
};
use spandb_engine::QueryEngine;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Dimension lookups, by-id fetches, and metadata queries.
///
/// Access via `db.query`.
///
/// All dimension lookups share one pagination contract: results are
/// bounded above by `end_ts` (exclusive, microseconds), capped at
/// `limit`, and ordered per [`Order`] with ties broken by trace id
/// ascending. Passing the timestamp of the last entry of one page as the
/// next call's `end_ts` walks backwards through history with no
/// duplicates and no gaps.
///
/// By-id fetches omit ids with no live data and preserve the input order
/// of the remainder. The `adjust` list activates clock-skew correction
/// when it contains [`Adjust::TimeSkew`]; an empty list leaves
/// timestamps as reported.
pub struct Query {
    engine: Arc<QueryEngine>,
}

impl Query {
    pub(crate) fn new(engine: Arc<QueryEngine>) -> Self {
        Self { engine }
    }

    // =========================================================================
    // Dimension lookups
    // =========================================================================

    /// Trace ids for traces that touched a service.
    pub fn trace_ids_by_service_name(
        &self,
        service: &str,
        end_ts: Micros,
        limit: usize,
        order: Order,
    ) -> Result<Vec<TraceId>> {
        Ok(self
            .engine
            .trace_ids_by_service_name(service, end_ts, limit, order)?)
    }

    /// Trace ids for traces containing a span of the given name within a
    /// service. An empty span name degrades to the service-only lookup.
    pub fn trace_ids_by_span_name(
        &self,
        service: &str,
        span_name: &str,
        end_ts: Micros,
        limit: usize,
        order: Order,
    ) -> Result<Vec<TraceId>> {
        Ok(self
            .engine
            .trace_ids_by_span_name(service, span_name, end_ts, limit, order)?)
    }

    /// Trace ids for traces carrying an annotation within a service.
    ///
    /// With `value` absent this matches timestamp annotations whose value
    /// equals `key`; with `value` present, binary annotations with that
    /// exact key and value.
    pub fn trace_ids_by_annotation(
        &self,
        service: &str,
        key: &str,
        value: Option<&[u8]>,
        end_ts: Micros,
        limit: usize,
        order: Order,
    ) -> Result<Vec<TraceId>> {
        Ok(self
            .engine
            .trace_ids_by_annotation(service, key, value, end_ts, limit, order)?)
    }

    // =========================================================================
    // By-id fetches
    // =========================================================================

    /// Full traces for the given ids.
    pub fn traces_by_ids(&self, trace_ids: &[TraceId], adjust: &[Adjust]) -> Result<Vec<Trace>> {
        Ok(self.engine.traces_by_ids(trace_ids, adjust)?)
    }

    /// Summaries for the given ids, omitting ids with no data.
    pub fn trace_summaries_by_ids(
        &self,
        trace_ids: &[TraceId],
        adjust: &[Adjust],
    ) -> Result<Vec<TraceSummary>> {
        Ok(self.engine.trace_summaries_by_ids(trace_ids, adjust)?)
    }

    /// Timelines for the given ids, omitting ids with no data.
    pub fn trace_timelines_by_ids(
        &self,
        trace_ids: &[TraceId],
        adjust: &[Adjust],
    ) -> Result<Vec<TraceTimeline>> {
        Ok(self.engine.trace_timelines_by_ids(trace_ids, adjust)?)
    }

    /// Trace/summary/timeline/depth bundles for the given ids.
    pub fn trace_combos_by_ids(
        &self,
        trace_ids: &[TraceId],
        adjust: &[Adjust],
    ) -> Result<Vec<TraceCombo>> {
        Ok(self.engine.trace_combos_by_ids(trace_ids, adjust)?)
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// All service names with non-expired data.
    pub fn service_names(&self) -> Result<BTreeSet<String>> {
        Ok(self.engine.service_names()?)
    }

    /// All span names recorded for a service, non-expired data only.
    pub fn span_names(&self, service: &str) -> Result<BTreeSet<String>> {
        Ok(self.engine.span_names(service)?)
    }
}
