//! Retention facade: per-trace TTLs over the process default.

use crate::error::Result;
use spandb_core::TraceId;
use spandb_engine::QueryEngine;
use std::sync::Arc;

/// TTL overrides and reclamation.
///
/// Access via `db.retention`.
///
/// A trace lives until its TTL elapses, measured from the later of its
/// last write and its last override. Expired traces become invisible to
/// every query immediately; physical reclamation happens opportunistically
/// on reads, or eagerly via [`Retention::purge_expired`].
pub struct Retention {
    engine: Arc<QueryEngine>,
}

impl Retention {
    pub(crate) fn new(engine: Arc<QueryEngine>) -> Self {
        Self { engine }
    }

    /// Override the TTL for one trace, extending or shortening it.
    ///
    /// Fails with an `"invalid ttl"` error when `ttl_secs` is zero or
    /// negative.
    pub fn set_trace_ttl(&self, trace_id: TraceId, ttl_secs: i64) -> Result<()> {
        Ok(self.engine.set_trace_ttl(trace_id, ttl_secs)?)
    }

    /// Effective TTL for a trace: the override if set, else the default.
    pub fn trace_ttl(&self, trace_id: TraceId) -> Result<i64> {
        Ok(self.engine.trace_ttl(trace_id)?)
    }

    /// The process-wide default TTL in seconds.
    pub fn default_ttl_secs(&self) -> Result<i64> {
        Ok(self.engine.default_ttl_secs())
    }

    /// Physically reclaim every expired trace now.
    ///
    /// Optional: reads already filter expired data, so this only releases
    /// memory earlier. Returns the number of traces reclaimed.
    pub fn purge_expired(&self) -> Result<usize> {
        Ok(self.engine.purge_expired())
    }
}
