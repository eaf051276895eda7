//! Span ingestion facade.

use crate::error::Result;
use spandb_core::{Span, Trace, TraceId};
use spandb_engine::QueryEngine;
use std::sync::Arc;

/// Span ingestion and direct trace access.
///
/// Access via `db.spans`.
pub struct Spans {
    engine: Arc<QueryEngine>,
}

impl Spans {
    pub(crate) fn new(engine: Arc<QueryEngine>) -> Self {
        Self { engine }
    }

    /// Report one completed span.
    ///
    /// Resubmitting an identical span changes nothing. A second report
    /// under the same span id — the server half of an RPC the client
    /// already reported — merges into the stored span.
    ///
    /// # Example
    ///
    /// ```ignore
    /// db.spans.report(span)?;
    /// ```
    pub fn report(&self, span: Span) -> Result<()> {
        self.engine.ingest(span)?;
        Ok(())
    }

    /// Report a batch of completed spans.
    ///
    /// Equivalent to calling [`Spans::report`] per span; spans of
    /// different traces land independently.
    pub fn report_all(&self, spans: impl IntoIterator<Item = Span>) -> Result<()> {
        for span in spans {
            self.engine.ingest(span)?;
        }
        Ok(())
    }

    /// Fetch one trace's raw span set.
    ///
    /// Returns `None` for unknown or expired traces.
    pub fn get(&self, trace_id: TraceId) -> Result<Option<Trace>> {
        Ok(self.engine.traces_by_ids(&[trace_id], &[])?.pop())
    }

    /// Delete one trace: spans, index entries, TTL state.
    ///
    /// Returns `true` if the trace existed.
    pub fn remove(&self, trace_id: TraceId) -> Result<bool> {
        Ok(self.engine.remove_trace(trace_id))
    }
}
