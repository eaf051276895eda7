//! Main entry point for spandb.
//!
//! This module provides the [`SpanDb`] struct, the primary entry point
//! for all engine operations, and its builder.

use crate::error::{QueryError, Result};
use crate::primitives::{Query, Retention, Spans};
use spandb_core::{Clock, SystemClock};
use spandb_engine::{EngineConfig, QueryEngine};
use std::sync::Arc;

/// The spandb engine.
///
/// Create one with [`SpanDb::ephemeral`] or [`SpanDb::builder`], then use
/// the area facades:
///
/// ```ignore
/// let db = SpanDb::ephemeral()?;
///
/// db.spans.report(span)?;
/// let ids = db.query.trace_ids_by_service_name("web", now, 10, Order::TimestampDesc)?;
/// db.retention.set_trace_ttl(ids[0], 3600)?;
/// ```
///
/// `SpanDb` is `Send + Sync`; share it behind an `Arc` across request
/// handlers. State is sharded per trace id and per index key, so
/// unrelated traces never contend.
pub struct SpanDb {
    /// Span ingestion and direct trace access.
    pub spans: Spans,

    /// Dimension lookups, by-id fetches, metadata queries.
    pub query: Query,

    /// Per-trace TTL overrides and reclamation.
    pub retention: Retention,
}

impl SpanDb {
    /// Open an in-memory engine with default settings.
    ///
    /// All data lives in process memory and is lost on drop; durability
    /// of raw span bytes belongs to the store backing a deployment, not
    /// to this engine.
    pub fn ephemeral() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for engine configuration.
    ///
    /// ```ignore
    /// let db = SpanDb::builder()
    ///     .default_ttl_secs(24 * 3600)
    ///     .build()?;
    /// ```
    pub fn builder() -> SpanDbBuilder {
        SpanDbBuilder::new()
    }

    fn from_engine(engine: Arc<QueryEngine>) -> Self {
        Self {
            spans: Spans::new(engine.clone()),
            query: Query::new(engine.clone()),
            retention: Retention::new(engine),
        }
    }
}

/// Builder for engine configuration.
pub struct SpanDbBuilder {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
}

impl SpanDbBuilder {
    /// Create a builder with default settings: one-week default TTL,
    /// wall-clock time.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the process-wide default TTL in seconds.
    ///
    /// Applies to every trace without an explicit override. Must be
    /// positive; `build` fails otherwise.
    pub fn default_ttl_secs(mut self, secs: i64) -> Self {
        self.config.default_ttl_secs = secs;
        self
    }

    /// Replace the clock used for retention decisions.
    ///
    /// Tests pin time with a [`spandb_core::ManualClock`]; replay tooling
    /// can feed recorded time.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<SpanDb> {
        let engine = QueryEngine::new(self.config, self.clock).map_err(QueryError::from)?;
        Ok(SpanDb::from_engine(Arc::new(engine)))
    }
}

impl Default for SpanDbBuilder {
    fn default() -> Self {
        Self::new()
    }
}
