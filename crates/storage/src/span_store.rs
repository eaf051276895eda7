//! Sharded span store
//!
//! DashMap keyed by trace id, FxHashMap span arena within each shard.
//! Reads are lock-free through the DashMap read guard; a write locks only
//! its own trace's shard, so a reader of that trace sees either the
//! pre-write or post-write span set, never a partial one, and unrelated
//! traces never contend.
//!
//! Every read consults the TTL manager. Expired traces are filtered here;
//! physical reclamation is the engine's job, since it must also purge the
//! dimension indices.

use dashmap::DashMap;
use rustc_hash::FxHashMap;
use spandb_core::{Micros, Span, SpanId, Trace, TraceId};
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tracing::trace;

/// Result of a `put`, for logging and write-amplification accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// First report of this span id.
    Inserted,
    /// An existing span absorbed new annotations or fields.
    Merged,
    /// A byte-identical resubmission; nothing changed.
    Unchanged,
}

#[derive(Debug, Default)]
struct TraceShard {
    spans: FxHashMap<SpanId, Span>,
}

/// Append-only mapping from trace id to that trace's span set.
pub struct SpanStore {
    shards: DashMap<TraceId, TraceShard>,
    ttl: Arc<crate::TtlManager>,
}

impl SpanStore {
    /// Create a store consulting the given TTL manager on reads.
    pub fn new(ttl: Arc<crate::TtlManager>) -> Self {
        Self {
            shards: DashMap::new(),
            ttl,
        }
    }

    /// Append a span to its trace.
    ///
    /// Idempotent for identical resubmissions; a differing report under an
    /// existing span id merges into it (see [`Span::merge_from`]).
    pub fn put(&self, span: Span) -> PutOutcome {
        let trace_id = span.trace_id;
        let span_id = span.id;
        let mut shard = self.shards.entry(trace_id).or_default();
        let outcome = match shard.spans.entry(span_id) {
            Entry::Occupied(mut occupied) => {
                let existing = occupied.get_mut();
                if *existing == span {
                    PutOutcome::Unchanged
                } else if existing.merge_from(span) {
                    PutOutcome::Merged
                } else {
                    PutOutcome::Unchanged
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(span);
                PutOutcome::Inserted
            }
        };
        trace!(trace_id = %trace_id, span_id = %span_id, ?outcome, "span put");
        outcome
    }

    /// All spans for a trace, or `None` if absent or expired.
    ///
    /// Spans are ordered by start timestamp then span id, so repeated
    /// reads of an unchanged trace are byte-identical.
    pub fn get(&self, trace_id: TraceId, now: Micros) -> Option<Trace> {
        if self.ttl.is_expired(trace_id, now) {
            return None;
        }
        self.shards.get(&trace_id).map(|shard| {
            let mut spans: Vec<Span> = shard.spans.values().cloned().collect();
            spans.sort_by_key(|s| (s.start_timestamp().unwrap_or(Micros::MAX), s.id));
            Trace::new(spans)
        })
    }

    /// Fetch several traces, omitting ids with no live data and preserving
    /// the input order of the remainder.
    pub fn get_many(&self, trace_ids: &[TraceId], now: Micros) -> Vec<Trace> {
        trace_ids
            .iter()
            .filter_map(|&id| self.get(id, now))
            .collect()
    }

    /// Delete all spans for a trace. Returns `true` if the trace existed.
    pub fn remove(&self, trace_id: TraceId) -> bool {
        self.shards.remove(&trace_id).is_some()
    }

    /// Whether the trace holds live data.
    pub fn contains(&self, trace_id: TraceId, now: Micros) -> bool {
        !self.ttl.is_expired(trace_id, now) && self.shards.contains_key(&trace_id)
    }

    /// Ids of all traces with stored spans, including expired ones not yet
    /// reclaimed.
    pub fn trace_ids(&self) -> Vec<TraceId> {
        self.shards.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of stored traces.
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    /// Whether the store holds no traces.
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Total spans across all traces.
    pub fn span_count(&self) -> usize {
        self.shards.iter().map(|entry| entry.spans.len()).sum()
    }
}

impl std::fmt::Debug for SpanStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpanStore")
            .field("traces", &self.len())
            .field("spans", &self.span_count())
            .finish()
    }
}
