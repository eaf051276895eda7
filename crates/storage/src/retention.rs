//! TTL-governed retention
//!
//! Every trace lives until its TTL elapses, measured from the later of its
//! last write and its last TTL override. The manager only answers
//! questions; it never deletes anything itself. Readers consult
//! [`TtlManager::is_expired`] and treat expired traces as nonexistent,
//! whether or not they have been physically reclaimed.

use dashmap::DashMap;
use spandb_core::{Error, Micros, Result, TraceId};
use tracing::debug;

const MICROS_PER_SEC: i64 = 1_000_000;

#[derive(Debug, Clone, Copy)]
struct TtlState {
    /// Override in seconds; `None` means the process default applies.
    ttl_secs: Option<i64>,
    /// Last-write-or-override time, microseconds since epoch.
    basis_micros: Micros,
}

/// Per-trace retention state over a process-wide default TTL.
#[derive(Debug)]
pub struct TtlManager {
    default_ttl_secs: i64,
    states: DashMap<TraceId, TtlState>,
}

impl TtlManager {
    /// Create a manager with the given process-wide default TTL.
    ///
    /// The default must be positive; the facade validates this at build
    /// time, so a bad value here is a programming error.
    pub fn new(default_ttl_secs: i64) -> Self {
        debug_assert!(default_ttl_secs > 0);
        Self {
            default_ttl_secs,
            states: DashMap::new(),
        }
    }

    /// The process-wide default TTL in seconds.
    pub fn default_ttl_secs(&self) -> i64 {
        self.default_ttl_secs
    }

    /// Record a write to the trace, refreshing its retention basis.
    pub fn touch(&self, trace_id: TraceId, now: Micros) {
        self.states
            .entry(trace_id)
            .and_modify(|s| s.basis_micros = now)
            .or_insert(TtlState {
                ttl_secs: None,
                basis_micros: now,
            });
    }

    /// Override the TTL for one trace.
    ///
    /// Also refreshes the retention basis, so the new TTL is measured
    /// from the override instant. Fails when `ttl_secs` is not positive.
    pub fn set_ttl(&self, trace_id: TraceId, ttl_secs: i64, now: Micros) -> Result<()> {
        if ttl_secs <= 0 {
            return Err(Error::InvalidTtl(format!(
                "ttl must be positive, got {}",
                ttl_secs
            )));
        }
        self.states.insert(
            trace_id,
            TtlState {
                ttl_secs: Some(ttl_secs),
                basis_micros: now,
            },
        );
        debug!(trace_id = %trace_id, ttl_secs, "ttl override set");
        Ok(())
    }

    /// Effective TTL for a trace: the override if set, else the default.
    pub fn ttl_secs(&self, trace_id: TraceId) -> i64 {
        self.states
            .get(&trace_id)
            .and_then(|s| s.ttl_secs)
            .unwrap_or(self.default_ttl_secs)
    }

    /// Whether a trace's data must be treated as gone.
    ///
    /// Traces with no recorded state are not expired: nothing was stored,
    /// so there is nothing to hide.
    pub fn is_expired(&self, trace_id: TraceId, now: Micros) -> bool {
        match self.states.get(&trace_id) {
            Some(state) => {
                let ttl = state.ttl_secs.unwrap_or(self.default_ttl_secs);
                state.basis_micros + ttl * MICROS_PER_SEC <= now
            }
            None => false,
        }
    }

    /// Drop retention state after a trace is physically removed.
    pub fn forget(&self, trace_id: TraceId) {
        self.states.remove(&trace_id);
    }

    /// Number of traces with recorded retention state.
    pub fn tracked(&self) -> usize {
        self.states.len()
    }
}
