//! Clock seam for retention decisions
//!
//! Expiry is computed against an injected clock rather than ambient
//! `SystemTime`, so retention behavior is testable without sleeping and
//! embedders can pin time in replay scenarios.

use crate::types::Micros;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of "now" for TTL checks and ingest bookkeeping.
pub trait Clock: Send + Sync + 'static {
    /// Current time, microseconds since the UNIX epoch.
    fn now_micros(&self) -> Micros;
}

/// Wall-clock time via `chrono`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_micros(&self) -> Micros {
        chrono::Utc::now().timestamp_micros()
    }
}

/// A clock advanced by hand. Intended for tests and replay tooling.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a manual clock starting at the given instant.
    pub fn starting_at(now_micros: Micros) -> Self {
        Self {
            now: AtomicI64::new(now_micros),
        }
    }

    /// Move the clock forward.
    pub fn advance_micros(&self, delta: Micros) {
        self.now.fetch_add(delta, Ordering::SeqCst);
    }

    /// Move the clock forward by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.advance_micros(secs * 1_000_000);
    }

    /// Set the clock to an absolute instant.
    pub fn set(&self, now_micros: Micros) {
        self.now.store(now_micros, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_micros(&self) -> Micros {
        self.now.load(Ordering::SeqCst)
    }
}
