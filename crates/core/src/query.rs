//! Query vocabulary: result ordering and timestamp adjustment modes

use crate::types::{Micros, TraceId};
use serde::{Deserialize, Serialize};

/// Ordering applied to dimension-lookup results.
///
/// Timestamp orders compare the representative timestamp of each index
/// entry; duration orders compare the trace's computed duration. Ties are
/// always broken by trace id ascending so pagination is deterministic.
/// `None` is stable within one call: ascending trace id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// Most recent first. The default for "latest N traces" queries.
    #[default]
    TimestampDesc,
    /// Oldest first.
    TimestampAsc,
    /// Longest trace first.
    DurationDesc,
    /// Shortest trace first.
    DurationAsc,
    /// No requested order; stable ascending trace id.
    None,
}

/// Timestamp adjustment applied when assembling traces.
///
/// Dispatched as a pure timestamp transformation over a returned copy;
/// stored annotations are never rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjust {
    /// Leave timestamps exactly as reported.
    #[default]
    Nothing,
    /// Correct per-host clock skew so causally ordered annotations across
    /// hosts appear consistently ordered.
    TimeSkew,
}

impl Adjust {
    /// Whether a requested adjustment list activates skew correction.
    ///
    /// An empty list is equivalent to `Nothing`.
    pub fn wants_time_skew(adjustments: &[Adjust]) -> bool {
        adjustments.contains(&Adjust::TimeSkew)
    }
}

/// One index posting resolved for a lookup: the trace plus the sort keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedTrace {
    /// The matching trace.
    pub trace_id: TraceId,
    /// Representative timestamp: earliest annotation timestamp indexed
    /// under the dimension key for this trace.
    pub timestamp: Micros,
    /// The trace's end-to-end duration, updated lazily as spans arrive.
    pub duration: Micros,
}
