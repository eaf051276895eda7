//! Convenient re-exports for typical usage.
//!
//! ```ignore
//! use spandb::prelude::*;
//! ```

pub use crate::database::{SpanDb, SpanDbBuilder};
pub use crate::error::{QueryError, Result};
pub use crate::primitives::{Query, Retention, Spans};
pub use spandb_core::{
    annotations, Adjust, Annotation, AnnotationType, BinaryAnnotation, Clock, Endpoint,
    ManualClock, Micros, Order, Span, SpanId, SystemClock, TimelineAnnotation, Trace, TraceCombo,
    TraceId, TraceSummary, TraceTimeline,
};
