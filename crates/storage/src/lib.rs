//! Span storage and retention for spandb
//!
//! Two components live here:
//!
//! - [`SpanStore`]: the one true source of record — an append-only mapping
//!   from trace id to the set of spans composing that trace, sharded per
//!   trace id so unrelated traces never contend.
//! - [`TtlManager`]: per-trace retention overrides over a process-wide
//!   default, consulted by every read path. Expiry is a lazy read-time
//!   filter; physical reclamation is a separate, optional step.

pub mod retention;
pub mod span_store;

pub use retention::TtlManager;
pub use span_store::{PutOutcome, SpanStore};
