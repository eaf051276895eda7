//! The boundary error type.
//!
//! The external contract reports exactly one error kind carrying a
//! message. Internal causes map onto it: storage unavailability, invalid
//! TTL arguments, malformed lookup arguments. Everything else — missing
//! traces, missing spans, unresolvable parent chains — is absence, not an
//! error, and never reaches this type.

use thiserror::Error;

/// The single error surfaced by every query operation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct QueryError {
    message: String,
}

impl QueryError {
    /// The human-readable cause, e.g. `"invalid ttl: ttl must be
    /// positive, got -1"`.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<spandb_core::Error> for QueryError {
    fn from(e: spandb_core::Error) -> Self {
        QueryError {
            message: e.to_string(),
        }
    }
}

/// Result type for all query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
