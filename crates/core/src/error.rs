//! Canonical error type for engine operations
//!
//! Internal layers propagate this with `?`; the facade crate maps it onto
//! the single boundary error the external contract exposes. Missing
//! traces, missing spans, and unresolvable parent references are never
//! errors — they surface as absence or omission.

use thiserror::Error;

/// All engine errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying span store is unavailable or timed out.
    #[error("storage unavailable: {0}")]
    Storage(String),

    /// A TTL argument was zero or negative.
    #[error("invalid ttl: {0}")]
    InvalidTtl(String),

    /// A request argument was malformed or unsupported.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a storage-availability error.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    /// Check if this is an invalid-argument error (including bad TTLs).
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_) | Error::InvalidTtl(_))
    }
}
