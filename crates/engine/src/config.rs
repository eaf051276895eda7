//! Engine configuration

/// One week, the conventional retention window for trace data.
pub const DEFAULT_TTL_SECS: i64 = 7 * 24 * 3600;

/// Tunable parameters applied when the engine is built.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Process-wide default TTL in seconds, applied to every trace
    /// without an explicit override. Must be positive.
    pub default_ttl_secs: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}
