//! Secondary dimension indices for spandb
//!
//! Maintains three indices over span-store content, updated synchronously
//! on every ingest:
//!
//! - service name → traces
//! - (service name, span name) → traces
//! - (service name, annotation key, optional value) → traces
//!
//! Each posting carries a representative timestamp (the earliest
//! annotation timestamp seen for that trace under that key); trace
//! durations are kept in a separate lazily-updated window map shared by
//! all three indices. Lookups are bounded, ordered, and TTL-filtered.

pub mod manager;

pub use manager::IndexManager;
