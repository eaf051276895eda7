//! Raw span data: endpoints, annotations, and the span itself
//!
//! A span is one unit of work within a trace. It carries two kinds of
//! facts: [`Annotation`]s ("something happened at time T on host H") and
//! [`BinaryAnnotation`]s (key/value facts with no inherent time order).
//!
//! Spans belonging to one RPC are reported twice — once by the client,
//! once by the server — under the same span id. The store merges the two
//! halves, which is why [`Span::merge_from`] lives here next to the data.

use crate::types::{Micros, SpanId, TraceId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

/// Core annotation values recognized by the skew adjuster.
///
/// A client/server RPC produces four annotations on one span:
/// `cs` and `cr` recorded by the client host, `sr` and `ss` recorded by
/// the server host. The relative order of these four is what clock-skew
/// correction restores.
pub mod annotations {
    /// The client has made the request.
    pub const CLIENT_SEND: &str = "cs";
    /// The client has received the response.
    pub const CLIENT_RECV: &str = "cr";
    /// The server has received the request.
    pub const SERVER_RECV: &str = "sr";
    /// The server has sent the response.
    pub const SERVER_SEND: &str = "ss";
}

/// A service instance: service name plus network address.
///
/// Immutable, embedded by value wherever referenced. Two endpoints are the
/// same host exactly when all three fields agree; the skew adjuster keys
/// its per-host offsets on this equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    /// Service name, lowercased at the ingest boundary.
    pub service_name: String,
    /// IPv4 address of the instance.
    pub ipv4: Ipv4Addr,
    /// Listening port of the instance.
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint.
    pub fn new(service_name: impl Into<String>, ipv4: Ipv4Addr, port: u16) -> Self {
        Self {
            service_name: service_name.into(),
            ipv4,
            port,
        }
    }
}

/// A timestamped event recorded on a span by one host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    /// Event time, microseconds since epoch.
    pub timestamp: Micros,
    /// Event value, e.g. `"cs"` or `"sr"`.
    pub value: String,
    /// The host that recorded the event.
    pub endpoint: Endpoint,
}

impl Annotation {
    /// Create an annotation.
    pub fn new(timestamp: Micros, value: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            timestamp,
            value: value.into(),
            endpoint,
        }
    }
}

/// Value-type tag of a binary annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationType {
    /// Boolean encoded as one byte.
    Bool,
    /// Opaque bytes.
    Bytes,
    /// Big-endian 16-bit integer.
    I16,
    /// Big-endian 32-bit integer.
    I32,
    /// Big-endian 64-bit integer.
    I64,
    /// Big-endian IEEE double.
    Double,
    /// UTF-8 string.
    String,
}

/// A key/value fact attached to a span, not inherently time-ordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinaryAnnotation {
    /// Annotation key, e.g. `"http.path"`.
    pub key: String,
    /// Raw value bytes, interpreted per `annotation_type`.
    pub value: Vec<u8>,
    /// How `value` is encoded.
    pub annotation_type: AnnotationType,
    /// The host that recorded the fact.
    pub endpoint: Endpoint,
}

impl BinaryAnnotation {
    /// Create a binary annotation with a UTF-8 string value.
    pub fn string(key: impl Into<String>, value: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            key: key.into(),
            value: value.into().into_bytes(),
            annotation_type: AnnotationType::String,
            endpoint,
        }
    }
}

/// One unit of work within a trace.
///
/// Spans form a forest via `parent_id` references. References are weak
/// lookups by id, never ownership: a missing or cyclic parent is data to
/// tolerate, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// The trace this span belongs to.
    pub trace_id: TraceId,
    /// Unique id of this span within the trace.
    pub id: SpanId,
    /// Span name (an operation name), lowercased at the ingest boundary.
    pub name: String,
    /// Parent span id; `None` for a root span.
    pub parent_id: Option<SpanId>,
    /// Timestamped events, in reported order.
    pub annotations: Vec<Annotation>,
    /// Key/value facts, in reported order.
    pub binary_annotations: Vec<BinaryAnnotation>,
}

impl Span {
    /// Create a span with no annotations.
    pub fn new(trace_id: TraceId, id: SpanId, name: impl Into<String>) -> Self {
        Self {
            trace_id,
            id,
            name: name.into(),
            parent_id: None,
            annotations: Vec::new(),
            binary_annotations: Vec::new(),
        }
    }

    /// Earliest annotation timestamp, if any annotation exists.
    pub fn start_timestamp(&self) -> Option<Micros> {
        self.annotations.iter().map(|a| a.timestamp).min()
    }

    /// Latest annotation timestamp, if any annotation exists.
    pub fn end_timestamp(&self) -> Option<Micros> {
        self.annotations.iter().map(|a| a.timestamp).max()
    }

    /// Wall-clock duration spanned by this span's annotations.
    pub fn duration(&self) -> Option<Micros> {
        match (self.start_timestamp(), self.end_timestamp()) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Whether this span declares no parent.
    ///
    /// Note that a span whose parent id resolves to no span in the trace
    /// is also treated as a root; that resolution needs the whole trace
    /// and lives in the engine's span forest.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Distinct service names recorded on this span, from both annotation
    /// and binary-annotation endpoints.
    pub fn service_names(&self) -> BTreeSet<String> {
        self.annotations
            .iter()
            .map(|a| a.endpoint.service_name.clone())
            .chain(
                self.binary_annotations
                    .iter()
                    .map(|b| b.endpoint.service_name.clone()),
            )
            .collect()
    }

    /// First annotation in reported order, used to attribute the span to a
    /// service in summaries.
    pub fn first_annotation(&self) -> Option<&Annotation> {
        self.annotations.first()
    }

    /// Lowercase the span name and every endpoint service name.
    ///
    /// Applied once at the ingest boundary so dimension lookups are
    /// case-insensitive.
    pub fn normalize(&mut self) {
        if self.name.chars().any(|c| c.is_ascii_uppercase()) {
            self.name = self.name.to_ascii_lowercase();
        }
        for a in &mut self.annotations {
            normalize_service(&mut a.endpoint);
        }
        for b in &mut self.binary_annotations {
            normalize_service(&mut b.endpoint);
        }
    }

    /// Merge another report of the same span into this one.
    ///
    /// The client and server halves of an RPC arrive as two spans sharing
    /// one id. Annotation lists are unioned with order-preserving dedup;
    /// name and parent keep the first non-empty values seen. Merging an
    /// identical report is a no-op.
    ///
    /// Returns `true` if anything changed.
    pub fn merge_from(&mut self, other: Span) -> bool {
        debug_assert_eq!(self.id, other.id);
        let mut changed = false;

        if self.name.is_empty() && !other.name.is_empty() {
            self.name = other.name;
            changed = true;
        }
        if self.parent_id.is_none() && other.parent_id.is_some() {
            self.parent_id = other.parent_id;
            changed = true;
        }
        for a in other.annotations {
            if !self.annotations.contains(&a) {
                self.annotations.push(a);
                changed = true;
            }
        }
        for b in other.binary_annotations {
            if !self.binary_annotations.contains(&b) {
                self.binary_annotations.push(b);
                changed = true;
            }
        }
        changed
    }
}

fn normalize_service(endpoint: &mut Endpoint) {
    if endpoint
        .service_name
        .chars()
        .any(|c| c.is_ascii_uppercase())
    {
        endpoint.service_name = endpoint.service_name.to_ascii_lowercase();
    }
}
