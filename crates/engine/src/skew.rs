//! Clock-skew correction
//!
//! Hosts participating in one trace do not share a clock. Sorting
//! annotations by raw timestamp can therefore show a server receiving a
//! request before the client sent it. This module computes one offset per
//! host from the `cs`/`sr`/`ss`/`cr` annotation quartets spans carry, and
//! applies those offsets to a returned copy of the trace. Stored spans
//! are never rewritten.
//!
//! For a span whose client and server halves ran on different hosts:
//!
//! ```text
//! network_latency = ((cr - cs) - (ss - sr)) / 2      floored at 0
//! server_offset   = cs - sr + network_latency
//! ```
//!
//! which pulls the server-receive to `cs + latency`. Offsets accumulate
//! down the tree: a child's correction is computed relative to its
//! already-corrected parent. Incomplete quartets, shared hosts, negative
//! raw durations, or an unresolvable parent chain contribute no
//! correction — skew adjustment degrades, it never fails a request.

use crate::forest::SpanForest;
use rustc_hash::FxHashSet;
use spandb_core::{annotations, Adjust, Endpoint, Micros, Span, Trace};
use std::collections::{HashMap, VecDeque};
use tracing::trace;

/// Apply the requested adjustments to a trace.
///
/// An empty adjustment list, or one containing only
/// [`Adjust::Nothing`], returns the trace unchanged.
pub fn adjust_trace(trace: Trace, adjustments: &[Adjust]) -> Trace {
    if Adjust::wants_time_skew(adjustments) {
        correct_time_skew(trace)
    } else {
        trace
    }
}

fn correct_time_skew(mut trace: Trace) -> Trace {
    let offsets = host_offsets(&trace);
    if offsets.is_empty() {
        return trace;
    }
    for span in &mut trace.spans {
        for annotation in &mut span.annotations {
            if let Some(&offset) = offsets.get(&annotation.endpoint) {
                annotation.timestamp += offset;
            }
        }
    }
    trace
}

/// Walk the parent forest from the root and derive one clock offset per
/// host. Spans unreachable from the root (disconnected or cyclic) derive
/// no offsets, leaving their hosts' annotations unadjusted.
fn host_offsets(trace: &Trace) -> HashMap<Endpoint, Micros> {
    let forest = SpanForest::new(&trace.spans);
    let Some(root_idx) = forest.root_index() else {
        return HashMap::new();
    };

    let mut offsets: HashMap<Endpoint, Micros> = HashMap::new();
    let mut visited: FxHashSet<_> = FxHashSet::default();
    let mut queue = VecDeque::from([root_idx]);

    while let Some(idx) = queue.pop_front() {
        let span = forest.span_at(idx);
        if !visited.insert(span.id) {
            continue;
        }
        if let Some(rpc) = RpcEdge::from_span(span) {
            let inherited = offsets.get(&rpc.client).copied().unwrap_or(0);
            let offset = inherited + rpc.server_offset();
            // First observation of a host wins; later edges refine their
            // own subtrees through accumulation instead.
            offsets.entry(rpc.server.clone()).or_insert(offset);
            trace!(
                span_id = %span.id,
                server = %rpc.server.service_name,
                offset,
                "derived host clock offset"
            );
        }
        for &child in forest.children_of(span.id) {
            queue.push_back(child);
        }
    }

    offsets.retain(|_, &mut offset| offset != 0);
    offsets
}

/// The four RPC annotations of one span, resolved to a client/server edge
/// across two distinct hosts.
struct RpcEdge {
    cs: Micros,
    sr: Micros,
    ss: Micros,
    cr: Micros,
    client: Endpoint,
    server: Endpoint,
}

impl RpcEdge {
    fn from_span(span: &Span) -> Option<Self> {
        let cs = find(span, annotations::CLIENT_SEND)?;
        let sr = find(span, annotations::SERVER_RECV)?;
        let ss = find(span, annotations::SERVER_SEND)?;
        let cr = find(span, annotations::CLIENT_RECV)?;

        // Both client annotations must come from one host, both server
        // annotations from another; same-host spans share a clock and
        // need no correction.
        if cs.endpoint != cr.endpoint || sr.endpoint != ss.endpoint {
            return None;
        }
        if cs.endpoint == sr.endpoint {
            return None;
        }
        // Negative raw durations mean the quartet itself is unusable.
        if cr.timestamp < cs.timestamp || ss.timestamp < sr.timestamp {
            return None;
        }

        Some(Self {
            cs: cs.timestamp,
            sr: sr.timestamp,
            ss: ss.timestamp,
            cr: cr.timestamp,
            client: cs.endpoint.clone(),
            server: sr.endpoint.clone(),
        })
    }

    /// The server host's clock offset relative to the client's.
    fn server_offset(&self) -> Micros {
        let client_duration = self.cr - self.cs;
        let server_duration = self.ss - self.sr;
        let latency = ((client_duration - server_duration) / 2).max(0);
        self.cs - self.sr + latency
    }
}

fn find<'a>(span: &'a Span, value: &str) -> Option<&'a spandb_core::Annotation> {
    span.annotations.iter().find(|a| a.value == value)
}
