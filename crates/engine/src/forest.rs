//! Span forest: id-based parent/child resolution
//!
//! Spans reference their parents by id, and nothing guarantees those
//! references form a well-shaped tree: parents may be missing, and cycles
//! can arrive from misbehaving clients. The forest therefore keeps spans
//! in a flat arena indexed by span id and resolves every relationship by
//! lookup, with visited-set guards in every walk. No walk recurses over
//! ownership pointers, and no malformed trace can hang or crash one.

use rustc_hash::{FxHashMap, FxHashSet};
use spandb_core::{Micros, Span, SpanId};
use std::collections::HashMap;

/// A flat, borrowed view of one trace's spans with parent/child
/// relationships resolved by id.
pub struct SpanForest<'a> {
    spans: &'a [Span],
    by_id: FxHashMap<SpanId, usize>,
    children: FxHashMap<SpanId, Vec<usize>>,
}

impl<'a> SpanForest<'a> {
    /// Build the forest over a trace's span slice.
    pub fn new(spans: &'a [Span]) -> Self {
        let mut by_id = FxHashMap::default();
        for (idx, span) in spans.iter().enumerate() {
            by_id.entry(span.id).or_insert(idx);
        }

        let mut children: FxHashMap<SpanId, Vec<usize>> = FxHashMap::default();
        for (idx, span) in spans.iter().enumerate() {
            if let Some(parent_id) = span.parent_id {
                if parent_id != span.id && by_id.contains_key(&parent_id) {
                    children.entry(parent_id).or_default().push(idx);
                }
            }
        }
        for child_indices in children.values_mut() {
            child_indices.sort_by_key(|&i| (start_key(&spans[i]), spans[i].id));
        }

        Self {
            spans,
            by_id,
            children,
        }
    }

    /// Look up a span by id.
    pub fn get(&self, id: SpanId) -> Option<&'a Span> {
        self.by_id.get(&id).map(|&idx| &self.spans[idx])
    }

    /// Arena indices of a span's children, ordered by start timestamp.
    pub fn children_of(&self, id: SpanId) -> &[usize] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The span at an arena index.
    pub fn span_at(&self, idx: usize) -> &'a Span {
        &self.spans[idx]
    }

    /// The root-most span: no parent, or a parent that resolves to no span
    /// in this trace. The earliest-starting such span wins when several
    /// qualify. When every span claims a resolvable parent (a cycle), the
    /// earliest-starting span of the whole trace stands in, so a malformed
    /// trace still renders.
    pub fn root_index(&self) -> Option<usize> {
        let root = self
            .by_id
            .values()
            .copied()
            .filter(|&idx| {
                let span = &self.spans[idx];
                match span.parent_id {
                    None => true,
                    Some(parent_id) => {
                        parent_id == span.id || !self.by_id.contains_key(&parent_id)
                    }
                }
            })
            .min_by_key(|&idx| (start_key(&self.spans[idx]), self.spans[idx].id));

        root.or_else(|| {
            self.by_id
                .values()
                .copied()
                .min_by_key(|&idx| (start_key(&self.spans[idx]), self.spans[idx].id))
        })
    }

    /// The root-most span itself.
    pub fn root_span(&self) -> Option<&'a Span> {
        self.root_index().map(|idx| &self.spans[idx])
    }

    /// Depth of every span in the parent forest: roots at 0, each child at
    /// its parent's depth plus one. A span revisited on the current walk
    /// is treated as its own root, which bounds every walk even through a
    /// parent cycle.
    pub fn depths(&self) -> HashMap<SpanId, u32> {
        let mut depths: HashMap<SpanId, u32> = HashMap::with_capacity(self.by_id.len());
        for &start_idx in self.by_id.values() {
            if depths.contains_key(&self.spans[start_idx].id) {
                continue;
            }
            let mut chain: Vec<SpanId> = Vec::new();
            let mut on_walk: FxHashSet<SpanId> = FxHashSet::default();
            let mut cursor = start_idx;
            let base = loop {
                let span = &self.spans[cursor];
                if let Some(&known) = depths.get(&span.id) {
                    // The chain hangs below an already-resolved span.
                    break known + 1;
                }
                chain.push(span.id);
                on_walk.insert(span.id);
                match span
                    .parent_id
                    .filter(|&p| p != span.id)
                    .and_then(|p| self.by_id.get(&p).copied())
                {
                    Some(parent_idx) => {
                        if on_walk.contains(&self.spans[parent_idx].id) {
                            // Cycle: the span at the top of the chain
                            // becomes its own root.
                            break 0;
                        }
                        cursor = parent_idx;
                    }
                    None => break 0,
                }
            };
            for (i, span_id) in chain.iter().rev().enumerate() {
                depths.insert(*span_id, base + i as u32);
            }
        }
        depths
    }
}

/// Sort key placing spans without annotations last.
fn start_key(span: &Span) -> Micros {
    span.start_timestamp().unwrap_or(Micros::MAX)
}
