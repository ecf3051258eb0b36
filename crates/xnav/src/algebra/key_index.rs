use std::collections::HashMap;

use compact_str::CompactString;
use itertools::Itertools;

use crate::handle::NodeHandle;
use crate::iter::{AxisIterator, IndexLookupIterator};
use crate::router::DocumentRouter;

/// Value-to-nodes table behind `key()`.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    entries: HashMap<CompactString, Vec<NodeHandle>>,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every node of `nodes` under each value `use_values` produces for it.
    pub fn build<F>(router: &DocumentRouter, nodes: &mut dyn AxisIterator, use_values: F) -> Self
    where
        F: Fn(&DocumentRouter, NodeHandle) -> Vec<String>,
    {
        let mut index = Self::new();
        let mut count = 0usize;
        while let Some(node) = nodes.next_node() {
            for value in use_values(router, node) {
                index.insert(&value, node);
            }
            count += 1;
        }
        tracing::debug!(nodes = count, keys = index.len(), "built key index");
        index
    }

    pub fn insert(&mut self, value: &str, node: NodeHandle) {
        let bucket = self.entries.entry(CompactString::from(value)).or_default();
        // one node may produce the same value several times in a row
        if bucket.last() != Some(&node) {
            bucket.push(node);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nodes keyed by any of `values`, in document order without repeats.
    pub fn lookup(&self, router: &DocumentRouter, values: &[&str]) -> IndexLookupIterator {
        let nodes: Vec<NodeHandle> = values
            .iter()
            .filter_map(|v| self.entries.get(*v))
            .flatten()
            .copied()
            .sorted_by(|a, b| router.compare(*a, *b))
            .dedup()
            .collect();
        IndexLookupIterator::index_lookup(nodes)
    }
}
