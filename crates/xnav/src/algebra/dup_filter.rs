use std::rc::Rc;

use crate::handle::NodeHandle;
use crate::iter::{AxisIterator, IterState};

/// Buffers its source, sorts by handle and drops repeats.
///
/// Handles sort in document order within a tree, so this restores document
/// order after a [`StepIterator`](super::StepIterator) whose inner axis is
/// reverse or whose contexts overlap. An index-lookup source is captured once
/// and reused for every later start node.
#[derive(Debug, Clone)]
pub struct DupFilterIterator {
    state: IterState,
    source: Box<dyn AxisIterator>,
    nodes: Option<Rc<[NodeHandle]>>,
    index: usize,
    marked: usize,
}

impl DupFilterIterator {
    pub fn new(source: Box<dyn AxisIterator>) -> Self {
        Self { state: IterState::default(), source, nodes: None, index: 0, marked: 0 }
    }

    fn fill(&mut self) -> &[NodeHandle] {
        let source = &mut self.source;
        self.nodes.get_or_insert_with(|| {
            let mut nodes = source.drain_nodes();
            let raw = nodes.len();
            nodes.sort_unstable();
            nodes.dedup();
            tracing::trace!(raw, unique = nodes.len(), "dup filter buffered source");
            nodes.into()
        })
    }
}

impl AxisIterator for DupFilterIterator {
    fn state(&self) -> &IterState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IterState {
        &mut self.state
    }

    fn bind(&mut self, node: NodeHandle) {
        self.index = 0;
        if self.nodes.is_some() && self.source.is_index_lookup() {
            return;
        }
        self.source.set_start_node(node);
        self.nodes = None;
    }

    fn rewind(&mut self) {
        self.index = 0;
    }

    fn advance(&mut self) -> Option<NodeHandle> {
        let index = self.index;
        let node = self.fill().get(index).copied()?;
        self.index += 1;
        Some(node)
    }

    fn mark_cursor(&mut self) {
        self.marked = self.index;
    }

    fn restore_cursor(&mut self) {
        self.index = self.marked;
    }

    fn boxed_clone(&self) -> Box<dyn AxisIterator> {
        Box::new(self.clone())
    }

    fn last(&mut self) -> usize {
        self.fill().len()
    }

    fn node_at(&mut self, position: usize) -> Option<NodeHandle> {
        let node = self.fill().get(position.checked_sub(1)?).copied()?;
        self.index = position;
        self.state.position = position;
        Some(node)
    }
}
