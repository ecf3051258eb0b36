use crate::handle::NodeHandle;
use crate::iter::{AxisIterator, IterState};

/// `E[n]` for a constant `n`: yields the source's `n`-th node once.
#[derive(Debug, Clone)]
pub struct NthIterator {
    state: IterState,
    source: Box<dyn AxisIterator>,
    n: usize,
    ready: bool,
    marked: bool,
}

impl NthIterator {
    /// `n` is 1-based; `0` yields nothing.
    pub fn new(source: Box<dyn AxisIterator>, n: usize) -> Self {
        Self { state: IterState::default(), source, n, ready: true, marked: true }
    }

    pub fn n(&self) -> usize {
        self.n
    }
}

impl AxisIterator for NthIterator {
    fn state(&self) -> &IterState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IterState {
        &mut self.state
    }

    fn bind(&mut self, node: NodeHandle) {
        self.source.set_start_node(node);
        self.ready = true;
    }

    fn rewind(&mut self) {
        self.source.reset();
        self.ready = true;
    }

    fn advance(&mut self) -> Option<NodeHandle> {
        if !self.ready {
            return None;
        }
        self.ready = false;
        self.source.node_at(self.n)
    }

    fn mark_cursor(&mut self) {
        self.marked = self.ready;
    }

    fn restore_cursor(&mut self) {
        self.ready = self.marked;
    }

    fn boxed_clone(&self) -> Box<dyn AxisIterator> {
        Box::new(self.clone())
    }

    fn is_reverse(&self) -> bool {
        self.source.is_reverse()
    }
}

/// Reports the position of `target` inside its source instead of the
/// position of the last node returned.
///
/// Binding scans the source once to locate `target`, then rewinds it; the
/// source must therefore produce the same sequence after `reset`. When
/// `target` is absent the position is one past the last node.
#[derive(Debug, Clone)]
pub struct MatchingIterator {
    state: IterState,
    source: Box<dyn AxisIterator>,
    target: NodeHandle,
    found_at: usize,
}

impl MatchingIterator {
    pub fn new(target: NodeHandle, source: Box<dyn AxisIterator>) -> Self {
        Self { state: IterState::default(), source, target, found_at: 0 }
    }

    fn locate(&mut self) {
        let mut position = 1;
        while let Some(node) = self.source.next_node() {
            if node == self.target {
                break;
            }
            position += 1;
        }
        self.found_at = position;
        self.source.reset();
    }
}

impl AxisIterator for MatchingIterator {
    fn state(&self) -> &IterState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IterState {
        &mut self.state
    }

    fn bind(&mut self, node: NodeHandle) {
        self.source.set_start_node(node);
        self.locate();
    }

    fn rewind(&mut self) {
        self.source.reset();
    }

    fn advance(&mut self) -> Option<NodeHandle> {
        self.source.next_node()
    }

    fn mark_cursor(&mut self) {
        self.source.set_mark();
    }

    fn restore_cursor(&mut self) {
        self.source.goto_mark();
    }

    fn boxed_clone(&self) -> Box<dyn AxisIterator> {
        Box::new(self.clone())
    }

    fn is_reverse(&self) -> bool {
        self.source.is_reverse()
    }

    fn position(&self) -> usize {
        self.found_at
    }

    fn last(&mut self) -> usize {
        self.source.last()
    }
}
