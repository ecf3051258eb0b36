use std::cell::RefCell;
use std::rc::Rc;

use crate::handle::NodeHandle;
use crate::iter::{AxisIterator, IterState};

#[derive(Debug)]
struct NodeCache {
    source: Box<dyn AxisIterator>,
    nodes: Vec<NodeHandle>,
    exhausted: bool,
}

impl NodeCache {
    fn get(&mut self, index: usize) -> Option<NodeHandle> {
        while self.nodes.len() <= index && !self.exhausted {
            match self.source.next_node() {
                Some(node) => self.nodes.push(node),
                None => self.exhausted = true,
            }
        }
        self.nodes.get(index).copied()
    }

    fn len(&mut self) -> usize {
        while !self.exhausted {
            match self.source.next_node() {
                Some(node) => self.nodes.push(node),
                None => self.exhausted = true,
            }
        }
        self.nodes.len()
    }
}

/// A variable's value: pulls from its source on demand and remembers
/// everything it has seen.
///
/// Clones share the buffer but keep their own read position, so several
/// readers of one variable cost a single walk of the source. After the first
/// bind the list stops being restartable; later start nodes are ignored.
#[derive(Debug, Clone)]
pub struct CachedNodeList {
    state: IterState,
    cache: Rc<RefCell<NodeCache>>,
    index: usize,
    marked: usize,
}

impl CachedNodeList {
    pub fn new(source: Box<dyn AxisIterator>) -> Self {
        let cache = NodeCache { source, nodes: Vec::new(), exhausted: false };
        Self { state: IterState::default(), cache: Rc::new(RefCell::new(cache)), index: 0, marked: 0 }
    }

    /// Nodes pulled from the source so far.
    pub fn cached_len(&self) -> usize {
        self.cache.borrow().nodes.len()
    }

    pub fn is_fully_cached(&self) -> bool {
        self.cache.borrow().exhausted
    }
}

impl AxisIterator for CachedNodeList {
    fn state(&self) -> &IterState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IterState {
        &mut self.state
    }

    fn bind(&mut self, node: NodeHandle) {
        {
            let mut cache = self.cache.borrow_mut();
            if cache.nodes.is_empty() && !cache.exhausted {
                cache.source.set_start_node(node);
            }
        }
        self.index = 0;
        self.state.restartable = false;
    }

    fn rewind(&mut self) {
        self.index = 0;
    }

    fn advance(&mut self) -> Option<NodeHandle> {
        let node = self.cache.borrow_mut().get(self.index)?;
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
        self.cache.borrow_mut().len()
    }

    fn node_at(&mut self, position: usize) -> Option<NodeHandle> {
        let node = self.cache.borrow_mut().get(position.checked_sub(1)?)?;
        self.index = position;
        self.state.position = position;
        Some(node)
    }
}
