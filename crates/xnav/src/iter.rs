//! The axis-iterator protocol.
//!
//! Every navigation primitive and every composite in [`crate::algebra`] is an
//! [`AxisIterator`]: a lazy cursor that is bound to a start node, yields
//! handles until exhausted, can be rewound, cloned into an independent value
//! snapshot and checkpointed with one level of mark/resume.
//!
//! Lifecycle: `Unbound --set_start_node--> Bound(pos 0) --next_node--> Bound(pos k)
//! --next_node(None)--> Exhausted`. [`AxisIterator::reset`] returns to
//! `Bound(pos 0)` with the last start node.
//!
//! A clone made with [`AxisIterator::clone_iterator`] is *not restartable*:
//! `set_start_node` on it is ignored, so an inner evaluation (e.g. computing
//! `last()`) can re-walk a captured value without disturbing the outer
//! iteration that produced it.

use core::fmt;
use std::rc::Rc;

use crate::handle::NodeHandle;
use crate::model::Axis;

/// Bookkeeping shared by all iterators.
#[derive(Debug, Clone)]
pub struct IterState {
    pub(crate) start: Option<NodeHandle>,
    pub(crate) position: usize,
    pub(crate) last: Option<usize>,
    pub(crate) restartable: bool,
    pub(crate) include_self: bool,
    pub(crate) marked_position: usize,
}

impl Default for IterState {
    fn default() -> Self {
        Self { start: None, position: 0, last: None, restartable: true, include_self: false, marked_position: 0 }
    }
}

pub trait AxisIterator: fmt::Debug {
    fn state(&self) -> &IterState;
    fn state_mut(&mut self) -> &mut IterState;

    /// Bind the underlying cursor to `node`. Called by [`Self::set_start_node`]
    /// after the restart rules have been applied.
    fn bind(&mut self, node: NodeHandle);

    /// Produce the next handle without touching position bookkeeping.
    fn advance(&mut self) -> Option<NodeHandle>;

    /// Checkpoint the cursor (one level). Position is saved by [`Self::set_mark`].
    fn mark_cursor(&mut self);
    fn restore_cursor(&mut self);

    /// Deep copy of the cursor chain; shared buffers stay shared.
    fn boxed_clone(&self) -> Box<dyn AxisIterator>;

    /// Return to the first node for the current start node. Composites rewind
    /// their sources even when those are no longer restartable.
    fn rewind(&mut self) {
        if let Some(start) = self.state().start {
            self.bind(start);
        }
    }

    fn is_reverse(&self) -> bool {
        false
    }

    fn axis(&self) -> Option<Axis> {
        None
    }

    /// Index lookups (`id()`, `key()`) produce the same nodes for every start node.
    fn is_index_lookup(&self) -> bool {
        false
    }

    fn set_restartable(&mut self, restartable: bool) {
        self.state_mut().restartable = restartable;
    }

    fn is_restartable(&self) -> bool {
        self.state().restartable
    }

    fn start_node(&self) -> Option<NodeHandle> {
        self.state().start
    }

    /// Request the `-or-self` variant of the axis at the next bind.
    fn include_self(&mut self) {
        self.state_mut().include_self = true;
    }

    fn set_start_node(&mut self, node: NodeHandle) {
        if !self.state().restartable {
            return;
        }
        let st = self.state_mut();
        st.start = Some(node);
        st.position = 0;
        st.last = None;
        self.bind(node);
    }

    fn reset(&mut self) {
        self.state_mut().position = 0;
        self.rewind();
    }

    fn next_node(&mut self) -> Option<NodeHandle> {
        let node = self.advance()?;
        self.state_mut().position += 1;
        Some(node)
    }

    /// 1-based position of the node most recently returned.
    fn position(&self) -> usize {
        self.state().position
    }

    /// Size of the whole sequence for the current start node. Computed once
    /// by draining a rewound copy; the cursor itself does not move.
    fn last(&mut self) -> usize {
        if let Some(last) = self.state().last {
            return last;
        }
        let mut copy = self.boxed_clone();
        copy.reset();
        let mut count = 0usize;
        while copy.next_node().is_some() {
            count += 1;
        }
        self.state_mut().last = Some(count);
        count
    }

    fn clone_iterator(&self) -> Box<dyn AxisIterator> {
        let mut copy = self.boxed_clone();
        copy.set_restartable(false);
        copy
    }

    fn set_mark(&mut self) {
        let pos = self.state().position;
        self.state_mut().marked_position = pos;
        self.mark_cursor();
    }

    fn goto_mark(&mut self) {
        let pos = self.state().marked_position;
        self.state_mut().position = pos;
        self.restore_cursor();
    }

    /// The node at 1-based `position` in cursor order. Position `0` never matches.
    fn node_at(&mut self, position: usize) -> Option<NodeHandle> {
        if position == 0 {
            return None;
        }
        if self.position() >= position {
            self.reset();
        }
        while let Some(node) = self.next_node() {
            if self.position() == position {
                return Some(node);
            }
        }
        None
    }

    /// Drain the remaining nodes.
    fn drain_nodes(&mut self) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        while let Some(n) = self.next_node() {
            out.push(n);
        }
        out
    }
}

impl Clone for Box<dyn AxisIterator> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// `Iterator` adapter over a borrowed cursor.
pub struct Nodes<'a> {
    inner: &'a mut dyn AxisIterator,
}

impl<'a> Nodes<'a> {
    pub fn new(inner: &'a mut dyn AxisIterator) -> Self {
        Self { inner }
    }
}

impl Iterator for Nodes<'_> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<NodeHandle> {
        self.inner.next_node()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmptyIterator {
    state: IterState,
}

impl EmptyIterator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AxisIterator for EmptyIterator {
    fn state(&self) -> &IterState {
        &self.state
    }
    fn state_mut(&mut self) -> &mut IterState {
        &mut self.state
    }
    fn bind(&mut self, _node: NodeHandle) {}
    fn advance(&mut self) -> Option<NodeHandle> {
        None
    }
    fn mark_cursor(&mut self) {}
    fn restore_cursor(&mut self) {}
    fn boxed_clone(&self) -> Box<dyn AxisIterator> {
        Box::new(self.clone())
    }
    fn last(&mut self) -> usize {
        0
    }
}

/// Yields one node: either a fixed node, or the start node it is bound to.
#[derive(Debug, Clone)]
pub struct SingletonIterator {
    state: IterState,
    node: Option<NodeHandle>,
    constant: bool,
    emitted: bool,
    marked: bool,
}

impl SingletonIterator {
    /// Always yields `node`, whatever it is bound to.
    pub fn constant(node: NodeHandle) -> Self {
        Self { state: IterState::default(), node: Some(node), constant: true, emitted: false, marked: false }
    }

    /// Yields its start node.
    pub fn of_start() -> Self {
        Self { state: IterState::default(), node: None, constant: false, emitted: false, marked: false }
    }
}

impl AxisIterator for SingletonIterator {
    fn state(&self) -> &IterState {
        &self.state
    }
    fn state_mut(&mut self) -> &mut IterState {
        &mut self.state
    }
    fn bind(&mut self, node: NodeHandle) {
        if !self.constant {
            self.node = Some(node);
        }
        self.emitted = false;
    }
    fn rewind(&mut self) {
        self.emitted = false;
    }
    fn advance(&mut self) -> Option<NodeHandle> {
        if self.emitted {
            return None;
        }
        self.emitted = true;
        self.node
    }
    fn mark_cursor(&mut self) {
        self.marked = self.emitted;
    }
    fn restore_cursor(&mut self) {
        self.emitted = self.marked;
    }
    fn boxed_clone(&self) -> Box<dyn AxisIterator> {
        Box::new(self.clone())
    }
    fn last(&mut self) -> usize {
        usize::from(self.node.is_some())
    }
}

/// Streams a fixed, shared handle sequence. Binding only rewinds it.
#[derive(Debug, Clone)]
pub struct ArrayIterator {
    state: IterState,
    nodes: Rc<[NodeHandle]>,
    index: usize,
    marked: usize,
    lookup: bool,
}

/// Result of an `id()`/`key()` lookup: start-node independent by construction.
pub type IndexLookupIterator = ArrayIterator;

impl ArrayIterator {
    pub fn new(nodes: impl Into<Rc<[NodeHandle]>>) -> Self {
        Self { state: IterState::default(), nodes: nodes.into(), index: 0, marked: 0, lookup: false }
    }

    /// Wrap the result of an index lookup.
    pub fn index_lookup(nodes: impl Into<Rc<[NodeHandle]>>) -> Self {
        Self { lookup: true, ..Self::new(nodes) }
    }

    pub fn nodes(&self) -> &[NodeHandle] {
        &self.nodes
    }
}

impl AxisIterator for ArrayIterator {
    fn state(&self) -> &IterState {
        &self.state
    }
    fn state_mut(&mut self) -> &mut IterState {
        &mut self.state
    }
    fn bind(&mut self, _node: NodeHandle) {
        self.index = 0;
    }
    fn rewind(&mut self) {
        self.index = 0;
    }
    fn advance(&mut self) -> Option<NodeHandle> {
        let node = self.nodes.get(self.index).copied()?;
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
    fn is_index_lookup(&self) -> bool {
        self.lookup
    }
    fn last(&mut self) -> usize {
        self.nodes.len()
    }
    fn node_at(&mut self, position: usize) -> Option<NodeHandle> {
        let node = self.nodes.get(position.checked_sub(1)?).copied()?;
        self.index = position;
        self.state.position = position;
        Some(node)
    }
}
