use core::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::handle::NodeHandle;
use crate::iter::{AxisIterator, IterState};
use crate::router::DocumentRouter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOp {
    Equal,
    NotEqual,
}

/// What a [`NodeValueIterator`] yields for a node whose value passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnMode {
    Node,
    Parent,
}

/// `E[. = 'v']`, `E[. != 'v']`, or `E[child = 'v']` with [`ReturnMode::Parent`]
/// when `E` walks the child.
#[derive(Debug, Clone)]
pub struct NodeValueIterator {
    state: IterState,
    router: Arc<DocumentRouter>,
    source: Box<dyn AxisIterator>,
    value: String,
    op: ValueOp,
    mode: ReturnMode,
}

impl NodeValueIterator {
    pub fn new(
        router: Arc<DocumentRouter>,
        source: Box<dyn AxisIterator>,
        value: impl Into<String>,
        op: ValueOp,
        mode: ReturnMode,
    ) -> Self {
        Self { state: IterState::default(), router, source, value: value.into(), op, mode }
    }
}

impl AxisIterator for NodeValueIterator {
    fn state(&self) -> &IterState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IterState {
        &mut self.state
    }

    fn bind(&mut self, node: NodeHandle) {
        self.source.set_start_node(node);
    }

    fn rewind(&mut self) {
        self.source.reset();
    }

    fn advance(&mut self) -> Option<NodeHandle> {
        while let Some(node) = self.source.next_node() {
            let equal = self.router.string_value(node) == self.value;
            if equal != (self.op == ValueOp::Equal) {
                continue;
            }
            match self.mode {
                ReturnMode::Node => return Some(node),
                ReturnMode::Parent => {
                    if let Some(parent) = self.router.parent(node) {
                        return Some(parent);
                    }
                }
            }
        }
        None
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
}

/// What a [`FilterIterator`] predicate sees for each candidate.
pub struct PredicateContext<'a> {
    pub node: NodeHandle,
    /// 1-based position of `node` in the unfiltered source.
    pub position: usize,
    pub router: &'a DocumentRouter,
    source: &'a mut dyn AxisIterator,
}

impl PredicateContext<'_> {
    /// Size of the unfiltered source; computed on first use.
    pub fn last(&mut self) -> usize {
        self.source.last()
    }
}

pub type Predicate = Rc<dyn Fn(&mut PredicateContext<'_>) -> bool>;

/// General predicate filter `E[p]`.
#[derive(Clone)]
pub struct FilterIterator {
    state: IterState,
    router: Arc<DocumentRouter>,
    source: Box<dyn AxisIterator>,
    predicate: Predicate,
}

impl FilterIterator {
    pub fn new(
        router: Arc<DocumentRouter>,
        source: Box<dyn AxisIterator>,
        predicate: impl Fn(&mut PredicateContext<'_>) -> bool + 'static,
    ) -> Self {
        Self { state: IterState::default(), router, source, predicate: Rc::new(predicate) }
    }
}

impl fmt::Debug for FilterIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterIterator").field("state", &self.state).field("source", &self.source).finish_non_exhaustive()
    }
}

impl AxisIterator for FilterIterator {
    fn state(&self) -> &IterState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IterState {
        &mut self.state
    }

    fn bind(&mut self, node: NodeHandle) {
        self.source.set_start_node(node);
    }

    fn rewind(&mut self) {
        self.source.reset();
    }

    fn advance(&mut self) -> Option<NodeHandle> {
        while let Some(node) = self.source.next_node() {
            let position = self.source.position();
            let mut ctx =
                PredicateContext { node, position, router: self.router.as_ref(), source: self.source.as_mut() };
            if (self.predicate)(&mut ctx) {
                return Some(node);
            }
        }
        None
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
}
