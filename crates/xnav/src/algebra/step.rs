use std::sync::Arc;

use crate::handle::NodeHandle;
use crate::iter::{AxisIterator, IterState};
use crate::router::DocumentRouter;

/// Path composition `A/B`: for each node of `source`, rebind `iterator` to it
/// and drain it before pulling the next source node.
///
/// Output order is the nested-loop order; pass it through a union or
/// [`DupFilterIterator`](super::DupFilterIterator) when document order matters.
#[derive(Debug, Clone)]
pub struct StepIterator {
    state: IterState,
    source: Box<dyn AxisIterator>,
    iterator: Box<dyn AxisIterator>,
    // `iterator` is bound to a source node and may still have output
    pending: bool,
    marked: Option<(Box<dyn AxisIterator>, bool)>,
}

impl StepIterator {
    pub fn new(source: Box<dyn AxisIterator>, mut iterator: Box<dyn AxisIterator>) -> Self {
        // the inner cursor is rebound for every source node
        iterator.set_restartable(true);
        Self { state: IterState::default(), source, iterator, pending: false, marked: None }
    }
}

impl AxisIterator for StepIterator {
    fn state(&self) -> &IterState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IterState {
        &mut self.state
    }

    fn bind(&mut self, node: NodeHandle) {
        self.source.set_start_node(node);
        self.pending = false;
    }

    fn rewind(&mut self) {
        self.source.reset();
        self.pending = false;
    }

    fn advance(&mut self) -> Option<NodeHandle> {
        loop {
            if self.pending {
                if let Some(node) = self.iterator.next_node() {
                    return Some(node);
                }
                self.pending = false;
            }
            let context = self.source.next_node()?;
            self.iterator.set_start_node(context);
            self.pending = true;
        }
    }

    fn mark_cursor(&mut self) {
        self.source.set_mark();
        self.marked = Some((self.iterator.boxed_clone(), self.pending));
    }

    fn restore_cursor(&mut self) {
        self.source.goto_mark();
        if let Some((iterator, pending)) = &self.marked {
            self.iterator = iterator.boxed_clone();
            self.pending = *pending;
        }
    }

    fn boxed_clone(&self) -> Box<dyn AxisIterator> {
        Box::new(self.clone())
    }
}

/// Absolute path `/A`: binds `source` to the document node of whatever node
/// it is started from.
#[derive(Debug, Clone)]
pub struct AbsoluteIterator {
    state: IterState,
    router: Arc<DocumentRouter>,
    source: Box<dyn AxisIterator>,
}

impl AbsoluteIterator {
    pub fn new(router: Arc<DocumentRouter>, source: Box<dyn AxisIterator>) -> Self {
        Self { state: IterState::default(), router, source }
    }
}

impl AxisIterator for AbsoluteIterator {
    fn state(&self) -> &IterState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IterState {
        &mut self.state
    }

    fn bind(&mut self, node: NodeHandle) {
        let root = self.router.document_of(node);
        self.source.set_start_node(root);
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
}
