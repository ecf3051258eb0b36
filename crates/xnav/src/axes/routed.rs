use std::sync::Arc;

use super::walker::AxisCursor;
use crate::handle::{DocMask, NodeHandle};
use crate::iter::{AxisIterator, IterState};
use crate::model::{Axis, NodeTest};
use crate::router::DocumentRouter;
use crate::tree::{LocalCursor, Tree};

/// Per-tree cursor wrapped for cross-document iteration.
///
/// Binding resolves the start handle's tree once; `advance` then talks to that
/// tree directly and re-tags every identity with the tree's mask.
#[derive(Debug, Clone)]
pub struct RoutedAxisIterator {
    state: IterState,
    router: Arc<DocumentRouter>,
    axis: Axis,
    test: Option<NodeTest>,
    bound: Option<Bound>,
    marked: Option<Bound>,
}

#[derive(Debug, Clone)]
struct Bound {
    tree: Arc<dyn Tree>,
    base: DocMask,
    axis: Axis,
    cursor: Box<dyn LocalCursor>,
}

impl RoutedAxisIterator {
    pub fn new(router: Arc<DocumentRouter>, axis: Axis, test: Option<NodeTest>) -> Self {
        Self { state: IterState::default(), router, axis, test, bound: None, marked: None }
    }

    fn effective_axis(&self) -> Axis {
        if self.state.include_self { self.axis.or_self() } else { self.axis }
    }

    fn make_cursor(&self, tree: &dyn Tree) -> Box<dyn LocalCursor> {
        let axis = self.effective_axis();
        tree.cursor(axis, self.test.as_ref()).unwrap_or_else(|| Box::new(AxisCursor::new(axis, self.test.clone())))
    }
}

impl AxisIterator for RoutedAxisIterator {
    fn state(&self) -> &IterState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IterState {
        &mut self.state
    }

    fn bind(&mut self, node: NodeHandle) {
        let routed = self.router.resolve(node);
        // keep the cursor allocation when staying inside the same tree
        let axis = self.effective_axis();
        let mut bound = match self.bound.take() {
            Some(b) if b.base == routed.base && b.axis == axis => b,
            _ => {
                let cursor = self.make_cursor(routed.tree.as_ref());
                Bound { tree: routed.tree, base: routed.base, axis, cursor }
            }
        };
        bound.cursor.start(bound.tree.as_ref(), routed.local);
        self.bound = Some(bound);
    }

    fn advance(&mut self) -> Option<NodeHandle> {
        let b = self.bound.as_mut()?;
        let id = b.cursor.next_id(b.tree.as_ref())?;
        Some(DocumentRouter::retag(b.base, id))
    }

    fn mark_cursor(&mut self) {
        self.marked = self.bound.clone();
    }

    fn restore_cursor(&mut self) {
        self.bound = self.marked.clone();
    }

    fn boxed_clone(&self) -> Box<dyn AxisIterator> {
        Box::new(self.clone())
    }

    fn is_reverse(&self) -> bool {
        self.effective_axis().is_reverse()
    }

    fn axis(&self) -> Option<Axis> {
        Some(self.effective_axis())
    }
}
