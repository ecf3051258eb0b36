use core::cmp::Ordering;
use std::sync::Arc;

use crate::handle::NodeHandle;
use crate::iter::{AxisIterator, IterState};
use crate::router::DocumentRouter;

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    node: NodeHandle,
    input: usize,
}

/// k-way merge of individually document-ordered inputs (`A | B | ...`).
///
/// Keeps a binary min-heap over the current head of every input. The popped
/// node is compared with the node last returned, so duplicates are dropped
/// no matter which inputs they come from and output is strictly increasing.
///
/// Inputs are added before the first node is pulled; the heap is primed
/// lazily from their heads.
#[derive(Debug, Clone)]
pub struct UnionIterator {
    state: IterState,
    router: Arc<DocumentRouter>,
    inputs: Vec<Box<dyn AxisIterator>>,
    heap: Vec<HeapEntry>,
    primed: bool,
    returned: Option<NodeHandle>,
    marked: Option<(Vec<HeapEntry>, bool, Option<NodeHandle>)>,
}

impl UnionIterator {
    pub fn new(router: Arc<DocumentRouter>) -> Self {
        Self {
            state: IterState::default(),
            router,
            inputs: Vec::new(),
            heap: Vec::new(),
            primed: false,
            returned: None,
            marked: None,
        }
    }

    pub fn from_inputs(router: Arc<DocumentRouter>, inputs: Vec<Box<dyn AxisIterator>>) -> Self {
        Self { inputs, ..Self::new(router) }
    }

    #[must_use]
    pub fn with_input(mut self, input: Box<dyn AxisIterator>) -> Self {
        self.add_input(input);
        self
    }

    pub fn add_input(&mut self, input: Box<dyn AxisIterator>) {
        debug_assert!(!self.primed, "inputs must be added before iteration starts");
        self.inputs.push(input);
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    fn fill(&mut self) {
        self.primed = true;
        self.heap.clear();
        self.returned = None;
        for (input, it) in self.inputs.iter_mut().enumerate() {
            if let Some(node) = it.next_node() {
                self.heap.push(HeapEntry { node, input });
            }
        }
        for i in (0..self.heap.len() / 2).rev() {
            sift_down(&mut self.heap, i, &self.router);
        }
    }
}

fn precedes(router: &DocumentRouter, a: &HeapEntry, b: &HeapEntry) -> bool {
    router.compare(a.node, b.node) == Ordering::Less
}

fn sift_down(heap: &mut [HeapEntry], mut i: usize, router: &DocumentRouter) {
    let len = heap.len();
    loop {
        let left = 2 * i + 1;
        let right = left + 1;
        let mut smallest = i;
        if left < len && precedes(router, &heap[left], &heap[smallest]) {
            smallest = left;
        }
        if right < len && precedes(router, &heap[right], &heap[smallest]) {
            smallest = right;
        }
        if smallest == i {
            return;
        }
        heap.swap(i, smallest);
        i = smallest;
    }
}

impl AxisIterator for UnionIterator {
    fn state(&self) -> &IterState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IterState {
        &mut self.state
    }

    fn bind(&mut self, node: NodeHandle) {
        for it in &mut self.inputs {
            it.set_start_node(node);
        }
        self.primed = false;
    }

    fn rewind(&mut self) {
        for it in &mut self.inputs {
            it.reset();
        }
        self.primed = false;
    }

    fn advance(&mut self) -> Option<NodeHandle> {
        if !self.primed {
            self.fill();
        }
        loop {
            let top = *self.heap.first()?;
            match self.inputs[top.input].next_node() {
                Some(next) => self.heap[0].node = next,
                None => {
                    self.heap.swap_remove(0);
                }
            }
            sift_down(&mut self.heap, 0, &self.router);
            if self.returned != Some(top.node) {
                self.returned = Some(top.node);
                return Some(top.node);
            }
        }
    }

    fn mark_cursor(&mut self) {
        for it in &mut self.inputs {
            it.set_mark();
        }
        self.marked = Some((self.heap.clone(), self.primed, self.returned));
    }

    fn restore_cursor(&mut self) {
        for it in &mut self.inputs {
            it.goto_mark();
        }
        if let Some((heap, primed, returned)) = &self.marked {
            self.heap.clone_from(heap);
            self.primed = *primed;
            self.returned = *returned;
        }
    }

    fn boxed_clone(&self) -> Box<dyn AxisIterator> {
        Box::new(self.clone())
    }
}
