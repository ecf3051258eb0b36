//! Generic per-axis cursor built only on the [`Tree`] primitives.

use smallvec::SmallVec;
use string_cache::DefaultAtom;

use crate::handle::NodeId;
use crate::model::{Axis, NodeKind, NodeTest};
use crate::tree::{LocalCursor, Tree};

#[derive(Debug, Clone)]
pub struct AxisCursor {
    axis: Axis,
    test: Option<NodeTest>,
    state: WalkState,
}

#[derive(Debug, Clone)]
enum WalkState {
    Idle,
    // self, parent, root
    Once(Option<NodeId>),
    Siblings {
        next: Option<NodeId>,
        forward: bool,
    },
    Attributes(Option<NodeId>),
    Ancestors(Option<NodeId>),
    // pre-order walk that never leaves the subtree rooted at `anchor`
    Descend {
        anchor: NodeId,
        next: Option<NodeId>,
    },
    // pre-order walk to the end of the document
    Following(Option<NodeId>),
    // reverse pre-order, skipping the context node's ancestors
    Preceding {
        ancestors: SmallVec<[NodeId; 16]>,
        next: Option<NodeId>,
    },
    Namespaces {
        seen: SmallVec<[DefaultAtom; 8]>,
        element: Option<NodeId>,
        next: Option<NodeId>,
    },
}

impl AxisCursor {
    pub fn new(axis: Axis, test: Option<NodeTest>) -> Self {
        Self { axis, test, state: WalkState::Idle }
    }

    fn owner_if_attr(tree: &dyn Tree, node: NodeId) -> Option<NodeId> {
        if tree.kind(node).is_attr_or_namespace() { tree.parent(node) } else { None }
    }

    /// Next node in document order, staying inside `anchor`'s subtree if given.
    fn successor(tree: &dyn Tree, node: NodeId, anchor: Option<NodeId>) -> Option<NodeId> {
        if let Some(c) = tree.first_child(node) {
            return Some(c);
        }
        Self::skip_subtree(tree, node, anchor)
    }

    /// First node after `node`'s subtree, staying inside `anchor`'s subtree if given.
    fn skip_subtree(tree: &dyn Tree, node: NodeId, anchor: Option<NodeId>) -> Option<NodeId> {
        let mut cur = node;
        loop {
            if Some(cur) == anchor {
                return None;
            }
            if let Some(s) = tree.next_sibling(cur) {
                return Some(s);
            }
            cur = tree.parent(cur)?;
        }
    }

    fn last_descendant(tree: &dyn Tree, mut node: NodeId) -> NodeId {
        while let Some(last) = tree.last_child(node) {
            node = last;
        }
        node
    }

    fn predecessor(tree: &dyn Tree, node: NodeId) -> Option<NodeId> {
        match tree.previous_sibling(node) {
            Some(prev) => Some(Self::last_descendant(tree, prev)),
            None => tree.parent(node),
        }
    }

    fn init(&self, tree: &dyn Tree, node: NodeId) -> WalkState {
        let is_attr = tree.kind(node).is_attr_or_namespace();
        match self.axis {
            Axis::SelfAxis => WalkState::Once(Some(node)),
            Axis::Parent => WalkState::Once(tree.parent(node)),
            Axis::Root => WalkState::Once(Some(tree.root())),
            Axis::Child => WalkState::Siblings { next: tree.first_child(node), forward: true },
            Axis::FollowingSibling => {
                WalkState::Siblings { next: if is_attr { None } else { tree.next_sibling(node) }, forward: true }
            }
            Axis::PrecedingSibling => {
                WalkState::Siblings { next: if is_attr { None } else { tree.previous_sibling(node) }, forward: false }
            }
            Axis::Attribute => WalkState::Attributes(tree.first_attribute(node)),
            Axis::Ancestor => WalkState::Ancestors(tree.parent(node)),
            Axis::AncestorOrSelf => WalkState::Ancestors(Some(node)),
            Axis::Descendant => WalkState::Descend { anchor: node, next: tree.first_child(node) },
            Axis::DescendantOrSelf => WalkState::Descend { anchor: node, next: Some(node) },
            Axis::DescendantOrSelfFromRoot => {
                let root = tree.root();
                WalkState::Descend { anchor: root, next: Some(root) }
            }
            Axis::Following => {
                let next = match Self::owner_if_attr(tree, node) {
                    Some(owner) => Self::successor(tree, owner, None),
                    None => Self::skip_subtree(tree, node, None),
                };
                WalkState::Following(next)
            }
            Axis::Preceding => {
                let origin = Self::owner_if_attr(tree, node).unwrap_or(node);
                let mut ancestors: SmallVec<[NodeId; 16]> = SmallVec::new();
                let mut cur = tree.parent(origin);
                while let Some(a) = cur {
                    ancestors.push(a);
                    cur = tree.parent(a);
                }
                if origin != node {
                    ancestors.push(origin);
                }
                WalkState::Preceding { next: Self::predecessor(tree, origin), ancestors }
            }
            Axis::Namespace => {
                let element = (tree.kind(node) == NodeKind::Element).then_some(node);
                WalkState::Namespaces { seen: SmallVec::new(), element, next: element.and_then(|e| tree.first_namespace(e)) }
            }
        }
    }

    fn next_candidate(&mut self, tree: &dyn Tree) -> Option<NodeId> {
        match &mut self.state {
            WalkState::Idle => None,
            WalkState::Once(node) => node.take(),
            WalkState::Siblings { next, forward } => {
                let cur = next.take()?;
                *next = if *forward { tree.next_sibling(cur) } else { tree.previous_sibling(cur) };
                Some(cur)
            }
            WalkState::Attributes(next) => {
                let cur = next.take()?;
                *next = tree.next_attribute(cur);
                Some(cur)
            }
            WalkState::Ancestors(next) => {
                let cur = next.take()?;
                *next = tree.parent(cur);
                Some(cur)
            }
            WalkState::Descend { anchor, next } => {
                let cur = next.take()?;
                *next = Self::successor(tree, cur, Some(*anchor));
                Some(cur)
            }
            WalkState::Following(next) => {
                let cur = next.take()?;
                *next = Self::successor(tree, cur, None);
                Some(cur)
            }
            WalkState::Preceding { ancestors, next } => {
                while let Some(cur) = next.take() {
                    *next = Self::predecessor(tree, cur);
                    if ancestors.contains(&cur) {
                        continue;
                    }
                    return Some(cur);
                }
                None
            }
            WalkState::Namespaces { seen, element, next } => loop {
                if let Some(ns) = next.take() {
                    *next = tree.next_namespace(ns);
                    let prefix = DefaultAtom::from(tree.local_name(ns).unwrap_or_default());
                    if seen.contains(&prefix) {
                        continue;
                    }
                    seen.push(prefix);
                    return Some(ns);
                }
                // declarations of this element exhausted: move to the parent element
                let parent = tree.parent((*element)?);
                *element = parent.filter(|p| tree.kind(*p) == NodeKind::Element);
                *next = element.and_then(|e| tree.first_namespace(e));
                element.as_ref()?;
            },
        }
    }
}

impl LocalCursor for AxisCursor {
    fn start(&mut self, tree: &dyn Tree, node: NodeId) {
        self.state = self.init(tree, node);
    }

    fn next_id(&mut self, tree: &dyn Tree) -> Option<NodeId> {
        let principal = self.axis.principal_kind();
        loop {
            let cand = self.next_candidate(tree)?;
            match &self.test {
                None => return Some(cand),
                Some(test) if test.matches(tree, cand, principal) => return Some(cand),
                Some(_) => {}
            }
        }
    }

    fn box_clone(&self) -> Box<dyn LocalCursor> {
        Box::new(self.clone())
    }
}
