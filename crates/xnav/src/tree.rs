//! Contract between the navigation core and a concrete tree storage.
//!
//! A [`Tree`] answers structural questions about its own nodes, addressed by
//! tree-local [`NodeId`]s. It never sees document masks: the
//! [`DocumentRouter`](crate::router::DocumentRouter) strips them on the way in
//! and re-tags results on the way out.

use core::fmt;

use crate::handle::{IDENT_BITS, NodeId};
use crate::model::{Axis, NodeKind, NodeTest};

pub trait Tree: Send + Sync + fmt::Debug {
    /// The document node.
    fn root(&self) -> NodeId;
    /// Largest identity handed out by this tree.
    fn max_id(&self) -> NodeId;

    fn kind(&self, node: NodeId) -> NodeKind;
    /// Parent of a child node, or owner element of an attribute/namespace node.
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn first_child(&self, node: NodeId) -> Option<NodeId>;
    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        if self.kind(node).is_attr_or_namespace() {
            return None;
        }
        let parent = self.parent(node)?;
        let mut prev = None;
        let mut cur = self.first_child(parent);
        while let Some(c) = cur {
            if c == node {
                return prev;
            }
            prev = Some(c);
            cur = self.next_sibling(c);
        }
        None
    }

    fn last_child(&self, node: NodeId) -> Option<NodeId> {
        let mut last = self.first_child(node)?;
        while let Some(n) = self.next_sibling(last) {
            last = n;
        }
        Some(last)
    }

    fn first_attribute(&self, node: NodeId) -> Option<NodeId>;
    fn next_attribute(&self, attr: NodeId) -> Option<NodeId>;

    /// Namespace nodes declared on `node` itself (not inherited ones).
    ///
    /// The namespace axis only reports declared nodes, so a tree that wants
    /// the implicit `xml` namespace in scope declares it on its outermost
    /// element.
    fn first_namespace(&self, _node: NodeId) -> Option<NodeId> {
        None
    }
    fn next_namespace(&self, _ns: NodeId) -> Option<NodeId> {
        None
    }

    fn string_value(&self, node: NodeId) -> String;
    /// Local name; the target for processing instructions, the prefix for namespace nodes.
    fn local_name(&self, node: NodeId) -> Option<&str>;
    fn namespace_uri(&self, node: NodeId) -> Option<&str>;
    fn prefix(&self, node: NodeId) -> Option<&str>;

    /// Document order within this tree.
    fn less_than(&self, a: NodeId, b: NodeId) -> bool {
        a < b
    }

    fn base_uri(&self) -> Option<&str> {
        None
    }

    /// Element carrying the given ID value, if the tree maintains an ID index.
    fn element_by_id(&self, _id: &str) -> Option<NodeId> {
        None
    }

    /// Tree-specific cursor for an axis. `None` selects the generic walker
    /// built on the primitives above.
    fn cursor(&self, _axis: Axis, _test: Option<&NodeTest>) -> Option<Box<dyn LocalCursor>> {
        None
    }

    /// Number of consecutive document masks needed to address every identity.
    fn id_blocks(&self) -> usize {
        (self.max_id() >> IDENT_BITS) as usize + 1
    }
}

/// Cursor over tree-local identities. The tree is passed on every call so a
/// cursor never has to own or borrow it.
pub trait LocalCursor: fmt::Debug {
    fn start(&mut self, tree: &dyn Tree, node: NodeId);
    fn next_id(&mut self, tree: &dyn Tree) -> Option<NodeId>;
    fn box_clone(&self) -> Box<dyn LocalCursor>;
}

impl Clone for Box<dyn LocalCursor> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}
