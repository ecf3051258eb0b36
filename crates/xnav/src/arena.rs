//! In-memory tree with identities assigned in document order.
//!
//! Focus:
//! - Ergonomic builder for tests and hosts that assemble small documents
//! - Identities are pre-order positions (attributes, then namespaces, then children)
//! - Subtree ranges are contiguous, so string values are a single scan
//!
//! Example:
//! ```
//! use platynui_xnav::arena::{attr, doc, elem, text};
//! use platynui_xnav::tree::Tree;
//!
//! // <root id="r"><child>Hello</child><child world="yes"/></root>
//! let tree = doc()
//!     .child(
//!         elem("root")
//!             .attr(attr("id", "r"))
//!             .child(elem("child").child(text("Hello")))
//!             .child(elem("child").attr(attr("world", "yes"))),
//!     )
//!     .build();
//!
//! let root = tree.first_child(tree.root()).unwrap();
//! assert_eq!(tree.local_name(root), Some("root"));
//! assert_eq!(tree.string_value(root), "Hello");
//! ```

use std::collections::HashMap;

use string_cache::DefaultAtom;

use crate::handle::NodeId;
use crate::model::{NodeKind, QName};
use crate::tree::Tree;

#[derive(Debug, Clone)]
struct NodeRec {
    kind: NodeKind,
    name: Option<QName>,
    value: Option<String>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    // attribute and namespace chains hang off the owner element
    first_attr: Option<NodeId>,
    first_ns: Option<NodeId>,
    next_in_group: Option<NodeId>,
    subtree_end: NodeId,
}

#[derive(Debug, Clone)]
pub struct ArenaTree {
    nodes: Vec<NodeRec>,
    ids: HashMap<String, NodeId>,
    base_uri: Option<String>,
}

impl ArenaTree {
    #[inline]
    fn rec(&self, node: NodeId) -> &NodeRec {
        &self.nodes[node as usize - 1]
    }

    #[inline]
    fn rec_mut(&mut self, node: NodeId) -> &mut NodeRec {
        &mut self.nodes[node as usize - 1]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn with_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    fn push(&mut self, kind: NodeKind, name: Option<QName>, value: Option<String>, parent: Option<NodeId>) -> NodeId {
        self.nodes.push(NodeRec {
            kind,
            name,
            value,
            parent,
            first_child: None,
            next_sibling: None,
            prev_sibling: None,
            first_attr: None,
            first_ns: None,
            next_in_group: None,
            subtree_end: 0,
        });
        let id = self.nodes.len() as NodeId;
        self.rec_mut(id).subtree_end = id;
        id
    }

    fn append(&mut self, spec: NodeBuilder, parent: Option<NodeId>) -> NodeId {
        let id = self.push(spec.kind, spec.name, spec.value, parent);

        let mut prev: Option<NodeId> = None;
        for a in spec.attrs {
            let aid = self.push(NodeKind::Attribute, Some(a.name), Some(a.value.clone()), Some(id));
            if a.is_id {
                self.ids.entry(a.value).or_insert(id);
            }
            match prev {
                Some(p) => self.rec_mut(p).next_in_group = Some(aid),
                None => self.rec_mut(id).first_attr = Some(aid),
            }
            prev = Some(aid);
        }

        let mut prev: Option<NodeId> = None;
        for n in spec.namespaces {
            let name = QName { prefix: None, local: n.prefix, ns_uri: None };
            let nid = self.push(NodeKind::Namespace, Some(name), Some(n.uri), Some(id));
            match prev {
                Some(p) => self.rec_mut(p).next_in_group = Some(nid),
                None => self.rec_mut(id).first_ns = Some(nid),
            }
            prev = Some(nid);
        }

        let mut prev: Option<NodeId> = None;
        for c in spec.children {
            let cid = self.append(c, Some(id));
            match prev {
                Some(p) => {
                    self.rec_mut(p).next_sibling = Some(cid);
                    self.rec_mut(cid).prev_sibling = Some(p);
                }
                None => self.rec_mut(id).first_child = Some(cid),
            }
            prev = Some(cid);
        }

        let end = self.nodes.len() as NodeId;
        self.rec_mut(id).subtree_end = end;
        id
    }
}

impl Tree for ArenaTree {
    fn root(&self) -> NodeId {
        1
    }

    fn max_id(&self) -> NodeId {
        self.nodes.len() as NodeId
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        self.rec(node).kind
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.rec(node).parent
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.rec(node).first_child
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.rec(node).next_sibling
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.rec(node).prev_sibling
    }

    fn first_attribute(&self, node: NodeId) -> Option<NodeId> {
        self.rec(node).first_attr
    }

    fn next_attribute(&self, attr: NodeId) -> Option<NodeId> {
        let rec = self.rec(attr);
        if rec.kind == NodeKind::Attribute { rec.next_in_group } else { None }
    }

    fn first_namespace(&self, node: NodeId) -> Option<NodeId> {
        self.rec(node).first_ns
    }

    fn next_namespace(&self, ns: NodeId) -> Option<NodeId> {
        let rec = self.rec(ns);
        if rec.kind == NodeKind::Namespace { rec.next_in_group } else { None }
    }

    fn string_value(&self, node: NodeId) -> String {
        let rec = self.rec(node);
        match rec.kind {
            NodeKind::Element | NodeKind::Document => {
                let mut out = String::new();
                for id in node + 1..=rec.subtree_end {
                    let r = self.rec(id);
                    if r.kind == NodeKind::Text
                        && let Some(v) = &r.value
                    {
                        out.push_str(v);
                    }
                }
                out
            }
            _ => rec.value.clone().unwrap_or_default(),
        }
    }

    fn local_name(&self, node: NodeId) -> Option<&str> {
        self.rec(node).name.as_ref().map(|q| q.local.as_ref())
    }

    fn namespace_uri(&self, node: NodeId) -> Option<&str> {
        self.rec(node).name.as_ref().and_then(|q| q.ns_uri.as_deref())
    }

    fn prefix(&self, node: NodeId) -> Option<&str> {
        self.rec(node).name.as_ref().and_then(|q| q.prefix.as_deref())
    }

    fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }
}

#[derive(Debug, Clone)]
pub struct AttrSpec {
    name: QName,
    value: String,
    is_id: bool,
}

impl AttrSpec {
    /// Mark this attribute as an ID attribute for [`Tree::element_by_id`].
    #[must_use]
    pub fn as_id(mut self) -> Self {
        self.is_id = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct NsSpec {
    prefix: DefaultAtom,
    uri: String,
}

#[derive(Debug, Clone)]
pub struct NodeBuilder {
    kind: NodeKind,
    name: Option<QName>,
    value: Option<String>,
    attrs: Vec<AttrSpec>,
    namespaces: Vec<NsSpec>,
    children: Vec<NodeBuilder>,
}

impl NodeBuilder {
    fn new(kind: NodeKind, name: Option<QName>, value: Option<String>) -> Self {
        Self { kind, name, value, attrs: Vec::new(), namespaces: Vec::new(), children: Vec::new() }
    }

    #[must_use]
    pub fn child(mut self, child: NodeBuilder) -> Self {
        debug_assert!(!matches!(child.kind, NodeKind::Document | NodeKind::Attribute | NodeKind::Namespace));
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn children<I: IntoIterator<Item = NodeBuilder>>(mut self, it: I) -> Self {
        for c in it {
            self = self.child(c);
        }
        self
    }

    #[must_use]
    pub fn attr(mut self, attr: AttrSpec) -> Self {
        debug_assert!(self.kind == NodeKind::Element);
        self.attrs.push(attr);
        self
    }

    /// Shorthand for an `id` attribute registered in the ID index.
    #[must_use]
    pub fn id(self, value: &str) -> Self {
        self.attr(attr("id", value).as_id())
    }

    #[must_use]
    pub fn namespace(mut self, ns: NsSpec) -> Self {
        debug_assert!(self.kind == NodeKind::Element);
        self.namespaces.push(ns);
        self
    }

    /// Finalize into a tree. A non-document builder is wrapped in a document node.
    pub fn build(self) -> ArenaTree {
        let spec = if self.kind == NodeKind::Document { self } else { doc().child(self) };
        let mut tree = ArenaTree { nodes: Vec::new(), ids: HashMap::new(), base_uri: None };
        tree.append(spec, None);
        tree
    }
}

// Convenience helpers for concise test code
pub fn doc() -> NodeBuilder {
    NodeBuilder::new(NodeKind::Document, None, None)
}

pub fn elem(name: &str) -> NodeBuilder {
    NodeBuilder::new(NodeKind::Element, Some(QName::local(name)), None)
}

pub fn elem_ns(prefix: Option<&str>, local: &str, ns_uri: &str) -> NodeBuilder {
    NodeBuilder::new(NodeKind::Element, Some(QName::with_ns(prefix, local, ns_uri)), None)
}

pub fn text(v: &str) -> NodeBuilder {
    NodeBuilder::new(NodeKind::Text, None, Some(v.to_string()))
}

pub fn comment(v: &str) -> NodeBuilder {
    NodeBuilder::new(NodeKind::Comment, None, Some(v.to_string()))
}

pub fn pi(target: &str, data: &str) -> NodeBuilder {
    NodeBuilder::new(NodeKind::ProcessingInstruction, Some(QName::local(target)), Some(data.to_string()))
}

pub fn attr(name: &str, v: &str) -> AttrSpec {
    AttrSpec { name: QName::local(name), value: v.to_string(), is_id: false }
}

pub fn ns(prefix: &str, uri: &str) -> NsSpec {
    NsSpec { prefix: DefaultAtom::from(prefix), uri: uri.to_string() }
}
