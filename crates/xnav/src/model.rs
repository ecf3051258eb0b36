use core::fmt;

use string_cache::DefaultAtom;

use crate::handle::NodeId;
use crate::tree::Tree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
}

impl NodeKind {
    /// Attributes and namespace nodes hang off an element but are not its children.
    #[inline]
    pub fn is_attr_or_namespace(self) -> bool {
        matches!(self, NodeKind::Attribute | NodeKind::Namespace)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<DefaultAtom>,
    pub local: DefaultAtom,
    pub ns_uri: Option<DefaultAtom>,
}

impl QName {
    pub fn local(local: &str) -> Self {
        QName { prefix: None, local: DefaultAtom::from(local), ns_uri: None }
    }

    pub fn with_ns(prefix: Option<&str>, local: &str, ns_uri: &str) -> Self {
        QName {
            prefix: prefix.map(DefaultAtom::from),
            local: DefaultAtom::from(local),
            ns_uri: Some(DefaultAtom::from(ns_uri)),
        }
    }
}

/// Traversal direction of a location step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Attribute,
    Namespace,
    SelfAxis,
    /// The document node of the context node's tree.
    Root,
    /// Every node of the context node's tree, document node included (`//`).
    DescendantOrSelfFromRoot,
}

impl Axis {
    /// Reverse axes yield nodes in reverse document order.
    pub fn is_reverse(self) -> bool {
        matches!(self, Axis::Ancestor | Axis::AncestorOrSelf | Axis::Preceding | Axis::PrecedingSibling)
    }

    /// Kind matched by a bare name test or `*` on this axis.
    pub fn principal_kind(self) -> NodeKind {
        match self {
            Axis::Attribute => NodeKind::Attribute,
            Axis::Namespace => NodeKind::Namespace,
            _ => NodeKind::Element,
        }
    }

    /// The `-or-self` counterpart, if the axis has one.
    pub fn or_self(self) -> Self {
        match self {
            Axis::Descendant => Axis::DescendantOrSelf,
            Axis::Ancestor => Axis::AncestorOrSelf,
            other => other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::Parent => "parent",
            Axis::Ancestor => "ancestor",
            Axis::AncestorOrSelf => "ancestor-or-self",
            Axis::FollowingSibling => "following-sibling",
            Axis::PrecedingSibling => "preceding-sibling",
            Axis::Following => "following",
            Axis::Preceding => "preceding",
            Axis::Attribute => "attribute",
            Axis::Namespace => "namespace",
            Axis::SelfAxis => "self",
            Axis::Root => "root",
            Axis::DescendantOrSelfFromRoot => "descendant-or-self-from-root",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Node test applied by a primitive axis cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeTest {
    /// `node()`
    AnyKind,
    /// `text()`, `comment()`, `element()`, `attribute()`, `document-node()`
    Kind(NodeKind),
    /// `processing-instruction()` with optional target
    ProcessingInstruction(Option<DefaultAtom>),
    /// `*`: any node of the axis' principal kind
    Principal,
    /// Exact expanded name of the principal kind
    Name { ns_uri: Option<DefaultAtom>, local: DefaultAtom },
    /// `prefix:*`
    NsWildcard(DefaultAtom),
    /// `*:local`
    LocalWildcard(DefaultAtom),
}

impl NodeTest {
    pub fn name(local: &str) -> Self {
        NodeTest::Name { ns_uri: None, local: DefaultAtom::from(local) }
    }

    pub fn ns_name(ns_uri: &str, local: &str) -> Self {
        NodeTest::Name { ns_uri: Some(DefaultAtom::from(ns_uri)), local: DefaultAtom::from(local) }
    }

    pub fn matches(&self, tree: &dyn Tree, node: NodeId, principal: NodeKind) -> bool {
        let kind = tree.kind(node);
        match self {
            NodeTest::AnyKind => true,
            NodeTest::Kind(k) => kind == *k,
            NodeTest::ProcessingInstruction(target) => {
                kind == NodeKind::ProcessingInstruction
                    && target.as_ref().is_none_or(|t| tree.local_name(node) == Some(t.as_ref()))
            }
            NodeTest::Principal => kind == principal,
            NodeTest::Name { ns_uri, local } => {
                kind == principal
                    && tree.local_name(node) == Some(local.as_ref())
                    && tree.namespace_uri(node) == ns_uri.as_deref()
            }
            NodeTest::NsWildcard(ns) => kind == principal && tree.namespace_uri(node) == Some(ns.as_ref()),
            NodeTest::LocalWildcard(local) => kind == principal && tree.local_name(node) == Some(local.as_ref()),
        }
    }
}
