use platynui_xnav::arena::{attr, comment, doc, elem, ns, text};
use platynui_xnav::handle::NodeHandle;
use platynui_xnav::iter::{AxisIterator, Nodes};
use platynui_xnav::model::{Axis, NodeKind, NodeTest};
use platynui_xnav::router::DocumentRouter;
use rstest::{fixture, rstest};
use std::sync::Arc;

// <root><A k="v"><B>one</B><B>two</B><C>three</C></A><D><B>four</B></D><!--end--></root>
fn sample() -> (Arc<DocumentRouter>, NodeHandle) {
    let tree = doc()
        .child(
            elem("root")
                .child(
                    elem("A")
                        .attr(attr("k", "v"))
                        .child(elem("B").child(text("one")))
                        .child(elem("B").child(text("two")))
                        .child(elem("C").child(text("three"))),
                )
                .child(elem("D").child(elem("B").child(text("four"))))
                .child(comment("end")),
        )
        .build();
    let router = Arc::new(DocumentRouter::new());
    let mask = router.register(Arc::new(tree)).unwrap();
    let root = router.root_handle(mask).unwrap();
    (router, root)
}

#[fixture]
fn fx() -> (Arc<DocumentRouter>, NodeHandle) {
    sample()
}

fn label(router: &DocumentRouter, n: NodeHandle) -> String {
    match router.kind(n) {
        NodeKind::Document => "/".to_string(),
        NodeKind::Text => format!("'{}'", router.string_value(n)),
        NodeKind::Comment => "#comment".to_string(),
        NodeKind::Attribute => format!("@{}", router.local_name(n).unwrap_or_default()),
        _ => router.local_name(n).unwrap_or_default(),
    }
}

fn run(router: &Arc<DocumentRouter>, axis: Axis, test: Option<NodeTest>, from: NodeHandle) -> Vec<String> {
    let mut it = match test {
        Some(t) => router.typed_axis_iterator(axis, t),
        None => router.axis_iterator(axis),
    };
    it.set_start_node(from);
    it.drain_nodes().into_iter().map(|n| label(router, n)).collect()
}

/// First descendant element named `name`, at `index` among those.
fn find(router: &Arc<DocumentRouter>, from: NodeHandle, name: &str, index: usize) -> NodeHandle {
    let mut it = router.typed_axis_iterator(Axis::Descendant, NodeTest::name(name));
    it.set_start_node(from);
    it.drain_nodes()[index]
}

#[rstest]
fn child_axis_yields_children_in_order(fx: (Arc<DocumentRouter>, NodeHandle)) {
    let (router, root) = fx;
    let a = find(&router, root, "A", 0);
    assert_eq!(run(&router, Axis::Child, None, a), ["B", "B", "C"]);
}

#[rstest]
#[case(Axis::Descendant, vec!["A", "B", "B", "C", "D", "B"])]
#[case(Axis::DescendantOrSelf, vec!["root", "A", "B", "B", "C", "D", "B"])]
#[case(Axis::Child, vec!["A", "D"])]
#[case(Axis::SelfAxis, vec!["root"])]
#[case(Axis::Parent, vec![])]
fn element_axes_from_root_element(
    fx: (Arc<DocumentRouter>, NodeHandle),
    #[case] axis: Axis,
    #[case] expected: Vec<&str>,
) {
    let (router, root) = fx;
    let top = find(&router, root, "root", 0);
    assert_eq!(run(&router, axis, Some(NodeTest::Kind(NodeKind::Element)), top), expected);
}

#[rstest]
fn descendant_includes_text_and_comments(fx: (Arc<DocumentRouter>, NodeHandle)) {
    let (router, root) = fx;
    let d = find(&router, root, "D", 0);
    assert_eq!(run(&router, Axis::Descendant, None, d), ["B", "'four'"]);
    let top = find(&router, root, "root", 0);
    assert_eq!(run(&router, Axis::Child, Some(NodeTest::Kind(NodeKind::Comment)), top), ["#comment"]);
}

#[rstest]
fn ancestor_axes_are_reverse(fx: (Arc<DocumentRouter>, NodeHandle)) {
    let (router, root) = fx;
    let b = find(&router, root, "B", 2);
    assert_eq!(run(&router, Axis::Ancestor, None, b), ["D", "root", "/"]);
    assert_eq!(run(&router, Axis::AncestorOrSelf, None, b), ["B", "D", "root", "/"]);
    assert!(router.axis_iterator(Axis::Ancestor).is_reverse());
    assert!(router.axis_iterator(Axis::PrecedingSibling).is_reverse());
    assert!(!router.axis_iterator(Axis::Following).is_reverse());
}

#[rstest]
fn preceding_skips_ancestors_and_attributes(fx: (Arc<DocumentRouter>, NodeHandle)) {
    let (router, root) = fx;
    let d = find(&router, root, "D", 0);
    assert_eq!(run(&router, Axis::Preceding, None, d), ["'three'", "C", "'two'", "B", "'one'", "B", "A"]);
}

#[rstest]
fn following_skips_descendants(fx: (Arc<DocumentRouter>, NodeHandle)) {
    let (router, root) = fx;
    let b = find(&router, root, "B", 0);
    let elements = Some(NodeTest::Kind(NodeKind::Element));
    assert_eq!(run(&router, Axis::Following, elements, b), ["B", "C", "D", "B"]);
}

#[rstest]
fn following_from_attribute_starts_at_owner_content(fx: (Arc<DocumentRouter>, NodeHandle)) {
    let (router, root) = fx;
    let a = find(&router, root, "A", 0);
    let mut attrs = router.axis_iterator(Axis::Attribute);
    attrs.set_start_node(a);
    let k = attrs.next_node().unwrap();
    assert_eq!(label(&router, k), "@k");
    assert_eq!(run(&router, Axis::Following, Some(NodeTest::name("B")), k), ["B", "B", "B"]);
    assert_eq!(run(&router, Axis::Parent, None, k), ["A"]);
    assert!(run(&router, Axis::FollowingSibling, None, k).is_empty());
}

#[rstest]
fn sibling_axes(fx: (Arc<DocumentRouter>, NodeHandle)) {
    let (router, root) = fx;
    let c = find(&router, root, "C", 0);
    assert_eq!(run(&router, Axis::PrecedingSibling, None, c), ["B", "B"]);
    let first_b = find(&router, root, "B", 0);
    assert_eq!(run(&router, Axis::FollowingSibling, None, first_b), ["B", "C"]);
}

#[rstest]
fn attribute_axis_with_name_test(fx: (Arc<DocumentRouter>, NodeHandle)) {
    let (router, root) = fx;
    let a = find(&router, root, "A", 0);
    assert_eq!(run(&router, Axis::Attribute, None, a), ["@k"]);
    assert_eq!(run(&router, Axis::Attribute, Some(NodeTest::name("k")), a), ["@k"]);
    assert!(run(&router, Axis::Attribute, Some(NodeTest::name("zz")), a).is_empty());
}

#[rstest]
fn root_axis_and_whole_document_walk(fx: (Arc<DocumentRouter>, NodeHandle)) {
    let (router, root) = fx;
    let b = find(&router, root, "B", 1);
    assert_eq!(run(&router, Axis::Root, None, b), ["/"]);
    let all = run(&router, Axis::DescendantOrSelfFromRoot, Some(NodeTest::name("B")), b);
    assert_eq!(all, ["B", "B", "B"]);
}

#[rstest]
fn include_self_switches_to_or_self_axis(fx: (Arc<DocumentRouter>, NodeHandle)) {
    let (router, root) = fx;
    let d = find(&router, root, "D", 0);
    let mut it = router.axis_iterator(Axis::Descendant);
    it.include_self();
    it.set_start_node(d);
    assert_eq!(it.axis(), Some(Axis::DescendantOrSelf));
    assert_eq!(it.drain_nodes().len(), 3);
}

#[test]
fn namespace_axis_hides_overridden_prefixes() {
    let tree = doc()
        .child(
            elem("outer")
                .namespace(ns("p", "urn:p"))
                .namespace(ns("q", "urn:q1"))
                .child(elem("inner").namespace(ns("q", "urn:q2"))),
        )
        .build();
    let router = Arc::new(DocumentRouter::new());
    let mask = router.register(Arc::new(tree)).unwrap();
    let inner = find(&router, router.root_handle(mask).unwrap(), "inner", 0);
    let mut it = router.axis_iterator(Axis::Namespace);
    it.set_start_node(inner);
    let found: Vec<_> =
        it.drain_nodes().into_iter().map(|n| (router.local_name(n).unwrap(), router.string_value(n))).collect();
    assert_eq!(found, [("q".to_string(), "urn:q2".to_string()), ("p".to_string(), "urn:p".to_string())]);
}

#[test]
fn xml_namespace_declared_on_the_outermost_element_is_in_scope_everywhere() {
    let tree = doc()
        .child(
            elem("outer")
                .namespace(ns("xml", "http://www.w3.org/XML/1998/namespace"))
                .child(elem("mid").child(elem("inner").namespace(ns("p", "urn:p")))),
        )
        .build();
    let router = Arc::new(DocumentRouter::new());
    let mask = router.register(Arc::new(tree)).unwrap();
    let inner = find(&router, router.root_handle(mask).unwrap(), "inner", 0);
    let mut it = router.axis_iterator(Axis::Namespace);
    it.set_start_node(inner);
    let prefixes: Vec<_> = it.drain_nodes().into_iter().map(|n| router.local_name(n).unwrap()).collect();
    assert_eq!(prefixes, ["p", "xml"]);
}

#[rstest]
fn clone_is_a_snapshot_that_ignores_rebinding(fx: (Arc<DocumentRouter>, NodeHandle)) {
    let (router, root) = fx;
    let mut it = router.axis_iterator(Axis::Descendant);
    it.set_start_node(root);
    it.next_node();
    it.next_node();

    let mut snapshot = it.clone_iterator();
    assert!(!snapshot.is_restartable());
    let d = find(&router, root, "D", 0);
    snapshot.set_start_node(d);
    assert_eq!(snapshot.position(), 2);

    let from_clone = snapshot.drain_nodes();
    let from_original = it.drain_nodes();
    assert_eq!(from_clone, from_original);
    assert!(!from_original.is_empty());
}

#[rstest]
fn last_does_not_move_the_cursor(fx: (Arc<DocumentRouter>, NodeHandle)) {
    let (router, root) = fx;
    let a = find(&router, root, "A", 0);
    let mut it = router.axis_iterator(Axis::Child);
    it.set_start_node(a);
    let first = it.next_node().unwrap();
    assert_eq!(it.last(), 3);
    assert_eq!(it.position(), 1);
    let second = it.next_node().unwrap();
    assert_ne!(first, second);
    assert_eq!(it.position(), 2);
}

#[rstest]
fn mark_and_resume(fx: (Arc<DocumentRouter>, NodeHandle)) {
    let (router, root) = fx;
    let mut it = router.axis_iterator(Axis::Descendant);
    it.set_start_node(root);
    it.next_node();
    it.set_mark();
    let after_mark: Vec<_> = (0..3).filter_map(|_| it.next_node()).collect();
    it.goto_mark();
    assert_eq!(it.position(), 1);
    let replay: Vec<_> = (0..3).filter_map(|_| it.next_node()).collect();
    assert_eq!(after_mark, replay);
}

#[rstest]
fn reset_replays_from_the_start(fx: (Arc<DocumentRouter>, NodeHandle)) {
    let (router, root) = fx;
    let mut it = router.typed_axis_iterator(Axis::Descendant, NodeTest::name("B"));
    it.set_start_node(root);
    let once = it.drain_nodes();
    it.reset();
    assert_eq!(it.position(), 0);
    assert_eq!(it.drain_nodes(), once);
    assert_eq!(it.node_at(2), Some(once[1]));
    assert_eq!(it.node_at(0), None);
}

#[test]
fn one_iterator_follows_its_start_node_across_documents() {
    let router = Arc::new(DocumentRouter::new());
    let m0 = router.register(Arc::new(doc().child(elem("first").child(elem("x"))).build())).unwrap();
    let m1 = router.register(Arc::new(doc().child(elem("second").child(elem("y")).child(elem("z"))).build())).unwrap();
    let mut it = router.axis_iterator(Axis::Descendant);

    it.set_start_node(router.root_handle(m0).unwrap());
    let first: Vec<_> = it.drain_nodes().into_iter().map(|n| label(&router, n)).collect();
    assert_eq!(first, ["first", "x"]);

    it.set_start_node(router.root_handle(m1).unwrap());
    let nodes = it.drain_nodes();
    assert!(nodes.iter().all(|n| n.mask() == m1));
    let second: Vec<_> = nodes.into_iter().map(|n| label(&router, n)).collect();
    assert_eq!(second, ["second", "y", "z"]);
}

#[rstest]
fn nodes_adapter_feeds_std_iterators(fx: (Arc<DocumentRouter>, NodeHandle)) {
    let (router, root) = fx;
    let mut it = router.typed_axis_iterator(Axis::Descendant, NodeTest::name("B"));
    it.set_start_node(root);
    let texts: Vec<String> = Nodes::new(it.as_mut()).map(|n| router.string_value(n)).collect();
    assert_eq!(texts, ["one", "two", "four"]);
    assert_eq!(it.position(), 3);
}
