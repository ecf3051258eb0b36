use platynui_xnav::arena::{ArenaTree, doc, elem, text};
use platynui_xnav::handle::{IDENT_BITS, NodeHandle, NodeId};
use platynui_xnav::iter::AxisIterator;
use platynui_xnav::model::{Axis, NodeKind};
use platynui_xnav::router::{DocumentLoader, DocumentRouter};
use platynui_xnav::tree::Tree;
use platynui_xnav::Error;
use rstest::{fixture, rstest};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

// doc(1) -> r(2) -> "t"(3)
fn three_nodes(name: &str) -> Arc<ArenaTree> {
    Arc::new(doc().child(elem(name).child(text("t"))).build())
}

#[fixture]
fn router() -> Arc<DocumentRouter> {
    Arc::new(DocumentRouter::new())
}

#[rstest]
fn masks_are_assigned_in_registration_order(router: Arc<DocumentRouter>) {
    assert_eq!(router.register(three_nodes("a")).unwrap(), 0);
    assert_eq!(router.register(three_nodes("b")).unwrap(), 1);
    assert_eq!(router.mask_count(), 2);
}

#[rstest]
fn cross_document_order_compares_masks_first(router: Arc<DocumentRouter>) {
    router.register(three_nodes("a")).unwrap();
    router.register(three_nodes("b")).unwrap();
    let doc1_first = NodeHandle::new(1, 1);
    let doc0_last = NodeHandle::new(0, 3);
    assert!(!router.less_than(doc1_first, doc0_last));
    assert!(router.less_than(doc0_last, doc1_first));
    assert!(router.less_than(NodeHandle::new(0, 1), doc0_last));
}

#[rstest]
fn same_uri_registers_once(router: Arc<DocumentRouter>) {
    let first = router.register_document("http://example.com/data/doc.xml", three_nodes("a")).unwrap();
    let again = router.register_document("http://example.com/data/../data/doc.xml", three_nodes("b")).unwrap();
    assert_eq!(first, again);
    assert_eq!(router.mask_count(), 1);
    assert_eq!(router.mask_for_uri("http://example.com/data/doc.xml"), Some(first));
    let root = router.root_handle(first).unwrap();
    let r = router.first_child(root).unwrap();
    assert_eq!(router.local_name(r).as_deref(), Some("a"));
}

#[rstest]
fn retagging_a_local_identity_round_trips(router: Arc<DocumentRouter>) {
    router.register(three_nodes("a")).unwrap();
    let mask = router.register(three_nodes("b")).unwrap();
    for ident in 1..=3 {
        let h = NodeHandle::new(mask, ident);
        let routed = router.resolve(h);
        assert_eq!(DocumentRouter::retag(routed.base, routed.local), h);
    }
}

#[rstest]
fn unregistered_mask_is_reported_by_checked_lookup(router: Arc<DocumentRouter>) {
    router.register(three_nodes("a")).unwrap();
    let err = router.try_tree(NodeHandle::new(7, 1)).unwrap_err();
    assert!(matches!(err, Error::UnregisteredMask { mask: 7 }));
}

#[rstest]
#[should_panic(expected = "document mask 7 is not registered")]
fn unregistered_mask_panics_on_unchecked_lookup(router: Arc<DocumentRouter>) {
    router.register(three_nodes("a")).unwrap();
    let _ = router.tree(NodeHandle::new(7, 1));
}

#[rstest]
fn address_space_exhaustion_is_an_error(router: Arc<DocumentRouter>) {
    for _ in 0..256 {
        router.register(three_nodes("a")).unwrap();
    }
    let err = router.register(three_nodes("overflow")).unwrap_err();
    assert!(matches!(err, Error::AddressSpaceExhausted { requested: 1, available: 0 }));
}

/// doc(1) with two element children: `a`(2) and `b` whose identity needs a second mask.
#[derive(Debug)]
struct WideTree;

const WIDE: NodeId = (1 << IDENT_BITS) + 1;

impl Tree for WideTree {
    fn root(&self) -> NodeId {
        1
    }
    fn max_id(&self) -> NodeId {
        WIDE
    }
    fn kind(&self, node: NodeId) -> NodeKind {
        if node == 1 { NodeKind::Document } else { NodeKind::Element }
    }
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        (node != 1).then_some(1)
    }
    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        (node == 1).then_some(2)
    }
    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        (node == 2).then_some(WIDE)
    }
    fn first_attribute(&self, _node: NodeId) -> Option<NodeId> {
        None
    }
    fn next_attribute(&self, _attr: NodeId) -> Option<NodeId> {
        None
    }
    fn string_value(&self, _node: NodeId) -> String {
        String::new()
    }
    fn local_name(&self, node: NodeId) -> Option<&str> {
        match node {
            2 => Some("a"),
            WIDE => Some("b"),
            _ => None,
        }
    }
    fn namespace_uri(&self, _node: NodeId) -> Option<&str> {
        None
    }
    fn prefix(&self, _node: NodeId) -> Option<&str> {
        None
    }
}

#[rstest]
fn sub_ranges_alias_one_tree(router: Arc<DocumentRouter>) {
    let base = router.register(Arc::new(WideTree)).unwrap();
    assert_eq!(base, 0);
    assert_eq!(router.mask_count(), 2);
    assert_eq!(router.register(three_nodes("next")).unwrap(), 2);

    let root = router.root_handle(0).unwrap();
    let mut children = router.axis_iterator(Axis::Child);
    children.set_start_node(root);
    let nodes = children.drain_nodes();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1].mask(), 1);
    assert_eq!(router.local(nodes[1]), WIDE);
    assert_eq!(router.local_name(nodes[1]).as_deref(), Some("b"));
    assert!(router.less_than(nodes[0], nodes[1]));
    assert_eq!(router.parent(nodes[1]), Some(root));
    assert!(Arc::ptr_eq(&router.tree(nodes[0]), &router.tree(nodes[1])));
}

#[derive(Default)]
struct CountingLoader {
    loads: AtomicUsize,
}

impl DocumentLoader for CountingLoader {
    fn load(&self, uri: &Url) -> platynui_xnav::Result<Arc<dyn Tree>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if uri.path().ends_with("broken.xml") {
            return Err(Error::InvalidDocument("unexpected end of input".into()));
        }
        let name = uri.path_segments().and_then(|mut s| s.next_back()).unwrap_or("doc").to_string();
        Ok(three_nodes(&name))
    }
}

#[fixture]
fn loader() -> Arc<CountingLoader> {
    Arc::new(CountingLoader::default())
}

fn loading_router(loader: &Arc<CountingLoader>) -> DocumentRouter {
    DocumentRouter::builder().with_loader(loader.clone()).with_base_uri("http://example.com/base/").build()
}

#[rstest]
fn document_loads_each_uri_once(loader: Arc<CountingLoader>) {
    let router = loading_router(&loader);
    let first = router.document("a.xml", None).unwrap().unwrap();
    let again = router.document("http://example.com/base/a.xml", None).unwrap().unwrap();
    assert_eq!(first, again);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    assert_eq!(router.kind(first), NodeKind::Document);
    let r = router.first_child(first).unwrap();
    assert_eq!(router.local_name(r).as_deref(), Some("a.xml"));
}

#[rstest]
fn document_resolves_against_explicit_base(loader: Arc<CountingLoader>) {
    let router = loading_router(&loader);
    let h = router.document("c.xml", Some("http://other.org/dir/")).unwrap().unwrap();
    let mask = router.mask_for_uri("http://other.org/dir/c.xml").unwrap();
    assert_eq!(h.mask(), mask);
}

#[rstest]
#[case("")]
#[case("   ")]
fn empty_uri_is_an_empty_result(loader: Arc<CountingLoader>, #[case] uri: &str) {
    let router = loading_router(&loader);
    assert_eq!(router.document(uri, None).unwrap(), None);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
}

#[rstest]
fn unresolvable_uri_is_an_empty_result(router: Arc<DocumentRouter>) {
    assert_eq!(router.document("no scheme here", None).unwrap(), None);
}

#[rstest]
fn load_failure_is_a_resolution_error(loader: Arc<CountingLoader>) {
    let router = loading_router(&loader);
    let err = router.document("broken.xml", None).unwrap_err();
    assert!(err.is_resolution());
    assert!(std::error::Error::source(&err).is_some());
    assert_eq!(router.mask_count(), 0);
}

#[rstest]
fn missing_loader_is_a_resolution_error(router: Arc<DocumentRouter>) {
    let err = router.document("http://example.com/a.xml", None).unwrap_err();
    assert!(err.is_resolution());
}

#[rstest]
fn document_iterator_is_ordered_and_distinct(loader: Arc<CountingLoader>) {
    let router = loading_router(&loader);
    let mut it = router.document_iterator(&["b.xml", "a.xml", "b.xml", ""], None).unwrap();
    let roots = it.drain_nodes();
    assert_eq!(roots.len(), 2);
    assert!(router.less_than(roots[0], roots[1]));
    assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
}

#[rstest]
fn id_lookup_is_ordered_and_start_independent(router: Arc<DocumentRouter>) {
    let tree = doc().child(elem("root").child(elem("x").id("a1")).child(elem("y").id("b2"))).build();
    let mask = router.register(Arc::new(tree)).unwrap();
    let root = router.root_handle(mask).unwrap();
    let mut found = router.id_lookup(root, "b2  a1 missing b2");
    assert!(found.is_index_lookup());
    let nodes = found.drain_nodes();
    let names: Vec<_> = nodes.iter().filter_map(|n| router.local_name(*n)).collect();
    assert_eq!(names, ["x", "y"]);
}

#[test]
fn names_and_base_uri_route_to_the_owning_tree() {
    use platynui_xnav::arena::{elem_ns, pi};

    let tree = doc()
        .child(elem_ns(Some("h"), "body", "http://www.w3.org/1999/xhtml").child(pi("render", "fast")))
        .build()
        .with_base_uri("file:///data/page.xhtml");
    assert_eq!(tree.len(), 3);
    assert!(!tree.is_empty());
    let router = Arc::new(DocumentRouter::new());
    router.register(three_nodes("first")).unwrap();
    let mask = router.register(Arc::new(tree)).unwrap();
    let root = router.root_handle(mask).unwrap();
    let body = router.first_child(root).unwrap();

    let name = router.name(body).unwrap();
    assert_eq!(&*name.local, "body");
    assert_eq!(router.prefix(body).as_deref(), Some("h"));
    assert_eq!(router.namespace_uri(body).as_deref(), Some("http://www.w3.org/1999/xhtml"));
    assert_eq!(router.base_uri(body).as_deref(), Some("file:///data/page.xhtml"));
    assert_eq!(router.base_uri(router.root_handle(0).unwrap()), None);

    let target = router.first_child(body).unwrap();
    assert_eq!(router.kind(target), NodeKind::ProcessingInstruction);
    assert_eq!(router.local_name(target).as_deref(), Some("render"));
    assert_eq!(router.string_value(target), "fast");
    assert!(router.name(router.first_child(router.root_handle(0).unwrap()).unwrap()).is_some());
}
