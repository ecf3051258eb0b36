//! Document router: maps document masks to trees.
//!
//! The router owns an append-only table indexed by mask. A tree whose
//! identities do not fit into 24 bits occupies several consecutive masks that
//! all alias the same slot base. A URI index makes `document()` idempotent:
//! each absolute URI is loaded at most once per router.

use core::cmp::Ordering;
use core::fmt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use itertools::Itertools;
use smallvec::SmallVec;
use string_cache::DefaultAtom;
use url::Url;

use crate::axes::RoutedAxisIterator;
use crate::error::{Error, ErrorSource, Result};
use crate::handle::{DocMask, IDENT_BITS, IDENT_MASK, MAX_MASKS, NodeHandle, NodeId};
use crate::iter::{ArrayIterator, AxisIterator, EmptyIterator, IndexLookupIterator};
use crate::model::{Axis, NodeKind, NodeTest, QName};
use crate::tree::Tree;

/// Loads documents for `document()`. Caching is the router's job; the loader
/// is called at most once per absolute URI.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, uri: &Url) -> Result<Arc<dyn Tree>>;
}

#[derive(Clone)]
struct Slot {
    tree: Arc<dyn Tree>,
    base: DocMask,
}

/// A handle resolved against the router table.
#[derive(Clone)]
pub struct Routed {
    pub tree: Arc<dyn Tree>,
    /// First mask of the owning tree.
    pub base: DocMask,
    /// Tree-local identity.
    pub local: NodeId,
}

impl fmt::Debug for Routed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routed").field("base", &self.base).field("local", &self.local).finish_non_exhaustive()
    }
}

pub struct DocumentRouter {
    slots: RwLock<Vec<Slot>>,
    by_uri: RwLock<HashMap<String, DocMask>>,
    // serializes check-load-insert so each URI is loaded once
    load_guard: Mutex<()>,
    loader: Option<Arc<dyn DocumentLoader>>,
    base_uri: Option<Url>,
}

impl fmt::Debug for DocumentRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentRouter")
            .field("masks", &self.mask_count())
            .field("uris", &self.by_uri.read().unwrap_or_else(PoisonError::into_inner).len())
            .field("base_uri", &self.base_uri.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

impl Default for DocumentRouter {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Default)]
pub struct DocumentRouterBuilder {
    loader: Option<Arc<dyn DocumentLoader>>,
    base_uri: Option<Url>,
}

impl DocumentRouterBuilder {
    #[must_use]
    pub fn with_loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Base URI used when `document()` is called without one. Invalid URIs are ignored.
    #[must_use]
    pub fn with_base_uri(mut self, uri: &str) -> Self {
        self.base_uri = Url::parse(uri).ok();
        self
    }

    pub fn build(self) -> DocumentRouter {
        DocumentRouter {
            slots: RwLock::new(Vec::new()),
            by_uri: RwLock::new(HashMap::new()),
            load_guard: Mutex::new(()),
            loader: self.loader,
            base_uri: self.base_uri,
        }
    }
}

impl DocumentRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> DocumentRouterBuilder {
        DocumentRouterBuilder::default()
    }

    /// Number of masks in use (sub-ranges counted individually).
    pub fn mask_count(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Register a tree and return its (first) mask. The first tree registered gets mask `0`.
    pub fn register(&self, tree: Arc<dyn Tree>) -> Result<DocMask> {
        let blocks = tree.id_blocks();
        if blocks == 0 {
            return Err(Error::InvalidDocument("tree reports zero identity blocks".into()));
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let available = MAX_MASKS - slots.len();
        if blocks > available {
            return Err(Error::AddressSpaceExhausted { requested: blocks, available });
        }
        let base = DocMask::try_from(slots.len())
            .map_err(|_| Error::AddressSpaceExhausted { requested: blocks, available })?;
        slots.extend(std::iter::repeat_n(Slot { tree, base }, blocks));
        tracing::debug!(mask = base, sub_ranges = blocks, "registered document");
        Ok(base)
    }

    /// Register a tree under a URI. A URI seen before returns its existing mask
    /// and the new tree is dropped.
    pub fn register_document(&self, uri: &str, tree: Arc<dyn Tree>) -> Result<DocMask> {
        let key = normalize_uri(uri);
        let _guard = self.load_guard.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mask) = self.mask_for_uri(&key) {
            tracing::trace!(uri = %key, mask, "document already registered");
            return Ok(mask);
        }
        let mask = self.register(tree)?;
        self.by_uri.write().unwrap_or_else(PoisonError::into_inner).insert(key.clone(), mask);
        tracing::debug!(uri = %key, mask, "bound uri to document");
        Ok(mask)
    }

    pub fn mask_for_uri(&self, uri: &str) -> Option<DocMask> {
        let key = normalize_uri(uri);
        self.by_uri.read().unwrap_or_else(PoisonError::into_inner).get(&key).copied()
    }

    fn slot(&self, mask: DocMask) -> Option<Slot> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).get(usize::from(mask)).cloned()
    }

    /// Checked resolution of a handle.
    pub fn try_resolve(&self, handle: NodeHandle) -> Result<Routed> {
        let mask = handle.mask();
        let slot = self.slot(mask).ok_or(Error::UnregisteredMask { mask })?;
        let local = (u32::from(mask - slot.base) << IDENT_BITS) | handle.ident();
        Ok(Routed { tree: slot.tree, base: slot.base, local })
    }

    /// Resolve a handle whose mask must be registered.
    ///
    /// # Panics
    /// Panics when the mask was never registered; handles only come from trees
    /// registered with this router.
    pub fn resolve(&self, handle: NodeHandle) -> Routed {
        match self.try_resolve(handle) {
            Ok(r) => r,
            Err(err) => panic!("{err} (handle {handle:?})"),
        }
    }

    pub fn try_tree(&self, handle: NodeHandle) -> Result<Arc<dyn Tree>> {
        self.try_resolve(handle).map(|r| r.tree)
    }

    /// # Panics
    /// Panics when the handle's mask was never registered.
    pub fn tree(&self, handle: NodeHandle) -> Arc<dyn Tree> {
        self.resolve(handle).tree
    }

    /// Tree-local identity of a handle.
    pub fn local(&self, handle: NodeHandle) -> NodeId {
        self.resolve(handle).local
    }

    /// Handle for a tree-local identity of the tree whose first mask is `base`.
    #[inline]
    pub fn retag(base: DocMask, local: NodeId) -> NodeHandle {
        // sub-range offsets never exceed the blocks registered for the tree
        let offset = (local >> IDENT_BITS) as DocMask;
        NodeHandle::new(base + offset, local & IDENT_MASK)
    }

    /// Handle of a tree's document node.
    pub fn root_handle(&self, mask: DocMask) -> Option<NodeHandle> {
        let slot = self.slot(mask)?;
        Some(Self::retag(slot.base, slot.tree.root()))
    }

    /// Document order across all registered trees: masks first, then tree order.
    pub fn compare(&self, a: NodeHandle, b: NodeHandle) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let ra = self.resolve(a);
        let rb = self.resolve(b);
        if ra.base != rb.base {
            return a.mask().cmp(&b.mask());
        }
        if ra.tree.less_than(ra.local, rb.local) { Ordering::Less } else { Ordering::Greater }
    }

    pub fn less_than(&self, a: NodeHandle, b: NodeHandle) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    // --- routed navigation -------------------------------------------------

    fn map_local(&self, handle: NodeHandle, f: impl FnOnce(&dyn Tree, NodeId) -> Option<NodeId>) -> Option<NodeHandle> {
        let r = self.resolve(handle);
        f(r.tree.as_ref(), r.local).map(|n| Self::retag(r.base, n))
    }

    pub fn kind(&self, handle: NodeHandle) -> NodeKind {
        let r = self.resolve(handle);
        r.tree.kind(r.local)
    }

    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.map_local(handle, |t, n| t.parent(n))
    }

    pub fn first_child(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.map_local(handle, |t, n| t.first_child(n))
    }

    pub fn next_sibling(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.map_local(handle, |t, n| t.next_sibling(n))
    }

    pub fn previous_sibling(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.map_local(handle, |t, n| t.previous_sibling(n))
    }

    pub fn last_child(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.map_local(handle, |t, n| t.last_child(n))
    }

    pub fn first_attribute(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.map_local(handle, |t, n| t.first_attribute(n))
    }

    pub fn next_attribute(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.map_local(handle, |t, n| t.next_attribute(n))
    }

    /// Document node of the handle's tree.
    pub fn document_of(&self, handle: NodeHandle) -> NodeHandle {
        let r = self.resolve(handle);
        Self::retag(r.base, r.tree.root())
    }

    /// Base URI of the handle's document, if the tree records one.
    pub fn base_uri(&self, handle: NodeHandle) -> Option<String> {
        self.resolve(handle).tree.base_uri().map(str::to_owned)
    }

    pub fn string_value(&self, handle: NodeHandle) -> String {
        let r = self.resolve(handle);
        r.tree.string_value(r.local)
    }

    pub fn local_name(&self, handle: NodeHandle) -> Option<String> {
        let r = self.resolve(handle);
        r.tree.local_name(r.local).map(str::to_owned)
    }

    pub fn namespace_uri(&self, handle: NodeHandle) -> Option<String> {
        let r = self.resolve(handle);
        r.tree.namespace_uri(r.local).map(str::to_owned)
    }

    pub fn prefix(&self, handle: NodeHandle) -> Option<String> {
        let r = self.resolve(handle);
        r.tree.prefix(r.local).map(str::to_owned)
    }

    pub fn name(&self, handle: NodeHandle) -> Option<QName> {
        let r = self.resolve(handle);
        let local = r.tree.local_name(r.local)?;
        Some(QName {
            prefix: r.tree.prefix(r.local).map(DefaultAtom::from),
            local: DefaultAtom::from(local),
            ns_uri: r.tree.namespace_uri(r.local).map(DefaultAtom::from),
        })
    }

    /// Same kind and same expanded name.
    pub fn same_kind_and_name(&self, a: NodeHandle, b: NodeHandle) -> bool {
        let ra = self.resolve(a);
        let rb = self.resolve(b);
        let (ta, tb) = (ra.tree.as_ref(), rb.tree.as_ref());
        ta.kind(ra.local) == tb.kind(rb.local)
            && ta.local_name(ra.local) == tb.local_name(rb.local)
            && ta.namespace_uri(ra.local) == tb.namespace_uri(rb.local)
    }

    // --- iterator factories ------------------------------------------------

    /// Cursor over `axis` from whichever document the start node belongs to.
    pub fn axis_iterator(self: &Arc<Self>, axis: Axis) -> Box<dyn AxisIterator> {
        Box::new(RoutedAxisIterator::new(Arc::clone(self), axis, None))
    }

    /// As [`Self::axis_iterator`], keeping only nodes that pass `test`.
    pub fn typed_axis_iterator(self: &Arc<Self>, axis: Axis, test: NodeTest) -> Box<dyn AxisIterator> {
        Box::new(RoutedAxisIterator::new(Arc::clone(self), axis, Some(test)))
    }

    /// Elements of the context node's document carrying any of the
    /// whitespace-separated IDs, in document order.
    pub fn id_lookup(&self, context: NodeHandle, idrefs: &str) -> IndexLookupIterator {
        let r = self.resolve(context);
        let mut found: SmallVec<[NodeHandle; 8]> =
            idrefs.split_whitespace().filter_map(|id| r.tree.element_by_id(id)).map(|n| Self::retag(r.base, n)).collect();
        found.sort_by(|a, b| self.compare(*a, *b));
        found.dedup();
        tracing::trace!(ids = idrefs, hits = found.len(), "id lookup");
        ArrayIterator::index_lookup(found.into_vec())
    }

    // --- document() --------------------------------------------------------

    fn absolute_uri(&self, uri: &str, base: Option<&str>) -> Option<Url> {
        let base = base.and_then(|b| Url::parse(b).ok()).or_else(|| self.base_uri.clone());
        match base {
            Some(b) => b.join(uri).ok(),
            None => Url::parse(uri).ok(),
        }
    }

    /// Document node for `uri`, loading it on first use.
    ///
    /// An empty or unparsable URI yields `Ok(None)`. A URI that resolves but
    /// fails to load yields [`Error::Resolution`].
    pub fn document(&self, uri: &str, base: Option<&str>) -> Result<Option<NodeHandle>> {
        if uri.trim().is_empty() {
            return Ok(None);
        }
        let Some(abs) = self.absolute_uri(uri, base) else {
            tracing::trace!(uri, "document() uri does not resolve; empty result");
            return Ok(None);
        };
        let key = String::from(abs.as_str());
        let _guard = self.load_guard.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mask) = self.by_uri.read().unwrap_or_else(PoisonError::into_inner).get(&key).copied() {
            tracing::trace!(uri = %key, mask, "document cache hit");
            return Ok(self.root_handle(mask));
        }
        let loader = self.loader.as_ref().ok_or_else(|| Error::resolution(&key, "no document loader configured"))?;
        let tree = loader.load(&abs).map_err(|err| match err {
            Error::Resolution { .. } => err,
            other => Error::resolution(&key, other.to_string()).with_source(Some(Arc::new(other) as ErrorSource)),
        })?;
        let mask = self.register(tree)?;
        self.by_uri.write().unwrap_or_else(PoisonError::into_inner).insert(key.clone(), mask);
        tracing::debug!(uri = %key, mask, "loaded document");
        Ok(self.root_handle(mask))
    }

    /// Document nodes for several URIs, in document order without duplicates.
    pub fn document_iterator(&self, uris: &[&str], base: Option<&str>) -> Result<Box<dyn AxisIterator>> {
        let mut roots: Vec<NodeHandle> = Vec::with_capacity(uris.len());
        for uri in uris {
            if let Some(root) = self.document(uri, base)? {
                roots.push(root);
            }
        }
        if roots.is_empty() {
            return Ok(Box::new(EmptyIterator::new()));
        }
        let roots: Vec<NodeHandle> = roots.into_iter().sorted_by(|a, b| self.compare(*a, *b)).dedup().collect();
        Ok(Box::new(ArrayIterator::new(roots)))
    }
}

fn normalize_uri(uri: &str) -> String {
    Url::parse(uri).map_or_else(|_| uri.to_string(), String::from)
}
