//! Packed node handles.
//!
//! A [`NodeHandle`] addresses one node in one of many independently built
//! trees. The upper [`MASK_BITS`] select the owning document (its router
//! slot), the lower [`IDENT_BITS`] carry the tree-local node identity.
//!
//! ```
//! use platynui_xnav::handle::NodeHandle;
//!
//! let h = NodeHandle::new(3, 42);
//! assert_eq!(h.mask(), 3);
//! assert_eq!(h.ident(), 42);
//! assert_eq!(h.with_mask(0).raw(), 42);
//! ```

use core::fmt;

/// Number of high bits selecting the document.
pub const MASK_BITS: u32 = 8;
/// Number of low bits carrying the node identity within one mask.
pub const IDENT_BITS: u32 = 24;
/// Bit mask extracting the identity part of a raw handle.
pub const IDENT_MASK: u32 = (1 << IDENT_BITS) - 1;
/// Largest number of router slots (distinct masks).
pub const MAX_MASKS: usize = 1 << MASK_BITS;

/// Document mask, i.e. the router slot a handle belongs to.
pub type DocMask = u8;

/// Tree-local node identity as seen by a [`crate::tree::Tree`].
///
/// Identities are assigned in document order at build time and are never `0`.
/// A tree with more than 2^24 nodes spans several consecutive masks; the
/// router folds the mask offset back into the identity (see
/// [`crate::router::DocumentRouter::local`]).
pub type NodeId = u32;

/// A node address: `(mask << 24) | ident`.
///
/// Raw comparison orders handles first by mask, then by identity, which is
/// document order for trees whose identities follow document order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodeHandle(u32);

impl NodeHandle {
    /// "No node". Never denotes a real node.
    pub const NULL: NodeHandle = NodeHandle(0);

    #[inline]
    pub const fn new(mask: DocMask, ident: u32) -> Self {
        NodeHandle(((mask as u32) << IDENT_BITS) | (ident & IDENT_MASK))
    }

    /// Reinterpret a raw integer. `0` maps to `None`.
    #[inline]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        if raw == 0 { None } else { Some(NodeHandle(raw)) }
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn mask(self) -> DocMask {
        (self.0 >> IDENT_BITS) as DocMask
    }

    /// Identity bits only (mask cleared).
    #[inline]
    pub const fn ident(self) -> u32 {
        self.0 & IDENT_MASK
    }

    /// Same identity, re-tagged with another document mask.
    #[inline]
    #[must_use]
    pub const fn with_mask(self, mask: DocMask) -> Self {
        NodeHandle::new(mask, self.ident())
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("NodeHandle(NULL)");
        }
        write!(f, "NodeHandle({}:{})", self.mask(), self.ident())
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.mask(), self.ident())
    }
}
