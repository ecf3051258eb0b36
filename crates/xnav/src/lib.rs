//! Node navigation core for XSLT/XPath evaluation.
//!
//! Trees are registered with a [`DocumentRouter`] and addressed through
//! packed [`NodeHandle`]s. Axis cursors, the iterator algebra, `xsl:sort`
//! and `xsl:number` all work on handles, so one selection can span the source
//! document, loaded documents and result tree fragments.

pub mod algebra;
pub mod arena;
pub mod axes;
pub mod error;
pub mod handle;
pub mod iter;
pub mod model;
pub mod number;
pub mod router;
pub mod sort;
pub mod tree;

pub use algebra::{
    AbsoluteIterator, CachedNodeList, DupFilterIterator, FilterIterator, KeyIndex, MatchingIterator, NodeValueIterator,
    NthIterator, StepIterator, UnionIterator,
};
pub use arena::{ArenaTree, NodeBuilder};
pub use error::{Error, Result};
pub use handle::{DocMask, NodeHandle, NodeId};
pub use iter::{ArrayIterator, AxisIterator, EmptyIterator, IndexLookupIterator, Nodes, SingletonIterator};
pub use model::{Axis, NodeKind, NodeTest, QName};
pub use number::{CountLevel, CounterSpec, NumberSettings, format_numbers};
pub use router::{DocumentLoader, DocumentRouter, DocumentRouterBuilder};
pub use sort::{SortLevel, SortSpec, sort_nodes};
pub use tree::{LocalCursor, Tree};
