//! Composite iterators built from other iterators: path steps, unions,
//! positional and value predicates, variable caching and key lookups.

mod cached;
mod dup_filter;
mod filter;
mod key_index;
mod positional;
mod step;
mod union;

pub use cached::CachedNodeList;
pub use dup_filter::DupFilterIterator;
pub use filter::{FilterIterator, NodeValueIterator, Predicate, PredicateContext, ReturnMode, ValueOp};
pub use key_index::KeyIndex;
pub use positional::{MatchingIterator, NthIterator};
pub use step::{AbsoluteIterator, StepIterator};
pub use union::UnionIterator;
