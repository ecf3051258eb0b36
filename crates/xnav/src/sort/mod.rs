//! Multi-level node sorting for `xsl:sort`.
//!
//! Each level extracts its key the first time a comparison needs it, so later
//! levels are never computed for nodes an earlier level already separates.

mod collation;
mod engine;
mod settings;

pub use collation::{
    CODEPOINT_URI, CodepointCollation, Collation, CollationRegistry, DICTIONARY_URI, DictionaryCollation,
    SIMPLE_ACCENT_URI, SIMPLE_CASE_ACCENT_URI, SIMPLE_CASE_URI, SimpleAccentCollation, SimpleCaseAccentCollation,
    SimpleCaseCollation, primary_subtag,
};
pub use engine::sort_nodes;
pub use settings::{CaseOrder, DataType, KeyFn, SortLevel, SortOrder, SortSpec, SortSpecBuilder};
