//! `xsl:number`: counting nodes and formatting the numbers.

mod counter;
mod format;

pub use counter::{
    AnyNodeCounter, CountLevel, CounterSpec, MultipleNodeCounter, NodeCounter, Pattern, SingleNodeCounter,
    element_named,
};
pub use format::{LetterValue, NumberSettings, format_numbers, format_values};
