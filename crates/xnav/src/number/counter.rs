//! Hierarchical counting for `xsl:number`.
//!
//! Counters are recomputed for every call from the start node, its ancestors
//! and the preceding nodes; nothing is cached between calls.

use core::fmt;
use std::sync::Arc;

use super::format::{NumberSettings, format_numbers, format_values};
use crate::handle::NodeHandle;
use crate::model::NodeKind;
use crate::router::DocumentRouter;

/// A `count`/`from` pattern.
pub type Pattern = Arc<dyn Fn(&DocumentRouter, NodeHandle) -> bool + Send + Sync>;

/// Pattern matching elements with the given local name.
pub fn element_named(local: &str) -> Pattern {
    let local = local.to_string();
    Arc::new(move |router: &DocumentRouter, node: NodeHandle| {
        router.kind(node) == NodeKind::Element && router.local_name(node).as_deref() == Some(local.as_str())
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountLevel {
    #[default]
    Single,
    Multiple,
    Any,
}

#[derive(Clone, Default)]
struct Patterns {
    count: Option<Pattern>,
    from: Option<Pattern>,
}

impl Patterns {
    /// Without a `count` pattern a node counts when it has the same kind and
    /// expanded name as the start node.
    fn counts(&self, router: &DocumentRouter, start: NodeHandle, node: NodeHandle) -> bool {
        match &self.count {
            Some(p) => p(router, node),
            None => router.same_kind_and_name(start, node),
        }
    }

    fn is_from(&self, router: &DocumentRouter, node: NodeHandle) -> bool {
        self.from.as_ref().is_some_and(|p| p(router, node))
    }

    /// 1 + number of counted preceding siblings.
    fn rank(&self, router: &DocumentRouter, start: NodeHandle, node: NodeHandle) -> u64 {
        let mut rank = 1;
        let mut cur = router.previous_sibling(node);
        while let Some(sib) = cur {
            if self.counts(router, start, sib) {
                rank += 1;
            }
            cur = router.previous_sibling(sib);
        }
        rank
    }
}

pub trait NodeCounter {
    /// Per-level numbers for `node`; empty when nothing is counted.
    fn count(&self, router: &DocumentRouter, node: NodeHandle) -> Vec<u64>;
}

/// `level="single"`: rank of the nearest counted ancestor-or-self.
#[derive(Clone, Default)]
pub struct SingleNodeCounter {
    patterns: Patterns,
}

impl NodeCounter for SingleNodeCounter {
    fn count(&self, router: &DocumentRouter, node: NodeHandle) -> Vec<u64> {
        let mut cur = Some(node);
        while let Some(c) = cur {
            if self.patterns.is_from(router, c) {
                break;
            }
            if self.patterns.counts(router, node, c) {
                return vec![self.patterns.rank(router, node, c)];
            }
            cur = router.parent(c);
        }
        Vec::new()
    }
}

/// `level="multiple"`: ranks of every counted ancestor-or-self, outermost first.
#[derive(Clone, Default)]
pub struct MultipleNodeCounter {
    patterns: Patterns,
}

impl NodeCounter for MultipleNodeCounter {
    fn count(&self, router: &DocumentRouter, node: NodeHandle) -> Vec<u64> {
        let mut levels = Vec::new();
        let mut cur = Some(node);
        while let Some(c) = cur {
            if self.patterns.is_from(router, c) {
                break;
            }
            if self.patterns.counts(router, node, c) {
                levels.push(self.patterns.rank(router, node, c));
            }
            cur = router.parent(c);
        }
        levels.reverse();
        levels
    }
}

/// `level="any"`: counted nodes at or before the start node in document
/// order, ancestors included, after the nearest node matching `from`.
#[derive(Clone, Default)]
pub struct AnyNodeCounter {
    patterns: Patterns,
}

impl AnyNodeCounter {
    fn preceding_or_ancestor(router: &DocumentRouter, node: NodeHandle) -> Option<NodeHandle> {
        if router.kind(node).is_attr_or_namespace() {
            return router.parent(node);
        }
        match router.previous_sibling(node) {
            Some(mut prev) => {
                while let Some(last) = router.last_child(prev) {
                    prev = last;
                }
                Some(prev)
            }
            None => router.parent(node),
        }
    }
}

impl NodeCounter for AnyNodeCounter {
    fn count(&self, router: &DocumentRouter, node: NodeHandle) -> Vec<u64> {
        let mut total = 0u64;
        let mut cur = Some(node);
        while let Some(c) = cur {
            if self.patterns.is_from(router, c) {
                break;
            }
            if self.patterns.counts(router, node, c) {
                total += 1;
            }
            cur = Self::preceding_or_ancestor(router, c);
        }
        if total == 0 { Vec::new() } else { vec![total] }
    }
}

/// `xsl:number` settings other than formatting.
#[derive(Clone, Default)]
pub struct CounterSpec {
    level: CountLevel,
    patterns: Patterns,
    value: Option<Vec<f64>>,
}

impl fmt::Debug for CounterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterSpec")
            .field("level", &self.level)
            .field("count", &self.patterns.count.is_some())
            .field("from", &self.patterns.from.is_some())
            .field("value", &self.value)
            .finish()
    }
}

impl CounterSpec {
    pub fn new(level: CountLevel) -> Self {
        Self { level, ..Self::default() }
    }

    #[must_use]
    pub fn count_pattern(mut self, pattern: Pattern) -> Self {
        self.patterns.count = Some(pattern);
        self
    }

    #[must_use]
    pub fn from_pattern(mut self, pattern: Pattern) -> Self {
        self.patterns.from = Some(pattern);
        self
    }

    /// Explicit numbers; pattern matching is skipped entirely.
    #[must_use]
    pub fn value(mut self, values: impl Into<Vec<f64>>) -> Self {
        self.value = Some(values.into());
        self
    }

    pub fn level(&self) -> CountLevel {
        self.level
    }

    pub fn counter(&self) -> Box<dyn NodeCounter> {
        let patterns = self.patterns.clone();
        match self.level {
            CountLevel::Single => Box::new(SingleNodeCounter { patterns }),
            CountLevel::Multiple => Box::new(MultipleNodeCounter { patterns }),
            CountLevel::Any => Box::new(AnyNodeCounter { patterns }),
        }
    }

    /// Number `node` and format the result.
    pub fn number(&self, router: &DocumentRouter, node: NodeHandle, settings: &NumberSettings) -> String {
        match &self.value {
            Some(values) => format_values(values, settings),
            None => format_numbers(&self.counter().count(router, node), settings),
        }
    }
}
