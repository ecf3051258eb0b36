use core::fmt;
use std::sync::Arc;

use super::collation::{Collation, CollationRegistry};
use crate::error::{Error, Result};
use crate::handle::NodeHandle;
use crate::router::DocumentRouter;

/// Produces the raw key text of a node for one sort level.
pub type KeyFn = Arc<dyn Fn(&DocumentRouter, NodeHandle) -> String + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    #[default]
    Text,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseOrder {
    UpperFirst,
    LowerFirst,
}

/// One `xsl:sort` level. The key defaults to the node's string value.
#[derive(Clone)]
pub struct SortLevel {
    pub(crate) select: Option<KeyFn>,
    pub(crate) data_type: DataType,
    pub(crate) order: SortOrder,
    pub(crate) case_order: Option<CaseOrder>,
    pub(crate) lang: Option<String>,
    pub(crate) collation: Option<String>,
}

impl fmt::Debug for SortLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortLevel")
            .field("select", &self.select.as_ref().map(|_| "<fn>"))
            .field("data_type", &self.data_type)
            .field("order", &self.order)
            .field("case_order", &self.case_order)
            .field("lang", &self.lang)
            .field("collation", &self.collation)
            .finish()
    }
}

impl Default for SortLevel {
    fn default() -> Self {
        Self::text()
    }
}

impl SortLevel {
    pub fn text() -> Self {
        Self { select: None, data_type: DataType::Text, order: SortOrder::Ascending, case_order: None, lang: None, collation: None }
    }

    pub fn number() -> Self {
        Self { data_type: DataType::Number, ..Self::text() }
    }

    #[must_use]
    pub fn select(mut self, f: impl Fn(&DocumentRouter, NodeHandle) -> String + Send + Sync + 'static) -> Self {
        self.select = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    #[must_use]
    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn descending(self) -> Self {
        self.order(SortOrder::Descending)
    }

    #[must_use]
    pub fn case_order(mut self, case_order: CaseOrder) -> Self {
        self.case_order = Some(case_order);
        self
    }

    #[must_use]
    pub fn lang(mut self, tag: &str) -> Self {
        self.lang = Some(tag.to_string());
        self
    }

    /// Collation URI; takes precedence over `lang`.
    #[must_use]
    pub fn collation(mut self, uri: &str) -> Self {
        self.collation = Some(uri.to_string());
        self
    }
}

/// A level with its collation looked up.
#[derive(Clone)]
pub(crate) struct ResolvedLevel {
    pub(crate) level: SortLevel,
    pub(crate) collation: Arc<dyn Collation>,
}

impl ResolvedLevel {
    pub(crate) fn key_text(&self, router: &DocumentRouter, node: NodeHandle) -> String {
        match &self.level.select {
            Some(f) => f(router, node),
            None => router.string_value(node),
        }
    }
}

/// Validated multi-level sort settings.
#[derive(Clone)]
pub struct SortSpec {
    pub(crate) levels: Vec<ResolvedLevel>,
}

impl fmt::Debug for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.levels.iter().map(|l| (&l.level, l.collation.uri()))).finish()
    }
}

impl SortSpec {
    pub fn builder() -> SortSpecBuilder {
        SortSpecBuilder::default()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

#[derive(Default)]
pub struct SortSpecBuilder {
    levels: Vec<SortLevel>,
    collations: Option<Arc<CollationRegistry>>,
}

impl SortSpecBuilder {
    #[must_use]
    pub fn level(mut self, level: SortLevel) -> Self {
        self.levels.push(level);
        self
    }

    #[must_use]
    pub fn with_collations(mut self, registry: Arc<CollationRegistry>) -> Self {
        self.collations = Some(registry);
        self
    }

    /// Resolve every level's collation. Fails on an unknown collation URI or
    /// a malformed language tag; a well-formed but unsupported language uses
    /// the default collation.
    pub fn build(self) -> Result<SortSpec> {
        let registry = self.collations.unwrap_or_else(|| Arc::new(CollationRegistry::default()));
        let mut levels = Vec::with_capacity(self.levels.len());
        for level in self.levels {
            let collation = if let Some(uri) = &level.collation {
                registry.get(uri).ok_or_else(|| Error::UnknownCollation(uri.clone()))?
            } else if let Some(tag) = &level.lang {
                match registry.for_language(tag)? {
                    Some(c) => c,
                    None => {
                        tracing::warn!(lang = %tag, "no collation for language, using default");
                        registry.default_collation()
                    }
                }
            } else {
                registry.default_collation()
            };
            levels.push(ResolvedLevel { level, collation });
        }
        tracing::debug!(levels = levels.len(), "sort spec built");
        Ok(SortSpec { levels })
    }
}
