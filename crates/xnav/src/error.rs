//! Typed errors for routing, document resolution and sort/number setup.
//!
//! Contract violations (an unregistered mask reaching
//! [`DocumentRouter::tree`](crate::router::DocumentRouter::tree)) panic
//! instead; [`Error::UnregisteredMask`] is only produced by the checked
//! accessors.

use std::sync::Arc;

use thiserror::Error;

use crate::handle::DocMask;

pub type Result<T> = core::result::Result<T, Error>;

/// Boxed cause attached to resolution failures.
pub type ErrorSource = Arc<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error, Clone)]
pub enum Error {
    /// A handle carried a mask that no tree was registered under.
    #[error("document mask {mask} is not registered")]
    UnregisteredMask { mask: DocMask },

    /// All masks are taken; no further documents can be addressed.
    #[error("document address space exhausted: {requested} mask(s) requested, {available} available")]
    AddressSpaceExhausted { requested: usize, available: usize },

    /// A document that should resolve could not be loaded or parsed.
    #[error("failed to load document '{uri}': {message}")]
    Resolution {
        uri: String,
        message: String,
        #[source]
        source: Option<ErrorSource>,
    },

    /// The tree handed to the router violates its contract.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Sort setup referenced a collation URI that is not registered.
    #[error("unknown collation URI: {0}")]
    UnknownCollation(String),

    /// Sort or number setup received a malformed language tag.
    #[error("invalid language tag: '{0}'")]
    InvalidLanguage(String),
}

impl Error {
    pub fn resolution(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Resolution { uri: uri.into(), message: message.into(), source: None }
    }

    /// Attach a cause to a [`Error::Resolution`]; other variants are returned unchanged.
    #[must_use]
    pub fn with_source(mut self, cause: impl Into<Option<ErrorSource>>) -> Self {
        if let Error::Resolution { source, .. } = &mut self {
            *source = cause.into();
        }
        self
    }

    pub fn is_resolution(&self) -> bool {
        matches!(self, Error::Resolution { .. })
    }
}
