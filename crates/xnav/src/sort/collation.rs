use std::collections::HashMap;
use std::sync::Arc;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::canonical_combining_class as ccc;

use crate::error::{Error, Result};

pub const CODEPOINT_URI: &str = "http://www.w3.org/2005/xpath-functions/collation/codepoint";
pub const SIMPLE_CASE_URI: &str = "urn:platynui:collation:simple-case";
pub const SIMPLE_ACCENT_URI: &str = "urn:platynui:collation:simple-accent";
pub const SIMPLE_CASE_ACCENT_URI: &str = "urn:platynui:collation:simple-case-accent";
pub const DICTIONARY_URI: &str = "urn:platynui:collation:dictionary";

/// A string ordering expressed as sort keys: keys are extracted once per
/// record and compared bytewise.
pub trait Collation: Send + Sync {
    fn uri(&self) -> &str;
    fn key(&self, s: &str) -> String {
        s.to_string()
    }
}

fn strip_marks(s: &str) -> String {
    s.nfd().filter(|&ch| ccc(ch) == 0).collect()
}

pub struct CodepointCollation;

impl Collation for CodepointCollation {
    fn uri(&self) -> &str {
        CODEPOINT_URI
    }
}

/// Case-insensitive.
pub struct SimpleCaseCollation;

impl Collation for SimpleCaseCollation {
    fn uri(&self) -> &str {
        SIMPLE_CASE_URI
    }
    fn key(&self, s: &str) -> String {
        s.to_lowercase()
    }
}

/// Accent-insensitive (NFD, combining marks removed).
pub struct SimpleAccentCollation;

impl Collation for SimpleAccentCollation {
    fn uri(&self) -> &str {
        SIMPLE_ACCENT_URI
    }
    fn key(&self, s: &str) -> String {
        strip_marks(s)
    }
}

pub struct SimpleCaseAccentCollation;

impl Collation for SimpleCaseAccentCollation {
    fn uri(&self) -> &str {
        SIMPLE_CASE_ACCENT_URI
    }
    fn key(&self, s: &str) -> String {
        strip_marks(s).to_lowercase()
    }
}

/// Three-tier ordering used for Latin-script languages: base letters first,
/// then accents, then the exact code points. `role` and `Rôle` sort next to
/// each other, ahead of `roles`.
pub struct DictionaryCollation;

impl Collation for DictionaryCollation {
    fn uri(&self) -> &str {
        DICTIONARY_URI
    }
    fn key(&self, s: &str) -> String {
        let accentless = strip_marks(s);
        let mut key = accentless.to_lowercase();
        key.push('\0');
        key.push_str(&s.to_lowercase());
        key.push('\0');
        key.push_str(s);
        key
    }
}

/// Collations by URI, plus the collation used for each supported language.
pub struct CollationRegistry {
    by_uri: HashMap<String, Arc<dyn Collation>>,
    by_language: HashMap<String, Arc<dyn Collation>>,
}

impl Default for CollationRegistry {
    fn default() -> Self {
        let mut reg = Self { by_uri: HashMap::new(), by_language: HashMap::new() };
        reg.insert(Arc::new(CodepointCollation));
        reg.insert(Arc::new(SimpleCaseCollation));
        reg.insert(Arc::new(SimpleAccentCollation));
        reg.insert(Arc::new(SimpleCaseAccentCollation));
        let dictionary: Arc<dyn Collation> = Arc::new(DictionaryCollation);
        reg.insert(dictionary.clone());
        for lang in ["da", "de", "en", "es", "fi", "fr", "it", "nl", "no", "pt", "sv"] {
            reg.by_language.insert(lang.to_string(), dictionary.clone());
        }
        reg
    }
}

impl CollationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uri: &str) -> Option<Arc<dyn Collation>> {
        self.by_uri.get(uri).cloned()
    }

    pub fn insert(&mut self, collation: Arc<dyn Collation>) {
        self.by_uri.insert(collation.uri().to_string(), collation);
    }

    /// Use `collation` for every tag whose primary subtag is `language`.
    pub fn insert_language(&mut self, language: &str, collation: Arc<dyn Collation>) {
        self.by_language.insert(language.to_ascii_lowercase(), collation);
    }

    pub fn default_collation(&self) -> Arc<dyn Collation> {
        self.get(CODEPOINT_URI).unwrap_or_else(|| Arc::new(CodepointCollation))
    }

    /// Collation for a language tag. `Ok(None)` when the tag is well formed
    /// but no collation is registered for it.
    pub fn for_language(&self, tag: &str) -> Result<Option<Arc<dyn Collation>>> {
        let primary = primary_subtag(tag)?;
        Ok(self.by_language.get(&primary).cloned())
    }
}

/// Validates a BCP 47 style tag (`en`, `de-CH`, `zh-Hant-TW`) and returns
/// its lowercased primary subtag.
pub fn primary_subtag(tag: &str) -> Result<String> {
    let mut parts = tag.split('-');
    let primary = parts.next().unwrap_or_default();
    let primary_ok = (1..=8).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
    let rest_ok = parts.all(|p| (1..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()));
    if !primary_ok || !rest_ok {
        return Err(Error::InvalidLanguage(tag.to_string()));
    }
    Ok(primary.to_ascii_lowercase())
}
