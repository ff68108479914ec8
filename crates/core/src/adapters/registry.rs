// ABOUTME: Site adapter data model and the ordered registry that resolves a URL to an adapter.
// ABOUTME: Resolution is substring matching in registration order; first match wins.

//! Site adapter definitions.
//!
//! An adapter is data, not code: the selectors used to locate the price, an
//! optional selector for a split fractional part, and the text fragments to
//! strip before parsing. Supporting a new retailer means adding one record.

use serde::{Deserialize, Serialize};

use crate::adapters::compiled::precompile_selectors;
use crate::error::WatchError;

/// Currency markers and separators removed from price text by default.
pub const DEFAULT_STRIP: &[&str] = &["₹", "Rs.", ","];

fn default_strip() -> Vec<String> {
    DEFAULT_STRIP.iter().map(|s| s.to_string()).collect()
}

/// A site-specific price extraction rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteAdapter {
    /// Lowercase substring that identifies the site in a product URL.
    pub id: String,
    /// CSS selectors in priority order: primary first, then layout fallbacks.
    pub selectors: Vec<String>,
    /// Selector for a separately rendered fractional part, appended to the
    /// whole-part text with no separator.
    #[serde(default)]
    pub fraction: Option<String>,
    /// Fragments removed from the extracted text before parsing.
    #[serde(default = "default_strip")]
    pub strip: Vec<String>,
}

impl SiteAdapter {
    /// Creates an adapter with the default cleaning policy.
    pub fn new<I, S>(id: impl Into<String>, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into().to_lowercase(),
            selectors: selectors.into_iter().map(Into::into).collect(),
            fraction: None,
            strip: default_strip(),
        }
    }

    /// Sets the fractional-part selector.
    pub fn with_fraction(mut self, css: impl Into<String>) -> Self {
        self.fraction = Some(css.into());
        self
    }

    /// Returns true if this adapter handles the given (lowercased) URL.
    fn matches(&self, lowered_url: &str) -> bool {
        !self.id.is_empty() && lowered_url.contains(&self.id)
    }

    fn all_selectors(&self) -> impl Iterator<Item = &str> {
        self.selectors
            .iter()
            .map(String::as_str)
            .chain(self.fraction.as_deref())
    }
}

/// Ordered collection of adapters.
#[derive(Debug, Default, Clone)]
pub struct AdapterRegistry {
    adapters: Vec<SiteAdapter>,
}

impl AdapterRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON array of adapters into a registry.
    pub fn from_json(text: &str) -> Result<Self, WatchError> {
        let adapters: Vec<SiteAdapter> = serde_json::from_str(text).map_err(|e| {
            WatchError::source_list("", "LoadAdapters", Some(anyhow::anyhow!(e)))
        })?;
        let mut registry = Self::new();
        registry.extend(adapters);
        Ok(registry)
    }

    /// Registers an adapter. An adapter with the same id is replaced in
    /// place, keeping its priority; otherwise the adapter is appended.
    pub fn register(&mut self, mut adapter: SiteAdapter) {
        adapter.id = adapter.id.to_lowercase();
        let invalid = precompile_selectors(adapter.all_selectors());
        for css in invalid {
            tracing::warn!(adapter = %adapter.id, selector = %css, "invalid selector will never match");
        }
        match self.adapters.iter_mut().find(|a| a.id == adapter.id) {
            Some(existing) => *existing = adapter,
            None => self.adapters.push(adapter),
        }
    }

    /// Registers every adapter from an iterator, in order.
    pub fn extend<I: IntoIterator<Item = SiteAdapter>>(&mut self, adapters: I) {
        for adapter in adapters {
            self.register(adapter);
        }
    }

    /// Picks the adapter for a URL. `None` means the site is unsupported.
    pub fn resolve(&self, url: &str) -> Option<&SiteAdapter> {
        let lowered = url.to_lowercase();
        self.adapters.iter().find(|a| a.matches(&lowered))
    }

    /// Looks up an adapter by id.
    pub fn get(&self, id: &str) -> Option<&SiteAdapter> {
        self.adapters.iter().find(|a| a.id == id)
    }

    /// Adapters in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &SiteAdapter> {
        self.adapters.iter()
    }

    /// Adapter ids in priority order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(|a| a.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
