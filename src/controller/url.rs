//! Browser URL query-string state.
//!
//! The URL carries the section discriminator and every non-empty filter.
//! Writes always go through history *replace*, so typing never creates
//! back/forward entries.

use url::form_urlencoded;

use super::catalog::{PageCatalog, SectionSchema};
use super::filter::FilterSet;

/// Decoded query-string pairs, in original order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlState {
    pairs: Vec<(String, String)>,
}

impl UrlState {
    /// Parse a query string. A leading `?` is accepted.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        Self { pairs }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Canonical query string for the current state.
///
/// Order: discriminator, non-empty filters in schema order, then extra
/// (non-filter) parameters in their original order.
pub fn canonical_query(
    catalog: &PageCatalog,
    section: &SectionSchema,
    filters: &FilterSet,
    extra_params: &[(String, String)],
) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.append_pair(&catalog.discriminator, &section.id);
    for (key, value) in filters.ordered_pairs(section) {
        serializer.append_pair(&key, &value);
    }
    serializer.extend_pairs(extra_params.iter());
    serializer.finish()
}

/// Normalize an incoming query string for comparison with a canonical one
pub fn normalize(query: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(UrlState::parse(query).pairs().iter())
        .finish()
}

/// Browser history collaborator. Only *replace* is offered.
pub trait HistorySink: Send {
    fn replace(&mut self, query: &str);
}

/// In-memory history that records every replacement
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    replacements: Vec<String>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current query string, if any replacement happened
    pub fn current(&self) -> Option<&str> {
        self.replacements.last().map(String::as_str)
    }

    pub fn replacements(&self) -> &[String] {
        &self.replacements
    }
}

impl HistorySink for MemoryHistory {
    fn replace(&mut self, query: &str) {
        self.replacements.push(query.to_string());
    }
}

/// Cross-page "last selected section" store, held outside the controller.
pub trait SectionMemory: Send {
    fn load(&self, page: &str) -> Option<String>;
    fn store(&mut self, page: &str, section: &str);
}

#[derive(Debug, Clone, Default)]
pub struct MemorySectionMemory {
    sections: std::collections::HashMap<String, String>,
}

impl MemorySectionMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SectionMemory for MemorySectionMemory {
    fn load(&self, page: &str) -> Option<String> {
        self.sections.get(page).cloned()
    }

    fn store(&mut self, page: &str, section: &str) {
        self.sections.insert(page.to_string(), section.to_string());
    }
}
