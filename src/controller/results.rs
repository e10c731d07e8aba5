//! Accumulated result pages.

use std::collections::HashSet;

use serde::Serialize;

use crate::remote::{Item, SearchInfo};

/// Search engine metadata of the latest fresh page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMetadata {
    pub engine: String,
    pub took_ms: Option<u64>,
    pub total_matches: Option<u64>,
}

impl From<SearchInfo> for SearchMetadata {
    fn from(info: SearchInfo) -> Self {
        Self {
            engine: info.engine,
            took_ms: info.took_ms,
            total_matches: info.total_matches,
        }
    }
}

/// Ordered result list: replaced on fresh, appended on load-more.
///
/// With `dedupe` on, appended items whose `id` is already listed are
/// skipped. Items without an id are always kept.
#[derive(Debug, Clone, Default)]
pub struct ResultAccumulator {
    items: Vec<Item>,
    metadata: Option<SearchMetadata>,
    dedupe: bool,
    seen: HashSet<String>,
}

impl ResultAccumulator {
    pub fn new(dedupe: bool) -> Self {
        Self {
            dedupe,
            ..Self::default()
        }
    }

    /// Replace list and metadata together
    pub fn fresh(&mut self, items: Vec<Item>, metadata: Option<SearchMetadata>) {
        self.seen = if self.dedupe {
            items.iter().filter_map(Item::id).collect()
        } else {
            HashSet::new()
        };
        self.items = items;
        self.metadata = metadata;
    }

    /// Append a page; returns how many items were added
    pub fn append(&mut self, items: Vec<Item>) -> usize {
        let before = self.items.len();
        if !self.dedupe {
            self.items.extend(items);
            return self.items.len() - before;
        }

        for item in items {
            match item.id() {
                Some(id) if !self.seen.insert(id.clone()) => {
                    tracing::debug!(id = %id, "skipping duplicate item");
                }
                _ => self.items.push(item),
            }
        }
        self.items.len() - before
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.metadata = None;
        self.seen.clear();
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn metadata(&self) -> Option<&SearchMetadata> {
        self.metadata.as_ref()
    }
}
