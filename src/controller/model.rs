//! Controller inputs, outputs and the read-only view projection
//!
//! The controller never performs I/O. Transitions return [`Command`]s for
//! the owner to execute, and renderers read a [`ViewSnapshot`].

use std::time::Duration;

use serde::Serialize;

use crate::config::ControllerConfig;
use crate::remote::{FetchErrorKind, Item};

use super::fetch::{FetchMode, FetchRequest, Generation};
use super::filter::FilterSet;
use super::results::SearchMetadata;

// ============================================================================
// Commands
// ============================================================================

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Send this request to the search API and feed the result back
    Fetch(FetchRequest),
    /// Replace (never push) the browser URL query string
    ReplaceUrl(String),
    /// Persist the selected section for the page
    RememberSection { page: String, section: String },
}

/// What happened to an arriving response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    Applied,
    /// Superseded or torn down; nothing changed
    Stale,
    /// Applied as an error state
    Failed(FetchErrorKind),
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    pub debounce: Duration,
    pub scroll_throttle: Duration,
    pub scroll_threshold_px: f64,
    pub page_size: u32,
    pub dedupe: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from(&ControllerConfig::default())
    }
}

impl From<&ControllerConfig> for ControllerSettings {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            debounce: config.debounce(),
            scroll_throttle: config.scroll_throttle(),
            scroll_threshold_px: f64::from(config.scroll_threshold_px),
            page_size: config.page_size,
            dedupe: config.dedupe,
        }
    }
}

// ============================================================================
// View
// ============================================================================

/// Error state shown to the user, with its scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    pub scope: FetchMode,
    pub kind: FetchErrorKind,
    pub message: String,
    pub retryable: bool,
}

/// Read-only projection of controller state for renderers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSnapshot {
    pub page: String,
    pub section: String,
    pub filters: FilterSet,
    /// Local values of fields being edited
    pub edits: Vec<(String, String)>,
    pub items: Vec<Item>,
    pub metadata: Option<SearchMetadata>,
    pub is_loading: bool,
    pub is_loading_more: bool,
    pub has_more: bool,
    pub total_count: Option<u64>,
    pub error: Option<ErrorView>,
    pub generation: Generation,
}

impl ViewSnapshot {
    /// Empty view before mount
    pub fn empty(page: &str) -> Self {
        Self {
            page: page.to_string(),
            section: String::new(),
            filters: FilterSet::new(),
            edits: Vec::new(),
            items: Vec::new(),
            metadata: None,
            is_loading: false,
            is_loading_more: false,
            has_more: false,
            total_count: None,
            error: None,
            generation: Generation::default(),
        }
    }
}
