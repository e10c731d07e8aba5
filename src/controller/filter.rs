//! Committed filter state.
//!
//! [`FilterSet`] holds the values that have been committed for the active
//! section; [`FilterStore`] owns it together with the URL parameters that
//! are not filters, and is the only place a commit is validated.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::Result;

use super::catalog::{PageCatalog, SectionSchema};
use super::url::UrlState;

/// A committed filter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Number(i64),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => write!(f, "{s}"),
            FilterValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Field name -> committed value. An absent key is an empty filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterSet {
    values: BTreeMap<String, FilterValue>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&FilterValue> {
        self.values.get(field)
    }

    /// Value rendered as it travels in a URL
    pub fn get_str(&self, field: &str) -> Option<String> {
        self.values.get(field).map(|v| v.to_string())
    }

    pub fn insert(&mut self, field: &str, value: FilterValue) {
        self.values.insert(field.to_string(), value);
    }

    pub fn remove(&mut self, field: &str) -> Option<FilterValue> {
        self.values.remove(field)
    }

    /// Set or clear a field; `None` clears it
    pub fn set(&mut self, field: &str, value: Option<FilterValue>) {
        match value {
            Some(v) => self.insert(field, v),
            None => {
                self.remove(field);
            }
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in the section's field order
    pub fn ordered_pairs(&self, section: &SectionSchema) -> Vec<(String, String)> {
        section
            .fields
            .iter()
            .filter_map(|f| self.get_str(&f.name).map(|v| (f.name.clone(), v)))
            .collect()
    }

    /// Whether any searchable text field has a value
    pub fn has_text_search(&self, section: &SectionSchema) -> bool {
        section
            .fields
            .iter()
            .any(|f| f.searchable && self.contains(&f.name))
    }
}

/// Canonical filter state for one page, synchronized with the URL
#[derive(Debug, Clone, Default)]
pub struct FilterStore {
    filters: FilterSet,
    /// Non-filter URL parameters, kept verbatim in original order
    extra_params: Vec<(String, String)>,
}

impl FilterStore {
    /// Build the initial filter set from section defaults overlaid with URL values.
    ///
    /// URL values that are not fields of `section`, or that fail validation,
    /// are dropped. Parameters that are not filters of any section are kept
    /// as extra parameters so they survive URL rewrites.
    pub fn initialize(url: &UrlState, catalog: &PageCatalog, section: &SectionSchema) -> Self {
        let mut filters = section.default_filters();
        let mut extra_params = Vec::new();

        for (key, raw) in url.pairs() {
            if key == &catalog.discriminator {
                continue;
            }
            let Some(field) = section.field(key) else {
                if catalog.is_filter_field(key) {
                    tracing::debug!(
                        field = %key,
                        section = %section.id,
                        "dropping URL filter not in section"
                    );
                } else {
                    extra_params.push((key.clone(), raw.clone()));
                }
                continue;
            };

            match field.parse(raw) {
                Ok(Some(value)) => filters.insert(key, value),
                Ok(None) => {}
                Err(e) => tracing::debug!(error = %e, "dropping invalid URL filter"),
            }
        }

        Self {
            filters,
            extra_params,
        }
    }

    /// Last committed snapshot
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn extra_params(&self) -> &[(String, String)] {
        &self.extra_params
    }

    /// Commit a raw value for `field`.
    ///
    /// Returns whether the committed set changed. Fails for fields outside
    /// the section schema and for values the field rejects.
    pub fn commit(&mut self, section: &SectionSchema, field: &str, raw: &str) -> Result<bool> {
        let schema = section.require_field(field)?;
        let value = schema.parse(raw)?;

        if self.filters.get(field) == value.as_ref() {
            return Ok(false);
        }
        self.filters.set(field, value);
        Ok(true)
    }

    /// Replace the whole filter set (section switch, clear, URL navigation)
    pub fn replace(&mut self, filters: FilterSet) {
        self.filters = filters;
    }

    pub fn set_extra_params(&mut self, extra_params: Vec<(String, String)>) {
        self.extra_params = extra_params;
    }
}
