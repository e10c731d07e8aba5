//! Page and section catalog.
//!
//! Each list page has a discriminator parameter (`category`, `type`,
//! `court`) whose value selects a section. A section fixes the endpoint, the
//! filter schema, the default filters and the pagination strategy.

use std::fmt;

use serde::Serialize;

use crate::error::{LexError, Result};

use super::filter::{FilterSet, FilterValue};
use super::pagination::{CursorSpec, PaginationStrategy};

/// Kind of a filter field. Decides validation and whether edits are debounced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text, debounced
    Text,
    /// Integer typed into a text box, debounced
    Number,
    /// Fixed set of options, committed immediately
    Choice(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
    /// Text search field: a non-empty value asks the API for highlights
    pub searchable: bool,
}

impl FieldSchema {
    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text,
            searchable: false,
        }
    }

    pub fn search(name: &str) -> Self {
        Self {
            searchable: true,
            ..Self::text(name)
        }
    }

    pub fn number(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Number,
            searchable: false,
        }
    }

    pub fn choice(name: &str, options: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Choice(options.iter().map(|o| o.to_string()).collect()),
            searchable: false,
        }
    }

    /// Whether edits to this field wait for the debounce timer
    pub fn is_debounced(&self) -> bool {
        !matches!(self.kind, FieldKind::Choice(_))
    }

    /// Parse a raw value for this field.
    ///
    /// `Ok(None)` means the value is empty, i.e. the filter is absent.
    pub fn parse(&self, raw: &str) -> Result<Option<FilterValue>> {
        if raw.trim().is_empty() {
            return Ok(None);
        }

        let invalid = |reason: String| LexError::InvalidFilterValue {
            field: self.name.clone(),
            value: raw.to_string(),
            reason,
        };

        match &self.kind {
            FieldKind::Text => Ok(Some(FilterValue::Text(raw.to_string()))),
            FieldKind::Number => raw
                .trim()
                .parse::<i64>()
                .map(|n| Some(FilterValue::Number(n)))
                .map_err(|_| invalid("expected a whole number".to_string())),
            FieldKind::Choice(options) => {
                if options.iter().any(|o| o == raw) {
                    Ok(Some(FilterValue::Text(raw.to_string())))
                } else {
                    Err(invalid(format!("expected one of: {}", options.join(", "))))
                }
            }
        }
    }
}

/// One discriminator value and everything it selects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSchema {
    /// Discriminator value, as it appears in the URL
    pub id: String,
    pub label: String,
    /// Endpoint path relative to the API base URL
    pub endpoint: String,
    pub fields: Vec<FieldSchema>,
    /// Default filter values, applied before URL values
    pub defaults: Vec<(String, String)>,
    pub pagination: PaginationStrategy,
}

impl SectionSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Look up a field or fail with `UnknownField`
    pub fn require_field(&self, name: &str) -> Result<&FieldSchema> {
        self.field(name).ok_or_else(|| LexError::UnknownField {
            section: self.id.clone(),
            field: name.to_string(),
        })
    }

    /// The section's default filters. Defaults that do not validate are skipped.
    pub fn default_filters(&self) -> FilterSet {
        let mut filters = FilterSet::new();
        for (name, raw) in &self.defaults {
            match self.field(name).map(|f| f.parse(raw)) {
                Some(Ok(Some(value))) => filters.insert(name, value),
                _ => tracing::warn!(section = %self.id, field = %name, "ignoring invalid default"),
            }
        }
        filters
    }
}

/// A list page: discriminator parameter plus its sections
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageCatalog {
    pub page: String,
    /// URL/API parameter carrying the section id
    pub discriminator: String,
    pub sections: Vec<SectionSchema>,
    pub default_section: String,
}

impl PageCatalog {
    pub fn section(&self, id: &str) -> Option<&SectionSchema> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn require_section(&self, id: &str) -> Result<&SectionSchema> {
        self.section(id).ok_or_else(|| LexError::UnknownSection {
            page: self.page.clone(),
            section: id.to_string(),
        })
    }

    /// The configured default section, else the first one
    pub fn default_section(&self) -> Result<&SectionSchema> {
        self.section(&self.default_section)
            .or_else(|| self.sections.first())
            .ok_or_else(|| LexError::EmptyCatalog(self.page.clone()))
    }

    /// Whether any section of this page filters on `name`
    pub fn is_filter_field(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.has_field(name))
    }
}

impl fmt::Display for PageCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.page, self.discriminator)
    }
}

/// Names of the built-in pages
pub const BUILTIN_PAGES: [&str; 3] = ["acts", "mappings", "judgments"];

/// Look up a built-in page catalog by name
pub fn builtin(page: &str) -> Result<PageCatalog> {
    match page {
        "acts" => Ok(acts()),
        "mappings" => Ok(mappings()),
        "judgments" => Ok(judgments()),
        _ => Err(LexError::UnknownPage(page.to_string())),
    }
}

pub fn all_builtin() -> Vec<PageCatalog> {
    vec![acts(), mappings(), judgments()]
}

const ACT_SORTS: [&str; 3] = ["year_desc", "year_asc", "title"];

fn acts() -> PageCatalog {
    PageCatalog {
        page: "acts".to_string(),
        discriminator: "category".to_string(),
        sections: vec![
            SectionSchema {
                id: "central".to_string(),
                label: "Central Acts".to_string(),
                endpoint: "/api/acts".to_string(),
                fields: vec![
                    FieldSchema::search("search"),
                    FieldSchema::number("year"),
                    FieldSchema::text("ministry"),
                    FieldSchema::choice("sort", &ACT_SORTS),
                ],
                defaults: vec![("sort".to_string(), "year_desc".to_string())],
                pagination: PaginationStrategy::Offset,
            },
            SectionSchema {
                id: "state".to_string(),
                label: "State Acts".to_string(),
                endpoint: "/api/acts".to_string(),
                fields: vec![
                    FieldSchema::search("search"),
                    FieldSchema::number("year"),
                    FieldSchema::text("state"),
                    FieldSchema::choice("sort", &ACT_SORTS),
                ],
                defaults: vec![("sort".to_string(), "year_desc".to_string())],
                pagination: PaginationStrategy::Offset,
            },
        ],
        default_section: "central".to_string(),
    }
}

fn mappings() -> PageCatalog {
    let mapping = |id: &str, label: &str| SectionSchema {
        id: id.to_string(),
        label: label.to_string(),
        endpoint: "/api/law-mappings".to_string(),
        fields: vec![
            FieldSchema::search("search"),
            FieldSchema::text("old_section"),
            FieldSchema::text("new_section"),
        ],
        defaults: Vec::new(),
        pagination: PaginationStrategy::Offset,
    };

    PageCatalog {
        page: "mappings".to_string(),
        discriminator: "type".to_string(),
        sections: vec![
            mapping("ipc_bns", "IPC to BNS"),
            mapping("crpc_bnss", "CrPC to BNSS"),
            mapping("iea_bsa", "IEA to BSA"),
        ],
        default_section: "ipc_bns".to_string(),
    }
}

fn judgments() -> PageCatalog {
    let by_date = PaginationStrategy::Cursor(CursorSpec::Dual {
        secondary: "date".to_string(),
    });

    PageCatalog {
        page: "judgments".to_string(),
        discriminator: "court".to_string(),
        sections: vec![
            SectionSchema {
                id: "supreme".to_string(),
                label: "Supreme Court".to_string(),
                endpoint: "/api/judgments".to_string(),
                fields: vec![
                    FieldSchema::search("search"),
                    FieldSchema::text("judge"),
                    FieldSchema::number("year"),
                ],
                defaults: Vec::new(),
                pagination: by_date.clone(),
            },
            SectionSchema {
                id: "high".to_string(),
                label: "High Courts".to_string(),
                endpoint: "/api/judgments".to_string(),
                fields: vec![
                    FieldSchema::search("search"),
                    FieldSchema::text("judge"),
                    FieldSchema::number("year"),
                    FieldSchema::choice(
                        "bench",
                        &["allahabad", "bombay", "calcutta", "delhi", "madras"],
                    ),
                ],
                defaults: Vec::new(),
                pagination: by_date,
            },
            SectionSchema {
                id: "district".to_string(),
                label: "District Courts".to_string(),
                endpoint: "/api/judgments".to_string(),
                fields: vec![FieldSchema::search("search"), FieldSchema::number("year")],
                defaults: Vec::new(),
                pagination: PaginationStrategy::Cursor(CursorSpec::Single),
            },
        ],
        default_section: "supreme".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        for page in BUILTIN_PAGES {
            let catalog = builtin(page).unwrap();
            assert_eq!(catalog.page, page);
            assert!(catalog.section(&catalog.default_section).is_some());
        }
        assert!(matches!(builtin("chatbot"), Err(LexError::UnknownPage(_))));
    }

    #[test]
    fn test_default_section_fallbacks() {
        let mut catalog = builtin("mappings").unwrap();
        catalog.default_section = "repealed".to_string();
        assert_eq!(catalog.default_section().unwrap().id, "ipc_bns");

        catalog.sections.clear();
        assert!(matches!(
            catalog.default_section(),
            Err(LexError::EmptyCatalog(page)) if page == "mappings"
        ));
    }

    #[test]
    fn test_choice_fields_are_not_debounced() {
        let catalog = builtin("acts").unwrap();
        let central = catalog.section("central").unwrap();
        assert!(central.field("search").unwrap().is_debounced());
        assert!(central.field("year").unwrap().is_debounced());
        assert!(!central.field("sort").unwrap().is_debounced());
    }

    #[test]
    fn test_field_parse() {
        let year = FieldSchema::number("year");
        assert_eq!(year.parse("2019").unwrap(), Some(FilterValue::Number(2019)));
        assert_eq!(year.parse("").unwrap(), None);
        assert!(year.parse("twenty").is_err());

        let sort = FieldSchema::choice("sort", &ACT_SORTS);
        assert!(sort.parse("title").unwrap().is_some());
        assert!(matches!(
            sort.parse("random"),
            Err(LexError::InvalidFilterValue { .. })
        ));

        let search = FieldSchema::search("search");
        assert_eq!(search.parse("   ").unwrap(), None);
        assert_eq!(
            search.parse("murder").unwrap(),
            Some(FilterValue::Text("murder".to_string()))
        );
    }

    #[test]
    fn test_default_filters() {
        let catalog = builtin("acts").unwrap();
        let defaults = catalog.section("state").unwrap().default_filters();
        assert_eq!(defaults.get_str("sort").as_deref(), Some("year_desc"));
        assert_eq!(defaults.len(), 1);
    }

    #[test]
    fn test_unknown_section_error() {
        let catalog = builtin("judgments").unwrap();
        let err = catalog.require_section("tribunal").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown section 'tribunal' for page 'judgments'"
        );
    }
}
