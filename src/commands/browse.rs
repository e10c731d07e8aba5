use std::sync::Arc;

use owo_colors::OwoColorize;
use url::form_urlencoded;

use super::{format_highlights, format_item_line};
use crate::config::Config;
use crate::controller::catalog::PageCatalog;
use crate::controller::url::UrlState;
use crate::controller::{
    ControllerDriver, ControllerSettings, MemoryHistory, MemorySectionMemory, UiEvent, builtin,
};
use crate::error::{LexError, Result};
use crate::remote::HttpSearchProvider;

pub struct BrowseOptions {
    pub page: String,
    pub section: Option<String>,
    pub filters: Vec<(String, String)>,
    pub query: String,
    pub pages: u32,
    pub json: bool,
}

/// Starting query string: `--query` overlaid with `--section` and `--filter`.
///
/// Unlike URL values, command-line filters are validated up front.
fn starting_query(catalog: &PageCatalog, options: &BrowseOptions) -> Result<String> {
    let url = UrlState::parse(&options.query);
    let section = match &options.section {
        Some(id) => catalog.require_section(id)?,
        None => match url
            .get(&catalog.discriminator)
            .and_then(|id| catalog.section(id))
        {
            Some(section) => section,
            None => catalog.default_section()?,
        },
    };
    for (key, value) in &options.filters {
        section.require_field(key)?.parse(value)?;
    }

    let overridden = |key: &str| {
        key == catalog.discriminator || options.filters.iter().any(|(k, _)| k == key)
    };

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.append_pair(&catalog.discriminator, &section.id);
    for (key, value) in url.pairs().iter().filter(|(k, _)| !overridden(k)) {
        serializer.append_pair(key, value);
    }
    serializer.extend_pairs(options.filters.iter());
    Ok(serializer.finish())
}

/// Run the controller against the configured API and print what it shows
pub async fn cmd_browse(config: &Config, options: BrowseOptions) -> Result<()> {
    let catalog = builtin(&options.page)?;
    let query = starting_query(&catalog, &options)?;
    let provider = Arc::new(HttpSearchProvider::from_config(&config.api)?);

    let mut driver = ControllerDriver::mount(
        catalog,
        &query,
        ControllerSettings::from(&config.controller),
        provider,
        MemoryHistory::new(),
        MemorySectionMemory::new(),
    )?;
    driver.settle().await;

    for _ in 1..options.pages {
        let controller = driver.controller();
        if !controller.has_more() || controller.failure().is_some() {
            break;
        }
        driver.dispatch(UiEvent::LoadMoreRequested)?;
        driver.settle().await;
    }

    let snapshot = driver.snapshot();
    if let Some(failure) = driver.controller().failure()
        && snapshot.items.is_empty()
    {
        return Err(LexError::Fetch(failure.error.clone()));
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let section = driver.controller().section();
    let total = snapshot
        .total_count
        .map(|t| format!(" of {t}"))
        .unwrap_or_default();
    println!(
        "{} / {}: {} items{}",
        snapshot.page.bold(),
        section.label.bold(),
        snapshot.items.len(),
        total
    );
    if let Some(metadata) = &snapshot.metadata {
        let took = metadata
            .took_ms
            .map(|ms| format!(" in {ms}ms"))
            .unwrap_or_default();
        println!("{}", format!("search: {}{}", metadata.engine, took).dimmed());
    }
    if let Some(url) = driver.history().current() {
        println!("{}", format!("url: ?{url}").dimmed());
    }
    println!();

    for item in &snapshot.items {
        println!("{}", format_item_line(item));
        for line in format_highlights(item) {
            println!("{line}");
        }
    }

    if let Some(error) = &snapshot.error {
        eprintln!(
            "{} loading more failed ({}): {}",
            "warning:".yellow(),
            error.kind,
            error.message
        );
    } else if snapshot.has_more {
        println!("{}", "more results available (use --pages)".dimmed());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(query: &str, section: Option<&str>, filters: &[(&str, &str)]) -> BrowseOptions {
        BrowseOptions {
            page: "judgments".to_string(),
            section: section.map(str::to_string),
            filters: filters
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            query: query.to_string(),
            pages: 1,
            json: false,
        }
    }

    #[test]
    fn test_starting_query_overlays_flags() {
        let catalog = builtin("judgments").unwrap();
        let query = starting_query(
            &catalog,
            &options("court=supreme&search=old&ref=x", Some("high"), &[("search", "bail")]),
        )
        .unwrap();
        assert_eq!(query, "court=high&ref=x&search=bail");
    }

    #[test]
    fn test_starting_query_rejects_bad_filters() {
        let catalog = builtin("judgments").unwrap();
        let err = starting_query(&catalog, &options("", Some("district"), &[("judge", "x")]))
            .unwrap_err();
        assert!(matches!(err, LexError::UnknownField { .. }));

        let err = starting_query(&catalog, &options("", None, &[("year", "recent")])).unwrap_err();
        assert!(matches!(err, LexError::InvalidFilterValue { .. }));

        let err = starting_query(&catalog, &options("", Some("tribunal"), &[])).unwrap_err();
        assert!(matches!(err, LexError::UnknownSection { .. }));
    }
}
