mod browse;
mod config;
mod sections;
mod url;

pub use browse::{BrowseOptions, cmd_browse};
pub use config::{cmd_config_path, cmd_config_show};
pub use sections::cmd_sections;
pub use url::cmd_url;

use owo_colors::OwoColorize;

use crate::remote::Item;

/// Fields tried, in order, as an item's title
const TITLE_FIELDS: [&str; 5] = ["title", "name", "case_name", "short_title", "old_section"];

/// Format a result item for single-line display
pub fn format_item_line(item: &Item) -> String {
    let id = item.id().unwrap_or_else(|| "-".to_string());
    let id_padded = format!("{:10}", id);

    let title = TITLE_FIELDS
        .iter()
        .find_map(|f| item.text(f))
        .unwrap_or_default();

    format!("{} {}", id_padded.cyan(), title)
}

/// Highlight fragments of an item, one indented line each
pub fn format_highlights(item: &Item) -> Vec<String> {
    item.highlights
        .iter()
        .flat_map(|(field, fragments)| {
            fragments
                .iter()
                .map(move |fragment| format!("    {}: {}", field.dimmed(), fragment))
        })
        .collect()
}
