use owo_colors::OwoColorize;

use crate::controller::catalog::{FieldKind, FieldSchema, PageCatalog};
use crate::controller::{CursorSpec, PaginationStrategy, all_builtin, builtin};
use crate::error::Result;

fn describe_strategy(strategy: &PaginationStrategy) -> String {
    match strategy {
        PaginationStrategy::Offset => "offset".to_string(),
        PaginationStrategy::Cursor(CursorSpec::Single) => "cursor(id)".to_string(),
        PaginationStrategy::Cursor(CursorSpec::Dual { secondary }) => {
            format!("cursor(id, {secondary})")
        }
    }
}

fn describe_field(field: &FieldSchema) -> String {
    let kind = match &field.kind {
        FieldKind::Text if field.searchable => "search".to_string(),
        FieldKind::Text => "text".to_string(),
        FieldKind::Number => "number".to_string(),
        FieldKind::Choice(options) => format!("one of {}", options.join("|")),
    };
    format!("{} ({})", field.name, kind)
}

/// List built-in pages with their sections
pub fn cmd_sections(page: Option<&str>, output_json: bool) -> Result<()> {
    let catalogs: Vec<PageCatalog> = match page {
        Some(p) => vec![builtin(p)?],
        None => all_builtin(),
    };

    if output_json {
        println!("{}", serde_json::to_string_pretty(&catalogs)?);
        return Ok(());
    }

    for catalog in &catalogs {
        println!("{}", catalog.to_string().bold());
        for section in &catalog.sections {
            let marker = if section.id == catalog.default_section {
                " (default)".dimmed().to_string()
            } else {
                String::new()
            };
            println!(
                "  {} {}{}  {}",
                section.id.cyan(),
                section.label,
                marker,
                describe_strategy(&section.pagination).dimmed()
            );
            let fields: Vec<String> = section.fields.iter().map(describe_field).collect();
            println!("    {}", fields.join(", "));
        }
        println!();
    }
    Ok(())
}
