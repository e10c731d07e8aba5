use owo_colors::OwoColorize;
use serde_json::json;

use crate::controller::url::normalize;
use crate::controller::{ControllerSettings, SearchController, builtin};
use crate::error::Result;

/// Show the query string the controller writes back for an incoming URL
pub fn cmd_url(page: &str, query: &str, output_json: bool) -> Result<()> {
    let catalog = builtin(page)?;
    let (controller, _) =
        SearchController::mount(catalog, query, None, ControllerSettings::default())?;

    let canonical = controller.current_url();
    let rewritten = canonical != normalize(query);

    if output_json {
        let output = json!({
            "page": page,
            "section": controller.section().id,
            "input": query,
            "canonical": canonical,
            "rewritten": rewritten,
            "filters": controller.filters(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("?{canonical}");
    if rewritten {
        println!("{}", "(rewritten from input)".dimmed());
    }
    Ok(())
}
