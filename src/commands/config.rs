//! Configuration commands.
//!
//! - `config show`: Display the effective configuration, token redacted
//! - `config path`: Print where the config file lives

use std::path::Path;

use owo_colors::OwoColorize;
use serde_json::json;

use crate::config::{API_TOKEN_ENV, API_URL_ENV, Config};
use crate::error::{LexError, Result};

/// Show current configuration
pub fn cmd_config_show(config: &Config, path: Option<&Path>, output_json: bool) -> Result<()> {
    let base_url = config.api.base_url()?;
    let token_configured = config.api.token().is_some();
    let path = path.map(Path::to_path_buf).or_else(Config::default_path);

    if output_json {
        let output = json!({
            "api": {
                "base_url": base_url.as_str(),
                "token_configured": token_configured,
                "timeout_secs": config.api.timeout_secs,
                "connect_timeout_secs": config.api.connect_timeout_secs,
            },
            "controller": config.controller,
            "config_file": path.map(|p| p.to_string_lossy().into_owned()),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}\n", "Configuration:".cyan().bold());
    print!("{}", config.to_redacted_yaml()?);
    println!();

    let token_status = if token_configured {
        "configured".green().to_string()
    } else {
        "not configured".dimmed().to_string()
    };
    println!("{}: {}", "effective base_url".cyan(), base_url);
    println!("{}: {}", "token".cyan(), token_status);
    println!(
        "{}",
        format!("Environment overrides: {API_URL_ENV}, {API_TOKEN_ENV}").dimmed()
    );
    if let Some(p) = path {
        println!("{}", format!("Config file: {}", p.display()).dimmed());
    }
    Ok(())
}

/// Print the config file path
pub fn cmd_config_path(path: Option<&Path>) -> Result<()> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(Config::default_path)
        .ok_or_else(|| LexError::Config("no config directory on this platform".to_string()))?;
    println!("{}", path.display());
    Ok(())
}
