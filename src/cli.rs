use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lexscroll")]
#[command(about = "Incremental search and pagination over legal-research list pages")]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a list page through the controller and print the results
    #[command(visible_alias = "b")]
    Browse {
        /// Page: acts, mappings, judgments
        page: String,

        /// Section (discriminator value), e.g. 'high' on judgments
        #[arg(short, long)]
        section: Option<String>,

        /// Filter as key=value (repeatable)
        #[arg(short, long = "filter", value_parser = parse_key_val)]
        filters: Vec<(String, String)>,

        /// Starting URL query string, as a browser would have it
        #[arg(short, long, default_value = "")]
        query: String,

        /// Number of pages to load (1 = fresh fetch only)
        #[arg(
            short = 'n',
            long,
            default_value_t = 1,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        pages: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical URL query string for a page
    Url {
        /// Page: acts, mappings, judgments
        page: String,

        /// Incoming query string
        #[arg(default_value = "")]
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List pages, sections, filter fields and pagination strategies
    Sections {
        /// Only this page
        page: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (token redacted)
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the config file path
    Path,
}

/// Parse `key=value`
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
