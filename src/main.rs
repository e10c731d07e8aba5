use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use lexscroll::Config;
use lexscroll::cli::{Cli, Commands, ConfigAction};
use lexscroll::commands::{
    BrowseOptions, cmd_browse, cmd_config_path, cmd_config_show, cmd_sections, cmd_url,
};

/// Environment variable holding the log filter (e.g. `lexscroll=debug`)
const LOG_ENV: &str = "LEXSCROLL_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Browse {
            page,
            section,
            filters,
            query,
            pages,
            json,
        } => match Config::load(config_path) {
            Ok(config) => {
                let options = BrowseOptions {
                    page,
                    section,
                    filters,
                    query,
                    pages,
                    json,
                };
                cmd_browse(&config, options).await
            }
            Err(e) => Err(e),
        },
        Commands::Url { page, query, json } => cmd_url(&page, &query, json),
        Commands::Sections { page, json } => cmd_sections(page.as_deref(), json),

        Commands::Config { action } => match action {
            ConfigAction::Show { json } => Config::load(config_path)
                .and_then(|config| cmd_config_show(&config, config_path, json)),
            ConfigAction::Path => cmd_config_path(config_path),
        },
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
