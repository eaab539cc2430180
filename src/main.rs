//! billcrawl - incremental bill and bill-detail crawler.
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use billcrawl::cli::{Cli, Commands};
use billcrawl::core::logging;
use billcrawl::storage::config::ResolvedConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = cli
        .log_level
        .as_deref()
        .and_then(logging::LogLevel::from_arg)
        .or_else(logging::parse_log_level_from_env)
        .unwrap_or_default();
    let log_format = if cli.json_output {
        logging::LogFormat::Json
    } else {
        logging::parse_log_format_from_env().unwrap_or_default()
    };
    let log_file = logging::parse_log_file_from_env();
    logging::init(log_level, log_format, log_file, cli.verbose);

    if !billcrawl::util::env::should_use_color(cli.no_color) {
        colored::control::set_override(false);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), category = %e.category(), "{e}");
            eprintln!("error[{}]: {e}", e.error_code());
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> billcrawl::Result<()> {
    let config = ResolvedConfig::resolve(&cli.overrides())?;
    tracing::debug!(
        database = %config.database.display(),
        database_source = %config.database_source,
        "Resolved configuration"
    );

    match &cli.command {
        Commands::Crawl(args) => billcrawl::cli::crawl::execute(args, &config, cli.json).await,
        Commands::Export(_) => billcrawl::cli::export::execute(&config, cli.json),
        Commands::Status => billcrawl::cli::status::execute(&config, cli.json),
    }
}
