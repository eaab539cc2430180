//! Crawl command implementation.

use std::fmt::Write as _;

use colored::Colorize;

use crate::cli::args::CrawlArgs;
use crate::core::models::{CrawlReport, StopReason};
use crate::core::pipeline::run_crawl;
use crate::error::Result;
use crate::storage::config::ResolvedConfig;
use crate::storage::records::RecordStore;
use crate::util::{format_count, format_duration_ms};

/// Execute the crawl command.
///
/// Credentials are checked before the record store is opened.
///
/// # Errors
///
/// Returns configuration, authentication, upstream or storage errors. A crawl
/// stopped by an expired session is not an error.
pub async fn execute(args: &CrawlArgs, config: &ResolvedConfig, json: bool) -> Result<()> {
    let api = config.api_config()?;
    let store = RecordStore::open(&config.database)?;

    let reports = run_crawl(&api, &store, args.target.into()).await?;
    print!("{}", render(&reports, json)?);
    Ok(())
}

/// Render crawl reports for stdout.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(reports: &[CrawlReport], json: bool) -> Result<String> {
    if json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(reports)?));
    }

    let mut out = String::new();
    for report in reports {
        let stop = match report.stop {
            StopReason::SessionExpired => report.stop.as_str().yellow().bold(),
            _ => report.stop.as_str().green(),
        };
        let _ = writeln!(
            out,
            "{:<13} {:>8} new  ({} requests, {}, {})",
            report.crawler.as_str().bold(),
            format_count(report.records_written),
            format_count(report.requests),
            stop,
            format_duration_ms(report.duration_ms()),
        );
    }
    if reports.iter().any(|r| r.stop.is_partial()) {
        let _ = writeln!(out, "Session expired; run again to continue.");
    }
    Ok(out)
}
