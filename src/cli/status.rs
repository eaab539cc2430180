//! Status command implementation.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::core::detail_crawler::pending_bill_ids;
use crate::core::models::{CrawlerKind, StopReason};
use crate::error::Result;
use crate::storage::config::ResolvedConfig;
use crate::storage::records::{Collection, RecordStore};
use crate::util::{format_count, format_relative_time};

/// Snapshot of the record store.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub database: String,
    pub bills: usize,
    pub bill_details: usize,
    pub pending_details: usize,
    pub last_runs: Vec<LastRun>,
}

/// Most recent run of one crawler.
#[derive(Debug, Clone, Serialize)]
pub struct LastRun {
    pub crawler: CrawlerKind,
    pub finished_at: DateTime<Utc>,
    pub records_written: usize,
    pub stop: StopReason,
}

/// Collect the status of a store.
///
/// # Errors
///
/// Returns storage errors.
pub fn collect(store: &RecordStore, database: &Path) -> Result<StoreStatus> {
    let bills = store.ids(Collection::Bills)?;
    let scraped: HashSet<String> = store.ids(Collection::BillDetails)?.into_iter().collect();
    let pending_details = pending_bill_ids(&bills, &scraped).len();

    let mut last_runs = Vec::new();
    for crawler in [CrawlerKind::Bills, CrawlerKind::BillDetails] {
        if let Some(run) = store.last_run(crawler)? {
            last_runs.push(LastRun {
                crawler,
                finished_at: run.report.finished_at,
                records_written: run.report.records_written,
                stop: run.report.stop,
            });
        }
    }

    Ok(StoreStatus {
        database: database.display().to_string(),
        bills: bills.len(),
        bill_details: store.count(Collection::BillDetails)?,
        pending_details,
        last_runs,
    })
}

/// Render a status for stdout.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(status: &StoreStatus, json: bool) -> Result<String> {
    if json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(status)?));
    }

    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "Database:".bold(), status.database);
    let _ = writeln!(out, "  bills         {:>10}", format_count(status.bills));
    let _ = writeln!(out, "  bill_details  {:>10}", format_count(status.bill_details));
    let pending = format_count(status.pending_details);
    let pending = if status.pending_details > 0 {
        pending.yellow()
    } else {
        pending.green()
    };
    let _ = writeln!(out, "  pending       {pending:>10}");

    if status.last_runs.is_empty() {
        let _ = writeln!(out, "No crawls recorded yet.");
    }
    for run in &status.last_runs {
        let _ = writeln!(
            out,
            "Last {} run: {} ({} new, {})",
            run.crawler,
            format_relative_time(run.finished_at),
            format_count(run.records_written),
            run.stop,
        );
    }
    Ok(out)
}

/// Execute the status command. Works offline.
///
/// # Errors
///
/// Returns storage errors.
pub fn execute(config: &ResolvedConfig, json: bool) -> Result<()> {
    let store = RecordStore::open(&config.database)?;
    let status = collect(&store, &config.database)?;
    print!("{}", render(&status, json)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::CrawlReport;
    use crate::test_utils::{make_bill_detail, make_bill_summary};

    fn seeded_store() -> RecordStore {
        let store = RecordStore::open_in_memory().unwrap();
        let bills: Vec<_> = ["b1", "b2", "b3"].iter().map(|id| make_bill_summary(id)).collect();
        store.insert_many(Collection::Bills, &bills).unwrap();
        store
            .insert_one(Collection::BillDetails, &make_bill_detail("b2", 1))
            .unwrap();
        store
    }

    #[test]
    fn counts_and_pending() {
        let store = seeded_store();
        let status = collect(&store, Path::new("mem")).unwrap();

        assert_eq!(status.bills, 3);
        assert_eq!(status.bill_details, 1);
        assert_eq!(status.pending_details, 2);
        assert!(status.last_runs.is_empty());
    }

    #[test]
    fn last_runs_are_reported() {
        let store = seeded_store();
        let now = Utc::now();
        store
            .record_run(&CrawlReport {
                crawler: CrawlerKind::Bills,
                started_at: now,
                finished_at: now,
                requests: 1,
                records_written: 3,
                stop: StopReason::Exhausted,
            })
            .unwrap();

        let status = collect(&store, Path::new("mem")).unwrap();
        assert_eq!(status.last_runs.len(), 1);
        assert_eq!(status.last_runs[0].crawler, CrawlerKind::Bills);

        colored::control::set_override(false);
        let out = render(&status, false).unwrap();
        assert!(out.contains("Last bills run: just now (3 new, exhausted)"));
    }

    #[test]
    fn json_status_has_counts() {
        let store = seeded_store();
        let status = collect(&store, Path::new("mem")).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&render(&status, true).unwrap()).unwrap();
        assert_eq!(parsed["bills"], 3);
        assert_eq!(parsed["pending_details"], 2);
    }
}
