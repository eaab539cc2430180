//! Crawl pipeline.
//!
//! Sequences one process run: obtain the bearer token once, open the record
//! store, run the selected crawlers in order and record each run.

use std::time::Instant;

use super::api::{ApiClient, BillsApi};
use super::auth::TokenProvider;
use super::bill_crawler::crawl_bills;
use super::detail_crawler::crawl_details;
use super::http::build_client;
use super::models::{CrawlReport, StopReason};
use crate::error::Result;
use crate::storage::config::ApiConfig;
use crate::storage::records::RecordStore;

/// Which crawlers to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPlan {
    Bills,
    Details,
    All,
}

impl CrawlPlan {
    const fn includes_bills(self) -> bool {
        matches!(self, Self::Bills | Self::All)
    }

    const fn includes_details(self) -> bool {
        matches!(self, Self::Details | Self::All)
    }
}

/// Authenticate and build the API client.
///
/// # Errors
///
/// Returns `AuthFailed` if no token is obtained, or a network error.
pub async fn connect(api: &ApiConfig) -> Result<ApiClient> {
    let client = build_client(api.timeout)?;
    let token = TokenProvider::new(client.clone(), &api.auth_url, api.credentials.clone())
        .fetch_token()
        .await?;
    Ok(ApiClient::new(
        client,
        &api.base_url,
        api.source.clone(),
        token,
    ))
}

/// Run the planned crawlers against an already authenticated API.
///
/// When the bill crawler stops on an expired session the detail crawler is
/// not started: the token is the same and would be rejected too.
///
/// # Errors
///
/// Returns the first crawler error. Reports of runs that finished before it
/// are already recorded in the store.
pub async fn run_plan<A: BillsApi>(
    api: &A,
    store: &RecordStore,
    plan: CrawlPlan,
    concurrency: usize,
) -> Result<Vec<CrawlReport>> {
    let mut reports = Vec::new();

    if plan.includes_bills() {
        let start = Instant::now();
        let report = crawl_bills(api, store).await?;
        store.record_run(&report)?;
        tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Bill crawler done");
        let expired = report.stop == StopReason::SessionExpired;
        reports.push(report);
        if expired {
            if plan.includes_details() {
                tracing::warn!("Skipping bill detail crawl: session expired");
            }
            return Ok(reports);
        }
    }

    if plan.includes_details() {
        let start = Instant::now();
        let report = crawl_details(api, store, concurrency).await?;
        store.record_run(&report)?;
        tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Bill detail crawler done");
        reports.push(report);
    }

    Ok(reports)
}

/// Authenticate, then run the plan.
///
/// # Errors
///
/// Returns authentication errors before any crawling, then crawler errors.
pub async fn run_crawl(api: &ApiConfig, store: &RecordStore, plan: CrawlPlan) -> Result<Vec<CrawlReport>> {
    tracing::info!(source = %api.source, ?plan, "Starting crawl");
    let client = connect(api).await?;
    run_plan(&client, store, plan, api.concurrency).await
}
