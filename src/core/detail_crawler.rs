//! Bill-detail crawler: set-difference scheduling with reversed fetch order.
//!
//! The pending set is computed once, before any request: identifiers in the
//! Bill store minus identifiers already in the Bill-Detail store. It is fetched
//! newest first (reverse of Bill store insertion order) so an interrupted run
//! leaves the freshest bills detailed.
//!
//! Requests run with bounded concurrency. A 401 raises a shared flag that is
//! checked right before each request is issued: nothing new goes out after it,
//! while responses already in flight are still stored.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde_json::Value;

use super::api::BillsApi;
use super::models::{CrawlReport, CrawlerKind, StopReason, require_bill_id};
use crate::error::{BillcrawlError, Result};
use crate::storage::records::{Collection, RecordStore};

/// Default number of detail requests in flight.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Identifiers that still need a detail, newest first.
///
/// `available` is in Bill store order. Duplicates in either input never yield
/// duplicate work; the first appearance in `available` fixes an id's position.
#[must_use]
pub fn pending_bill_ids<S: AsRef<str>>(available: &[S], scraped: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(available.len());
    let mut pending: Vec<String> = available
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|id| !scraped.contains(*id) && seen.insert(*id))
        .map(str::to_string)
        .collect();
    pending.reverse();
    pending
}

enum Fetched {
    Detail(String, Value),
    Failed(String, BillcrawlError),
    Skipped,
}

/// Run the bill-detail crawler once.
///
/// # Errors
///
/// A 401 ends the run with [`StopReason::SessionExpired`]. Any other upstream
/// error halts dispatch and is returned once in-flight requests have settled.
/// Record store errors are returned immediately.
pub async fn crawl_details<A: BillsApi>(
    api: &A,
    store: &RecordStore,
    concurrency: usize,
) -> Result<CrawlReport> {
    let started_at = Utc::now();
    let available = store.ids(Collection::Bills)?;
    let scraped: HashSet<String> = store.ids(Collection::BillDetails)?.into_iter().collect();
    let pending = pending_bill_ids(&available, &scraped);

    tracing::info!(
        available = available.len(),
        scraped = scraped.len(),
        pending = pending.len(),
        concurrency,
        "Starting bill detail crawl"
    );

    if pending.is_empty() {
        return Ok(CrawlReport {
            crawler: CrawlerKind::BillDetails,
            started_at,
            finished_at: Utc::now(),
            requests: 0,
            records_written: 0,
            stop: StopReason::NothingPending,
        });
    }

    let halted = AtomicBool::new(false);
    let halted = &halted;

    let mut results = stream::iter(pending)
        .map(|bill_id| async move {
            if halted.load(Ordering::SeqCst) {
                return Fetched::Skipped;
            }
            match api.fetch_bill_detail(&bill_id).await {
                Ok(detail) => Fetched::Detail(bill_id, detail),
                Err(e) => {
                    halted.store(true, Ordering::SeqCst);
                    Fetched::Failed(bill_id, e)
                }
            }
        })
        .buffer_unordered(concurrency.max(1));

    let mut requests = 0usize;
    let mut written = 0usize;
    let mut skipped = 0usize;
    let mut session_expired = false;
    let mut failure: Option<BillcrawlError> = None;

    while let Some(fetched) = results.next().await {
        match fetched {
            Fetched::Detail(bill_id, detail) => {
                requests += 1;
                match require_bill_id(&detail) {
                    Ok(id) if id == bill_id => {
                        if store.insert_one(Collection::BillDetails, &detail)? {
                            written += 1;
                        }
                    }
                    Ok(other) => {
                        halted.store(true, Ordering::SeqCst);
                        failure.get_or_insert(BillcrawlError::ParseResponse(format!(
                            "detail for {bill_id} carries billId {other}"
                        )));
                    }
                    Err(e) => {
                        halted.store(true, Ordering::SeqCst);
                        failure.get_or_insert(e);
                    }
                }
            }
            Fetched::Failed(bill_id, e) if e.is_session_expired() => {
                if !session_expired {
                    tracing::warn!(crawler = "bill_details", bill_id = %bill_id, error = %e, "session expired, stopping crawl");
                }
                session_expired = true;
            }
            Fetched::Failed(bill_id, e) => {
                tracing::error!(crawler = "bill_details", bill_id = %bill_id, error = %e, "Bill detail fetch failed");
                failure.get_or_insert(e);
            }
            Fetched::Skipped => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::info!(skipped, "Left bill details for the next run");
    }

    if let Some(e) = failure {
        if !session_expired {
            tracing::info!(requests, written, "Bill detail crawl halted");
            return Err(e);
        }
        tracing::warn!(error = %e, "Error alongside expired session");
    }

    let stop = if session_expired {
        StopReason::SessionExpired
    } else {
        StopReason::Completed
    };
    tracing::info!(requests, written, stop = %stop, "Bill detail crawl finished");

    Ok(CrawlReport {
        crawler: CrawlerKind::BillDetails,
        started_at,
        finished_at: Utc::now(),
        requests,
        records_written: written,
        stop,
    })
}
