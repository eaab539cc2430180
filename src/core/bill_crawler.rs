//! Bill crawler: incremental pagination with early stop.
//!
//! Pages are requested newest first, strictly one after another since each
//! cursor comes from the previous page. Every page is written in full. The
//! crawl stops at the catch-up point: when the last (oldest) summary of a page
//! was already stored before this run began. Only the last summary is checked,
//! so a page that merely starts with known bills does not stop the crawl.
//!
//! A run cut short by a 401 or another error leaves a gap below the pages it
//! stored. The cursor it was about to request is saved in the record store,
//! and once a later run reaches its catch-up point it continues from the saved
//! cursors, newest gap first, each segment ending at its own catch-up point.
//! Reaching the end of the listing settles every gap.

use std::collections::{HashSet, VecDeque};

use chrono::Utc;

use super::api::BillsApi;
use super::models::{CrawlReport, CrawlerKind, StopReason};
use crate::error::Result;
use crate::storage::records::{Collection, RecordStore};

/// Run the bill crawler once.
///
/// A 401 from the upstream ends the run with [`StopReason::SessionExpired`];
/// whatever was written before stays written, and the next run resumes below it.
///
/// # Errors
///
/// Returns any other upstream error, or a record store error.
pub async fn crawl_bills<A: BillsApi>(api: &A, store: &RecordStore) -> Result<CrawlReport> {
    let started_at = Utc::now();
    let known: HashSet<String> = store.ids(Collection::Bills)?.into_iter().collect();
    let mut gaps: VecDeque<String> = store.resume_cursors()?.into();

    tracing::info!(known = known.len(), gaps = gaps.len(), "Starting bill crawl");

    let mut cursor: Option<String> = None;
    let mut pages = 0usize;
    let mut written = 0usize;

    let stop = loop {
        let fetched = api.fetch_bills_page(cursor.as_deref()).await;
        let page = match fetched {
            Ok(page) => page,
            Err(e) if e.is_session_expired() => {
                tracing::warn!(crawler = "bills", pages, error = %e, "session expired, stopping crawl");
                save_gaps(store, cursor, gaps)?;
                break StopReason::SessionExpired;
            }
            Err(e) => {
                tracing::error!(crawler = "bills", pages, error = %e, "Bill page fetch failed");
                save_gaps(store, cursor, gaps)?;
                return Err(e);
            }
        };
        pages += 1;

        let appended = match store.insert_many(Collection::Bills, &page.data) {
            Ok(appended) => appended,
            Err(e) => {
                save_gaps(store, cursor, gaps)?;
                return Err(e);
            }
        };
        written += appended;
        tracing::debug!(page = pages, summaries = page.data.len(), appended, "Stored bills page");

        if let Some(last) = page.last_bill_id() {
            if known.contains(last) {
                tracing::info!(page = pages, bill_id = last, "Reached catch-up point");
                if let Some(resume) = gaps.pop_front() {
                    tracing::info!(cursor = %resume, "Resuming interrupted crawl");
                    cursor = Some(resume);
                    continue;
                }
                store.set_resume_cursors(&[])?;
                break StopReason::CaughtUp;
            }
        }

        match page.next_page {
            Some(next) => cursor = Some(next),
            None => {
                store.set_resume_cursors(&[])?;
                break StopReason::Exhausted;
            }
        }
    };

    let report = CrawlReport {
        crawler: CrawlerKind::Bills,
        started_at,
        finished_at: Utc::now(),
        requests: pages,
        records_written: written,
        stop,
    };
    tracing::info!(pages, written, stop = %stop, "Bill crawl finished");
    Ok(report)
}

/// Persist the gaps still owed: the interrupted position (if it was past the
/// first page) ahead of the older gaps not yet reached.
fn save_gaps(
    store: &RecordStore,
    interrupted: Option<String>,
    gaps: VecDeque<String>,
) -> Result<()> {
    let pending: Vec<String> = interrupted.into_iter().chain(gaps).collect();
    store.set_resume_cursors(&pending)
}
