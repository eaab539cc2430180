//! Record store: two append-only collections of raw upstream documents.
//!
//! Documents are keyed by their `billId`. Inserts append or silently ignore a
//! duplicate key, so re-inserting a page or a detail never creates a second
//! record. Identifiers are returned in insertion order.
//!
//! The connection sits behind a mutex so a single store can be shared by
//! concurrent writers.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use crate::core::models::{CrawlReport, CrawlerKind, StopReason, require_bill_id};
use crate::error::{BillcrawlError, Result};
use crate::storage::schema::run_migrations;

/// The two independent collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Bill summaries from the listing endpoint.
    Bills,
    /// Full bill details.
    BillDetails,
}

impl Collection {
    const fn table(self) -> &'static str {
        match self {
            Self::Bills => "bills",
            Self::BillDetails => "bill_details",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.table()
    }
}

/// A crawl run as stored in `crawl_runs`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRun {
    pub id: i64,
    pub report: CrawlReport,
}

/// Record store access layer.
pub struct RecordStore {
    conn: Mutex<Connection>,
}

impl RecordStore {
    /// Create or open a record store at the given path.
    ///
    /// # Errors
    /// Returns an error if the parent directory cannot be created, the database
    /// cannot be opened, or schema migrations fail.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(path)
            .map_err(|e| BillcrawlError::Storage(format!("open {}: {e}", path.display())))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        run_migrations(&mut conn)?;
        tracing::debug!(path = %path.display(), "Opened record store");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory record store (for testing).
    ///
    /// # Errors
    /// Returns an error if the in-memory database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()
            .map_err(|e| BillcrawlError::Storage(format!("open in-memory db: {e}")))?;

        run_migrations(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| BillcrawlError::Storage("record store lock poisoned".to_string()))
    }

    /// Insert one document. Returns whether it was appended (false on a
    /// duplicate `billId`).
    ///
    /// # Errors
    /// Returns `ParseResponse` if the document has no `billId`, or a storage error.
    pub fn insert_one(&self, collection: Collection, doc: &Value) -> Result<bool> {
        let bill_id = require_bill_id(doc)?;
        let document = serde_json::to_string(doc)?;
        let conn = self.lock()?;
        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (bill_id, document) VALUES (?1, ?2)",
                collection.table()
            ),
            params![bill_id, document],
        )?;
        Ok(inserted == 1)
    }

    /// Insert several documents in one transaction. Returns the number appended.
    ///
    /// Every document is validated before anything is written, so a malformed
    /// document leaves the collection untouched.
    ///
    /// # Errors
    /// Returns `ParseResponse` if any document has no `billId`, or a storage error.
    pub fn insert_many(&self, collection: Collection, docs: &[Value]) -> Result<usize> {
        let rows = docs
            .iter()
            .map(|doc| -> Result<(&str, String)> {
                Ok((require_bill_id(doc)?, serde_json::to_string(doc)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut appended = 0;
        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT OR IGNORE INTO {} (bill_id, document) VALUES (?1, ?2)",
                collection.table()
            ))?;
            for (bill_id, document) in &rows {
                appended += stmt.execute(params![bill_id, document])?;
            }
        }
        tx.commit()?;
        Ok(appended)
    }

    /// Whether a `billId` is present in the collection.
    ///
    /// # Errors
    /// Returns a storage error if the query fails.
    pub fn contains(&self, collection: Collection, bill_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE bill_id = ?1", collection.table()),
                [bill_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// All identifiers in insertion order.
    ///
    /// # Errors
    /// Returns a storage error if the query fails.
    pub fn ids(&self, collection: Collection) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT bill_id FROM {} ORDER BY seq",
            collection.table()
        ))?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    /// All documents in insertion order.
    ///
    /// # Errors
    /// Returns a storage error if the query fails, or a JSON error if a stored
    /// document is corrupt.
    pub fn all(&self, collection: Collection) -> Result<Vec<Value>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT document FROM {} ORDER BY seq",
            collection.table()
        ))?;
        let texts = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);
        drop(conn);

        texts
            .iter()
            .map(|text| serde_json::from_str(text).map_err(BillcrawlError::from))
            .collect()
    }

    /// Number of records in the collection.
    ///
    /// # Errors
    /// Returns a storage error if the query fails.
    pub fn count(&self, collection: Collection) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", collection.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Record a finished crawler run.
    ///
    /// # Errors
    /// Returns a storage error if the insert fails.
    pub fn record_run(&self, report: &CrawlReport) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO crawl_runs \
                (crawler, started_at, finished_at, requests, records_written, stop_reason) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                report.crawler.as_str(),
                report.started_at.to_rfc3339(),
                report.finished_at.to_rfc3339(),
                i64::try_from(report.requests).unwrap_or(i64::MAX),
                i64::try_from(report.records_written).unwrap_or(i64::MAX),
                report.stop.as_str(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent run of the given crawler, if any.
    ///
    /// # Errors
    /// Returns a storage error if the query fails or a stored row is malformed.
    pub fn last_run(&self, crawler: CrawlerKind) -> Result<Option<StoredRun>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, crawler, started_at, finished_at, requests, records_written, stop_reason \
                 FROM crawl_runs WHERE crawler = ?1 ORDER BY id DESC LIMIT 1",
                [crawler.as_str()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, crawler, started, finished, requests, written, stop)| {
            let malformed = |what: &str| BillcrawlError::Storage(format!("crawl run {id}: bad {what}"));
            Ok(StoredRun {
                id,
                report: CrawlReport {
                    crawler: CrawlerKind::from_name(&crawler).ok_or_else(|| malformed("crawler"))?,
                    started_at: parse_timestamp(&started).ok_or_else(|| malformed("started_at"))?,
                    finished_at: parse_timestamp(&finished)
                        .ok_or_else(|| malformed("finished_at"))?,
                    requests: usize::try_from(requests).unwrap_or(0),
                    records_written: usize::try_from(written).unwrap_or(0),
                    stop: StopReason::from_name(&stop).ok_or_else(|| malformed("stop_reason"))?,
                },
            })
        })
        .transpose()
    }

    /// Listing cursors still owed by interrupted bill crawls, newest gap first.
    ///
    /// # Errors
    /// Returns a storage error if the query fails.
    pub fn resume_cursors(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare_cached("SELECT cursor FROM bill_resume_cursors ORDER BY position")?;
        let cursors = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(cursors)
    }

    /// Replace the pending resume cursors with `cursors`, kept in the given order.
    ///
    /// # Errors
    /// Returns a storage error if the transaction fails.
    pub fn set_resume_cursors(&self, cursors: &[String]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM bill_resume_cursors", [])?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO bill_resume_cursors (position, cursor) VALUES (?1, ?2)",
            )?;
            for (position, cursor) in cursors.iter().enumerate() {
                stmt.execute(params![i64::try_from(position).unwrap_or(i64::MAX), cursor])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
