//! Record store schema and migrations.
//!
//! Versioned SQL files under `migrations/` are applied in order, each inside
//! its own transaction, and recorded in `schema_migrations`.

use rusqlite::Connection;

use crate::error::{BillcrawlError, Result};

const RECORD_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("../../migrations/001_record_collections.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("../../migrations/002_crawl_runs.sql"),
    },
    Migration {
        version: 3,
        sql: include_str!("../../migrations/003_resume_cursors.sql"),
    },
];

/// Latest schema version known to this build.
pub const SCHEMA_VERSION: i32 = 3;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: i32,
    sql: &'static str,
}

/// Run pending migrations. Returns the schema version after the run.
///
/// # Errors
/// Returns an error if reading the current version or applying a migration fails.
pub fn run_migrations(conn: &mut Connection) -> Result<i32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (\
            version INTEGER PRIMARY KEY,\
            applied_at TEXT DEFAULT (datetime('now'))\
        );",
    )
    .map_err(|e| BillcrawlError::Storage(format!("create schema_migrations: {e}")))?;

    let mut current: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| BillcrawlError::Storage(format!("read schema version: {e}")))?;

    for migration in RECORD_MIGRATIONS {
        if migration.version > current {
            apply(conn, migration)?;
            tracing::debug!(version = migration.version, "Applied record store migration");
            current = migration.version;
        }
    }

    Ok(current)
}

fn apply(conn: &mut Connection, migration: &Migration) -> Result<()> {
    let storage = |step: &str, e: rusqlite::Error| {
        BillcrawlError::Storage(format!("{step} migration {}: {e}", migration.version))
    };

    let tx = conn.transaction().map_err(|e| storage("begin", e))?;
    tx.execute_batch(migration.sql)
        .map_err(|e| storage("apply", e))?;
    tx.execute(
        "INSERT INTO schema_migrations (version) VALUES (?1)",
        [migration.version],
    )
    .map_err(|e| storage("record", e))?;
    tx.commit().map_err(|e| storage("commit", e))
}
