//! Tabular export of the bill-detail collection.

use std::io::Write;
use std::path::Path;

use csv::Writer;

use super::flatten::{BillRow, COLUMNS, flatten_documents};
use crate::error::{BillcrawlError, Result};
use crate::storage::records::{Collection, RecordStore};

/// Write rows as CSV with a header row.
///
/// # Errors
///
/// Returns `Export` if writing fails.
pub fn write_csv<W: Write>(rows: &[BillRow], out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(COLUMNS)?;
    for row in rows {
        writer.write_record(row.cells())?;
    }
    writer
        .flush()
        .map_err(|e| BillcrawlError::Export(e.to_string()))
}

/// Flatten every stored bill detail and write it to `path`.
///
/// Returns the number of rows written (excluding the header).
///
/// # Errors
///
/// Returns an error if the store cannot be read, a document is malformed, or
/// the file cannot be written.
pub fn export_bill_details(store: &RecordStore, path: &Path) -> Result<usize> {
    let docs = store.all(Collection::BillDetails)?;
    let rows = flatten_documents(&docs)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = std::fs::File::create(path)
        .map_err(|e| BillcrawlError::Export(format!("create {}: {e}", path.display())))?;
    write_csv(&rows, file)?;

    tracing::info!(
        details = docs.len(),
        rows = rows.len(),
        path = %path.display(),
        "Exported bill details"
    );
    Ok(rows.len())
}
