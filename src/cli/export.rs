//! Export command implementation.

use serde_json::json;

use crate::core::export::export_bill_details;
use crate::error::Result;
use crate::storage::config::ResolvedConfig;
use crate::storage::records::RecordStore;
use crate::util::format_count;

/// Execute the export command. Works offline.
///
/// # Errors
///
/// Returns storage, parse or write errors.
pub fn execute(config: &ResolvedConfig, json: bool) -> Result<()> {
    let store = RecordStore::open(&config.database)?;
    let rows = export_bill_details(&store, &config.export_path)?;

    if json {
        println!(
            "{}",
            json!({"rows": rows, "path": config.export_path.display().to_string()})
        );
    } else {
        println!(
            "Exported {} rows to {}",
            format_count(rows),
            config.export_path.display()
        );
    }
    Ok(())
}
