//! Storage for configuration and crawled records.

pub mod config;
pub mod paths;
pub mod records;
pub mod schema;

pub use config::{ApiConfig, CliOverrides, Config, ConfigSource, ResolvedConfig};
pub use paths::AppPaths;
pub use records::{Collection, RecordStore, StoredRun};
pub use schema::run_migrations;
