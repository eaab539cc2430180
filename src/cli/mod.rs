//! CLI argument parsing and command dispatch.

pub mod args;
pub mod crawl;
pub mod export;
pub mod status;

pub use args::{Cli, Commands, CrawlArgs, CrawlTarget, ExportArgs};
