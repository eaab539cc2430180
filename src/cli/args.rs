//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::pipeline::CrawlPlan;
use crate::storage::config::CliOverrides;

/// Incremental bill and bill-detail crawler.
#[derive(Parser, Debug)]
#[command(name = "billcrawl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // === Global flags ===
    /// Config file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Record store database path
    #[arg(long, value_name = "PATH", global = true)]
    pub database: Option<PathBuf>,

    /// Print command summaries as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Configuration values given on the command line.
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides {
            config: self.config.clone(),
            database: self.database.clone(),
            ..CliOverrides::default()
        };
        match &self.command {
            Commands::Crawl(args) => {
                overrides.timeout_seconds = args.timeout;
                overrides.concurrency = args.concurrency;
            }
            Commands::Export(args) => overrides.export_path.clone_from(&args.output),
            Commands::Status => {}
        }
        overrides
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch new bills and/or missing bill details
    Crawl(CrawlArgs),

    /// Flatten stored bill details into a CSV file
    Export(ExportArgs),

    /// Show record counts and the last run of each crawler
    Status,
}

/// Arguments for the `crawl` command.
#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Which crawler to run
    #[arg(value_enum, default_value = "all")]
    pub target: CrawlTarget,

    /// Bill detail requests in flight
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

/// Arguments for the `export` command.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output CSV path
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Crawl target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CrawlTarget {
    /// Bill summaries only
    Bills,
    /// Bill details for known bills only
    Details,
    /// Bills, then details
    All,
}

impl From<CrawlTarget> for CrawlPlan {
    fn from(target: CrawlTarget) -> Self {
        match target {
            CrawlTarget::Bills => Self::Bills,
            CrawlTarget::Details => Self::Details,
            CrawlTarget::All => Self::All,
        }
    }
}
