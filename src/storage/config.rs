//! Configuration loading and resolution.
//!
//! Loads an optional TOML file from:
//! - Linux/macOS: `~/.config/billcrawl/config.toml`
//! - Windows: `%APPDATA%/billcrawl/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `MERCHANT_ID`, `PLACE_ID`: source identity (required to crawl)
//! - `CLIENT_ID`, `SECRET`: client credentials (required to crawl, env only)
//! - `BILLCRAWL_API_URL`, `BILLCRAWL_AUTH_URL`: endpoint overrides
//! - `BILLCRAWL_TIMEOUT`: request timeout in seconds
//! - `BILLCRAWL_CONCURRENCY`: bill detail requests in flight
//! - `BILLCRAWL_DATABASE`: record store path
//! - `BILLCRAWL_EXPORT`: export file path
//! - `BILLCRAWL_CONFIG`: override config file path
//!
//! The environment is read once, here. Everything downstream receives a
//! [`ResolvedConfig`] or an [`ApiConfig`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::core::api::DEFAULT_API_BASE;
use crate::core::auth::DEFAULT_AUTH_URL;
use crate::core::detail_crawler::DEFAULT_CONCURRENCY;
use crate::core::models::{Credentials, SourceIdentity};
use crate::error::{BillcrawlError, Result};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Merchant identifier.
pub const ENV_MERCHANT_ID: &str = "MERCHANT_ID";
/// Place identifier.
pub const ENV_PLACE_ID: &str = "PLACE_ID";
/// OAuth client id.
pub const ENV_CLIENT_ID: &str = "CLIENT_ID";
/// OAuth client secret.
pub const ENV_SECRET: &str = "SECRET";
/// API base URL override.
pub const ENV_API_URL: &str = "BILLCRAWL_API_URL";
/// Authentication URL override.
pub const ENV_AUTH_URL: &str = "BILLCRAWL_AUTH_URL";
/// Request timeout in seconds.
pub const ENV_TIMEOUT: &str = "BILLCRAWL_TIMEOUT";
/// Detail crawl concurrency.
pub const ENV_CONCURRENCY: &str = "BILLCRAWL_CONCURRENCY";
/// Record store path.
pub const ENV_DATABASE: &str = "BILLCRAWL_DATABASE";
/// Export file path.
pub const ENV_EXPORT: &str = "BILLCRAWL_EXPORT";
/// Config file path override.
pub const ENV_CONFIG: &str = "BILLCRAWL_CONFIG";

const MAX_TIMEOUT_SECS: u64 = 300;
const MAX_CONCURRENCY: usize = 64;

// =============================================================================
// Config File
// =============================================================================

/// Contents of the config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceSection,
    pub api: ApiSection,
    pub storage: StorageSection,
}

/// `[source]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub merchant_id: Option<String>,
    pub place_id: Option<String>,
}

/// `[api]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: Option<String>,
    pub auth_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub concurrency: Option<usize>,
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub database: Option<PathBuf>,
    pub export_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    /// Returns `ConfigParse` if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let parse_error = |message: String| BillcrawlError::ConfigParse {
            path: path.display().to_string(),
            message,
        };
        let content = fs::read_to_string(path).map_err(|e| parse_error(e.to_string()))?;
        toml::from_str(&content).map_err(|e| parse_error(e.to_string()))
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| BillcrawlError::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content)?;
        Ok(())
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub export_path: Option<PathBuf>,
    pub timeout_seconds: Option<u64>,
    pub concurrency: Option<usize>,
}

/// Settings needed to talk to the upstream API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub source: SourceIdentity,
    pub credentials: Credentials,
    pub base_url: String,
    pub auth_url: String,
    pub timeout: Duration,
    pub concurrency: usize,
}

/// Fully resolved configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub merchant_id: Option<String>,
    pub place_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub base_url: String,
    pub auth_url: String,
    pub timeout: Duration,
    pub concurrency: usize,
    pub database: PathBuf,
    pub export_path: PathBuf,
    /// Where the database path came from.
    pub database_source: ConfigSource,
}

impl ResolvedConfig {
    /// Resolve from CLI overrides, the process environment and the config file.
    ///
    /// # Errors
    /// Returns a configuration error if the config file is invalid or a value
    /// is out of range.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        Self::resolve_with(cli, &AppPaths::new(), |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup and application paths.
    ///
    /// # Errors
    /// Same as [`ResolvedConfig::resolve`].
    pub fn resolve_with<F>(cli: &CliOverrides, paths: &AppPaths, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| {
            env(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let config_path = cli
            .config
            .clone()
            .or_else(|| env(ENV_CONFIG).map(PathBuf::from))
            .unwrap_or_else(|| paths.config_file());
        let file = Config::load_from(&config_path)?;

        let timeout_seconds = match cli.timeout_seconds {
            Some(secs) => secs,
            None => match env(ENV_TIMEOUT) {
                Some(raw) => parse_number(ENV_TIMEOUT, &raw)?,
                None => file
                    .api
                    .timeout_seconds
                    .unwrap_or(crate::core::http::DEFAULT_TIMEOUT.as_secs()),
            },
        };
        if timeout_seconds == 0 || timeout_seconds > MAX_TIMEOUT_SECS {
            return Err(BillcrawlError::ConfigInvalid {
                key: "timeout".to_string(),
                value: timeout_seconds.to_string(),
                message: format!("must be between 1 and {MAX_TIMEOUT_SECS} seconds"),
            });
        }

        let concurrency = match cli.concurrency {
            Some(n) => n,
            None => match env(ENV_CONCURRENCY) {
                Some(raw) => parse_number(ENV_CONCURRENCY, &raw)?,
                None => file.api.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            },
        };
        if concurrency == 0 || concurrency > MAX_CONCURRENCY {
            return Err(BillcrawlError::ConfigInvalid {
                key: "concurrency".to_string(),
                value: concurrency.to_string(),
                message: format!("must be between 1 and {MAX_CONCURRENCY}"),
            });
        }

        let (database, database_source) = if let Some(path) = cli.database.clone() {
            (path, ConfigSource::Cli)
        } else if let Some(path) = env(ENV_DATABASE) {
            (PathBuf::from(path), ConfigSource::Env)
        } else if let Some(path) = file.storage.database.clone() {
            (path, ConfigSource::ConfigFile)
        } else {
            (paths.records_db_file(), ConfigSource::Default)
        };

        let export_path = cli
            .export_path
            .clone()
            .or_else(|| env(ENV_EXPORT).map(PathBuf::from))
            .or_else(|| file.storage.export_path.clone())
            .unwrap_or_else(|| paths.export_file());

        Ok(Self {
            merchant_id: env(ENV_MERCHANT_ID).or(file.source.merchant_id),
            place_id: env(ENV_PLACE_ID).or(file.source.place_id),
            client_id: env(ENV_CLIENT_ID),
            client_secret: env(ENV_SECRET),
            base_url: env(ENV_API_URL)
                .or(file.api.base_url)
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            auth_url: env(ENV_AUTH_URL)
                .or(file.api.auth_url)
                .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            timeout: Duration::from_secs(timeout_seconds),
            concurrency,
            database,
            export_path,
            database_source,
        })
    }

    /// Settings for crawling. Fails fast, naming the first missing value.
    ///
    /// # Errors
    /// Returns `ConfigMissing` if any identity or credential value is absent.
    pub fn api_config(&self) -> Result<ApiConfig> {
        let require = |value: &Option<String>, name: &str| {
            value.clone().ok_or_else(|| BillcrawlError::ConfigMissing {
                name: name.to_string(),
            })
        };

        let merchant_id = require(&self.merchant_id, ENV_MERCHANT_ID)?;
        let place_id = require(&self.place_id, ENV_PLACE_ID)?;
        let client_id = require(&self.client_id, ENV_CLIENT_ID)?;
        let client_secret = require(&self.client_secret, ENV_SECRET)?;

        Ok(ApiConfig {
            source: SourceIdentity::new(merchant_id, place_id),
            credentials: Credentials::new(client_id, client_secret),
            base_url: self.base_url.clone(),
            auth_url: self.auth_url.clone(),
            timeout: self.timeout,
            concurrency: self.concurrency,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse().map_err(|_| BillcrawlError::ConfigInvalid {
        key: key.to_string(),
        value: raw.to_string(),
        message: "expected a positive integer".to_string(),
    })
}
