//! Error types for billcrawl.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! - **Configuration**: missing or invalid identity, credential or tuning values
//! - **Authentication**: the credential exchange did not yield a token
//! - **Session**: the upstream answered 401 while crawling
//! - **Network**: timeouts, connection failures and other non-success statuses
//! - **Data**: responses or stored documents that do not have the expected shape
//! - **Storage**: record store and export failures
//! - **Internal**: I/O, JSON and unclassified errors
//!
//! Each error has a stable error code (e.g., `BILL-A001`) for programmatic handling.
//!
//! A [`BillcrawlError::SessionExpired`] never leaves a crawler: the crawlers catch it
//! and turn it into a clean stop. It is part of this enum because the HTTP layer
//! produces it and the crawlers match on it.

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing or invalid configuration.
    Configuration,
    /// Token exchange failures.
    Authentication,
    /// Bearer token rejected mid-run.
    Session,
    /// Transient transport or HTTP failures.
    Network,
    /// Unexpected payload shape.
    Data,
    /// Record store or export failures.
    Storage,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Configuration error",
            Self::Authentication => "Authentication error",
            Self::Session => "Session expired",
            Self::Network => "Network error",
            Self::Data => "Data error",
            Self::Storage => "Storage error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Configuration => "C",
            Self::Authentication => "A",
            Self::Session => "S",
            Self::Network => "N",
            Self::Data => "D",
            Self::Storage => "R",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success, including a crawl stopped by an expired session.
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Missing or invalid configuration
    ConfigError = 2,
    /// Credential exchange failed
    AuthError = 3,
    /// Timeout
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

/// Main error type for billcrawl operations.
#[derive(Error, Debug)]
pub enum BillcrawlError {
    // ==========================================================================
    // Configuration errors
    // ==========================================================================
    /// A required identity or credential value was not supplied.
    #[error("required configuration value not set: {name}")]
    ConfigMissing { name: String },

    /// A configuration value could not be used.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid {
        key: String,
        value: String,
        message: String,
    },

    /// The config file exists but could not be read or parsed.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    // ==========================================================================
    // Authentication errors
    // ==========================================================================
    /// The client-credentials exchange did not produce a bearer token.
    #[error("authentication failed: {reason}")]
    AuthFailed { reason: String },

    // ==========================================================================
    // Session errors
    // ==========================================================================
    /// The upstream rejected the bearer token (HTTP 401).
    #[error("session expired (HTTP 401) for {url}")]
    SessionExpired { url: String },

    // ==========================================================================
    // Network errors
    // ==========================================================================
    /// Request timeout.
    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Non-success status other than 401.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    // ==========================================================================
    // Data errors
    // ==========================================================================
    /// Failed to parse an upstream response or a stored document.
    #[error("failed to parse response: {0}")]
    ParseResponse(String),

    // ==========================================================================
    // Storage errors
    // ==========================================================================
    /// Record store failure.
    #[error("record store error: {0}")]
    Storage(String),

    /// Export file could not be written.
    #[error("export failed: {0}")]
    Export(String),

    // ==========================================================================
    // Internal errors
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for BillcrawlError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<csv::Error> for BillcrawlError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

impl BillcrawlError {
    /// Map error to process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self.category() {
            ErrorCategory::Configuration => ExitCode::ConfigError,
            ErrorCategory::Authentication => ExitCode::AuthError,
            ErrorCategory::Network if matches!(self, Self::Timeout(_)) => ExitCode::Timeout,
            ErrorCategory::Session => ExitCode::Success,
            _ => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigMissing { .. }
            | Self::ConfigInvalid { .. }
            | Self::ConfigParse { .. }
            | Self::Config(_) => ErrorCategory::Configuration,

            Self::AuthFailed { .. } => ErrorCategory::Authentication,

            Self::SessionExpired { .. } => ErrorCategory::Session,

            Self::Timeout(_) | Self::Network(_) | Self::HttpStatus { .. } => ErrorCategory::Network,

            Self::ParseResponse(_) => ErrorCategory::Data,

            Self::Storage(_) | Self::Export(_) => ErrorCategory::Storage,

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `BILL-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigMissing { .. } => "BILL-C001",
            Self::ConfigInvalid { .. } => "BILL-C002",
            Self::ConfigParse { .. } => "BILL-C003",
            Self::Config(_) => "BILL-C099",

            Self::AuthFailed { .. } => "BILL-A001",

            Self::SessionExpired { .. } => "BILL-S001",

            Self::Timeout(_) => "BILL-N001",
            Self::HttpStatus { .. } => "BILL-N002",
            Self::Network(_) => "BILL-N099",

            Self::ParseResponse(_) => "BILL-D001",

            Self::Storage(_) => "BILL-R001",
            Self::Export(_) => "BILL-R002",

            Self::Io(_) => "BILL-X001",
            Self::Json(_) => "BILL-X002",
            Self::Other(_) => "BILL-X099",
        }
    }

    /// True for the 401 condition that ends a crawl cleanly.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }

    /// Returns whether the error is potentially recoverable by retrying.
    ///
    /// Session expiry is excluded: retrying with the same token cannot succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns the HTTP status associated with this error, if any.
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        match self {
            Self::SessionExpired { .. } => Some(401),
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias using `BillcrawlError`.
pub type Result<T> = std::result::Result<T, BillcrawlError>;
