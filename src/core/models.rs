//! Data models for bills, bill details and crawl runs.
//!
//! Bill summaries and details are persisted as the raw JSON documents returned by
//! the upstream API. The typed views here are used where the crawlers and the
//! flattener need specific fields.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{BillcrawlError, Result};

/// Field carrying the bill identifier in every upstream document.
pub const BILL_ID_FIELD: &str = "billId";

// =============================================================================
// Source identity and credentials
// =============================================================================

/// The upstream account whose data is fetched: merchant and place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceIdentity {
    pub merchant_id: String,
    pub place_id: String,
}

impl SourceIdentity {
    #[must_use]
    pub fn new(merchant_id: impl Into<String>, place_id: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            place_id: place_id.into(),
        }
    }
}

impl fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.merchant_id, self.place_id)
    }
}

/// Client credentials exchanged for a bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Opaque bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token value.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

// =============================================================================
// Upstream payloads
// =============================================================================

/// One page of the bills listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillsPage {
    /// Bill summaries, newest first.
    #[serde(default)]
    pub data: Vec<Value>,
    /// Continuation cursor; absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
}

impl BillsPage {
    /// Identifier of the last (oldest) summary on the page.
    #[must_use]
    pub fn last_bill_id(&self) -> Option<&str> {
        self.data.last().and_then(bill_id_of)
    }
}

/// Extract `billId` from a raw document.
#[must_use]
pub fn bill_id_of(doc: &Value) -> Option<&str> {
    doc.get(BILL_ID_FIELD).and_then(Value::as_str)
}

/// Extract `billId`, failing when the document has none.
///
/// # Errors
///
/// Returns `ParseResponse` if the document has no string `billId`.
pub fn require_bill_id(doc: &Value) -> Result<&str> {
    bill_id_of(doc).ok_or_else(|| {
        BillcrawlError::ParseResponse(format!("document has no string '{BILL_ID_FIELD}' field"))
    })
}

/// Full detail of a bill, including its line items.
///
/// Scalar fields are kept as JSON values because the upstream mixes strings and
/// numbers for prices and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillDetail {
    pub bill_id: String,
    #[serde(default)]
    pub session_created: Value,
    #[serde(default)]
    pub created_at: Value,
    #[serde(default)]
    pub paid_at: Value,
    #[serde(default)]
    pub final_price: Value,
    #[serde(default)]
    pub final_price_without_tax: Value,
    #[serde(default)]
    pub payment_method: Value,
    #[serde(default)]
    pub created_by: Option<Creator>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<LineItem>,
}

impl BillDetail {
    /// Parse a stored detail document.
    ///
    /// # Errors
    ///
    /// Returns `ParseResponse` if the document is not a bill detail.
    pub fn from_document(doc: &Value) -> Result<Self> {
        if !doc.is_object() {
            return Err(BillcrawlError::ParseResponse(format!(
                "bill detail must be an object, got {}",
                json_kind(doc)
            )));
        }
        Self::deserialize(doc).map_err(|e| {
            let id = bill_id_of(doc).unwrap_or("<unknown>");
            BillcrawlError::ParseResponse(format!("bill detail {id}: {e}"))
        })
    }
}

/// A JSON `null` reads as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// User who created a bill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    #[serde(default)]
    pub user_name: Value,
}

/// One line of a bill. Has no identity outside its bill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub amount: Value,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub vat_rate: Value,
    #[serde(default)]
    pub product_id: Value,
}

// =============================================================================
// Crawl runs
// =============================================================================

/// Which crawler produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlerKind {
    Bills,
    BillDetails,
}

impl CrawlerKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bills => "bills",
            Self::BillDetails => "bill_details",
        }
    }

    /// Parse the stored name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bills" => Some(Self::Bills),
            "bill_details" => Some(Self::BillDetails),
            _ => None,
        }
    }
}

impl fmt::Display for CrawlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a crawler stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The last page carried no continuation cursor.
    Exhausted,
    /// A page ended on an identifier stored before the run.
    CaughtUp,
    /// The upstream answered 401.
    SessionExpired,
    /// Every known bill already had its detail.
    NothingPending,
    /// Every pending detail was fetched.
    Completed,
}

impl StopReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::CaughtUp => "caught_up",
            Self::SessionExpired => "session_expired",
            Self::NothingPending => "nothing_pending",
            Self::Completed => "completed",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "exhausted" => Some(Self::Exhausted),
            "caught_up" => Some(Self::CaughtUp),
            "session_expired" => Some(Self::SessionExpired),
            "nothing_pending" => Some(Self::NothingPending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Whether the run ended before the crawler's natural end.
    #[must_use]
    pub const fn is_partial(self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one crawler run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub crawler: CrawlerKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Successful upstream responses.
    pub requests: usize,
    /// Records actually appended to the store.
    pub records_written: usize,
    pub stop: StopReason,
}

impl CrawlReport {
    /// Run duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
