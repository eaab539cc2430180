//! Test utilities for billcrawl.
//!
//! Provides document factories, a scripted in-process [`BillsApi`] and
//! temp-directory helpers shared by unit and integration tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use billcrawl::test_utils::*;
//!
//! let api = ScriptedApi::new()
//!     .with_page(make_bills_page(&["b2", "b1"], None));
//! let dir = TestDir::new();
//! dir.create_file("config.toml", "[api]\nconcurrency = 2");
//! ```

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Value, json};

use crate::core::api::BillsApi;
use crate::core::models::BillsPage;
use crate::error::{BillcrawlError, Result};

// =============================================================================
// Document Factories
// =============================================================================

/// Create a bill summary as it appears in a listing page.
#[must_use]
pub fn make_bill_summary(bill_id: &str) -> Value {
    json!({
        "billId": bill_id,
        "createdAt": "2024-03-01T09:15:00Z",
        "paidAt": "2024-03-01T09:20:00Z",
        "finalPrice": "150.00",
        "currencyCode": "CZK"
    })
}

/// Create a bill detail document with `items` line items.
///
/// # Examples
///
/// ```rust,ignore
/// use billcrawl::test_utils::make_bill_detail;
///
/// let detail = make_bill_detail("b1", 3);
/// assert_eq!(detail["items"].as_array().unwrap().len(), 3);
/// ```
#[must_use]
pub fn make_bill_detail(bill_id: &str, items: usize) -> Value {
    let items: Vec<Value> = (0..items)
        .map(|i| {
            json!({
                "name": format!("Item {i}"),
                "amount": 1,
                "price": "50.00",
                "vatRate": 15,
                "productId": format!("p-{i}")
            })
        })
        .collect();

    json!({
        "billId": bill_id,
        "sessionCreated": "2024-03-01T08:00:00Z",
        "createdAt": "2024-03-01T09:15:00Z",
        "paidAt": "2024-03-01T09:20:00Z",
        "finalPrice": "150.00",
        "finalPriceWithoutTax": "130.43",
        "paymentMethod": "cash",
        "createdBy": {"userName": "cashier"},
        "items": items
    })
}

/// Create a listing page from bill ids (newest first) and an optional cursor.
#[must_use]
pub fn make_bills_page(bill_ids: &[&str], next_page: Option<&str>) -> BillsPage {
    BillsPage {
        data: bill_ids.iter().map(|id| make_bill_summary(id)).collect(),
        next_page: next_page.map(str::to_string),
    }
}

// =============================================================================
// Scripted API
// =============================================================================

/// In-process [`BillsApi`] that replays scripted responses and records calls.
///
/// Pages are served in the order they were added; once the script runs out
/// an empty last page is returned. Details default to
/// `make_bill_detail(id, 1)` unless overridden.
#[derive(Default)]
pub struct ScriptedApi {
    pages: Mutex<VecDeque<Result<BillsPage>>>,
    page_cursors: Mutex<Vec<Option<String>>>,
    details: Mutex<HashMap<String, Value>>,
    detail_errors: Mutex<HashMap<String, BillcrawlError>>,
    detail_requests: Mutex<Vec<String>>,
}

impl ScriptedApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a listing page.
    #[must_use]
    pub fn with_page(self, page: BillsPage) -> Self {
        lock(&self.pages).push_back(Ok(page));
        self
    }

    /// Queue a listing failure.
    #[must_use]
    pub fn with_page_error(self, error: BillcrawlError) -> Self {
        lock(&self.pages).push_back(Err(error));
        self
    }

    /// Serve `detail` for `bill_id`.
    #[must_use]
    pub fn with_detail(self, bill_id: &str, detail: Value) -> Self {
        lock(&self.details).insert(bill_id.to_string(), detail);
        self
    }

    /// Fail the request for `bill_id` with `error`.
    #[must_use]
    pub fn with_detail_error(self, bill_id: &str, error: BillcrawlError) -> Self {
        lock(&self.detail_errors).insert(bill_id.to_string(), error);
        self
    }

    /// Cursors passed to each listing request, in order.
    #[must_use]
    pub fn page_cursors(&self) -> Vec<Option<String>> {
        lock(&self.page_cursors).clone()
    }

    /// Number of listing requests issued.
    #[must_use]
    pub fn page_requests(&self) -> usize {
        lock(&self.page_cursors).len()
    }

    /// Bill ids of detail requests, in the order they were issued.
    #[must_use]
    pub fn detail_requests(&self) -> Vec<String> {
        lock(&self.detail_requests).clone()
    }
}

impl BillsApi for ScriptedApi {
    async fn fetch_bills_page(&self, cursor: Option<&str>) -> Result<BillsPage> {
        lock(&self.page_cursors).push(cursor.map(str::to_string));
        lock(&self.pages)
            .pop_front()
            .unwrap_or_else(|| Ok(BillsPage::default()))
    }

    async fn fetch_bill_detail(&self, bill_id: &str) -> Result<Value> {
        lock(&self.detail_requests).push(bill_id.to_string());
        tokio::task::yield_now().await;

        if let Some(error) = lock(&self.detail_errors).remove(bill_id) {
            return Err(error);
        }
        Ok(lock(&self.details)
            .get(bill_id)
            .cloned()
            .unwrap_or_else(|| make_bill_detail(bill_id, 1)))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

// =============================================================================
// Temp Directory Utilities
// =============================================================================

/// A temporary directory for tests with automatic cleanup.
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// Create a new isolated temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file with the given content, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.inner.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
    }

    /// Read a file from the temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        match (&$haystack, $needle) {
            (haystack, needle) => assert!(
                haystack.contains(needle),
                "Expected string to contain {:?}\n\nActual string:\n{:?}",
                needle,
                haystack
            ),
        }
    };
}

/// Assert that a string does NOT contain a substring.
#[macro_export]
macro_rules! assert_not_contains {
    ($haystack:expr, $needle:expr) => {
        match (&$haystack, $needle) {
            (haystack, needle) => assert!(
                !haystack.contains(needle),
                "Expected string NOT to contain {:?}\n\nActual string:\n{:?}",
                needle,
                haystack
            ),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::BillDetail;

    #[test]
    fn bill_detail_factory_parses() {
        let detail = BillDetail::from_document(&make_bill_detail("b1", 2)).unwrap();
        assert_eq!(detail.bill_id, "b1");
        assert_eq!(detail.items.len(), 2);
    }

    #[test]
    fn bills_page_factory_keeps_order() {
        let page = make_bills_page(&["b3", "b2"], Some("next"));
        assert_eq!(page.last_bill_id(), Some("b2"));
        assert_eq!(page.next_page.as_deref(), Some("next"));
    }

    #[tokio::test]
    async fn scripted_api_replays_pages_then_ends() {
        let api = ScriptedApi::new().with_page(make_bills_page(&["b1"], Some("c1")));

        let first = api.fetch_bills_page(None).await.unwrap();
        let second = api.fetch_bills_page(Some("c1")).await.unwrap();

        assert_eq!(first.data.len(), 1);
        assert!(second.data.is_empty());
        assert!(second.next_page.is_none());
        assert_eq!(api.page_cursors(), vec![None, Some("c1".to_string())]);
    }

    #[tokio::test]
    async fn scripted_api_serves_overrides_and_errors_once() {
        let api = ScriptedApi::new().with_detail_error(
            "b2",
            BillcrawlError::Network("reset".to_string()),
        );

        assert!(api.fetch_bill_detail("b2").await.is_err());
        assert!(api.fetch_bill_detail("b2").await.is_ok());
        assert_eq!(api.detail_requests(), vec!["b2", "b2"]);
    }

    #[test]
    fn test_dir_creates_nested_files() {
        let dir = TestDir::new();
        dir.create_file("a/b/c.txt", "hello");
        assert_eq!(dir.read_file("a/b/c.txt").unwrap(), "hello");
        assert_contains!(dir.file_path("a/b/c.txt").to_string_lossy(), "c.txt");
    }
}
