//! Upstream fixtures and wiremock helpers.
//!
//! A [`FakeUpstream`] serves the authorization endpoint and the bills API from
//! one mock server. Listing cursors are path based (`/bills/{source}/page/N`)
//! so every page has its own exact path.
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use billcrawl::core::models::{Credentials, SourceIdentity};
use billcrawl::storage::config::ApiConfig;
pub use billcrawl::test_utils::{make_bill_detail, make_bill_summary};

pub const MERCHANT: &str = "m1";
pub const PLACE: &str = "p1";
pub const SOURCE: &str = "m1-p1";
pub const TOKEN: &str = "test-token";
pub const AUTH_PATH: &str = "/api/auth/authorize";

// =============================================================================
// Fixture Loading
// =============================================================================

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Load a JSON fixture from `tests/fixtures/`.
///
/// # Panics
///
/// Panics if the file cannot be read or parsed.
pub fn load_fixture<T: DeserializeOwned>(name: &str) -> T {
    let full_path = fixtures_dir().join(name);
    let content = fs::read_to_string(&full_path)
        .unwrap_or_else(|e| panic!("read fixture {}: {e}", full_path.display()));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("parse fixture {}: {e}", full_path.display()))
}

// =============================================================================
// Fake Upstream
// =============================================================================

/// Path of listing page `n` (1-based). Page 1 is the listing root.
pub fn page_path(n: usize) -> String {
    if n <= 1 {
        format!("/bills/{SOURCE}")
    } else {
        format!("/bills/{SOURCE}/page/{n}")
    }
}

/// Path of one bill's detail.
pub fn detail_path(bill_id: &str) -> String {
    format!("/bills/{SOURCE}/{bill_id}")
}

/// Body of a listing page.
pub fn page_body(bill_ids: &[&str], next_page: Option<usize>) -> Value {
    let data: Vec<Value> = bill_ids.iter().map(|id| make_bill_summary(id)).collect();
    match next_page {
        Some(n) => json!({"data": data, "nextPage": page_path(n)}),
        None => json!({"data": data}),
    }
}

pub struct FakeUpstream {
    pub server: MockServer,
}

impl FakeUpstream {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// API settings pointing at this server.
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            source: SourceIdentity::new(MERCHANT, PLACE),
            credentials: Credentials::new("client-id", "client-secret"),
            base_url: self.uri(),
            auth_url: format!("{}{AUTH_PATH}", self.uri()),
            timeout: Duration::from_secs(5),
            concurrency: 1,
        }
    }

    /// Issue `TOKEN` for the client-credentials exchange, exactly once.
    pub async fn mount_token(&self) {
        Mock::given(method("POST"))
            .and(path(AUTH_PATH))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client-id"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": TOKEN, "token_type": "bearer"})),
            )
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Serve listing page `n`, expecting exactly `hits` requests.
    pub async fn mount_page(&self, n: usize, bill_ids: &[&str], next: Option<usize>, hits: u64) {
        Mock::given(method("GET"))
            .and(path(page_path(n)))
            .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(bill_ids, next)))
            .expect(hits)
            .mount(&self.server)
            .await;
    }

    /// Answer listing page `n` with `status`.
    pub async fn mount_page_status(&self, n: usize, status: u16, hits: u64) {
        Mock::given(method("GET"))
            .and(path(page_path(n)))
            .respond_with(ResponseTemplate::new(status))
            .expect(hits)
            .mount(&self.server)
            .await;
    }

    /// Serve a detail with `items` line items, expecting exactly `hits` requests.
    pub async fn mount_detail(&self, bill_id: &str, items: usize, hits: u64) {
        Mock::given(method("GET"))
            .and(path(detail_path(bill_id)))
            .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(make_bill_detail(bill_id, items)))
            .expect(hits)
            .mount(&self.server)
            .await;
    }

    /// Answer a detail request with `status`.
    pub async fn mount_detail_status(&self, bill_id: &str, status: u16, hits: u64) {
        Mock::given(method("GET"))
            .and(path(detail_path(bill_id)))
            .respond_with(ResponseTemplate::new(status))
            .expect(hits)
            .mount(&self.server)
            .await;
    }

    /// Paths of requests received so far, in arrival order, excluding the token exchange.
    pub async fn api_paths(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.url.path().to_string())
            .filter(|p| p != AUTH_PATH)
            .collect()
    }
}
