//! Upstream API seam.
//!
//! [`BillsApi`] is what the crawlers depend on; [`ApiClient`] implements it over
//! HTTP. [`CredentialedFetcher`] exposes the authorization header and source
//! identity, composed from a token obtained once by the token provider.

use serde_json::Value;

use super::http::{HttpClient, fetch_json};
use super::models::{BearerToken, BillsPage, SourceIdentity};
use crate::error::Result;

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.storyous.com";

/// Capability of issuing authorized requests for one source.
pub trait CredentialedFetcher {
    /// Value for the `Authorization` header.
    fn authorization_header(&self) -> String;

    /// The account whose data is fetched.
    fn source_identity(&self) -> &SourceIdentity;
}

/// Operations the crawlers need from the upstream.
#[allow(async_fn_in_trait)]
pub trait BillsApi {
    /// Fetch one page of bill summaries. `None` requests the first page.
    async fn fetch_bills_page(&self, cursor: Option<&str>) -> Result<BillsPage>;

    /// Fetch the full detail document for one bill.
    async fn fetch_bill_detail(&self, bill_id: &str) -> Result<Value>;
}

/// HTTP implementation of [`BillsApi`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: HttpClient,
    base_url: String,
    source: SourceIdentity,
    token: BearerToken,
}

impl ApiClient {
    #[must_use]
    pub fn new(
        client: HttpClient,
        base_url: impl Into<String>,
        source: SourceIdentity,
        token: BearerToken,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            source,
            token,
        }
    }

    /// URL of a bills page. A relative cursor is resolved against the base URL.
    #[must_use]
    pub fn bills_url(&self, cursor: Option<&str>) -> String {
        match cursor {
            None => format!("{}/bills/{}", self.base_url, self.source),
            Some(c) if c.starts_with("http://") || c.starts_with("https://") => c.to_string(),
            Some(c) => format!("{}/{}", self.base_url, c.trim_start_matches('/')),
        }
    }

    /// URL of one bill's detail.
    #[must_use]
    pub fn detail_url(&self, bill_id: &str) -> String {
        format!("{}/bills/{}/{}", self.base_url, self.source, bill_id)
    }
}

impl CredentialedFetcher for ApiClient {
    fn authorization_header(&self) -> String {
        self.token.header_value()
    }

    fn source_identity(&self) -> &SourceIdentity {
        &self.source
    }
}

impl BillsApi for ApiClient {
    async fn fetch_bills_page(&self, cursor: Option<&str>) -> Result<BillsPage> {
        let url = self.bills_url(cursor);
        tracing::debug!(%url, "GET bills page");
        fetch_json(&self.client, &url, Some(&self.authorization_header())).await
    }

    async fn fetch_bill_detail(&self, bill_id: &str) -> Result<Value> {
        let url = self.detail_url(bill_id);
        tracing::debug!(%url, bill_id, "GET bill detail");
        fetch_json(&self.client, &url, Some(&self.authorization_header())).await
    }
}
