//! HTTP client utilities.
//!
//! Provides the shared HTTP client and the JSON fetch used by the token
//! provider and both crawlers. A 401 is classified as
//! [`BillcrawlError::SessionExpired`]; every other non-success status is
//! [`BillcrawlError::HttpStatus`].

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};

use crate::error::{BillcrawlError, Result};

/// Default timeout for HTTP requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A `reqwest` client together with the request timeout it was built with.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        self.inner.get(url)
    }

    pub(crate) fn post(&self, url: &str) -> RequestBuilder {
        self.inner.post(url)
    }

    /// Map a transport error to the error taxonomy.
    pub(crate) fn send_error(&self, e: &reqwest::Error) -> BillcrawlError {
        if e.is_timeout() {
            BillcrawlError::Timeout(self.timeout.as_secs())
        } else {
            BillcrawlError::Network(e.to_string())
        }
    }
}

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration) -> Result<HttpClient> {
    let inner = ClientBuilder::new()
        .timeout(timeout)
        .user_agent(format!("billcrawl/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| BillcrawlError::Network(e.to_string()))?;
    Ok(HttpClient { inner, timeout })
}

/// Get or create a default HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn default_client() -> Result<HttpClient> {
    build_client(DEFAULT_TIMEOUT)
}

/// Fetch JSON from a URL, optionally with an `Authorization` header.
///
/// # Errors
///
/// Returns `SessionExpired` on 401, `HttpStatus` on other non-success
/// statuses, `Timeout`/`Network` on transport failure and `ParseResponse`
/// when the body is not the expected JSON.
pub async fn fetch_json<T: serde::de::DeserializeOwned>(
    client: &HttpClient,
    url: &str,
    authorization: Option<&str>,
) -> Result<T> {
    let mut request = client.get(url);
    if let Some(value) = authorization {
        request = request.header(AUTHORIZATION, value);
    }

    let response = request.send().await.map_err(|e| client.send_error(&e))?;
    let response = check_status(response, url)?;

    response
        .json()
        .await
        .map_err(|e| BillcrawlError::ParseResponse(format!("{url}: {e}")))
}

/// Classify the response status.
pub(crate) fn check_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(BillcrawlError::SessionExpired {
            url: url.to_string(),
        });
    }
    if !status.is_success() {
        return Err(BillcrawlError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response)
}
