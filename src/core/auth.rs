//! Token provider: exchanges client credentials for a bearer token.
//!
//! The token is fetched once per process and reused for every request. It is
//! never refreshed; expiry surfaces later as a 401 during crawling.

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use super::http::HttpClient;
use super::models::{BearerToken, Credentials};
use crate::error::{BillcrawlError, Result};

/// Default authentication endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://login.storyous.com/api/auth/authorize";

const GRANT_TYPE: &str = "client_credentials";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Performs the client-credentials exchange against a fixed endpoint.
#[derive(Debug, Clone)]
pub struct TokenProvider {
    client: HttpClient,
    auth_url: String,
    credentials: Credentials,
}

impl TokenProvider {
    #[must_use]
    pub fn new(client: HttpClient, auth_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            client,
            auth_url: auth_url.into(),
            credentials,
        }
    }

    /// Exchange the credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AuthFailed` if the endpoint rejects the credentials or the
    /// response carries no `access_token`. Transport failures keep their
    /// network classification.
    pub async fn fetch_token(&self) -> Result<BearerToken> {
        tracing::debug!(url = %self.auth_url, client_id = %self.credentials.client_id, "Requesting bearer token");

        let form = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("grant_type", GRANT_TYPE),
        ];

        let response = self
            .client
            .post(&self.auth_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&form)
            .send()
            .await
            .map_err(|e| self.client.send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BillcrawlError::AuthFailed {
                reason: format!("HTTP {status} from {}", self.auth_url),
            });
        }

        let body: TokenResponse = response.json().await.map_err(|e| BillcrawlError::AuthFailed {
            reason: format!("unreadable token response: {e}"),
        })?;

        match body.access_token {
            Some(token) if !token.trim().is_empty() => {
                tracing::info!("Obtained bearer token");
                Ok(BearerToken::new(token))
            }
            _ => Err(BillcrawlError::AuthFailed {
                reason: "response did not contain an access_token".to_string(),
            }),
        }
    }
}
