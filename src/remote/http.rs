//! HTTP implementation of the search API contract.
//!
//! # Security Note - Logging
//!
//! The bearer token is held in a `SecretString` and only exposed while the
//! `Authorization` header is built. The header value is marked sensitive so
//! reqwest/hyper debug output prints it as `Sensitive`.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use reqwest::header;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::ApiConfig;
use crate::error::{LexError, Result};

use super::{ApiQuery, FetchError, ResponseEnvelope, SearchProvider};

/// Search API reached over HTTP GET
pub struct HttpSearchProvider {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl HttpSearchProvider {
    /// Create a provider from configuration.
    ///
    /// Uses the configured connect and total timeouts.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let base_url = config.base_url()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: config.token(),
        })
    }

    /// Create a provider with default timeouts.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Attach a bearer token
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Resolve the full request URL for a query.
    pub fn request_url(&self, query: &ApiQuery) -> Result<Url> {
        let mut url = self.base_url.join(query.endpoint.trim_start_matches('/'))?;
        if !query.params.is_empty() {
            url.query_pairs_mut().extend_pairs(query.params.iter());
        }
        Ok(url)
    }

    fn auth_header(&self) -> Option<header::HeaderValue> {
        let token = self.token.as_ref()?;
        let mut value =
            header::HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())).ok()?;
        value.set_sensitive(true);
        Some(value)
    }
}

impl fmt::Debug for HttpSearchProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSearchProvider")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl SearchProvider for HttpSearchProvider {
    async fn fetch_page(
        &self,
        query: &ApiQuery,
    ) -> std::result::Result<ResponseEnvelope, FetchError> {
        let url = self.request_url(query).map_err(|e| match e {
            LexError::Url(e) => FetchError::network(format!("invalid request URL: {e}")),
            other => FetchError::network(other.to_string()),
        })?;

        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(auth) = self.auth_header() {
            request = request.header(header::AUTHORIZATION, auth);
        }

        tracing::debug!(
            endpoint = %query.endpoint,
            params = %query.to_query_string(),
            "fetching page"
        );

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status));
        }

        let body = response.bytes().await?;
        ResponseEnvelope::from_slice(&body)
    }
}
