//! The HTTP boundary of the crawler.
//!
//! [`SearchClient`](super::SearchClient) never talks to `reqwest` directly;
//! it goes through [`Transport`], which production code implements with
//! [`HttpTransport`] and tests implement with an in-memory catalog.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;

/// What came back from one GET, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Sends a single GET request. Implementations must not retry or pace;
/// [`SearchClient`](super::SearchClient) owns both.
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] on network-level failures (connect,
    /// timeout, reset). A response with any status code is `Ok`.
    fn get(&self, url: &str) -> impl Future<Output = Result<RawResponse, ScraperError>> + Send;
}

/// `reqwest`-backed transport with a browser-like header profile.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "*/*")
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;

        tracing::debug!(url, status, bytes = body.len(), "GET");
        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}
