//! Paced, retrying client for the product search endpoint.

mod response;
mod transport;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use aisle_core::CrawlTarget;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::Value;

use crate::error::ScraperError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::SearchResponse;
use crate::url::{build_url, QueryParams};

pub use response::{classify_status, StatusClass};
pub use transport::{HttpTransport, RawResponse, Transport};

/// Random delay before every request attempt, drawn uniformly from
/// `[min, max]`. Independent of the retry backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub min: Duration,
    pub max: Duration,
}

impl Pacing {
    #[must_use]
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max <= self.min {
            self.min
        } else {
            rng.random_range(self.min..=self.max)
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(7_200),
            max: Duration::from_millis(12_000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub currency: String,
    pub test_variant: String,
    pub pacing: Pacing,
    pub retry: RetryPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_owned(),
            test_variant: "A".to_owned(),
            pacing: Pacing::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// A successfully fetched and validated page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The body exactly as parsed, for storage.
    pub raw: Value,
    pub response: SearchResponse,
    pub fetched_at: DateTime<Utc>,
}

/// Client for the search endpoint at a fixed base URL.
///
/// Every request waits out a [`Pacing`] delay, then goes through the
/// [`Transport`]. Transient failures are retried per [`RetryPolicy`]; all
/// other failures are returned as-is.
pub struct SearchClient<T = HttpTransport> {
    transport: T,
    base_url: String,
    settings: ClientSettings,
    requests: AtomicUsize,
}

impl SearchClient<HttpTransport> {
    /// Builds a client over a fresh [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built, or
    /// [`ScraperError::InvalidBaseUrl`] if `base_url` is unusable.
    pub fn http(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        settings: ClientSettings,
    ) -> Result<Self, ScraperError> {
        let transport = HttpTransport::new(timeout_secs, user_agent)?;
        Self::new(base_url, transport, settings)
    }
}

impl<T: Transport> SearchClient<T> {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if `base_url` does not parse,
    /// is not http(s), or already carries a query string.
    pub fn new(
        base_url: &str,
        transport: T,
        settings: ClientSettings,
    ) -> Result<Self, ScraperError> {
        let invalid = |reason: String| ScraperError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason,
        };
        let parsed = reqwest::Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme \"{}\"", parsed.scheme())));
        }
        if parsed.query().is_some() {
            return Err(invalid("must not contain a query string".to_owned()));
        }

        Ok(Self {
            transport,
            base_url: base_url.to_owned(),
            settings,
            requests: AtomicUsize::new(0),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Requests handed to the transport so far, retries included.
    #[must_use]
    pub fn requests_sent(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// Parameters every request for `target` carries.
    #[must_use]
    pub fn base_params(&self, target: &CrawlTarget) -> QueryParams {
        QueryParams::from([
            ("currency".to_owned(), self.settings.currency.clone()),
            ("q".to_owned(), String::new()),
            ("testVariant".to_owned(), self.settings.test_variant.clone()),
            ("servicePoint".to_owned(), target.service_point()),
        ])
    }

    #[must_use]
    pub fn url_for(&self, params: &QueryParams) -> String {
        build_url(&self.base_url, params)
    }

    /// One request with the base parameters only. Its total count and facets
    /// describe the whole store.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch`].
    pub async fn probe(&self, target: &CrawlTarget) -> Result<FetchedPage, ScraperError> {
        let url = self.url_for(&self.base_params(target));
        self.fetch(&url).await
    }

    /// Fetches and validates `url`, pacing and retrying as configured.
    ///
    /// # Errors
    ///
    /// Any non-retriable [`ScraperError`] from classification or parsing, or
    /// [`ScraperError::RetriesExhausted`] once the retry budget is spent.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, ScraperError> {
        let this = self;
        retry_with_backoff(&self.settings.retry, url, move || async move {
            let pause = this.settings.pacing.sample(&mut rand::rng());
            if !pause.is_zero() {
                tracing::trace!(
                    pause_ms = u64::try_from(pause.as_millis()).unwrap_or(u64::MAX),
                    "pacing"
                );
                tokio::time::sleep(pause).await;
            }

            this.requests.fetch_add(1, Ordering::Relaxed);
            let raw = this.transport.get(url).await?;
            let status = raw.status;
            let (raw, response) = response::parse_response(url, raw)?;
            tracing::info!(
                url,
                status,
                total_count = response.meta.pagination.total_count,
                items = response.data.len(),
                "fetched page"
            );
            Ok(FetchedPage {
                raw,
                response,
                fetched_at: Utc::now(),
            })
        })
        .await
    }
}
