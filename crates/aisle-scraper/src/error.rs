use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 429, 403 or 5xx. Worth another try after backing off.
    #[error("retryable HTTP status {status} from {url}")]
    RetryableStatus { status: u16, url: String },

    /// 400, 401, 402, 404, 405, 406 or 410. Usually means the crawler has been
    /// blocked or the request shape is no longer accepted.
    #[error("HTTP {status} from {url}: we may have been blocked")]
    Blocked { status: u16, url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("expected JSON from {url}, got content type {content_type:?}")]
    NotJson {
        url: String,
        content_type: Option<String>,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("giving up on {url} after {attempts} attempts in {elapsed_secs}s: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        elapsed_secs: u64,
        #[source]
        last: Box<ScraperError>,
    },

    #[error("total count for {query} kept changing ({restarts} restarts)")]
    DriftLimit { query: String, restarts: u32 },

    #[error("invalid API base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl ScraperError {
    /// Returns `true` if the error is a transient condition that should be
    /// retried after a backoff delay.
    ///
    /// Everything else needs an operator to look at it and is propagated
    /// straight to the caller.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            ScraperError::Http(e) => !e.is_builder() && !e.is_decode(),
            ScraperError::RetryableStatus { .. } => true,
            ScraperError::Blocked { .. }
            | ScraperError::UnexpectedStatus { .. }
            | ScraperError::NotJson { .. }
            | ScraperError::Deserialize { .. }
            | ScraperError::RetriesExhausted { .. }
            | ScraperError::DriftLimit { .. }
            | ScraperError::InvalidBaseUrl { .. } => false,
        }
    }
}
