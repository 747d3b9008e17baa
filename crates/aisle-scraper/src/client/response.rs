//! Turning a [`RawResponse`] into a typed page or a classified error.

use serde::Deserialize;
use serde_json::Value;

use super::transport::RawResponse;
use crate::error::ScraperError;
use crate::types::SearchResponse;

/// How a status code is treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    /// Throttling, bot-wall or server trouble: back off and try again.
    Retryable,
    /// The request shape is rejected or we've been blocked.
    Blocked,
    Unexpected,
}

#[must_use]
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200 => StatusClass::Success,
        403 | 429 | 500..=599 => StatusClass::Retryable,
        400 | 401 | 402 | 404 | 405 | 406 | 410 => StatusClass::Blocked,
        _ => StatusClass::Unexpected,
    }
}

/// `true` when the media type (parameters ignored) is `application/json`.
fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/json"))
}

/// Validates status and content type, then parses the body twice: once into
/// a generic JSON value kept for storage, once into [`SearchResponse`].
///
/// # Errors
///
/// One of [`ScraperError::RetryableStatus`], [`ScraperError::Blocked`],
/// [`ScraperError::UnexpectedStatus`], [`ScraperError::NotJson`] or
/// [`ScraperError::Deserialize`].
pub(crate) fn parse_response(
    url: &str,
    raw: RawResponse,
) -> Result<(Value, SearchResponse), ScraperError> {
    let status = raw.status;
    match classify_status(status) {
        StatusClass::Success => {}
        StatusClass::Retryable => {
            return Err(ScraperError::RetryableStatus {
                status,
                url: url.to_owned(),
            })
        }
        StatusClass::Blocked => {
            return Err(ScraperError::Blocked {
                status,
                url: url.to_owned(),
            })
        }
        StatusClass::Unexpected => {
            return Err(ScraperError::UnexpectedStatus {
                status,
                url: url.to_owned(),
            })
        }
    }

    if !is_json(raw.content_type.as_deref()) {
        return Err(ScraperError::NotJson {
            url: url.to_owned(),
            content_type: raw.content_type,
        });
    }

    let value: Value =
        serde_json::from_str(&raw.body).map_err(|source| ScraperError::Deserialize {
            context: format!("malformed JSON from {url}"),
            source,
        })?;
    let response =
        SearchResponse::deserialize(&value).map_err(|source| ScraperError::Deserialize {
            context: format!("search response from {url}"),
            source,
        })?;

    Ok((value, response))
}
