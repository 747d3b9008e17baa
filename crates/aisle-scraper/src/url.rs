//! Query-string construction for the search endpoint.
//!
//! The storefront web app always sends its parameters in the same order.
//! Requests are built in that order too so they look like the web app's.
//! Parameters the web app never sends (extra facet filters) go last.

use std::collections::HashMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Parameter order used by the storefront web app.
pub const CANONICAL_ORDER: [&str; 11] = [
    "currency",
    "serviceType",
    "q",
    "limit",
    "offset",
    "brandName",
    "categoryTree",
    "usaSnapEligible",
    "sort",
    "testVariant",
    "servicePoint",
];

/// Everything except RFC 3986 unreserved characters and `/` is escaped.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

pub type QueryParams = HashMap<String, String>;

/// Serializes `params` into `?k=v&k=v`, or an empty string when there is
/// nothing to send.
///
/// Keys in [`CANONICAL_ORDER`] come first, in that order. Remaining keys
/// follow, sorted so retries of the same request produce the same URL.
/// Entries with an empty key are dropped.
#[must_use]
pub fn build_query(params: &QueryParams) -> String {
    let mut extra: Vec<(&String, &String)> = params
        .iter()
        .filter(|(key, _)| !CANONICAL_ORDER.contains(&key.as_str()))
        .collect();
    extra.sort_unstable();

    let pairs: Vec<String> = CANONICAL_ORDER
        .iter()
        .filter_map(|key| params.get_key_value(*key))
        .chain(extra)
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, QUERY_COMPONENT),
                utf8_percent_encode(value, QUERY_COMPONENT)
            )
        })
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

/// Appends the query string for `params` to `base`.
#[must_use]
pub fn build_url(base: &str, params: &QueryParams) -> String {
    format!("{base}{}", build_query(params))
}
