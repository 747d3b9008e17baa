//! In-memory search endpoint for exercising the crawler without a network.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use percent_encoding::percent_decode_str;
use serde_json::{json, Value};

use crate::client::{ClientSettings, Pacing, RawResponse, SearchClient, Transport};
use crate::error::ScraperError;
use crate::retry::RetryPolicy;

pub(crate) const BASE_URL: &str = "https://search.example.com/v3/product-search";

/// Parameters the catalog understands that are not facet filters.
const NON_FILTER_KEYS: [&str; 8] = [
    "currency",
    "serviceType",
    "q",
    "limit",
    "offset",
    "sort",
    "testVariant",
    "servicePoint",
];

#[derive(Debug, Clone)]
pub(crate) struct FakeProduct {
    pub sku: String,
    pub name: String,
    pub price: i64,
    /// Facet memberships, e.g. `("categoryTree", "frozen")`.
    pub attrs: Vec<(String, String)>,
}

impl FakeProduct {
    /// Relevance order is insertion order; names and prices are unique and
    /// rise with the index.
    pub fn numbered(index: usize) -> Self {
        Self {
            sku: format!("{index:06}"),
            name: format!("item-{index:05}"),
            price: 100 + i64::try_from(index).unwrap_or(0) * 3,
            attrs: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.push((key.to_owned(), value.to_owned()));
        self
    }
}

/// Serves filtered, sorted, paged slices of a fixed product list.
pub(crate) struct FakeCatalog {
    products: Vec<FakeProduct>,
    facets: Value,
    /// `totalCount` values to report instead of the real one, consumed one
    /// per request.
    scripted_totals: Mutex<VecDeque<usize>>,
    requests: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new(products: Vec<FakeProduct>) -> Self {
        Self {
            products,
            facets: json!([]),
            scripted_totals: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn numbered(count: usize) -> Self {
        Self::new((0..count).map(FakeProduct::numbered).collect())
    }

    pub fn with_facets(mut self, facets: Value) -> Self {
        self.facets = facets;
        self
    }

    pub fn with_scripted_totals(self, totals: impl IntoIterator<Item = usize>) -> Self {
        self.scripted_totals.lock().unwrap().extend(totals);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Decoded query parameters of every request, in order.
    pub fn request_params(&self) -> Vec<Vec<(String, String)>> {
        self.requests().iter().map(|url| parse_query(url)).collect()
    }

    /// `offset` of every paged request (the probe has none).
    pub fn offsets(&self) -> Vec<usize> {
        self.request_params()
            .iter()
            .filter_map(|params| param(params, "offset"))
            .filter_map(|v| v.parse().ok())
            .collect()
    }

    fn respond(&self, url: &str) -> Value {
        let params = parse_query(url);
        let limit = param(&params, "limit").and_then(|v| v.parse().ok()).unwrap_or(30);
        let offset: usize = param(&params, "offset").and_then(|v| v.parse().ok()).unwrap_or(0);

        let mut matching: Vec<&FakeProduct> = self
            .products
            .iter()
            .filter(|product| {
                params
                    .iter()
                    .filter(|(key, _)| !NON_FILTER_KEYS.contains(&key.as_str()))
                    .all(|pair| product.attrs.contains(pair))
            })
            .collect();

        match param(&params, "sort") {
            Some("name_asc") => matching.sort_by(|a, b| a.name.cmp(&b.name)),
            Some("name_desc") => matching.sort_by(|a, b| b.name.cmp(&a.name)),
            Some("price_asc") => matching.sort_by_key(|p| p.price),
            Some("price_desc") => matching.sort_by_key(|p| std::cmp::Reverse(p.price)),
            _ => {}
        }

        let total_count = self
            .scripted_totals
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(matching.len());

        let data: Vec<Value> = matching
            .iter()
            .skip(offset)
            .take(limit)
            .map(|p| {
                json!({
                    "sku": p.sku,
                    "name": p.name,
                    "price": { "amount": p.price, "currencyCode": "USD" }
                })
            })
            .collect();

        json!({
            "meta": {
                "pagination": { "offset": offset, "limit": limit, "totalCount": total_count },
                "facets": self.facets,
                "sort": []
            },
            "data": data
        })
    }
}

impl Transport for FakeCatalog {
    async fn get(&self, url: &str) -> Result<RawResponse, ScraperError> {
        self.requests.lock().unwrap().push(url.to_owned());
        Ok(RawResponse {
            status: 200,
            content_type: Some("application/json; charset=utf-8".to_owned()),
            body: self.respond(url).to_string(),
        })
    }
}

fn parse_query(url: &str) -> Vec<(String, String)> {
    let Some((_, query)) = url.split_once('?') else {
        return Vec::new();
    };
    let decode = |s: &str| percent_decode_str(s).decode_utf8_lossy().into_owned();
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (decode(k), decode(v)))
        .collect()
}

pub(crate) fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// No pacing, tiny backoff, three attempts.
pub(crate) fn quick_settings() -> ClientSettings {
    ClientSettings {
        pacing: Pacing::none(),
        retry: RetryPolicy {
            max_attempts: 3,
            max_elapsed: Duration::from_secs(60),
            backoff_step: Duration::from_millis(1),
        },
        ..ClientSettings::default()
    }
}

pub(crate) fn fake_client(catalog: FakeCatalog) -> SearchClient<FakeCatalog> {
    SearchClient::new(BASE_URL, catalog, quick_settings()).unwrap()
}
