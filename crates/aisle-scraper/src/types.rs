//! Response types for the product search endpoint.
//!
//! Only the parts the crawler relies on are modelled; everything else in the
//! body is kept verbatim in [`crate::paginator::PageResult::raw`] for storage.
//! If any modelled field disappears or changes type, deserialization fails and
//! the crawl stops: the upstream contract has changed and someone needs to look.
//!
//! ## Observed shape
//!
//! ```text
//! {
//!   "meta": {
//!     "pagination": { "offset": 0, "limit": 60, "totalCount": 1432 },
//!     "facets": [
//!       {
//!         "name": "categoryTree",
//!         "config": { "parameterName": "categoryTree", ... },
//!         "values": [
//!           { "key": "12", "docCount": 310, "label": "Frozen", "children": [ ... ] }
//!         ]
//!       }
//!     ],
//!     "sort": [ { "parameterName": "sort", "parameterValue": "price_asc", ... } ]
//!   },
//!   "data": [ { "sku": "0000000123", "name": "...", "brandName": "...", ... } ]
//! }
//! ```

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub meta: Meta,
    pub data: Vec<Product>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub pagination: Pagination,
    #[serde(default)]
    pub facets: Vec<Facet>,
    #[serde(default)]
    pub sort: Vec<SortOption>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
    /// Number of products matching the query, regardless of how many of them
    /// are reachable by paging.
    pub total_count: usize,
}

/// One filterable attribute (brand, category, SNAP eligibility, ...).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facet {
    pub name: String,
    #[serde(default)]
    pub localized_name: Option<String>,
    pub config: FacetConfig,
    #[serde(default)]
    pub values: Vec<FacetValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetConfig {
    /// Query parameter used to filter on this facet, e.g. `categoryTree`.
    pub parameter_name: String,
    #[serde(default)]
    pub is_multi_value: bool,
}

/// A facet value. Hierarchical facets (categories) nest further values in
/// `children`; a child's `doc_count` is never larger than its parent's.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetValue {
    pub key: String,
    pub doc_count: usize,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub is_selected: Option<bool>,
    #[serde(default)]
    pub children: Vec<FacetValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOption {
    pub parameter_name: String,
    pub parameter_value: String,
    #[serde(default)]
    pub localized_name: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub sku: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Amount in minor units (cents).
    pub amount: i64,
    #[serde(default)]
    pub currency_code: Option<String>,
}
