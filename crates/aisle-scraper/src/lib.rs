pub mod backoff;
pub mod client;
pub mod error;
pub mod facets;
pub mod orchestrator;
pub mod paginator;
pub mod ranking;
pub mod retry;
pub mod types;
pub mod url;

#[cfg(test)]
mod testing;

pub use backoff::CollisionBackoff;
pub use client::{ClientSettings, HttpTransport, Pacing, RawResponse, SearchClient, Transport};
pub use error::ScraperError;
pub use facets::{flatten_facets, FacetTree, FlatFilter};
pub use orchestrator::{select_mode, CrawlMode, CrawlSession, CrawlSummary, StoreCrawl};
pub use paginator::{CrawlLimits, PageResult, Paginator, QuerySpec};
pub use ranking::{rank_filters, Perturbation};
pub use retry::RetryPolicy;
pub use types::SearchResponse;
