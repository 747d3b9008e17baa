//! Offset pagination for one query, with total-count drift detection.
//!
//! The API will only page so far into any result set: requests past
//! `max_page_items` are answered as if the offset were `max_page_items`. A
//! [`Paginator`] therefore walks offsets until it reaches either the end of
//! the result set or that ceiling, whichever comes first.
//!
//! If the total count changes mid-walk the catalog moved under us and offsets
//! no longer line up, so the walk restarts from offset 0.

use std::collections::HashSet;
use std::fmt;

use aisle_core::{CrawlTarget, SortStrategy};
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::client::{SearchClient, Transport};
use crate::error::ScraperError;
use crate::ranking::Perturbation;
use crate::types::SearchResponse;
use crate::url::QueryParams;

/// One query: a store, a sort order and at most one facet filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub target: CrawlTarget,
    pub sort: SortStrategy,
    pub filter: Option<(String, String)>,
}

impl QuerySpec {
    #[must_use]
    pub fn new(target: CrawlTarget, sort: SortStrategy, filter: Option<(String, String)>) -> Self {
        Self {
            target,
            sort,
            filter,
        }
    }

    /// Adds paging, sort and filter parameters to `base`. Relevance is the
    /// API default and is sent by leaving `sort` out.
    #[must_use]
    pub fn page_params(&self, mut base: QueryParams, limit: usize, offset: usize) -> QueryParams {
        base.insert("limit".to_owned(), limit.to_string());
        base.insert("offset".to_owned(), offset.to_string());
        if self.sort != SortStrategy::Relevance {
            base.insert("sort".to_owned(), self.sort.as_param().to_owned());
        }
        if let Some((key, value)) = &self.filter {
            base.insert(key.clone(), value.clone());
        }
        base
    }
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sort={}", self.target, self.sort)?;
        if let Some((key, value)) = &self.filter {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

/// Crawl-wide tuning shared by every query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrawlLimits {
    pub page_size: usize,
    /// Deepest offset the API serves for any single query.
    pub max_page_items: usize,
    pub max_drift_restarts: u32,
    pub perturbation: Perturbation,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            page_size: 60,
            max_page_items: 1_000,
            max_drift_restarts: 10,
            perturbation: Perturbation::default(),
        }
    }
}

/// One yielded page. Immutable; the caller owns it.
#[derive(Debug, Clone)]
pub struct PageResult {
    /// Unique SKUs on this page.
    pub skus: HashSet<String>,
    pub raw: Value,
    pub response: SearchResponse,
    pub total_count: usize,
    /// Offset actually requested.
    pub offset: usize,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Paginator {
    query: QuerySpec,
    page_size: usize,
    max_page_items: usize,
    max_drift_restarts: u32,
    offset: usize,
    end: Option<usize>,
    drift_restarts: u32,
}

impl Paginator {
    #[must_use]
    pub fn new(query: QuerySpec, limits: &CrawlLimits) -> Self {
        Self {
            query,
            page_size: limits.page_size,
            max_page_items: limits.max_page_items,
            max_drift_restarts: limits.max_drift_restarts,
            offset: 0,
            end: None,
            drift_restarts: 0,
        }
    }

    #[must_use]
    pub fn query(&self) -> &QuerySpec {
        &self.query
    }

    #[must_use]
    pub fn drift_restarts(&self) -> u32 {
        self.drift_restarts
    }

    /// No further request will be made.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.offset > self.max_page_items + self.page_size
            || self.end.is_some_and(|end| self.offset >= end)
    }

    /// Fetches the next page, transparently restarting on drift.
    ///
    /// Returns `Ok(None)` once the result set or the offset ceiling is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Propagates fatal errors from [`SearchClient::fetch`], and returns
    /// [`ScraperError::DriftLimit`] after more than `max_drift_restarts`
    /// restarts.
    pub async fn next_page<T: Transport>(
        &mut self,
        client: &SearchClient<T>,
    ) -> Result<Option<PageResult>, ScraperError> {
        loop {
            if self.is_done() {
                return Ok(None);
            }

            let offset = self.offset.min(self.max_page_items);
            let params =
                self.query
                    .page_params(client.base_params(&self.query.target), self.page_size, offset);
            let page = client.fetch(&client.url_for(&params)).await?;
            let total_count = page.response.meta.pagination.total_count;

            match self.end {
                None => self.end = Some(total_count),
                Some(end) if end != total_count => {
                    self.drift_restarts += 1;
                    tracing::warn!(
                        query = %self.query,
                        offset,
                        expected = end,
                        actual = total_count,
                        restart = self.drift_restarts,
                        "total count drifted, restarting from offset 0"
                    );
                    if self.drift_restarts > self.max_drift_restarts {
                        return Err(ScraperError::DriftLimit {
                            query: self.query.to_string(),
                            restarts: self.drift_restarts,
                        });
                    }
                    self.end = None;
                    self.offset = 0;
                    continue;
                }
                Some(_) => {}
            }

            self.offset += self.page_size;
            let skus = page
                .response
                .data
                .iter()
                .map(|product| product.sku.clone())
                .collect();

            return Ok(Some(PageResult {
                skus,
                raw: page.raw,
                response: page.response,
                total_count,
                offset,
                fetched_at: page.fetched_at,
            }));
        }
    }
}

#[cfg(test)]
#[path = "paginator_test.rs"]
mod tests;
