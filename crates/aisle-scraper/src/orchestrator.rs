//! Crawling a whole store despite the per-query paging ceiling.
//!
//! A single query can only be paged `max_page_items` deep, so how a store is
//! crawled depends on its size `n` (taken from one probe request):
//!
//! | `n`                         | Mode                 | Queries                                  |
//! |-----------------------------|----------------------|------------------------------------------|
//! | `n <= max`                  | [`CrawlMode::Direct`]   | relevance, unfiltered                 |
//! | `max < n <= 2 * max`        | [`CrawlMode::DualSort`] | one sort, then its reverse            |
//! | `n > 2 * max`               | [`CrawlMode::FacetPartitioned`] | per facet filter, largest first |
//!
//! In every mode the crawl ends as soon as the number of distinct SKUs seen
//! reaches the target count.

use std::collections::{HashSet, VecDeque};

use aisle_core::{CrawlTarget, SortStrategy};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::client::{HttpTransport, SearchClient, Transport};
use crate::error::ScraperError;
use crate::facets::{flatten_facets, FilterId, FlatFilter};
use crate::paginator::{CrawlLimits, PageResult, Paginator, QuerySpec};
use crate::ranking::rank_filters;

/// Sort picked for a filter whose results fit in one query.
const SORT_WEIGHTS: [(SortStrategy, f64); 5] = [
    (SortStrategy::Relevance, 0.7),
    (SortStrategy::PriceAscending, 0.2),
    (SortStrategy::NameAscending, 0.1 / 3.0),
    (SortStrategy::NameDescending, 0.1 / 3.0),
    (SortStrategy::PriceDescending, 0.1 / 3.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlMode {
    Direct,
    DualSort,
    FacetPartitioned,
}

#[must_use]
pub fn select_mode(catalog_size: usize, max_page_items: usize) -> CrawlMode {
    if catalog_size <= max_page_items {
        CrawlMode::Direct
    } else if catalog_size <= max_page_items.saturating_mul(2) {
        CrawlMode::DualSort
    } else {
        CrawlMode::FacetPartitioned
    }
}

/// Mutable state of one crawl.
#[derive(Debug, Default)]
pub struct CrawlSession {
    seen_skus: HashSet<String>,
    exhausted: HashSet<FilterId>,
    target_count: usize,
}

impl CrawlSession {
    #[must_use]
    pub fn new(target_count: usize) -> Self {
        Self {
            target_count,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn seen_skus(&self) -> &HashSet<String> {
        &self.seen_skus
    }

    #[must_use]
    pub fn target_count(&self) -> usize {
        self.target_count
    }

    #[must_use]
    pub fn is_exhausted(&self, id: &str) -> bool {
        self.exhausted.contains(id)
    }

    /// Marks `filter` and its immediate children as done.
    pub fn mark_exhausted(&mut self, filter: &FlatFilter) {
        self.exhausted.insert(filter.id());
        self.exhausted.extend(filter.children.iter().cloned());
    }

    /// Records a page's SKUs; `true` once the target count is reached.
    pub fn record(&mut self, page: &PageResult) -> bool {
        self.seen_skus.extend(page.skus.iter().cloned());
        self.is_complete()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.seen_skus.len() >= self.target_count
    }
}

/// Totals for logging and the job summary.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub target: CrawlTarget,
    pub mode: CrawlMode,
    pub catalog_size: usize,
    pub target_count: usize,
    pub unique_skus: usize,
    pub pages: usize,
    pub requests: usize,
    pub filters_ranked: usize,
    pub filters_crawled: usize,
    pub drift_restarts: u32,
    pub complete: bool,
}

/// Cursor over every page of one store's crawl.
///
/// Pages come out one per [`StoreCrawl::next_page`] call, in request order.
/// Nothing runs between calls; dropping the cursor cancels the crawl.
pub struct StoreCrawl<'c, T: Transport = HttpTransport> {
    client: &'c SearchClient<T>,
    target: CrawlTarget,
    limits: CrawlLimits,
    mode: CrawlMode,
    catalog_size: usize,
    session: CrawlSession,
    rng: StdRng,
    /// Queries still to run for the current filter (or the whole crawl
    /// outside facet mode).
    plan: VecDeque<QuerySpec>,
    current: Option<Paginator>,
    filters: std::vec::IntoIter<FlatFilter>,
    filters_ranked: usize,
    filters_crawled: usize,
    in_progress: Option<FlatFilter>,
    pages: usize,
    drift_restarts: u32,
    finished: bool,
}

impl<'c, T: Transport> StoreCrawl<'c, T> {
    /// Probes the store and picks a crawl mode.
    ///
    /// # Errors
    ///
    /// Any fatal error from the probe request.
    pub async fn start(
        client: &'c SearchClient<T>,
        target: CrawlTarget,
        limits: CrawlLimits,
    ) -> Result<Self, ScraperError> {
        let rng = StdRng::from_rng(&mut rand::rng());
        Self::start_with_rng(client, target, limits, rng).await
    }

    /// [`Self::start`] with a caller-supplied RNG for sort choice and
    /// filter perturbation.
    ///
    /// # Errors
    ///
    /// Any fatal error from the probe request.
    pub async fn start_with_rng(
        client: &'c SearchClient<T>,
        target: CrawlTarget,
        limits: CrawlLimits,
        mut rng: StdRng,
    ) -> Result<Self, ScraperError> {
        let probe = client.probe(&target).await?;
        let catalog_size = probe.response.meta.pagination.total_count;
        let mode = select_mode(catalog_size, limits.max_page_items);

        let mut plan = VecDeque::new();
        let mut ranked = Vec::new();
        match mode {
            CrawlMode::Direct => {
                plan.push_back(QuerySpec::new(target, SortStrategy::Relevance, None));
            }
            CrawlMode::DualSort => {
                plan.extend(dual_sort_plan(target, None, &mut rng));
            }
            CrawlMode::FacetPartitioned => {
                ranked = rank_filters(
                    flatten_facets(&probe.response.meta.facets),
                    catalog_size,
                    limits.perturbation,
                    &mut rng,
                );
            }
        }

        tracing::info!(
            store = %target,
            catalog_size,
            max_page_items = limits.max_page_items,
            ?mode,
            filters = ranked.len(),
            "crawl mode selected"
        );

        Ok(Self {
            client,
            target,
            limits,
            mode,
            catalog_size,
            session: CrawlSession::new(catalog_size),
            rng,
            plan,
            current: None,
            filters_ranked: ranked.len(),
            filters: ranked.into_iter(),
            filters_crawled: 0,
            in_progress: None,
            pages: 0,
            drift_restarts: 0,
            finished: false,
        })
    }

    #[must_use]
    pub fn mode(&self) -> CrawlMode {
        self.mode
    }

    #[must_use]
    pub fn catalog_size(&self) -> usize {
        self.catalog_size
    }

    #[must_use]
    pub fn session(&self) -> &CrawlSession {
        &self.session
    }

    /// Next page of the crawl, or `None` once it is over.
    ///
    /// The page that brings the distinct SKU count up to the target is still
    /// returned; the call after it returns `None` without a request.
    ///
    /// # Errors
    ///
    /// Any fatal error from the underlying queries. The crawl is finished
    /// afterwards; pages already returned stay valid.
    pub async fn next_page(&mut self) -> Result<Option<PageResult>, ScraperError> {
        while !self.finished {
            if self.current.is_none() && !self.advance() {
                self.finished = true;
                tracing::info!(
                    store = %self.target,
                    unique_skus = self.session.seen_skus.len(),
                    target_count = self.session.target_count,
                    "crawl plan exhausted"
                );
                break;
            }
            let Some(paginator) = self.current.as_mut() else {
                continue;
            };

            let unfiltered = paginator.query().filter.is_none();
            let restarts_before = paginator.drift_restarts();
            let page = match paginator.next_page(self.client).await {
                Ok(Some(page)) => page,
                Ok(None) => {
                    self.drift_restarts += paginator.drift_restarts();
                    self.current = None;
                    continue;
                }
                Err(err) => {
                    self.finished = true;
                    return Err(err);
                }
            };

            if unfiltered && paginator.drift_restarts() > restarts_before {
                tracing::info!(
                    previous = self.session.target_count,
                    current = page.total_count,
                    "catalog size changed, updating target count"
                );
                self.session.target_count = page.total_count;
            }

            self.pages += 1;
            if self.session.record(&page) {
                self.finished = true;
                tracing::info!(
                    store = %self.target,
                    unique_skus = self.session.seen_skus.len(),
                    target_count = self.session.target_count,
                    pages = self.pages,
                    "target count reached, stopping"
                );
            }
            return Ok(Some(page));
        }
        Ok(None)
    }

    /// Loads the next query into `current`. `false` when nothing is left.
    fn advance(&mut self) -> bool {
        loop {
            if let Some(query) = self.plan.pop_front() {
                tracing::debug!(query = %query, "starting query");
                self.current = Some(Paginator::new(query, &self.limits));
                return true;
            }

            if let Some(done) = self.in_progress.take() {
                self.session.mark_exhausted(&done);
            }

            let Some(filter) = self.filters.next() else {
                return false;
            };

            if self.session.is_exhausted(&filter.id()) {
                tracing::debug!(filter = %filter.id(), "already covered by a parent, skipping");
                self.session.mark_exhausted(&filter);
                continue;
            }

            let param = filter.as_param();
            if filter.item_count >= self.limits.max_page_items {
                self.plan
                    .extend(dual_sort_plan(self.target, param, &mut self.rng));
            } else {
                let sort = weighted_sort(&mut self.rng);
                self.plan.push_back(QuerySpec::new(self.target, sort, param));
            }

            self.filters_crawled += 1;
            tracing::info!(
                filter = %filter.id(),
                item_count = filter.item_count,
                queries = self.plan.len(),
                seen = self.session.seen_skus.len(),
                "crawling filter"
            );
            self.in_progress = Some(filter);
        }
    }

    #[must_use]
    pub fn summary(&self) -> CrawlSummary {
        CrawlSummary {
            target: self.target,
            mode: self.mode,
            catalog_size: self.catalog_size,
            target_count: self.session.target_count,
            unique_skus: self.session.seen_skus.len(),
            pages: self.pages,
            requests: self.client.requests_sent(),
            filters_ranked: self.filters_ranked,
            filters_crawled: self.filters_crawled,
            drift_restarts: self.drift_restarts
                + self.current.as_ref().map_or(0, Paginator::drift_restarts),
            complete: self.session.is_complete(),
        }
    }
}

/// A random sort that has a reverse, followed by that reverse.
fn dual_sort_plan<R: rand::Rng + ?Sized>(
    target: CrawlTarget,
    filter: Option<(String, String)>,
    rng: &mut R,
) -> Vec<QuerySpec> {
    let first = SortStrategy::WITH_DUALS
        .choose(rng)
        .copied()
        .unwrap_or(SortStrategy::PriceAscending);
    std::iter::once(first)
        .chain(first.dual())
        .map(|sort| QuerySpec::new(target, sort, filter.clone()))
        .collect()
}

fn weighted_sort<R: rand::Rng + ?Sized>(rng: &mut R) -> SortStrategy {
    SORT_WEIGHTS
        .choose_weighted(rng, |(_, weight)| *weight)
        .map_or(SortStrategy::Relevance, |(sort, _)| *sort)
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
