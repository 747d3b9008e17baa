//! `crawl` and `probe` command handlers.

use std::path::Path;
use std::time::Duration;

use aisle_core::{AppConfig, CrawlTarget};
use aisle_scraper::{
    select_mode, ClientSettings, CrawlLimits, Pacing, Perturbation, RetryPolicy, SearchClient,
    StoreCrawl,
};
use anyhow::Context;
use chrono::Utc;

use crate::store::JobWriter;

pub(crate) fn client_settings(config: &AppConfig) -> ClientSettings {
    ClientSettings {
        currency: config.currency.clone(),
        test_variant: config.test_variant.clone(),
        pacing: Pacing {
            min: Duration::from_millis(config.pacing_min_ms),
            max: Duration::from_millis(config.pacing_max_ms),
        },
        retry: RetryPolicy {
            max_attempts: config.max_retry_attempts,
            max_elapsed: Duration::from_secs(config.max_retry_elapsed_secs),
            backoff_step: Duration::from_micros(config.backoff_step_us),
        },
    }
}

pub(crate) fn crawl_limits(config: &AppConfig) -> CrawlLimits {
    CrawlLimits {
        page_size: config.page_size,
        max_page_items: config.max_page_items,
        max_drift_restarts: config.max_drift_restarts,
        perturbation: Perturbation {
            radius: config.perturb_radius,
            probability: config.perturb_probability,
        },
    }
}

fn build_client(config: &AppConfig) -> anyhow::Result<SearchClient> {
    SearchClient::http(
        &config.api_base_url,
        config.request_timeout_secs,
        &config.user_agent,
        client_settings(config),
    )
    .context("failed to build search client")
}

/// Crawls one store into a new job directory under `root`.
///
/// Pages are written as they arrive. Once the job directory exists,
/// `summary.json` is written whether the crawl completes or aborts; on abort
/// the error is returned after it.
pub(crate) async fn run_crawl(
    config: &AppConfig,
    target: CrawlTarget,
    root: &Path,
) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let mut writer = JobWriter::create(root, target, Utc::now()).await?;
    tracing::info!(
        job = %writer.id(),
        store = %target,
        dir = %writer.dir().display(),
        "crawl job started"
    );

    let (summary, outcome) =
        match StoreCrawl::start(&client, target, crawl_limits(config)).await {
            Ok(mut crawl) => {
                let outcome = stream_pages(&mut crawl, &mut writer).await;
                (Some(crawl.summary()), outcome)
            }
            Err(e) => (
                None,
                Err(anyhow::Error::new(e).context(format!("probing store {target}"))),
            ),
        };

    let error = outcome.as_ref().err().map(|e| format!("{e:#}"));
    writer
        .write_summary(summary.as_ref(), error.as_deref())
        .await?;

    match (outcome, summary) {
        (Ok(()), Some(summary)) => {
            tracing::info!(
                job = %writer.id(),
                mode = ?summary.mode,
                pages = writer.pages_written(),
                requests = summary.requests,
                unique_skus = summary.unique_skus,
                target_count = summary.target_count,
                "crawl job finished"
            );
            if !summary.complete {
                tracing::warn!(
                    unique_skus = summary.unique_skus,
                    target_count = summary.target_count,
                    "crawl ended below the target count"
                );
            }
            Ok(())
        }
        (Ok(()), None) => Ok(()),
        (Err(e), _) => {
            tracing::error!(
                job = %writer.id(),
                pages = writer.pages_written(),
                error = %e,
                "crawl job aborted"
            );
            Err(e).with_context(|| format!("crawl of store {target} aborted"))
        }
    }
}

/// Writes pages until the crawl ends or either side fails.
async fn stream_pages(crawl: &mut StoreCrawl<'_>, writer: &mut JobWriter) -> anyhow::Result<()> {
    while let Some(page) = crawl.next_page().await? {
        writer.write_page(&page).await?;
    }
    Ok(())
}

/// Prints a store's catalog size and the mode a crawl would use.
pub(crate) async fn run_probe(config: &AppConfig, target: CrawlTarget) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let page = client
        .probe(&target)
        .await
        .with_context(|| format!("probing store {target}"))?;

    let meta = &page.response.meta;
    let total = meta.pagination.total_count;
    let mode = select_mode(total, config.max_page_items);
    println!("store:   {target}");
    println!("total:   {total}");
    println!("mode:    {mode:?}");
    println!("facets:  {}", meta.facets.len());
    for facet in &meta.facets {
        println!("  {:<20} {} values", facet.config.parameter_name, facet.values.len());
    }
    Ok(())
}
