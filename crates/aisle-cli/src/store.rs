//! On-disk layout of a crawl job.
//!
//! ```text
//! <root>/<job id>/
//!   meta.json                                   id, region, store, start
//!   00001-2026-10-19T08:14:03.123456+00:00.json raw page body
//!   00002-...json
//!   summary.json                                written when the crawl ends
//! ```
//!
//! Page files are written as soon as each page arrives. Bodies are stored as
//! compact JSON with sorted keys.

use std::path::{Path, PathBuf};

use aisle_core::CrawlTarget;
use aisle_scraper::{CrawlSummary, PageResult};
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct JobMeta<'a> {
    id: &'a Uuid,
    region: String,
    store: String,
    start: String,
}

#[derive(Debug, Serialize)]
struct JobSummary<'a> {
    id: &'a Uuid,
    finished: String,
    pages_written: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(flatten)]
    crawl: Option<&'a CrawlSummary>,
}

pub(crate) struct JobWriter {
    id: Uuid,
    dir: PathBuf,
    pages_written: usize,
}

impl JobWriter {
    /// Creates `<root>/<new job id>/` and writes `meta.json` into it.
    pub(crate) async fn create(
        root: &Path,
        target: CrawlTarget,
        started_at: DateTime<Utc>,
    ) -> anyhow::Result<Self> {
        let id = Uuid::new_v4();
        let dir = root.join(id.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating job directory {}", dir.display()))?;

        let writer = Self {
            id,
            dir,
            pages_written: 0,
        };
        let meta = JobMeta {
            id: &writer.id,
            region: target.padded_region(),
            store: target.padded_store(),
            start: started_at.to_rfc3339_opts(SecondsFormat::Micros, false),
        };
        writer.write_json("meta.json", &meta).await?;
        Ok(writer)
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn pages_written(&self) -> usize {
        self.pages_written
    }

    /// Writes one page body, named by arrival order and fetch time.
    pub(crate) async fn write_page(&mut self, page: &PageResult) -> anyhow::Result<PathBuf> {
        let name = format!(
            "{:05}-{}.json",
            self.pages_written + 1,
            page.fetched_at.to_rfc3339_opts(SecondsFormat::Micros, false)
        );
        let path = self.write_json(&name, &sort_keys(&page.raw)).await?;
        self.pages_written += 1;
        tracing::debug!(path = %path.display(), skus = page.skus.len(), "page written");
        Ok(path)
    }

    pub(crate) async fn write_summary(
        &self,
        crawl: Option<&CrawlSummary>,
        error: Option<&str>,
    ) -> anyhow::Result<PathBuf> {
        let summary = JobSummary {
            id: &self.id,
            finished: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            pages_written: self.pages_written,
            error,
            crawl,
        };
        self.write_json("summary.json", &summary).await
    }

    async fn write_json<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> anyhow::Result<PathBuf> {
        let path = self.dir.join(name);
        let bytes = serde_json::to_vec(value).context("serializing job file")?;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

/// Rebuilds `value` with every object's keys in lexicographic order.
///
/// Needed only if serde_json's `preserve_order` feature is enabled somewhere in
/// the dependency graph; otherwise `Map` is already sorted.
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, v)| (key.clone(), sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
