use std::path::PathBuf;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Scheme, host and path of the search endpoint, without a query string.
    pub api_base_url: String,
    pub log_level: String,
    /// Root directory under which each crawl job writes its own folder.
    pub data_root: PathBuf,
    pub currency: String,
    pub test_variant: String,
    /// Items requested per page (`limit`).
    pub page_size: usize,
    /// Deepest offset a single query is allowed to page to.
    pub max_page_items: usize,
    pub pacing_min_ms: u64,
    pub pacing_max_ms: u64,
    /// Backoff step in microseconds; the n-th retry waits `k * step`, `k ∈ [0, 2^n]`.
    pub backoff_step_us: u64,
    pub max_retry_attempts: u32,
    pub max_retry_elapsed_secs: u64,
    pub max_drift_restarts: u32,
    pub perturb_radius: usize,
    pub perturb_probability: f64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}
