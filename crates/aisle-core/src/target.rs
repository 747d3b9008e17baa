use serde::{Deserialize, Serialize};

/// One physical store, identified by its region and store numbers.
///
/// Both numbers are printed zero-padded to three digits wherever the search
/// API or the on-disk layout expects them, e.g. region `479`, store `30`
/// becomes the service point `"479-030"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrawlTarget {
    pub region_id: u32,
    pub store_id: u32,
}

impl CrawlTarget {
    #[must_use]
    pub fn new(region_id: u32, store_id: u32) -> Self {
        Self {
            region_id,
            store_id,
        }
    }

    /// Composite `servicePoint` query value, `RRR-SSS`.
    #[must_use]
    pub fn service_point(&self) -> String {
        format!("{:03}-{:03}", self.region_id, self.store_id)
    }

    #[must_use]
    pub fn padded_region(&self) -> String {
        format!("{:03}", self.region_id)
    }

    #[must_use]
    pub fn padded_store(&self) -> String {
        format!("{:03}", self.store_id)
    }
}

impl std::fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.service_point())
    }
}
