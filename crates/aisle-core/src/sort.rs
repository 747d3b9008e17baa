use serde::{Deserialize, Serialize};

/// Sort orders accepted by the search API's `sort` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortStrategy {
    Relevance,
    #[serde(rename = "name_asc")]
    NameAscending,
    #[serde(rename = "name_desc")]
    NameDescending,
    #[serde(rename = "price_asc")]
    PriceAscending,
    #[serde(rename = "price_desc")]
    PriceDescending,
}

impl SortStrategy {
    pub const ALL: [SortStrategy; 5] = [
        SortStrategy::Relevance,
        SortStrategy::NameAscending,
        SortStrategy::NameDescending,
        SortStrategy::PriceAscending,
        SortStrategy::PriceDescending,
    ];

    /// Strategies that have a reverse ordering, see [`SortStrategy::dual`].
    pub const WITH_DUALS: [SortStrategy; 4] = [
        SortStrategy::NameAscending,
        SortStrategy::NameDescending,
        SortStrategy::PriceAscending,
        SortStrategy::PriceDescending,
    ];

    /// Wire value for the `sort` query parameter.
    #[must_use]
    pub fn as_param(self) -> &'static str {
        match self {
            SortStrategy::Relevance => "relevance",
            SortStrategy::NameAscending => "name_asc",
            SortStrategy::NameDescending => "name_desc",
            SortStrategy::PriceAscending => "price_asc",
            SortStrategy::PriceDescending => "price_desc",
        }
    }

    /// The same ordering reversed. Relevance has no reverse.
    #[must_use]
    pub fn dual(self) -> Option<SortStrategy> {
        match self {
            SortStrategy::Relevance => None,
            SortStrategy::NameAscending => Some(SortStrategy::NameDescending),
            SortStrategy::NameDescending => Some(SortStrategy::NameAscending),
            SortStrategy::PriceAscending => Some(SortStrategy::PriceDescending),
            SortStrategy::PriceDescending => Some(SortStrategy::PriceAscending),
        }
    }

    /// Parses a wire value back into a strategy.
    #[must_use]
    pub fn from_param(value: &str) -> Option<SortStrategy> {
        Self::ALL.into_iter().find(|s| s.as_param() == value)
    }
}

impl std::fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_param())
    }
}
