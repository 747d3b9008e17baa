//! Ordering of candidate filters for a facet-partitioned crawl.
//!
//! Filters are ranked purely by how many products they match, largest
//! first, so broad filters are tried before the narrow ones they contain.
//! The ranked list is then shuffled slightly so two crawls of the same
//! store don't issue the exact same request sequence.

use rand::Rng;

use crate::facets::FlatFilter;

/// Local shuffle applied after ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perturbation {
    /// Furthest distance a single swap may span.
    pub radius: usize,
    /// Chance that any given position is swapped.
    pub probability: f64,
}

impl Perturbation {
    /// No reordering at all.
    pub const NONE: Perturbation = Perturbation {
        radius: 0,
        probability: 0.0,
    };
}

impl Default for Perturbation {
    fn default() -> Self {
        Self {
            radius: 2,
            probability: 0.3,
        }
    }
}

/// Appends the null filter, sorts by item count (descending, stable), then
/// applies `perturbation`.
#[must_use]
pub fn rank_filters<R: Rng + ?Sized>(
    mut filters: Vec<FlatFilter>,
    catalog_size: usize,
    perturbation: Perturbation,
    rng: &mut R,
) -> Vec<FlatFilter> {
    filters.push(FlatFilter::null(catalog_size));
    filters.sort_by(|a, b| b.item_count.cmp(&a.item_count));
    let swaps = perturb(&mut filters, perturbation, rng);
    tracing::debug!(
        filters = filters.len(),
        swaps = swaps.len(),
        "ranked candidate filters"
    );
    filters
}

/// Walks the list once; at each index `i`, with probability `p`, swaps the
/// element with one drawn uniformly from `[i - radius, i + radius]` (clamped
/// to the list). Returns the swaps performed, in order.
///
/// Only the order changes, never the contents.
pub fn perturb<T, R: Rng + ?Sized>(
    items: &mut [T],
    perturbation: Perturbation,
    rng: &mut R,
) -> Vec<(usize, usize)> {
    let n = items.len();
    let mut swaps = Vec::new();

    for i in 0..n {
        if rng.random::<f64>() < perturbation.probability {
            let lo = i.saturating_sub(perturbation.radius);
            let hi = i.saturating_add(perturbation.radius).min(n - 1);
            let j = rng.random_range(lo..=hi);
            items.swap(i, j);
            swaps.push((i, j));
        }
    }

    swaps
}
