//! Merging, deduplication and final ordering of results.

pub mod dedup;
pub mod url_normalize;

pub use dedup::{Accumulator, dedup_key};
pub use url_normalize::normalize_url;

use crate::types::SearchResultItem;

/// Merge per-source result lists into one deduplicated, ordered list.
///
/// Each batch carries the priority of the source that produced it. Output
/// order is relevance descending, then source priority ascending, then
/// discovery order, so identical inputs always produce identical output.
pub fn merge<I>(results_by_source: I) -> Vec<SearchResultItem>
where
    I: IntoIterator<Item = (u32, Vec<SearchResultItem>)>,
{
    let mut acc = Accumulator::new();
    for (priority, items) in results_by_source {
        acc.absorb(items, priority);
    }
    acc.into_ranked()
}
