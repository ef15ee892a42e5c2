use std::collections::HashSet;

use wainah_core::NormalizedResult;

/// Identity of a result for deduplication: the first non-blank of
/// `image_url`, `product_url`, `name`, trimmed and lower-cased.
#[must_use]
pub fn dedup_key(result: &NormalizedResult) -> Option<String> {
    [
        result.image_url.as_deref(),
        result.product_url.as_deref(),
        Some(result.name.as_str()),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|s| !s.is_empty())
    .map(str::to_lowercase)
}

/// Drops later duplicates and results with no usable key, keeping
/// first-seen order.
#[must_use]
pub fn dedup_results(results: Vec<NormalizedResult>) -> Vec<NormalizedResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| dedup_key(r).is_some_and(|key| seen.insert(key)))
        .collect()
}
