//! Staged filtering and ordering of normalized results.
//!
//! The caller's policy runs first. When it yields too few results the filter
//! is widened in two fixed steps:
//!
//! | stage | trusted only | min similarity | link required | kept |
//! |-------|--------------|----------------|---------------|------|
//! | 1     | policy       | policy         | policy        | all passing |
//! | 2     | no           | 0.55           | yes           | new ids, when stage 1 kept < 6 |
//! | 3     | no           | 0.50           | no            | new linkless ids, when total < 3 |
//!
//! The merged set is then sorted once by [`compare_results`] and truncated.

use std::cmp::Ordering;
use std::collections::HashSet;

use wainah_core::{Catalog, NormalizedResult, RankingPolicy};

/// Stage 2 runs when stage 1 keeps fewer than this many results.
pub const STAGE_TWO_FLOOR: usize = 6;
/// Stage 3 runs when stages 1 and 2 together keep fewer than this many.
pub const STAGE_THREE_FLOOR: usize = 3;
pub const STAGE_TWO_MIN_SIMILARITY: f64 = 0.55;
pub const STAGE_THREE_MIN_SIMILARITY: f64 = 0.50;
/// Similarity at or above which a result is in the high-confidence tier.
pub const HIGH_SIMILARITY: f64 = 0.90;
pub const MAX_RANKED: usize = 30;

/// Similarities closer than this compare equal.
const SIMILARITY_EPSILON: f64 = 1e-6;

/// Filters `results` through the staged policy and returns them in ranked
/// order, at most [`MAX_RANKED`] long.
#[must_use]
pub fn rank_results(
    results: &[NormalizedResult],
    policy: &RankingPolicy,
    catalog: &Catalog,
) -> Vec<NormalizedResult> {
    let mut ranked: Vec<NormalizedResult> = results
        .iter()
        .filter(|r| passes(r, policy, catalog))
        .cloned()
        .collect();
    let stage_one = ranked.len();
    let mut seen: HashSet<String> = ranked.iter().map(|r| r.id.clone()).collect();

    if stage_one < STAGE_TWO_FLOOR {
        let widened = RankingPolicy {
            user_country: policy.user_country.clone(),
            min_similarity: STAGE_TWO_MIN_SIMILARITY,
            only_trusted: false,
            require_link: true,
        };
        append_new(&mut ranked, &mut seen, results, |r| passes(r, &widened, catalog));
    }
    let stage_two = ranked.len() - stage_one;

    if ranked.len() < STAGE_THREE_FLOOR {
        let widest = RankingPolicy {
            user_country: policy.user_country.clone(),
            min_similarity: STAGE_THREE_MIN_SIMILARITY,
            only_trusted: false,
            require_link: false,
        };
        append_new(&mut ranked, &mut seen, results, |r| {
            !r.has_link() && passes(r, &widest, catalog)
        });
    }
    let stage_three = ranked.len() - stage_one - stage_two;

    tracing::debug!(
        input = results.len(),
        stage_one,
        stage_two,
        stage_three,
        "ranking stages complete"
    );

    ranked.sort_by(|a, b| compare_results(a, b, &policy.user_country, catalog));
    ranked.truncate(MAX_RANKED);
    ranked
}

fn append_new<F>(
    ranked: &mut Vec<NormalizedResult>,
    seen: &mut HashSet<String>,
    results: &[NormalizedResult],
    keep: F,
) where
    F: Fn(&NormalizedResult) -> bool,
{
    for result in results {
        if keep(result) && seen.insert(result.id.clone()) {
            ranked.push(result.clone());
        }
    }
}

/// Returns `true` if `result` satisfies every filter in `policy`.
#[must_use]
pub fn passes(result: &NormalizedResult, policy: &RankingPolicy, catalog: &Catalog) -> bool {
    if policy.require_link && !result.has_link() {
        return false;
    }
    if result.similarity < policy.min_similarity {
        return false;
    }
    !policy.only_trusted || is_trusted(result, catalog)
}

fn is_trusted(result: &NormalizedResult, catalog: &Catalog) -> bool {
    result
        .store_domain
        .as_deref()
        .is_some_and(|d| catalog.is_trusted(d))
}

/// Ranking order, earlier criteria dominating:
///
/// 1. has a product link
/// 2. trusted storefront
/// 3. similarity at or above [`HIGH_SIMILARITY`]
/// 4. similarity, descending
/// 5. country matches `user_country`
/// 6. price, ascending, unknown last
/// 7. store domain, ascending
#[must_use]
pub fn compare_results(
    a: &NormalizedResult,
    b: &NormalizedResult,
    user_country: &str,
    catalog: &Catalog,
) -> Ordering {
    let local = |r: &NormalizedResult| r.country_code.as_deref() == Some(user_country);
    let high = |r: &NormalizedResult| r.similarity >= HIGH_SIMILARITY;

    b.has_link()
        .cmp(&a.has_link())
        .then_with(|| is_trusted(b, catalog).cmp(&is_trusted(a, catalog)))
        .then_with(|| high(b).cmp(&high(a)))
        .then_with(|| similarity_step(b.similarity).cmp(&similarity_step(a.similarity)))
        .then_with(|| local(b).cmp(&local(a)))
        .then_with(|| compare_price(a.price_value, b.price_value))
        .then_with(|| domain_key(a).cmp(domain_key(b)))
}

/// Quantizes a similarity to [`SIMILARITY_EPSILON`] steps so near-equal
/// values tie while the ordering stays total.
// At most 1e6 after clamping, so the cast cannot truncate.
#[allow(clippy::cast_possible_truncation)]
fn similarity_step(similarity: f64) -> i64 {
    let clamped = if similarity.is_nan() {
        0.0
    } else {
        similarity.clamp(0.0, 1.0)
    };
    (clamped / SIMILARITY_EPSILON).round() as i64
}

fn domain_key(result: &NormalizedResult) -> &str {
    result.store_domain.as_deref().unwrap_or("")
}

fn compare_price(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
#[path = "rank_test.rs"]
mod tests;
