//! Candidate normalization: raw source candidates into `NormalizedResult`.
//!
//! Two passes:
//!
//! 1. [`Normalizer::normalize_candidate`] maps each source shape onto the
//!    shared fields (name, links, tier scores, parsed price).
//! 2. [`Normalizer::normalize_result`] fills derivable fields that are still
//!    absent. It only ever fills gaps, so applying it twice changes nothing.

use std::sync::Arc;

use wainah_core::{Catalog, ImageCandidate, NormalizedResult, RawCandidate, TextHitCandidate};

use crate::domain::{hostname_of, strip_www};
use crate::price::PriceParser;

/// Normalizes candidates against one catalog.
#[derive(Debug, Clone)]
pub struct Normalizer {
    catalog: Arc<Catalog>,
    prices: PriceParser,
}

impl Normalizer {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let prices = PriceParser::new(&catalog);
        Self { catalog, prices }
    }

    /// Normalizes every candidate, keeping input order.
    #[must_use]
    pub fn normalize_all(&self, candidates: &[RawCandidate]) -> Vec<NormalizedResult> {
        candidates
            .iter()
            .map(|c| self.normalize_candidate(c))
            .collect()
    }

    #[must_use]
    pub fn normalize_candidate(&self, candidate: &RawCandidate) -> NormalizedResult {
        let result = match candidate {
            RawCandidate::Image(image) => from_image(image),
            RawCandidate::TextHit(hit) => self.from_text_hit(hit),
        };
        self.normalize_result(result)
    }

    /// Fills `store_domain`, `store`, `similarity`, `currency`/`price_value`,
    /// and `country_code` where they are absent and derivable.
    #[must_use]
    pub fn normalize_result(&self, mut result: NormalizedResult) -> NormalizedResult {
        if result.store_domain.is_none() {
            result.store_domain = result.product_url.as_deref().and_then(hostname_of);
        }
        if result.store.is_none() {
            result.store.clone_from(&result.store_domain);
        }

        if !result.similarity.is_finite() || result.similarity <= 0.0 {
            result.similarity = result
                .confidence
                .filter(|c| c.is_finite())
                .map_or(0.0, |c| c / 100.0);
        }
        result.similarity = clamp_unit(result.similarity);

        if result.currency.is_none() || result.price_value.is_none() {
            if let Some(parsed) = result.price.as_deref().and_then(|p| self.prices.parse(p)) {
                if result.currency.is_none() {
                    result.currency = Some(parsed.currency);
                }
                if result.price_value.is_none() {
                    result.price_value = Some(parsed.value);
                }
            }
        }

        if result.country_code.is_none() {
            result.country_code = result
                .store_domain
                .as_deref()
                .and_then(|d| self.catalog.country_for_domain(d))
                .map(str::to_owned);
        }

        result
    }

    fn from_text_hit(&self, hit: &TextHitCandidate) -> NormalizedResult {
        let mut result = NormalizedResult::new(hit.id.clone(), hit.title.clone(), hit.similarity);
        result.product_url = Some(hit.link.clone());
        result.image_url.clone_from(&hit.thumbnail);
        result.store_domain = hostname_of(&hit.link);
        result.store = result.store_domain.clone().or_else(|| {
            hit.display_link
                .as_deref()
                .map(strip_www)
                .filter(|s| !s.is_empty())
        });

        let price_text = [Some(hit.title.as_str()), hit.snippet.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(parsed) = self.prices.parse(&price_text) {
            result.price = Some(parsed.display());
            result.currency = Some(parsed.currency);
            result.price_value = Some(parsed.value);
        }
        result
    }
}

fn from_image(image: &ImageCandidate) -> NormalizedResult {
    let name = image
        .label
        .clone()
        .unwrap_or_else(|| image.tier.display_name().to_owned());
    let mut result = NormalizedResult::new(image.id.clone(), name, image.tier.similarity());
    result.image_url = Some(image.image_url.clone());
    result.product_url.clone_from(&image.page_url);
    result.confidence = Some(image.tier.confidence());
    result
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
