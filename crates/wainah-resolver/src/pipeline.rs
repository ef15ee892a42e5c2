//! Resolution pipeline orchestration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use wainah_core::{
    load_catalog, AppConfig, Catalog, ConfigError, PolicyOverrides, RankingPolicy, RawCandidate,
    Resolution,
};
use wainah_search::pagination::max_pages;
use wainah_search::{clamp_result_count, SearchOptions, TextSearchClient};
use wainah_vision::{collect_visual_matches, crop_primary_object, ImagePayload, VisionClient};

use crate::dedup::dedup_results;
use crate::error::ResolveError;
use crate::normalize::Normalizer;
use crate::rank::rank_results;

/// Query label reported when web detection offers no best guess.
pub const FALLBACK_IMAGE_LABEL: &str = "image";

/// Resolves images and text queries into ranked storefront matches.
///
/// Holds only immutable clients and tables, so one instance can serve
/// concurrent requests behind an `Arc`.
pub struct Resolver {
    vision: Option<VisionClient>,
    search: TextSearchClient,
    normalizer: Normalizer,
    catalog: Arc<Catalog>,
    default_country: String,
    text_result_count: u32,
    call_timeout_secs: u64,
}

impl Resolver {
    /// Builds a resolver from configuration, loading the catalog override
    /// file when one is configured.
    ///
    /// A missing Vision API key is not an error here; image resolution
    /// reports it when called.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Config`] if the catalog file cannot be loaded,
    /// or [`ResolveError::Setup`] if an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ResolveError> {
        let catalog = match config.catalog_path.as_deref() {
            Some(path) => load_catalog(path)?,
            None => Catalog::builtin(),
        };
        Self::with_catalog(config, Arc::new(catalog))
    }

    /// Builds a resolver from configuration with an explicit catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Setup`] if an HTTP client cannot be built.
    pub fn with_catalog(config: &AppConfig, catalog: Arc<Catalog>) -> Result<Self, ResolveError> {
        let vision = match config.require_vision_api_key() {
            Ok(key) => Some(
                VisionClient::with_base_url(
                    key,
                    config.request_timeout_secs,
                    &config.user_agent,
                    &config.vision_base_url,
                )
                .map_err(|e| ResolveError::Setup(e.to_string()))?,
            ),
            Err(e) => {
                tracing::debug!(error = %e, "image resolution disabled");
                None
            }
        };
        let search = TextSearchClient::from_config(config, Arc::clone(&catalog))?;

        Ok(Self {
            vision,
            search,
            normalizer: Normalizer::new(Arc::clone(&catalog)),
            catalog,
            default_country: config.default_country.clone(),
            text_result_count: clamp_result_count(config.text_result_count),
            call_timeout_secs: config.request_timeout_secs,
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolves base64 image text (optionally a `data:` URL).
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidImage`] if the text is not base64, and
    /// otherwise the same errors as [`Self::resolve_image`].
    pub async fn resolve_image_base64(
        &self,
        encoded: &str,
        overrides: &PolicyOverrides,
    ) -> Result<Resolution, ResolveError> {
        if encoded.trim().is_empty() {
            return Err(ResolveError::EmptyImage);
        }
        let payload =
            ImagePayload::from_base64(encoded).map_err(|e| ResolveError::InvalidImage(e.to_string()))?;
        self.resolve_image(&payload, overrides).await
    }

    /// Runs the full image pipeline:
    ///
    /// 1. Crop to the primary object (falls back to the original image).
    /// 2. Web detection on the cropped or original image.
    /// 3. Text search with the best-guess label (skipped on failure).
    /// 4. Normalize, deduplicate, and rank.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::EmptyImage`] for an empty payload.
    /// - [`ResolveError::Config`] if no Vision API key is configured.
    /// - [`ResolveError::VisualMatch`] or [`ResolveError::Timeout`] if web
    ///   detection fails.
    pub async fn resolve_image(
        &self,
        payload: &ImagePayload,
        overrides: &PolicyOverrides,
    ) -> Result<Resolution, ResolveError> {
        let started = Instant::now();
        if payload.is_empty() {
            return Err(ResolveError::EmptyImage);
        }
        let vision = self
            .vision
            .as_ref()
            .ok_or_else(ConfigError::missing_vision_key)?;
        let policy = self.policy(overrides);

        let cropped = match tokio::time::timeout(
            self.call_timeout(),
            crop_primary_object(vision, payload),
        )
        .await
        {
            Ok(cropped) => cropped,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.call_timeout_secs,
                    "crop timed out; using original image"
                );
                None
            }
        };
        let image = cropped.as_ref().unwrap_or(payload);
        tracing::debug!(
            cropped = cropped.is_some(),
            bytes = image.len(),
            "image prepared for web detection"
        );

        let web = tokio::time::timeout(self.call_timeout(), vision.detect_web(image))
            .await
            .map_err(|_| ResolveError::Timeout {
                stage: "web detection",
                secs: self.call_timeout_secs,
            })?
            .map_err(ResolveError::VisualMatch)?;

        let visual = collect_visual_matches(&web);
        let mut candidates = visual.candidates;

        match visual.best_guess_label.as_deref() {
            Some(label) if self.search.is_configured() => {
                let hits = self.search_text(label, &policy).await;
                candidates.extend(hits);
            }
            Some(_) => {
                tracing::debug!("no text search route configured; using visual matches only");
            }
            None => {
                tracing::debug!("no best-guess label; skipping text search");
            }
        }

        let label = visual
            .best_guess_label
            .unwrap_or_else(|| FALLBACK_IMAGE_LABEL.to_string());
        Ok(self.finish(&candidates, &policy, label, started))
    }

    /// Resolves a typed query through text search alone.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::EmptyQuery`] for a blank query.
    /// - [`ResolveError::Config`] if no text search route is configured.
    pub async fn resolve_text(
        &self,
        query: &str,
        overrides: &PolicyOverrides,
    ) -> Result<Resolution, ResolveError> {
        let started = Instant::now();
        let query = query.trim();
        if query.is_empty() {
            return Err(ResolveError::EmptyQuery);
        }
        if !self.search.is_configured() {
            return Err(ConfigError::missing_text_search().into());
        }
        let policy = self.policy(overrides);

        let candidates = self.search_text(query, &policy).await;
        Ok(self.finish(&candidates, &policy, query.to_string(), started))
    }

    /// Text search bounded by the stage timeout. Failures yield no hits.
    async fn search_text(&self, query: &str, policy: &RankingPolicy) -> Vec<RawCandidate> {
        let options = SearchOptions {
            country: policy.user_country.clone(),
            num: self.text_result_count,
            trusted_only: policy.only_trusted,
        };
        let budget = self.text_stage_timeout();
        match tokio::time::timeout(budget, self.search.search(query, &options)).await {
            Ok(hits) => {
                tracing::debug!(query, count = hits.len(), "text search complete");
                hits
            }
            Err(_) => {
                tracing::warn!(
                    query,
                    timeout_secs = budget.as_secs(),
                    "text search timed out; continuing without text results"
                );
                Vec::new()
            }
        }
    }

    fn finish(
        &self,
        candidates: &[RawCandidate],
        policy: &RankingPolicy,
        query_label: String,
        started: Instant,
    ) -> Resolution {
        let normalized = self.normalizer.normalize_all(candidates);
        let unique = dedup_results(normalized);
        let results = rank_results(&unique, policy, &self.catalog);
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(
            label = %query_label,
            candidates = candidates.len(),
            unique = unique.len(),
            results = results.len(),
            elapsed_ms,
            "resolution complete"
        );

        Resolution {
            results,
            query_label,
            elapsed_ms,
        }
    }

    fn policy(&self, overrides: &PolicyOverrides) -> RankingPolicy {
        RankingPolicy::for_country(&self.default_country).with_overrides(overrides)
    }

    fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// One call budget for the proxy plus one per direct-route page.
    fn text_stage_timeout(&self) -> Duration {
        let calls = u64::from(max_pages(self.text_result_count)) + 1;
        Duration::from_secs(self.call_timeout_secs.saturating_mul(calls))
    }
}
