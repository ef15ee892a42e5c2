//! Route selection and direct-route pagination for `TextSearchClient`.

use wainah_core::RawCandidate;

use crate::collect::text_hits;
use crate::error::SearchError;
use crate::pagination::{clamp_result_count, PageWindow};
use crate::query::{build_direct_query, quote_query};
use crate::types::SearchItem;

use super::TextSearchClient;

/// Per-call search options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// ISO 3166 alpha-2 code of the shopper, used for the region hint.
    pub country: String,
    /// Requested result count; clamped to `1..=30`.
    pub num: u32,
    /// Restrict results to the trusted storefront allow-list.
    pub trusted_only: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            country: "KW".to_string(),
            num: 10,
            trusted_only: true,
        }
    }
}

impl TextSearchClient {
    /// Searches for `query` and returns text-hit candidates.
    ///
    /// Tries the proxy route first. If it fails or returns nothing, falls back
    /// to the direct route. Failures on both routes, or no route at all, yield
    /// an empty `Vec` and a warning; this never errors.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Vec<RawCandidate> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if !self.is_configured() {
            tracing::warn!("no text search route configured; skipping text search");
            return Vec::new();
        }

        let quoted = quote_query(trimmed);
        let region = self.catalog.search_region(&options.country).to_owned();
        let num = clamp_result_count(options.num);

        let mut items: Vec<SearchItem> = Vec::new();

        if self.proxy.is_some() {
            match self
                .fetch_via_proxy(&quoted, &region, num, options.trusted_only)
                .await
            {
                Ok(found) => {
                    tracing::debug!(count = found.len(), "search proxy returned items");
                    items = found;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "search proxy failed; trying direct route");
                }
            }
        }

        if items.is_empty() && self.direct.is_some() {
            match self
                .fetch_direct(&quoted, &region, num, options.trusted_only)
                .await
            {
                Ok(found) => {
                    tracing::debug!(count = found.len(), "direct search returned items");
                    items = found;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "direct search failed; returning no text results");
                }
            }
        }

        text_hits(&items, trimmed)
    }

    /// Collects up to `num` items from the direct route, page by page.
    ///
    /// Stops at the requested count or at the first empty or short page. A
    /// failure on the first page is returned; a failure on a later page keeps
    /// the items gathered so far.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_direct_page`] on the first page.
    pub async fn fetch_direct(
        &self,
        quoted_query: &str,
        region: &str,
        num: u32,
        trusted_only: bool,
    ) -> Result<Vec<SearchItem>, SearchError> {
        let query = build_direct_query(quoted_query, trusted_only, self.catalog.trusted_domains());
        let requested = clamp_result_count(num);
        let mut collected: Vec<SearchItem> = Vec::new();

        for page in 0.. {
            let Some(window) = PageWindow::for_page(page, requested) else {
                break;
            };

            let items = match self.fetch_direct_page(&query, region, window).await {
                Ok(items) => items,
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        start = window.start,
                        kept = collected.len(),
                        "search page failed; keeping earlier pages"
                    );
                    break;
                }
            };

            let received = items.len();
            collected.extend(items);
            if window.is_last(received) {
                break;
            }
        }

        collected.truncate(requested as usize);
        Ok(collected)
    }
}
