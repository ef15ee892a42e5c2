//! HTTP client for the programmable search service.
//!
//! Two routes reach the same index:
//!
//! - **proxy**: a server-mediated endpoint that holds the credentials and
//!   answers `GET {proxy}?q&num&gl&trustedOnly` with one JSON body.
//! - **direct**: `GET {base}/customsearch/v1` with an API key and engine id,
//!   paginated by `start` offset.
//!
//! [`TextSearchClient::search`] tries the proxy first and falls back to the
//! direct route; see `search.rs`.

mod search;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Url};
use wainah_core::{AppConfig, Catalog};

use crate::error::SearchError;
use crate::pagination::PageWindow;
use crate::types::{ProxyResponse, SearchItem, SearchResponse};

pub use search::SearchOptions;

/// Fields requested from the direct route; everything else is dropped
/// server-side.
const DIRECT_FIELDS: &str =
    "items(link,displayLink,title,snippet,pagemap/cse_image,pagemap/metatags)";

/// Language restriction for the direct route.
const LANGUAGES: &str = "lang_ar|lang_en";

pub(super) struct DirectRoute {
    endpoint: Url,
    api_key: String,
    cx: String,
}

/// Client for text search.
///
/// Build with [`TextSearchClient::new`] and attach routes with
/// [`TextSearchClient::with_proxy`] and [`TextSearchClient::with_direct`], or
/// use [`TextSearchClient::from_config`]. A client with no routes is valid
/// and always returns no results.
pub struct TextSearchClient {
    pub(super) client: Client,
    pub(super) proxy: Option<Url>,
    pub(super) direct: Option<DirectRoute>,
    pub(super) catalog: Arc<Catalog>,
}

impl TextSearchClient {
    /// Creates a client with no routes configured.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        catalog: Arc<Catalog>,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            proxy: None,
            direct: None,
            catalog,
        })
    }

    /// Creates a client with every route the configuration enables.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built, or
    /// [`SearchError::InvalidBaseUrl`] if a configured URL does not parse.
    pub fn from_config(config: &AppConfig, catalog: Arc<Catalog>) -> Result<Self, SearchError> {
        let mut client = Self::new(config.request_timeout_secs, &config.user_agent, catalog)?;
        if let Some(proxy) = config.cse_proxy_url.as_deref() {
            client = client.with_proxy(proxy)?;
        }
        if let (Some(key), Some(cx)) = (config.cse_api_key.as_deref(), config.cse_cx.as_deref()) {
            client = client.with_direct(key, cx, &config.cse_base_url)?;
        }
        Ok(client)
    }

    /// Enables the proxy route.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidBaseUrl`] if `proxy_url` does not parse.
    pub fn with_proxy(mut self, proxy_url: &str) -> Result<Self, SearchError> {
        let url = Url::parse(proxy_url.trim()).map_err(|e| SearchError::InvalidBaseUrl {
            url: proxy_url.to_owned(),
            reason: e.to_string(),
        })?;
        self.proxy = Some(url);
        Ok(self)
    }

    /// Enables the direct route against `base_url` (production:
    /// `https://www.googleapis.com`).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_direct(mut self, api_key: &str, cx: &str, base_url: &str) -> Result<Self, SearchError> {
        let raw = format!("{}/customsearch/v1", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&raw).map_err(|e| SearchError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        self.direct = Some(DirectRoute {
            endpoint,
            api_key: api_key.to_owned(),
            cx: cx.to_owned(),
        });
        Ok(self)
    }

    /// Returns `true` if at least one route is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.proxy.is_some() || self.direct.is_some()
    }

    /// Fetches items through the proxy route.
    ///
    /// A body reporting `ok: false` yields no items rather than an error.
    ///
    /// # Errors
    ///
    /// - [`SearchError::NotConfigured`] if no proxy is set.
    /// - [`SearchError::UnexpectedStatus`] on a non-2xx response.
    /// - [`SearchError::Http`] on network failure or timeout.
    /// - [`SearchError::Deserialize`] if the body is not the expected JSON.
    pub async fn fetch_via_proxy(
        &self,
        quoted_query: &str,
        region: &str,
        num: u32,
        trusted_only: bool,
    ) -> Result<Vec<SearchItem>, SearchError> {
        let base = self
            .proxy
            .as_ref()
            .ok_or(SearchError::NotConfigured("proxy"))?;

        let mut url = base.clone();
        url.query_pairs_mut()
            .append_pair("q", quoted_query)
            .append_pair("num", &num.to_string())
            .append_pair("gl", region)
            .append_pair("trustedOnly", if trusted_only { "1" } else { "0" });

        let body = self.get_json_text(url, base.as_str()).await?;
        let parsed =
            serde_json::from_str::<ProxyResponse>(&body).map_err(|e| SearchError::Deserialize {
                context: "search proxy response".to_owned(),
                source: e,
            })?;

        if parsed.ok == Some(false) {
            tracing::debug!(
                error = parsed.error.as_deref().unwrap_or(""),
                "search proxy reported failure"
            );
        }

        let mut items = parsed.into_items();
        items.truncate(num as usize);
        Ok(items)
    }

    /// Fetches a single page from the direct route.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch_via_proxy`], with `NotConfigured` when no direct
    /// credentials are set.
    pub async fn fetch_direct_page(
        &self,
        query: &str,
        region: &str,
        window: PageWindow,
    ) -> Result<Vec<SearchItem>, SearchError> {
        let route = self
            .direct
            .as_ref()
            .ok_or(SearchError::NotConfigured("direct"))?;

        let mut url = route.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("key", &route.api_key)
            .append_pair("cx", &route.cx)
            .append_pair("q", query)
            .append_pair("num", &window.size.to_string())
            .append_pair("start", &window.start.to_string())
            .append_pair("gl", region)
            .append_pair("lr", LANGUAGES)
            .append_pair("safe", "off")
            .append_pair("fields", DIRECT_FIELDS);

        let body = self.get_json_text(url, route.endpoint.as_str()).await?;
        let parsed =
            serde_json::from_str::<SearchResponse>(&body).map_err(|e| SearchError::Deserialize {
                context: format!("search page at start={}", window.start),
                source: e,
            })?;
        Ok(parsed.items)
    }

    /// Sends a GET and returns the body of a 2xx response. `display_url` is
    /// reported in errors in place of the full URL so credentials stay out of
    /// logs.
    async fn get_json_text(&self, url: Url, display_url: &str) -> Result<String, SearchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::UnexpectedStatus {
                status: status.as_u16(),
                url: display_url.to_owned(),
            });
        }
        Ok(response.text().await.map_err(reqwest::Error::without_url)?)
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
