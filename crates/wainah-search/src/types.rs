//! Response types for the programmable search service and its proxy.
//!
//! ## Observed shape
//!
//! The service omits `items` entirely when a query has no results, and any
//! item may lack `pagemap`. `pagemap.metatags` is an array of loose objects
//! whose values are usually strings, so it is kept as raw JSON and read
//! field-by-field.
//!
//! The proxy wraps items as `{ "ok": true, "items": [...] }`. Older
//! deployments answered `{ "products": [...] }` with the same item shape.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Top-level response from `GET /customsearch/v1`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

/// Response from the server-mediated proxy route.
#[derive(Debug, Default, Deserialize)]
pub struct ProxyResponse {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub items: Option<Vec<SearchItem>>,
    #[serde(default)]
    pub products: Option<Vec<SearchItem>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProxyResponse {
    /// Items from whichever envelope the proxy used; `items` wins when both
    /// are present.
    #[must_use]
    pub fn into_items(self) -> Vec<SearchItem> {
        self.items.or(self.products).unwrap_or_default()
    }
}

/// One web result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    #[serde(default)]
    pub link: Option<String>,
    /// Host as shown to users, e.g. `"www.xcite.com"`.
    #[serde(default)]
    pub display_link: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub pagemap: Option<PageMap>,
}

impl SearchItem {
    /// Preview image from `cse_image[0].src`, else `metatags[0]["og:image"]`.
    #[must_use]
    pub fn thumbnail(&self) -> Option<String> {
        let pagemap = self.pagemap.as_ref()?;
        let from_cse = pagemap
            .cse_image
            .first()
            .and_then(|img| img.src.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let from_meta = || {
            pagemap
                .metatags
                .first()
                .and_then(|tags| tags.get("og:image"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };
        from_cse.or_else(from_meta).map(str::to_owned)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMap {
    #[serde(default)]
    pub cse_image: Vec<PageImage>,
    #[serde(default)]
    pub metatags: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageImage {
    #[serde(default)]
    pub src: Option<String>,
}
