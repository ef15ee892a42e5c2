use serde::{Deserialize, Serialize};

/// Similarity assigned to storefront pages, whether they come from a text
/// search hit or from a page that embeds a matching image.
pub const STOREFRONT_SIMILARITY: f64 = 0.93;

/// Categorical bucket the web-detection service places a matching image in.
///
/// The service does not return a usable similarity score, so each bucket maps
/// to a fixed similarity/confidence pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Full,
    Partial,
    VisuallySimilar,
}

impl MatchTier {
    /// Fixed similarity in `[0, 1]` for this tier.
    #[must_use]
    pub fn similarity(self) -> f64 {
        match self {
            MatchTier::Full => 0.95,
            MatchTier::Partial => 0.85,
            MatchTier::VisuallySimilar => 0.70,
        }
    }

    /// Fixed confidence on the `0..=100` scale for this tier.
    #[must_use]
    pub fn confidence(self) -> f64 {
        match self {
            MatchTier::Full => 95.0,
            MatchTier::Partial => 85.0,
            MatchTier::VisuallySimilar => 70.0,
        }
    }

    /// Short tag used in candidate ids.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            MatchTier::Full => "full",
            MatchTier::Partial => "partial",
            MatchTier::VisuallySimilar => "similar",
        }
    }

    /// Display name used when no better label is known.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            MatchTier::Full => "Full match",
            MatchTier::Partial => "Partial match",
            MatchTier::VisuallySimilar => "Visually similar",
        }
    }
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// An unranked reference gathered from one external source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCandidate {
    Image(ImageCandidate),
    TextHit(TextHitCandidate),
}

impl RawCandidate {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            RawCandidate::Image(c) => &c.id,
            RawCandidate::TextHit(c) => &c.id,
        }
    }
}

/// A matching image returned by web detection.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCandidate {
    pub id: String,
    pub image_url: String,
    pub tier: MatchTier,
    /// Page the image was found on, when the source reports one.
    pub page_url: Option<String>,
    /// Best-guess label for the submitted image, used as the display name.
    pub label: Option<String>,
}

/// A web page hit: a text-search result or a page embedding a matching image.
#[derive(Debug, Clone, PartialEq)]
pub struct TextHitCandidate {
    pub id: String,
    pub title: String,
    pub link: String,
    pub snippet: Option<String>,
    /// Host as displayed by the search service, e.g. `"www.xcite.com"`.
    pub display_link: Option<String>,
    /// Preview image pulled from the page's embedded metadata.
    pub thumbnail: Option<String>,
    pub similarity: f64,
}

/// Canonical, source-independent representation of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    /// Unique within one pipeline run.
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    /// Lower-cased hostname of `product_url` with any `www.` prefix removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_domain: Option<String>,
    /// Raw price text, e.g. `"12.5 KWD"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// ISO 4217 code resolved from the price text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_value: Option<f64>,
    /// ISO 3166 alpha-2 code inferred from `store_domain`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    /// Source-reported confidence on the `0..=100` scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Similarity in `[0, 1]`.
    #[serde(default)]
    pub similarity: f64,
}

impl NormalizedResult {
    /// Creates a result with only the required fields set.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, similarity: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            product_url: None,
            image_url: None,
            store: None,
            store_domain: None,
            price: None,
            currency: None,
            price_value: None,
            country_code: None,
            confidence: None,
            similarity,
        }
    }

    /// Returns `true` if the result links to a product page.
    #[must_use]
    pub fn has_link(&self) -> bool {
        self.product_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Filter parameters for one ranking pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingPolicy {
    /// ISO 3166 alpha-2 code of the shopper, e.g. `"KW"`.
    pub user_country: String,
    pub min_similarity: f64,
    pub only_trusted: bool,
    pub require_link: bool,
}

impl RankingPolicy {
    pub const DEFAULT_MIN_SIMILARITY: f64 = 0.60;

    /// The primary policy for a shopper in `user_country`.
    #[must_use]
    pub fn for_country(user_country: &str) -> Self {
        Self {
            user_country: user_country.trim().to_uppercase(),
            min_similarity: Self::DEFAULT_MIN_SIMILARITY,
            only_trusted: true,
            require_link: true,
        }
    }

    /// Applies caller-supplied overrides on top of this policy.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &PolicyOverrides) -> Self {
        if let Some(country) = overrides.user_country.as_deref() {
            if !country.trim().is_empty() {
                self.user_country = country.trim().to_uppercase();
            }
        }
        if let Some(min) = overrides.min_similarity {
            if min.is_finite() {
                self.min_similarity = min.clamp(0.0, 1.0);
            }
        }
        if let Some(only_trusted) = overrides.only_trusted {
            self.only_trusted = only_trusted;
        }
        self
    }
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self::for_country("KW")
    }
}

/// Optional per-request adjustments to the ranking policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyOverrides {
    pub user_country: Option<String>,
    pub min_similarity: Option<f64>,
    pub only_trusted: Option<bool>,
}

/// Output of one resolution request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub results: Vec<NormalizedResult>,
    /// Label the results were resolved for (best guess or the user query).
    pub query_label: String,
    /// Wall-clock time spent resolving, in milliseconds.
    #[serde(rename = "elapsedTime")]
    pub elapsed_ms: u64,
}
