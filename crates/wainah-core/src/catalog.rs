//! Read-only lookup tables shared by every pipeline run: trusted storefronts,
//! storefront countries, currency tokens, and search regions.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

const TRUSTED_DOMAINS: &[&str] = &[
    "amazon.sa",
    "amazon.ae",
    "amazon.com",
    "noon.com",
    "xcite.com",
    "x-cite.com",
    "jarir.com",
    "extra.com",
    "carrefourksa.com",
    "carrefouruae.com",
    "luluhypermarket.com",
    "ikea.com",
    "shein.com",
    "namshi.com",
];

const DOMAIN_COUNTRIES: &[(&str, &str)] = &[
    ("amazon.sa", "SA"),
    ("amazon.ae", "AE"),
    ("xcite.com", "KW"),
    ("x-cite.com", "KW"),
    ("jarir.com", "SA"),
    ("extra.com", "SA"),
    ("carrefourksa.com", "SA"),
    ("carrefouruae.com", "AE"),
    ("luluhypermarket.com", "AE"),
];

const CURRENCY_TOKENS: &[(&str, &str)] = &[
    ("KWD", "KWD"),
    ("د.ك", "KWD"),
    ("KD", "KWD"),
    ("SAR", "SAR"),
    ("ر.س", "SAR"),
    ("ريال", "SAR"),
    ("AED", "AED"),
    ("د.إ", "AED"),
    ("USD", "USD"),
    ("$", "USD"),
];

const SEARCH_REGIONS: &[(&str, &str)] = &[
    ("KW", "kw"),
    ("SA", "sa"),
    ("AE", "ae"),
    ("QA", "qa"),
    ("OM", "om"),
    ("BH", "bh"),
];

const DEFAULT_REGION: &str = "sa";

/// Immutable lookup tables injected into the normalizer, ranker, and text
/// search collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    trusted_domains: Vec<String>,
    domain_countries: BTreeMap<String, String>,
    currency_tokens: BTreeMap<String, String>,
    search_regions: BTreeMap<String, String>,
    default_region: String,
}

/// On-disk shape of a catalog override. Omitted sections keep the built-ins.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    pub trusted_domains: Option<Vec<String>>,
    pub domain_countries: Option<BTreeMap<String, String>>,
    pub currency_tokens: Option<BTreeMap<String, String>>,
    pub search_regions: Option<BTreeMap<String, String>>,
    pub default_region: Option<String>,
}

impl Catalog {
    /// The tables the pipeline ships with.
    #[must_use]
    pub fn builtin() -> Self {
        let pairs = |table: &[(&str, &str)]| -> BTreeMap<String, String> {
            table
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect()
        };
        Self {
            trusted_domains: TRUSTED_DOMAINS.iter().map(|d| (*d).to_owned()).collect(),
            domain_countries: pairs(DOMAIN_COUNTRIES),
            currency_tokens: pairs(CURRENCY_TOKENS),
            search_regions: pairs(SEARCH_REGIONS),
            default_region: DEFAULT_REGION.to_owned(),
        }
    }

    /// Builds a catalog from an override file, keeping built-ins for any
    /// section the file leaves out.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if a table entry is empty.
    pub fn from_file(file: CatalogFile) -> Result<Self, ConfigError> {
        let mut catalog = Self::builtin();
        if let Some(domains) = file.trusted_domains {
            catalog.trusted_domains = domains.iter().map(|d| canonical_domain(d)).collect();
        }
        if let Some(countries) = file.domain_countries {
            catalog.domain_countries = countries
                .into_iter()
                .map(|(d, c)| (canonical_domain(&d), c.trim().to_uppercase()))
                .collect();
        }
        if let Some(tokens) = file.currency_tokens {
            catalog.currency_tokens = tokens
                .into_iter()
                .map(|(t, c)| (t.trim().to_owned(), c.trim().to_uppercase()))
                .collect();
        }
        if let Some(regions) = file.search_regions {
            catalog.search_regions = regions
                .into_iter()
                .map(|(c, gl)| (c.trim().to_uppercase(), gl.trim().to_lowercase()))
                .collect();
        }
        if let Some(region) = file.default_region {
            catalog.default_region = region.trim().to_lowercase();
        }
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.trusted_domains.iter().any(String::is_empty) {
            return Err(ConfigError::Validation(
                "trusted domain entries must be non-empty".to_string(),
            ));
        }
        if let Some((domain, _)) = self
            .domain_countries
            .iter()
            .find(|(d, c)| d.is_empty() || c.len() != 2)
        {
            return Err(ConfigError::Validation(format!(
                "domain country entry '{domain}' needs a non-empty domain and a two-letter country code"
            )));
        }
        if let Some((token, _)) = self
            .currency_tokens
            .iter()
            .find(|(t, c)| t.is_empty() || c.len() != 3)
        {
            return Err(ConfigError::Validation(format!(
                "currency token '{token}' needs a non-empty token and a three-letter ISO code"
            )));
        }
        if self.default_region.is_empty() {
            return Err(ConfigError::Validation(
                "default_region must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn trusted_domains(&self) -> &[String] {
        &self.trusted_domains
    }

    /// Currency token → ISO 4217 code.
    #[must_use]
    pub fn currency_tokens(&self) -> &BTreeMap<String, String> {
        &self.currency_tokens
    }

    /// Returns `true` if `domain` is, or is a subdomain of, a trusted storefront.
    #[must_use]
    pub fn is_trusted(&self, domain: &str) -> bool {
        !domain.is_empty()
            && self
                .trusted_domains
                .iter()
                .any(|trusted| domain_matches(domain, trusted))
    }

    /// Infers the storefront country from its domain. The longest matching
    /// table key wins, so `shop.amazon.sa` resolves through `amazon.sa`.
    #[must_use]
    pub fn country_for_domain(&self, domain: &str) -> Option<&str> {
        if domain.is_empty() {
            return None;
        }
        self.domain_countries
            .iter()
            .filter(|(key, _)| domain_matches(domain, key))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, country)| country.as_str())
    }

    /// Region hint (`gl`) for the text search service.
    #[must_use]
    pub fn search_region(&self, country: &str) -> &str {
        self.search_regions
            .get(&country.trim().to_uppercase())
            .map_or(self.default_region.as_str(), String::as_str)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Suffix match on whole labels: `uk.amazon.com` matches `amazon.com`,
/// `notamazon.com` does not.
fn domain_matches(domain: &str, key: &str) -> bool {
    domain == key
        || domain
            .strip_suffix(key)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn canonical_domain(domain: &str) -> String {
    let lower = domain.trim().to_lowercase();
    lower.strip_prefix("www.").map_or(lower.clone(), str::to_owned)
}

/// Load a catalog override from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<Catalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: CatalogFile = serde_yaml::from_str(&content)?;
    Catalog::from_file(file)
}
