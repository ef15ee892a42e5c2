//! Price extraction from free text such as `"Now 12.500 KD"` or `"ر.س 99"`.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use wainah_core::Catalog;

const NUMBER: &str = r"[0-9][0-9.,]*";

static BUILTIN: LazyLock<PriceParser> = LazyLock::new(|| PriceParser::new(&Catalog::builtin()));

/// An amount and the ISO 4217 code it was quoted in.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPrice {
    pub currency: String,
    pub value: f64,
}

impl ParsedPrice {
    /// `"12.5 KWD"`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{} {}", self.value, self.currency)
    }
}

/// Matches a number adjacent to a currency token from the catalog, in either
/// order. Amount-first matches win over token-first matches.
#[derive(Debug, Clone)]
pub struct PriceParser {
    amount_first: Option<Regex>,
    token_first: Option<Regex>,
    /// Lower-cased token → ISO code.
    tokens: HashMap<String, String>,
}

impl PriceParser {
    #[must_use]
    pub fn new(catalog: &Catalog) -> Self {
        let tokens: HashMap<String, String> = catalog
            .currency_tokens()
            .iter()
            .map(|(token, code)| (token.to_lowercase(), code.clone()))
            .collect();

        // Longest first so a token is never shadowed by one of its prefixes.
        let mut alternatives: Vec<&String> = catalog.currency_tokens().keys().collect();
        alternatives.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        let alternation = alternatives
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");

        let compile = |pattern: String| {
            if alternation.is_empty() {
                return None;
            }
            match Regex::new(&pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!(error = %e, "currency pattern rejected; price parsing disabled");
                    None
                }
            }
        };

        Self {
            amount_first: compile(format!(r"(?i)({NUMBER})\s*({alternation})")),
            token_first: compile(format!(r"(?i)({alternation})\s*({NUMBER})")),
            tokens,
        }
    }

    /// Returns the first price found in `text`, or `None` when no number sits
    /// next to a known currency token or the number does not parse.
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<ParsedPrice> {
        if text.trim().is_empty() {
            return None;
        }
        let (amount, token) = self
            .amount_first
            .as_ref()
            .and_then(|re| re.captures(text))
            .map(|caps| (caps[1].to_owned(), caps[2].to_owned()))
            .or_else(|| {
                self.token_first
                    .as_ref()
                    .and_then(|re| re.captures(text))
                    .map(|caps| (caps[2].to_owned(), caps[1].to_owned()))
            })?;

        let currency = self.tokens.get(&token.to_lowercase())?.clone();
        let value = amount.replace(',', "").parse::<f64>().ok()?;
        value.is_finite().then_some(ParsedPrice { currency, value })
    }
}

/// Parses `text` with the built-in currency tokens.
#[must_use]
pub fn parse_price(text: &str) -> Option<ParsedPrice> {
    BUILTIN.parse(text)
}
