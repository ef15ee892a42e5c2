//! Query string construction.

/// Wraps the trimmed query in double quotes for phrase matching.
///
/// Embedded double quotes are dropped so the phrase stays balanced.
#[must_use]
pub fn quote_query(query: &str) -> String {
    let inner: String = query.trim().chars().filter(|c| *c != '"').collect();
    format!("\"{inner}\"")
}

/// `site:a OR site:b ...` over the given domains.
#[must_use]
pub fn site_filter(domains: &[String]) -> String {
    domains
        .iter()
        .map(|d| format!("site:{d}"))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Final query sent to the service on the direct route. The proxy applies
/// the site restriction itself from its `trustedOnly` flag.
#[must_use]
pub fn build_direct_query(quoted: &str, trusted_only: bool, domains: &[String]) -> String {
    if trusted_only && !domains.is_empty() {
        format!("{quoted} {}", site_filter(domains))
    } else {
        quoted.to_owned()
    }
}
