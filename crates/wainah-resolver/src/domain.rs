use reqwest::Url;

/// Lower-cased host of `url` without a leading `www.`, or `None` when the URL
/// does not parse or has no host.
#[must_use]
pub fn hostname_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").map_or(host.clone(), str::to_owned);
    (!host.is_empty()).then_some(host)
}

/// Strips a leading `www.` from a display host such as `"www.noon.com"`.
#[must_use]
pub fn strip_www(host: &str) -> String {
    let lower = host.trim().to_lowercase();
    lower.strip_prefix("www.").map_or(lower.clone(), str::to_owned)
}
