//! Maps search items to pipeline candidates.

use wainah_core::{RawCandidate, TextHitCandidate, STOREFRONT_SIMILARITY};

use crate::types::SearchItem;

/// Converts items to text-hit candidates, skipping items without a link.
///
/// `query` is the unquoted user query; it stands in for a missing title.
#[must_use]
pub fn text_hits(items: &[SearchItem], query: &str) -> Vec<RawCandidate> {
    items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| text_hit(item, idx, query))
        .map(RawCandidate::TextHit)
        .collect()
}

fn text_hit(item: &SearchItem, idx: usize, query: &str) -> Option<TextHitCandidate> {
    let link = non_blank(item.link.as_deref())?;
    let title = non_blank(item.title.as_deref()).unwrap_or_else(|| query.trim().to_owned());

    Some(TextHitCandidate {
        id: format!("cse-{idx}-{link}"),
        title,
        snippet: non_blank(item.snippet.as_deref()),
        display_link: non_blank(item.display_link.as_deref()),
        thumbnail: item.thumbnail(),
        link,
        similarity: STOREFRONT_SIMILARITY,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
