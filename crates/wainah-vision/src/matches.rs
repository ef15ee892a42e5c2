//! Turns a web-detection response into pipeline candidates.
//!
//! Web detection only buckets matching images (full, partial, visually
//! similar), so each bucket gets a fixed similarity from [`MatchTier`].
//! Pages that embed a matching image become storefront-style hits.

use std::sync::LazyLock;

use regex::Regex;
use wainah_core::{ImageCandidate, MatchTier, RawCandidate, TextHitCandidate, STOREFRONT_SIMILARITY};

use crate::types::{WebDetection, WebImage};

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid tags regex"));
static SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Candidates and label extracted from one web-detection response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualMatches {
    pub best_guess_label: Option<String>,
    /// Full, partial, and visually-similar images in that order, followed by pages.
    pub candidates: Vec<RawCandidate>,
}

/// Maps web-detection sections to candidates.
#[must_use]
pub fn collect_visual_matches(web: &WebDetection) -> VisualMatches {
    let label = best_guess_label(web);
    let mut candidates = Vec::new();

    let tiers = [
        (MatchTier::Full, &web.full_matching_images),
        (MatchTier::Partial, &web.partial_matching_images),
        (MatchTier::VisuallySimilar, &web.visually_similar_images),
    ];
    for (tier, images) in tiers {
        candidates.extend(image_candidates(tier, images, label.as_deref()));
    }

    for (idx, page) in web.pages_with_matching_images.iter().enumerate() {
        let link = page.url.trim();
        if link.is_empty() {
            continue;
        }
        let title = page
            .page_title
            .as_deref()
            .map(clean_page_title)
            .filter(|t| !t.is_empty())
            .or_else(|| label.clone())
            .unwrap_or_else(|| link.to_owned());
        candidates.push(RawCandidate::TextHit(TextHitCandidate {
            id: format!("page-{idx}"),
            title,
            link: link.to_owned(),
            snippet: None,
            display_link: None,
            thumbnail: None,
            similarity: STOREFRONT_SIMILARITY,
        }));
    }

    tracing::debug!(
        label = label.as_deref().unwrap_or(""),
        full = web.full_matching_images.len(),
        partial = web.partial_matching_images.len(),
        similar = web.visually_similar_images.len(),
        pages = web.pages_with_matching_images.len(),
        "collected visual matches"
    );

    VisualMatches {
        best_guess_label: label,
        candidates,
    }
}

fn image_candidates<'a>(
    tier: MatchTier,
    images: &'a [WebImage],
    label: Option<&'a str>,
) -> impl Iterator<Item = RawCandidate> + 'a {
    images
        .iter()
        .filter(|img| !img.url.trim().is_empty())
        .enumerate()
        .map(move |(idx, img)| {
            RawCandidate::Image(ImageCandidate {
                id: format!("vis-{tier}-{idx}"),
                image_url: img.url.trim().to_owned(),
                tier,
                page_url: None,
                label: label.map(str::to_owned),
            })
        })
}

/// First non-empty best-guess label, else the highest-scoring described web
/// entity.
fn best_guess_label(web: &WebDetection) -> Option<String> {
    web.best_guess_labels
        .iter()
        .map(|l| l.label.trim())
        .find(|l| !l.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            web.web_entities
                .iter()
                .filter_map(|e| {
                    let description = e.description.as_deref()?.trim();
                    (!description.is_empty()).then_some((e.score, description))
                })
                .max_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, description)| description.to_owned())
        })
}

/// Strips markup and common entities from a page title and collapses whitespace.
#[must_use]
pub fn clean_page_title(raw: &str) -> String {
    let without_tags = TAG_RE.replace_all(raw, "");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    SPACE_RE.replace_all(decoded.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{WebEntity, WebLabel, WebPage};

    fn image(url: &str) -> WebImage {
        WebImage {
            url: url.to_owned(),
            score: None,
        }
    }

    fn sample() -> WebDetection {
        WebDetection {
            best_guess_labels: vec![WebLabel {
                label: "ceramic mug".to_owned(),
                language_code: Some("en".to_owned()),
            }],
            full_matching_images: vec![image("https://cdn.example.com/a.jpg")],
            partial_matching_images: vec![image("https://cdn.example.com/b.jpg"), image(" ")],
            visually_similar_images: vec![image("https://cdn.example.com/c.jpg")],
            pages_with_matching_images: vec![
                WebPage {
                    url: "https://www.xcite.com/mug".to_owned(),
                    score: None,
                    page_title: Some("Ceramic <b>Mug</b> &amp; Saucer".to_owned()),
                },
                WebPage {
                    url: "https://blog.example.com/post".to_owned(),
                    score: None,
                    page_title: None,
                },
            ],
            web_entities: Vec::new(),
        }
    }

    #[test]
    fn tiers_are_collected_in_order_with_fixed_scores() {
        let matches = collect_visual_matches(&sample());
        assert_eq!(matches.best_guess_label.as_deref(), Some("ceramic mug"));
        let tiers: Vec<MatchTier> = matches
            .candidates
            .iter()
            .filter_map(|c| match c {
                RawCandidate::Image(i) => Some(i.tier),
                RawCandidate::TextHit(_) => None,
            })
            .collect();
        assert_eq!(
            tiers,
            vec![MatchTier::Full, MatchTier::Partial, MatchTier::VisuallySimilar]
        );
    }

    #[test]
    fn image_candidates_have_no_page_link() {
        let matches = collect_visual_matches(&sample());
        let RawCandidate::Image(first) = &matches.candidates[0] else {
            panic!("expected image candidate first");
        };
        assert_eq!(first.id, "vis-full-0");
        assert!(first.page_url.is_none());
        assert_eq!(first.label.as_deref(), Some("ceramic mug"));
    }

    #[test]
    fn pages_become_storefront_hits() {
        let matches = collect_visual_matches(&sample());
        let pages: Vec<&TextHitCandidate> = matches
            .candidates
            .iter()
            .filter_map(|c| match c {
                RawCandidate::TextHit(t) => Some(t),
                RawCandidate::Image(_) => None,
            })
            .collect();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].title, "Ceramic Mug & Saucer");
        assert_eq!(pages[0].link, "https://www.xcite.com/mug");
        assert!(pages[0].thumbnail.is_none());
        assert!((pages[0].similarity - STOREFRONT_SIMILARITY).abs() < f64::EPSILON);
        assert_eq!(pages[1].title, "ceramic mug");
    }

    #[test]
    fn label_falls_back_to_top_web_entity() {
        let web = WebDetection {
            web_entities: vec![
                WebEntity {
                    entity_id: None,
                    score: 0.4,
                    description: Some("Cup".to_owned()),
                },
                WebEntity {
                    entity_id: None,
                    score: 0.9,
                    description: Some("Coffee mug".to_owned()),
                },
                WebEntity {
                    entity_id: None,
                    score: 1.2,
                    description: None,
                },
            ],
            ..WebDetection::default()
        };
        let matches = collect_visual_matches(&web);
        assert_eq!(matches.best_guess_label.as_deref(), Some("Coffee mug"));
    }

    #[test]
    fn empty_detection_yields_nothing() {
        let matches = collect_visual_matches(&WebDetection::default());
        assert!(matches.best_guess_label.is_none());
        assert!(matches.candidates.is_empty());
    }

    #[test]
    fn clean_page_title_collapses_whitespace() {
        assert_eq!(clean_page_title("  A\n  <i>b</i>\tC  "), "A b C");
    }
}
