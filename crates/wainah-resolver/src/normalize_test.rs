use super::*;
use wainah_core::{MatchTier, STOREFRONT_SIMILARITY};

fn normalizer() -> Normalizer {
    Normalizer::new(Arc::new(Catalog::builtin()))
}

fn hit(id: &str, link: &str, title: &str, snippet: Option<&str>) -> RawCandidate {
    RawCandidate::TextHit(TextHitCandidate {
        id: id.to_owned(),
        title: title.to_owned(),
        link: link.to_owned(),
        snippet: snippet.map(str::to_owned),
        display_link: None,
        thumbnail: None,
        similarity: STOREFRONT_SIMILARITY,
    })
}

fn image(id: &str, url: &str, tier: MatchTier, label: Option<&str>) -> RawCandidate {
    RawCandidate::Image(ImageCandidate {
        id: id.to_owned(),
        image_url: url.to_owned(),
        tier,
        page_url: None,
        label: label.map(str::to_owned),
    })
}

#[test]
fn text_hit_gets_domain_store_price_and_country() {
    let result = normalizer().normalize_candidate(&hit(
        "cse-0",
        "https://www.xcite.com/kettle",
        "Electric Kettle",
        Some("Now only 12.500 KD"),
    ));
    assert_eq!(result.product_url.as_deref(), Some("https://www.xcite.com/kettle"));
    assert_eq!(result.store_domain.as_deref(), Some("xcite.com"));
    assert_eq!(result.store.as_deref(), Some("xcite.com"));
    assert_eq!(result.price.as_deref(), Some("12.5 KWD"));
    assert_eq!(result.currency.as_deref(), Some("KWD"));
    assert_eq!(result.price_value, Some(12.5));
    assert_eq!(result.country_code.as_deref(), Some("KW"));
    assert!((result.similarity - STOREFRONT_SIMILARITY).abs() < f64::EPSILON);
}

#[test]
fn text_hit_store_falls_back_to_display_link() {
    let candidate = RawCandidate::TextHit(TextHitCandidate {
        id: "cse-1".to_owned(),
        title: "Mug".to_owned(),
        link: "not a url".to_owned(),
        snippet: None,
        display_link: Some("www.Noon.com".to_owned()),
        thumbnail: Some("https://img.noon.com/m.jpg".to_owned()),
        similarity: STOREFRONT_SIMILARITY,
    });
    let result = normalizer().normalize_candidate(&candidate);
    assert!(result.store_domain.is_none());
    assert_eq!(result.store.as_deref(), Some("noon.com"));
    assert_eq!(result.image_url.as_deref(), Some("https://img.noon.com/m.jpg"));
    assert!(result.country_code.is_none());
}

#[test]
fn image_candidate_uses_tier_scores_and_never_derives_domain_from_image() {
    let result = normalizer().normalize_candidate(&image(
        "vis-full-0",
        "https://m.media-amazon.com/images/I/kettle.jpg",
        MatchTier::Full,
        Some("electric kettle"),
    ));
    assert_eq!(result.name, "electric kettle");
    assert!(result.product_url.is_none());
    assert!(result.store_domain.is_none());
    assert!(result.store.is_none());
    assert_eq!(result.confidence, Some(95.0));
    assert!((result.similarity - 0.95).abs() < f64::EPSILON);
}

#[test]
fn unlabeled_image_uses_tier_name() {
    let result = normalizer().normalize_candidate(&image(
        "vis-similar-0",
        "https://cdn.example.com/a.jpg",
        MatchTier::VisuallySimilar,
        None,
    ));
    assert_eq!(result.name, "Visually similar");
    assert!((result.similarity - 0.70).abs() < f64::EPSILON);
}

#[test]
fn confidence_only_sets_similarity() {
    let mut raw = NormalizedResult::new("a", "A", 0.0);
    raw.confidence = Some(85.0);
    let result = normalizer().normalize_result(raw);
    assert!((result.similarity - 0.85).abs() < 1e-9);

    let mut over = NormalizedResult::new("b", "B", f64::NAN);
    over.confidence = Some(140.0);
    assert!((normalizer().normalize_result(over).similarity - 1.0).abs() < f64::EPSILON);
}

#[test]
fn similarity_is_clamped_and_nan_becomes_zero() {
    let n = normalizer();
    assert!((n.normalize_result(NormalizedResult::new("a", "A", 1.7)).similarity - 1.0).abs() < f64::EPSILON);
    assert!(n.normalize_result(NormalizedResult::new("b", "B", f64::NAN)).similarity.abs() < f64::EPSILON);
    assert!(n.normalize_result(NormalizedResult::new("c", "C", -0.2)).similarity.abs() < f64::EPSILON);
}

#[test]
fn existing_fields_are_not_overwritten() {
    let mut raw = NormalizedResult::new("a", "A", 0.8);
    raw.product_url = Some("https://www.jarir.com/p".to_owned());
    raw.store = Some("Jarir Bookstore".to_owned());
    raw.country_code = Some("KW".to_owned());
    raw.price = Some("99 SAR".to_owned());
    raw.currency = Some("USD".to_owned());

    let result = normalizer().normalize_result(raw);
    assert_eq!(result.store.as_deref(), Some("Jarir Bookstore"));
    assert_eq!(result.store_domain.as_deref(), Some("jarir.com"));
    assert_eq!(result.country_code.as_deref(), Some("KW"));
    assert_eq!(result.currency.as_deref(), Some("USD"));
    assert_eq!(result.price_value, Some(99.0));
}

#[test]
fn country_lookup_respects_label_boundaries() {
    let mut sub = NormalizedResult::new("a", "A", 0.9);
    sub.product_url = Some("https://shop.amazon.sa/dp/1".to_owned());
    assert_eq!(
        normalizer().normalize_result(sub).country_code.as_deref(),
        Some("SA")
    );

    let mut lookalike = NormalizedResult::new("b", "B", 0.9);
    lookalike.product_url = Some("https://notxcite.com/p".to_owned());
    assert!(normalizer().normalize_result(lookalike).country_code.is_none());
}

#[test]
fn normalize_result_is_a_fixed_point() {
    let n = normalizer();
    let candidates = vec![
        hit("t", "https://www.carrefouruae.com/x", "Blender AED 149", None),
        image("i", "https://cdn.example.com/a.jpg", MatchTier::Partial, Some("blender")),
    ];
    for candidate in &candidates {
        let once = n.normalize_candidate(candidate);
        let twice = n.normalize_result(once.clone());
        assert_eq!(once, twice);
    }

    let mut zero = NormalizedResult::new("z", "Z", 0.0);
    zero.confidence = Some(0.0);
    let once = n.normalize_result(zero);
    assert_eq!(n.normalize_result(once.clone()), once);
}
