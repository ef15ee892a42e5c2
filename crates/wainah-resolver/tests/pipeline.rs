//! End-to-end tests for `Resolver` against wiremock stand-ins for the Vision
//! and search services.

use std::collections::HashMap;
use std::io::Cursor;
use std::time::Duration;

use image::{DynamicImage, ImageFormat};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wainah_core::{build_app_config, AppConfig, ConfigError, PolicyOverrides};
use wainah_resolver::{ResolveError, Resolver};
use wainah_vision::ImagePayload;

const ANNOTATE_PATH: &str = "/v1/images:annotate";
const SEARCH_PATH: &str = "/customsearch/v1";

fn config(server: &MockServer, extra: &[(&str, &str)]) -> AppConfig {
    let uri = server.uri();
    let mut vars: HashMap<String, String> = [
        ("VISION_API_KEY", "vision-key"),
        ("WAINAH_VISION_BASE_URL", uri.as_str()),
        ("CSE_API_KEY", "cse-key"),
        ("CSE_CX", "cse-cx"),
        ("WAINAH_CSE_BASE_URL", uri.as_str()),
        ("WAINAH_REQUEST_TIMEOUT_SECS", "5"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        vars.insert((*k).to_string(), (*v).to_string());
    }
    build_app_config(|key| vars.get(key).cloned().ok_or(std::env::VarError::NotPresent))
        .expect("test config is valid")
}

fn resolver(server: &MockServer) -> Resolver {
    Resolver::from_config(&config(server, &[])).expect("resolver builds")
}

fn png_payload() -> ImagePayload {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(64, 48)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("encode test png");
    ImagePayload::new(buf.into_inner())
}

async fn mount_localization(server: &MockServer, objects: Value) {
    Mock::given(method("POST"))
        .and(path(ANNOTATE_PATH))
        .and(body_partial_json(json!({
            "requests": [{ "features": [{ "type": "OBJECT_LOCALIZATION" }] }]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "responses": [{ "localizedObjectAnnotations": objects }] })),
        )
        .mount(server)
        .await;
}

async fn mount_web_detection(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(ANNOTATE_PATH))
        .and(body_partial_json(json!({
            "requests": [{ "features": [{ "type": "WEB_DETECTION" }] }]
        })))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

fn web_detection_body(label: Option<&str>) -> Value {
    let labels: Vec<Value> = label
        .map(|l| vec![json!({ "label": l })])
        .unwrap_or_default();
    json!({
        "responses": [{
            "webDetection": {
                "bestGuessLabels": labels,
                "fullMatchingImages": [{ "url": "https://cdn.example.com/kettle.jpg" }],
                "pagesWithMatchingImages": [{
                    "url": "https://www.xcite.com/electric-kettle",
                    "pageTitle": "Electric <b>Kettle</b> | Xcite"
                }]
            }
        }]
    })
}

async fn mount_search(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn trusted_page_ranks_above_linkless_full_match() {
    let server = MockServer::start().await;
    mount_localization(&server, json!([])).await;
    mount_web_detection(
        &server,
        ResponseTemplate::new(200).set_body_json(web_detection_body(Some("electric kettle"))),
    )
    .await;
    mount_search(&server, ResponseTemplate::new(200).set_body_json(json!({}))).await;

    let resolution = resolver(&server)
        .resolve_image(&png_payload(), &PolicyOverrides::default())
        .await
        .expect("resolution succeeds");

    assert_eq!(resolution.query_label, "electric kettle");
    assert_eq!(resolution.results.len(), 2);

    let page = &resolution.results[0];
    assert_eq!(page.id, "page-0");
    assert_eq!(page.name, "Electric Kettle | Xcite");
    assert_eq!(page.store_domain.as_deref(), Some("xcite.com"));
    assert_eq!(page.country_code.as_deref(), Some("KW"));

    let image = &resolution.results[1];
    assert_eq!(image.id, "vis-full-0");
    assert!(image.product_url.is_none());
    assert_eq!(image.confidence, Some(95.0));
}

#[tokio::test]
async fn text_hits_augment_visual_matches() {
    let server = MockServer::start().await;
    mount_localization(
        &server,
        json!([{
            "name": "Kettle",
            "score": 0.9,
            "boundingPoly": { "normalizedVertices": [
                { "x": 0.2, "y": 0.2 }, { "x": 0.8, "y": 0.2 }, { "x": 0.8, "y": 0.8 }, { "x": 0.2, "y": 0.8 }
            ]}
        }]),
    )
    .await;
    mount_web_detection(
        &server,
        ResponseTemplate::new(200).set_body_json(web_detection_body(Some("electric kettle"))),
    )
    .await;
    mount_search(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "link": "https://www.noon.com/kettle-1",
                    "displayLink": "www.noon.com",
                    "title": "Kettle 1.7L",
                    "snippet": "Only 9.900 KWD with free delivery"
                },
                {
                    "link": "https://www.xcite.com/electric-kettle",
                    "title": "Electric Kettle"
                }
            ]
        })),
    )
    .await;

    let resolution = resolver(&server)
        .resolve_image(&png_payload(), &PolicyOverrides::default())
        .await
        .expect("resolution succeeds");

    let ids: Vec<&str> = resolution.results.iter().map(|r| r.id.as_str()).collect();
    assert!(ids.contains(&"cse-0-https://www.noon.com/kettle-1"), "ids: {ids:?}");
    // The second search hit duplicates the visual page link and is dropped.
    assert!(!ids.iter().any(|id| id.starts_with("cse-1-")), "ids: {ids:?}");

    let noon = resolution
        .results
        .iter()
        .find(|r| r.store_domain.as_deref() == Some("noon.com"))
        .expect("noon hit present");
    assert_eq!(noon.price.as_deref(), Some("9.9 KWD"));
    assert_eq!(noon.currency.as_deref(), Some("KWD"));
    assert_eq!(noon.price_value, Some(9.9));
    assert_eq!(noon.store.as_deref(), Some("noon.com"));
}

#[tokio::test]
async fn text_search_failure_keeps_visual_results() {
    let server = MockServer::start().await;
    mount_localization(&server, json!([])).await;
    mount_web_detection(
        &server,
        ResponseTemplate::new(200).set_body_json(web_detection_body(Some("electric kettle"))),
    )
    .await;
    mount_search(&server, ResponseTemplate::new(500)).await;

    let resolution = resolver(&server)
        .resolve_image(&png_payload(), &PolicyOverrides::default())
        .await
        .expect("text failure is absorbed");
    assert_eq!(resolution.results.len(), 2);
}

#[tokio::test]
async fn localization_failure_falls_back_to_original_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ANNOTATE_PATH))
        .and(body_partial_json(json!({
            "requests": [{ "features": [{ "type": "OBJECT_LOCALIZATION" }] }]
        })))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_web_detection(
        &server,
        ResponseTemplate::new(200).set_body_json(web_detection_body(None)),
    )
    .await;

    let resolution = resolver(&server)
        .resolve_image(&png_payload(), &PolicyOverrides::default())
        .await
        .expect("crop failure is absorbed");
    assert_eq!(resolution.query_label, "image");
    assert_eq!(resolution.results.len(), 2);
}

#[tokio::test]
async fn web_detection_failure_is_fatal() {
    let server = MockServer::start().await;
    mount_localization(&server, json!([])).await;
    mount_web_detection(
        &server,
        ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "API key not valid" }
        })),
    )
    .await;

    let err = resolver(&server)
        .resolve_image(&png_payload(), &PolicyOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::VisualMatch(_)), "unexpected error: {err:?}");
    assert!(err.to_string().contains("API key not valid"));
}

#[tokio::test]
async fn empty_image_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = resolver(&server)
        .resolve_image(&ImagePayload::new(Vec::new()), &PolicyOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::EmptyImage));
}

#[tokio::test]
async fn invalid_base64_is_rejected() {
    let server = MockServer::start().await;
    let err = resolver(&server)
        .resolve_image_base64("data:image/png;base64,@@@", &PolicyOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::InvalidImage(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn missing_vision_key_is_a_config_error() {
    let server = MockServer::start().await;
    let mut cfg = config(&server, &[]);
    cfg.vision_api_key = None;
    let resolver = Resolver::from_config(&cfg).expect("resolver builds without vision key");

    let err = resolver
        .resolve_image(&png_payload(), &PolicyOverrides::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, ResolveError::Config(ConfigError::MissingEnvVar(ref var)) if var == "VISION_API_KEY"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn resolve_text_uses_query_as_label() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "link": "https://www.jarir.com/mug", "title": "Travel Mug SAR 45" },
                { "link": "https://www.xcite.com/mug", "title": "Travel Mug 3.5 KD" }
            ]
        })),
    )
    .await;

    let resolution = resolver(&server)
        .resolve_text("  travel mug ", &PolicyOverrides::default())
        .await
        .expect("text resolution succeeds");

    assert_eq!(resolution.query_label, "travel mug");
    assert_eq!(resolution.results.len(), 2);
    // Same trust and similarity; the Kuwaiti store wins for a KW shopper.
    assert_eq!(resolution.results[0].store_domain.as_deref(), Some("xcite.com"));
}

#[tokio::test]
async fn resolve_text_country_override_changes_locality() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "link": "https://www.xcite.com/mug", "title": "Travel Mug" },
                { "link": "https://www.jarir.com/mug", "title": "Travel Mug" }
            ]
        })),
    )
    .await;

    let overrides = PolicyOverrides {
        user_country: Some("sa".to_string()),
        ..PolicyOverrides::default()
    };
    let resolution = resolver(&server)
        .resolve_text("travel mug", &overrides)
        .await
        .expect("text resolution succeeds");
    assert_eq!(resolution.results[0].store_domain.as_deref(), Some("jarir.com"));
}

#[tokio::test]
async fn resolve_text_rejects_blank_query_and_missing_routes() {
    let server = MockServer::start().await;
    let err = resolver(&server)
        .resolve_text("   ", &PolicyOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::EmptyQuery));

    let mut cfg = config(&server, &[]);
    cfg.cse_api_key = None;
    cfg.cse_cx = None;
    let err = Resolver::from_config(&cfg)
        .expect("resolver builds")
        .resolve_text("mug", &PolicyOverrides::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, ResolveError::Config(ConfigError::MissingEnvVar(ref var)) if var.contains("CSE_CX")),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn crop_timeout_falls_back_to_original_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ANNOTATE_PATH))
        .and(body_partial_json(json!({
            "requests": [{ "features": [{ "type": "OBJECT_LOCALIZATION" }] }]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "responses": [{}] }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    mount_web_detection(
        &server,
        ResponseTemplate::new(200).set_body_json(web_detection_body(None)),
    )
    .await;

    let cfg = config(&server, &[("WAINAH_REQUEST_TIMEOUT_SECS", "1")]);
    let resolution = Resolver::from_config(&cfg)
        .expect("resolver builds")
        .resolve_image(&png_payload(), &PolicyOverrides::default())
        .await
        .expect("slow crop must not fail the resolution");

    assert_eq!(resolution.query_label, "image");
    assert_eq!(resolution.results.len(), 2);
    assert_eq!(resolution.results[0].id, "page-0");
}

#[tokio::test]
async fn web_detection_timeout_is_fatal() {
    let server = MockServer::start().await;
    mount_localization(&server, json!([])).await;
    mount_web_detection(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(web_detection_body(Some("electric kettle")))
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let cfg = config(&server, &[("WAINAH_REQUEST_TIMEOUT_SECS", "1")]);
    let err = Resolver::from_config(&cfg)
        .expect("resolver builds")
        .resolve_image(&png_payload(), &PolicyOverrides::default())
        .await
        .unwrap_err();

    // The stage timer and the HTTP client share one budget; either may fire first.
    assert!(
        matches!(
            err,
            ResolveError::Timeout { stage: "web detection", secs: 1 } | ResolveError::VisualMatch(_)
        ),
        "unexpected error: {err:?}"
    );
    assert!(!err.to_string().contains("vision-key"), "key leaked: {err}");
}

#[tokio::test]
async fn slow_text_search_keeps_visual_results() {
    let server = MockServer::start().await;
    mount_localization(&server, json!([])).await;
    mount_web_detection(
        &server,
        ResponseTemplate::new(200).set_body_json(web_detection_body(Some("electric kettle"))),
    )
    .await;
    mount_search(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(json!({
                "items": [{ "link": "https://www.noon.com/kettle", "title": "Kettle 9.9 KWD" }]
            }))
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let cfg = config(&server, &[("WAINAH_REQUEST_TIMEOUT_SECS", "1")]);
    let resolution = Resolver::from_config(&cfg)
        .expect("resolver builds")
        .resolve_image(&png_payload(), &PolicyOverrides::default())
        .await
        .expect("slow text search must not fail the resolution");

    assert_eq!(resolution.query_label, "electric kettle");
    assert_eq!(resolution.results.len(), 2);
    assert!(resolution
        .results
        .iter()
        .all(|r| r.store_domain.as_deref() != Some("noon.com")));
}

#[tokio::test]
async fn slow_text_search_yields_empty_text_resolution() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(json!({ "items": [{ "link": "https://www.xcite.com/mug", "title": "Mug" }] }))
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let cfg = config(&server, &[("WAINAH_REQUEST_TIMEOUT_SECS", "1")]);
    let resolution = Resolver::from_config(&cfg)
        .expect("resolver builds")
        .resolve_text("mug", &PolicyOverrides::default())
        .await
        .expect("timeouts are absorbed for text search");

    assert_eq!(resolution.query_label, "mug");
    assert!(resolution.results.is_empty());
}
