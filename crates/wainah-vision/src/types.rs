//! Vision API `images:annotate` request and response types.
//!
//! Only the fields the pipeline reads are modeled. The service omits zero
//! values (a vertex at `x = 0` arrives as `{"y": 0.4}`), so nearly every field
//! carries `#[serde(default)]`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct AnnotateRequest<'a> {
    pub requests: Vec<AnnotateImageRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnnotateImageRequest<'a> {
    pub image: ImageContent<'a>,
    pub features: Vec<Feature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_context: Option<ImageContext>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageContent<'a> {
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub max_results: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageContext {
    pub web_detection_params: WebDetectionParams,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WebDetectionParams {
    pub include_geo_results: bool,
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AnnotateResponse {
    #[serde(default)]
    pub responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnnotateImageResponse {
    #[serde(default)]
    pub localized_object_annotations: Vec<LocalizedObjectAnnotation>,
    #[serde(default)]
    pub web_detection: Option<WebDetection>,
    #[serde(default)]
    pub error: Option<ApiStatus>,
}

/// Error envelope, used both per-image and for non-2xx bodies.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: ApiStatus,
}

/// One object found by `OBJECT_LOCALIZATION`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedObjectAnnotation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub bounding_poly: BoundingPoly,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingPoly {
    /// Pixel coordinates; rarely populated for object localization.
    #[serde(default)]
    pub vertices: Vec<Vertex>,
    /// Coordinates relative to the image size, nominally in `[0, 1]`.
    #[serde(default)]
    pub normalized_vertices: Vec<Vertex>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Result of the `WEB_DETECTION` feature.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebDetection {
    #[serde(default)]
    pub web_entities: Vec<WebEntity>,
    #[serde(default)]
    pub full_matching_images: Vec<WebImage>,
    #[serde(default)]
    pub partial_matching_images: Vec<WebImage>,
    #[serde(default)]
    pub pages_with_matching_images: Vec<WebPage>,
    #[serde(default)]
    pub visually_similar_images: Vec<WebImage>,
    #[serde(default)]
    pub best_guess_labels: Vec<WebLabel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebEntity {
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebImage {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPage {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub score: Option<f64>,
    /// May contain markup such as `<b>` around matched terms.
    #[serde(default)]
    pub page_title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebLabel {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub language_code: Option<String>,
}
