//! HTTP client for the Vision API `images:annotate` endpoint.
//!
//! Wraps `reqwest` with key handling, typed request/response bodies, and
//! error mapping. Each call is a single attempt bounded by the client timeout.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::VisionError;
use crate::payload::ImagePayload;
use crate::types::{
    AnnotateImageRequest, AnnotateImageResponse, AnnotateRequest, AnnotateResponse, ErrorBody,
    Feature, ImageContent, ImageContext, LocalizedObjectAnnotation, WebDetection,
    WebDetectionParams,
};

const DEFAULT_BASE_URL: &str = "https://vision.googleapis.com";

/// Upper bound on annotations requested per feature.
const MAX_RESULTS: u32 = 10;

/// Client for the Vision API.
///
/// Use [`VisionClient::new`] for production or [`VisionClient::with_base_url`]
/// to point at a mock server in tests.
pub struct VisionClient {
    client: Client,
    endpoint: Url,
}

impl VisionClient {
    /// Creates a client pointed at the production Vision API.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, VisionError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`VisionError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, VisionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;

        let raw = format!("{}/v1/images:annotate", base_url.trim_end_matches('/'));
        let mut endpoint = Url::parse(&raw).map_err(|e| VisionError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        endpoint.query_pairs_mut().append_pair("key", api_key);

        Ok(Self { client, endpoint })
    }

    /// Runs `OBJECT_LOCALIZATION` on the image.
    ///
    /// An image with no recognizable objects yields an empty `Vec`.
    ///
    /// # Errors
    ///
    /// - [`VisionError::Http`] on network failure or timeout.
    /// - [`VisionError::UnexpectedStatus`] on a non-2xx response.
    /// - [`VisionError::Api`] if the service reports a per-image error.
    /// - [`VisionError::Deserialize`] if the body does not match the expected shape.
    pub async fn localize_objects(
        &self,
        payload: &ImagePayload,
    ) -> Result<Vec<LocalizedObjectAnnotation>, VisionError> {
        let content = payload.to_base64();
        let request = AnnotateImageRequest {
            image: ImageContent { content: &content },
            features: vec![Feature {
                kind: "OBJECT_LOCALIZATION",
                max_results: MAX_RESULTS,
            }],
            image_context: None,
        };
        let response = self.annotate(request, "object localization").await?;
        Ok(response.localized_object_annotations)
    }

    /// Runs `WEB_DETECTION` on the image, including geo-specific results.
    ///
    /// A response with no web detection section yields an empty
    /// [`WebDetection`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::localize_objects`].
    pub async fn detect_web(&self, payload: &ImagePayload) -> Result<WebDetection, VisionError> {
        let content = payload.to_base64();
        let request = AnnotateImageRequest {
            image: ImageContent { content: &content },
            features: vec![Feature {
                kind: "WEB_DETECTION",
                max_results: MAX_RESULTS,
            }],
            image_context: Some(ImageContext {
                web_detection_params: WebDetectionParams {
                    include_geo_results: true,
                },
            }),
        };
        let response = self.annotate(request, "web detection").await?;
        Ok(response.web_detection.unwrap_or_default())
    }

    /// Sends one annotate request and returns the single per-image response.
    async fn annotate(
        &self,
        request: AnnotateImageRequest<'_>,
        context: &str,
    ) -> Result<AnnotateImageResponse, VisionError> {
        let body = AnnotateRequest {
            requests: vec![request],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .map(|b| b.error.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| truncate(&text, 200));
            return Err(VisionError::UnexpectedStatus {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: AnnotateResponse =
            serde_json::from_str(&text).map_err(|e| VisionError::Deserialize {
                context: context.to_owned(),
                source: e,
            })?;

        let image_response = parsed.responses.into_iter().next().unwrap_or_default();
        if let Some(err) = image_response.error.as_ref() {
            if err.code != 0 || !err.message.is_empty() {
                return Err(VisionError::Api {
                    code: err.code,
                    message: err.message.clone(),
                });
            }
        }
        Ok(image_response)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
