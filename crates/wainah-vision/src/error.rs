use thiserror::Error;

/// Errors returned by the Vision API client and image handling.
#[derive(Debug, Error)]
pub enum VisionError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("Vision API returned HTTP {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    /// The service answered 200 but reported a per-image error.
    #[error("Vision API error {code}: {message}")]
    Api { code: i32, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid Vision API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The image payload is empty, not valid base64, or not a decodable raster.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}
