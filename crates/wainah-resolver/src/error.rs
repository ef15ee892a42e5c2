use thiserror::Error;
use wainah_core::ConfigError;
use wainah_search::SearchError;
use wainah_vision::VisionError;

/// Failures that reach the caller of a resolution.
///
/// Crop and text-search failures are absorbed inside the pipeline and never
/// show up here.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("image payload is empty")]
    EmptyImage,

    #[error("search query is empty")]
    EmptyQuery,

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("visual match failed: {0}")]
    VisualMatch(#[source] VisionError),

    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },

    #[error("client setup failed: {0}")]
    Setup(String),
}

impl From<SearchError> for ResolveError {
    fn from(e: SearchError) -> Self {
        ResolveError::Setup(e.to_string())
    }
}
