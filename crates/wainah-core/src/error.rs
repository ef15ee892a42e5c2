use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),

    #[error("catalog validation failed: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Image resolution was requested without a Vision API key.
    #[must_use]
    pub fn missing_vision_key() -> Self {
        ConfigError::MissingEnvVar("VISION_API_KEY".to_string())
    }

    /// Text resolution was requested without any search route.
    #[must_use]
    pub fn missing_text_search() -> Self {
        ConfigError::MissingEnvVar("WAINAH_CSE_PROXY_URL or CSE_API_KEY/CSE_CX".to_string())
    }
}
