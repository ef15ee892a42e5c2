use std::path::PathBuf;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub vision_api_key: Option<String>,
    pub vision_base_url: String,
    pub cse_api_key: Option<String>,
    pub cse_cx: Option<String>,
    pub cse_base_url: String,
    pub cse_proxy_url: Option<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub default_country: String,
    pub text_result_count: u32,
    pub catalog_path: Option<PathBuf>,
}

impl AppConfig {
    /// Returns the Vision API key, which image resolution cannot run without.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if no key was configured.
    pub fn require_vision_api_key(&self) -> Result<&str, ConfigError> {
        self.vision_api_key
            .as_deref()
            .ok_or_else(ConfigError::missing_vision_key)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field(
                "vision_api_key",
                &self.vision_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("vision_base_url", &self.vision_base_url)
            .field(
                "cse_api_key",
                &self.cse_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("cse_cx", &self.cse_cx.as_ref().map(|_| "[redacted]"))
            .field("cse_base_url", &self.cse_base_url)
            .field("cse_proxy_url", &self.cse_proxy_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("default_country", &self.default_country)
            .field("text_result_count", &self.text_result_count)
            .field("catalog_path", &self.catalog_path)
            .finish()
    }
}
