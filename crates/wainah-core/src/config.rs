use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or credentials are half-configured.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or credentials are half-configured.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or credentials are half-configured.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default =
        |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("WAINAH_ENV", "development"))?;
    let log_level = or_default("WAINAH_LOG_LEVEL", "info");

    let vision_api_key = optional("VISION_API_KEY").or_else(|| optional("VITE_VISION_API_KEY"));
    let vision_base_url = or_default("WAINAH_VISION_BASE_URL", "https://vision.googleapis.com");

    let cse_api_key = optional("CSE_API_KEY");
    let cse_cx = optional("CSE_CX");
    match (&cse_api_key, &cse_cx) {
        (Some(_), None) => {
            return Err(ConfigError::InvalidEnvVar {
                var: "CSE_CX".to_string(),
                reason: "must be set together with CSE_API_KEY".to_string(),
            })
        }
        (None, Some(_)) => {
            return Err(ConfigError::InvalidEnvVar {
                var: "CSE_API_KEY".to_string(),
                reason: "must be set together with CSE_CX".to_string(),
            })
        }
        _ => {}
    }
    let cse_base_url = or_default("WAINAH_CSE_BASE_URL", "https://www.googleapis.com");
    let cse_proxy_url = optional("WAINAH_CSE_PROXY_URL");

    let request_timeout_secs = parse_u64("WAINAH_REQUEST_TIMEOUT_SECS", "8")?;
    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "WAINAH_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let user_agent = or_default("WAINAH_USER_AGENT", "wainah/0.1 (visual-product-search)");

    let default_country = parse_country(&or_default("WAINAH_DEFAULT_COUNTRY", "KW"))?;

    let text_result_count = parse_u32("WAINAH_TEXT_RESULT_COUNT", "10")?;
    if !(1..=30).contains(&text_result_count) {
        return Err(ConfigError::InvalidEnvVar {
            var: "WAINAH_TEXT_RESULT_COUNT".to_string(),
            reason: format!("{text_result_count} is outside 1..=30"),
        });
    }

    let catalog_path = optional("WAINAH_CATALOG_PATH").map(PathBuf::from);

    Ok(AppConfig {
        env,
        log_level,
        vision_api_key,
        vision_base_url,
        cse_api_key,
        cse_cx,
        cse_base_url,
        cse_proxy_url,
        request_timeout_secs,
        user_agent,
        default_country,
        text_result_count,
        catalog_path,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "WAINAH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

/// Accepts a two-letter country code in any case and returns it upper-cased.
fn parse_country(s: &str) -> Result<String, ConfigError> {
    if s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(s.to_ascii_uppercase())
    } else {
        Err(ConfigError::InvalidEnvVar {
            var: "WAINAH_DEFAULT_COUNTRY".to_string(),
            reason: format!("'{s}' is not a two-letter country code"),
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
