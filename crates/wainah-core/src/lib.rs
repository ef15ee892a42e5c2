//! Shared types, lookup tables, and configuration for the visual product
//! resolution pipeline.

pub mod app_config;
pub mod catalog;
pub mod config;
pub mod error;
pub mod results;

pub use app_config::{AppConfig, Environment};
pub use catalog::{load_catalog, Catalog};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use results::{
    ImageCandidate, MatchTier, NormalizedResult, PolicyOverrides, RankingPolicy, RawCandidate,
    Resolution, TextHitCandidate, STOREFRONT_SIMILARITY,
};
