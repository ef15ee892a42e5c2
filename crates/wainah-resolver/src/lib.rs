//! Turns visual and text matches into one ranked list of storefront results.

pub mod dedup;
pub mod domain;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod price;
pub mod rank;

pub use dedup::{dedup_key, dedup_results};
pub use domain::hostname_of;
pub use error::ResolveError;
pub use normalize::Normalizer;
pub use pipeline::Resolver;
pub use price::{parse_price, ParsedPrice, PriceParser};
pub use rank::{compare_results, rank_results};
