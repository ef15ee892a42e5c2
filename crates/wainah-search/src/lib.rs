//! Text search over storefront pages.

pub mod client;
pub mod collect;
pub mod error;
pub mod pagination;
pub mod query;
pub mod types;

pub use client::{SearchOptions, TextSearchClient};
pub use collect::text_hits;
pub use error::SearchError;
pub use pagination::{clamp_result_count, PageWindow};
pub use types::{PageMap, ProxyResponse, SearchItem, SearchResponse};
