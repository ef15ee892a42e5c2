//! Vision API access: primary-object cropping and web-detection matches.

pub mod client;
pub mod crop;
pub mod error;
pub mod matches;
pub mod payload;
pub mod types;

pub use client::VisionClient;
pub use crop::{crop_primary_object, select_primary, BoundingBox, Detection, Point};
pub use error::VisionError;
pub use matches::{collect_visual_matches, VisualMatches};
pub use payload::ImagePayload;
pub use types::WebDetection;
