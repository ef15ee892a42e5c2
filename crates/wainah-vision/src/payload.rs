//! Raw image bytes as submitted by the caller.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::VisionError;

/// An encoded raster image (JPEG, PNG, ...). The bytes are never inspected
/// until cropping decodes them.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
}

impl ImagePayload {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Decodes a base64 payload. A `data:<mime>;base64,` prefix is accepted
    /// and whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::InvalidImage`] if the text is not valid base64.
    pub fn from_base64(encoded: &str) -> Result<Self, VisionError> {
        let content = if encoded.trim_start().starts_with("data:") {
            encoded.rsplit(',').next().unwrap_or_default()
        } else {
            encoded
        };
        let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| VisionError::InvalidImage(format!("payload is not valid base64: {e}")))?;
        Ok(Self { bytes })
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Standard base64 of the bytes, as the Vision API expects in `image.content`.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl From<Vec<u8>> for ImagePayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}
