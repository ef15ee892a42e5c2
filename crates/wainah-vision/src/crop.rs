//! Primary-object cropping ahead of the web-detection call.
//!
//! Object localization returns boxes for everything it recognizes. The box
//! that best represents the product is the one with the largest
//! `score * area`, ignoring body-part classes that would crop onto the person
//! holding the product. Cropping is best-effort: every failure degrades to
//! "no crop" and the caller keeps the original image.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use crate::client::VisionClient;
use crate::payload::ImagePayload;
use crate::types::LocalizedObjectAnnotation;

/// Labels never chosen as the primary subject.
const EXCLUDED_LABELS: &[&str] = &["Person", "Hand", "Arm"];

/// Margin added on each side of the primary box, as a fraction of its size.
pub const CROP_MARGIN: f64 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A localized object with exactly four vertices in `[0, 1] x [0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub score: f64,
    pub vertices: [Point; 4],
}

impl Detection {
    /// Builds a detection, normalizing the vertex list (see [`normalize_vertices`]).
    #[must_use]
    pub fn new(label: impl Into<String>, score: f64, raw_vertices: &[Point]) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            label: label.into(),
            score,
            vertices: normalize_vertices(raw_vertices),
        }
    }

    /// Converts a wire annotation. Normalized vertices are preferred; pixel
    /// vertices are scaled by `image_size` when they are all that is present.
    #[must_use]
    pub fn from_annotation(annotation: &LocalizedObjectAnnotation, image_size: (u32, u32)) -> Self {
        let poly = &annotation.bounding_poly;
        let raw: Vec<Point> = if !poly.normalized_vertices.is_empty() {
            poly.normalized_vertices
                .iter()
                .map(|v| Point { x: v.x, y: v.y })
                .collect()
        } else if image_size.0 > 0 && image_size.1 > 0 {
            let (w, h) = (f64::from(image_size.0), f64::from(image_size.1));
            poly.vertices
                .iter()
                .map(|v| Point {
                    x: v.x / w,
                    y: v.y / h,
                })
                .collect()
        } else {
            Vec::new()
        };
        Self::new(annotation.name.clone(), annotation.score, &raw)
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        box_area(&self.vertices)
    }

    #[must_use]
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::enclosing(&self.vertices)
    }

    fn weight(&self) -> f64 {
        self.score * self.area()
    }
}

/// Keeps at most four vertices, clamps each coordinate into `[0, 1]`, and pads
/// with `(0, 0)` up to four. Non-finite coordinates become `0`.
#[must_use]
pub fn normalize_vertices(raw: &[Point]) -> [Point; 4] {
    let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
    let mut out = [Point::default(); 4];
    for (slot, p) in out.iter_mut().zip(raw.iter()) {
        *slot = Point {
            x: clamp(p.x),
            y: clamp(p.y),
        };
    }
    out
}

/// Area of the axis-aligned extent of `vertices`.
#[must_use]
pub fn box_area(vertices: &[Point]) -> f64 {
    let b = BoundingBox::enclosing(vertices);
    (b.max_x - b.min_x).max(0.0) * (b.max_y - b.min_y).max(0.0)
}

/// Returns `true` for body-part classes that must not be cropped to.
#[must_use]
pub fn is_excluded_label(label: &str) -> bool {
    EXCLUDED_LABELS
        .iter()
        .any(|excluded| excluded.eq_ignore_ascii_case(label.trim()))
}

/// Picks the detection with the greatest `score * area`, skipping excluded
/// labels. The first of equally weighted detections wins.
#[must_use]
pub fn select_primary(detections: &[Detection]) -> Option<&Detection> {
    detections
        .iter()
        .filter(|d| !is_excluded_label(&d.label))
        .fold(None, |best: Option<&Detection>, d| {
            if best.is_none_or(|b| d.weight() > b.weight()) {
                Some(d)
            } else {
                best
            }
        })
}

/// Axis-aligned rectangle in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Smallest box containing every vertex. An empty slice gives a zero box.
    #[must_use]
    pub fn enclosing(vertices: &[Point]) -> Self {
        if vertices.is_empty() {
            return Self {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 0.0,
                max_y: 0.0,
            };
        }
        vertices.iter().fold(
            Self {
                min_x: f64::INFINITY,
                min_y: f64::INFINITY,
                max_x: f64::NEG_INFINITY,
                max_y: f64::NEG_INFINITY,
            },
            |b, p| Self {
                min_x: b.min_x.min(p.x),
                min_y: b.min_y.min(p.y),
                max_x: b.max_x.max(p.x),
                max_y: b.max_y.max(p.y),
            },
        )
    }

    /// Grows the box by `margin` of its width/height on each side, clamped to `[0, 1]`.
    #[must_use]
    pub fn expand(self, margin: f64) -> Self {
        let dx = (self.max_x - self.min_x).max(0.0) * margin;
        let dy = (self.max_y - self.min_y).max(0.0) * margin;
        Self {
            min_x: (self.min_x - dx).clamp(0.0, 1.0),
            min_y: (self.min_y - dy).clamp(0.0, 1.0),
            max_x: (self.max_x + dx).clamp(0.0, 1.0),
            max_y: (self.max_y + dy).clamp(0.0, 1.0),
        }
    }

    /// Pixel rectangle inside a `width x height` image, or `None` when it
    /// would be empty.
    #[must_use]
    pub fn to_pixels(self, width: u32, height: u32) -> Option<PixelRect> {
        let (w, h) = (f64::from(width), f64::from(height));
        // Coordinates are clamped to [0, 1] and scaled by a u32 dimension, so
        // the rounded values are non-negative and fit in u32.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x0, y0, x1, y1) = (
            (self.min_x * w).floor() as u32,
            (self.min_y * h).floor() as u32,
            ((self.max_x * w).ceil() as u32).min(width),
            ((self.max_y * h).ceil() as u32).min(height),
        );
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Chooses the pixel rectangle to crop a `width x height` image to, if any.
#[must_use]
pub fn plan_crop(detections: &[Detection], width: u32, height: u32) -> Option<PixelRect> {
    let primary = select_primary(detections)?;
    primary.bounds().expand(CROP_MARGIN).to_pixels(width, height)
}

/// Crops `image` to `rect` and re-encodes it as PNG.
///
/// # Errors
///
/// Returns the encoder error if PNG encoding fails.
pub fn encode_crop(image: &DynamicImage, rect: PixelRect) -> Result<Vec<u8>, image::ImageError> {
    let cropped = image.crop_imm(rect.x, rect.y, rect.width, rect.height);
    let mut buf = Cursor::new(Vec::new());
    cropped.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Localizes objects in `payload` and returns a crop around the primary one.
///
/// Decoding and re-encoding run on the blocking pool. Returns `None` when the
/// image cannot be decoded, the localization call fails, nothing croppable is
/// found, or encoding fails. Never errors.
pub async fn crop_primary_object(
    client: &VisionClient,
    payload: &ImagePayload,
) -> Option<ImagePayload> {
    let bytes = payload.as_bytes().to_vec();
    let image = match tokio::task::spawn_blocking(move || image::load_from_memory(&bytes)).await {
        Ok(Ok(image)) => image,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "image could not be decoded; skipping crop");
            return None;
        }
        Err(e) => {
            tracing::warn!(error = %e, "image decode task failed; skipping crop");
            return None;
        }
    };

    let annotations = match client.localize_objects(payload).await {
        Ok(annotations) => annotations,
        Err(e) => {
            tracing::warn!(error = %e, "object localization failed; skipping crop");
            return None;
        }
    };

    let size = (image.width(), image.height());
    let detections: Vec<Detection> = annotations
        .iter()
        .map(|a| Detection::from_annotation(a, size))
        .collect();

    let Some(rect) = plan_crop(&detections, size.0, size.1) else {
        tracing::debug!(
            detections = detections.len(),
            "no croppable primary object; using original image"
        );
        return None;
    };

    match tokio::task::spawn_blocking(move || encode_crop(&image, rect)).await {
        Ok(Ok(bytes)) => {
            tracing::debug!(
                x = rect.x,
                y = rect.y,
                width = rect.width,
                height = rect.height,
                "cropped to primary object"
            );
            Some(ImagePayload::new(bytes))
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "crop encoding failed; using original image");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "crop encode task failed; using original image");
            None
        }
    }
}
