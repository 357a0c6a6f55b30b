//! Default decode capability built on the `image` crate.
//!
//! Decodes JPEG/PNG bytes, applies EXIF orientation for JPEG, and resamples to the
//! requested target size. A decoded-memory budget stands in for the allocation limits
//! a browser imposes on bitmaps: a target whose RGBA surface exceeds the budget fails
//! with `OutOfMemory` before any decoding, so a smaller cap can still succeed. The source
//! is decoded in its native layout under `image::Limits` capped at the same budget and
//! is resampled before conversion to RGBA.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader, Limits};

use super::{DecodeError, FilterType, Orientation, RasterDecoder};
use crate::config::PipelineConfig;
use crate::pixels::PixelBuffer;
use crate::types::{ContentKind, Dimensions};

const RGBA_BYTES: u64 = 4;

/// `image`-crate backed rasterizer.
#[derive(Debug, Clone)]
pub struct ImageRasterizer {
    filter: FilterType,
    max_decoded_bytes: u64,
    apply_orientation: bool,
}

impl Default for ImageRasterizer {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl ImageRasterizer {
    pub fn new(filter: FilterType, max_decoded_bytes: u64, apply_orientation: bool) -> Self {
        Self {
            filter,
            max_decoded_bytes,
            apply_orientation,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.resize_filter,
            config.max_decoded_bytes,
            config.apply_orientation,
        )
    }

    /// Bytes of the RGBA surface produced for `target`.
    pub fn surface_bytes(target: Dimensions) -> u64 {
        target.pixel_count().saturating_mul(RGBA_BYTES)
    }

    fn check_budget(&self, target: Dimensions) -> Result<(), DecodeError> {
        let required = Self::surface_bytes(target);
        if required > self.max_decoded_bytes {
            return Err(DecodeError::OutOfMemory {
                required,
                budget: self.max_decoded_bytes,
            });
        }
        Ok(())
    }

    fn map_image_error(&self, err: image::ImageError, source: Dimensions) -> DecodeError {
        match err {
            image::ImageError::Limits(_) => DecodeError::OutOfMemory {
                required: source.pixel_count().saturating_mul(RGBA_BYTES),
                budget: self.max_decoded_bytes,
            },
            image::ImageError::Unsupported(_) => DecodeError::InvalidFormat,
            other => DecodeError::CorruptedFile(other.to_string()),
        }
    }
}

impl RasterDecoder for ImageRasterizer {
    fn decode_at(
        &self,
        bytes: &[u8],
        source: Dimensions,
        target: Dimensions,
    ) -> Result<PixelBuffer, DecodeError> {
        self.check_budget(target)?;

        let is_jpeg = ContentKind::sniff(bytes) == Some(ContentKind::Jpeg);
        let orientation = if self.apply_orientation && is_jpeg {
            extract_orientation(bytes)
        } else {
            Orientation::Normal
        };

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

        let mut limits = Limits::default();
        limits.max_alloc = Some(self.max_decoded_bytes);
        reader.limits(limits);

        let img = reader
            .decode()
            .map_err(|e| self.map_image_error(e, source))?;

        let resampled = if (img.width(), img.height()) == (target.width, target.height) {
            img
        } else {
            img.resize_exact(target.width, target.height, self.filter.to_image_filter())
        };

        let oriented = apply_orientation(resampled, orientation).into_rgba8();

        let expected = if orientation.swaps_dimensions() {
            target.transposed()
        } else {
            target
        };
        if oriented.dimensions() != (expected.width, expected.height) {
            return Err(DecodeError::SurfaceUnavailable(target));
        }

        PixelBuffer::from_rgba_image(oriented).ok_or(DecodeError::SurfaceUnavailable(target))
    }
}

/// Extract EXIF orientation from JPEG bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
pub fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
