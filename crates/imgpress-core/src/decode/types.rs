//! Core types for decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pixels::PixelBuffer;
use crate::types::Dimensions;

/// Error types for a single decode attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The file format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The decode would exceed the memory budget.
    #[error("Out of memory during decoding: need {required} bytes, budget is {budget} bytes")]
    OutOfMemory { required: u64, budget: u64 },

    /// No pixel surface of the requested size could be obtained.
    #[error("Could not allocate a {0} pixel surface")]
    SurfaceUnavailable(Dimensions),
}

/// Filter type for rasterizing to the target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    #[default]
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    /// Flip horizontal + rotate 270 CW.
    Transpose = 5,
    Rotate90CW = 6,
    /// Flip horizontal + rotate 90 CW.
    Transverse = 7,
    Rotate270CW = 8,
}

impl Orientation {
    /// Returns true if this orientation swaps width and height.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90CW
                | Orientation::Transverse
                | Orientation::Rotate270CW
        )
    }
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// The pixels produced by a successful decode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Dimensions reported by the header probe.
    pub source: Dimensions,
    /// Resolution cap the frame was decoded under.
    pub cap: u32,
    pub pixels: PixelBuffer,
}

impl DecodedFrame {
    pub fn dimensions(&self) -> Dimensions {
        self.pixels.dimensions()
    }
}

/// Consumed capability: decode compressed bytes into RGBA pixels at a target size.
///
/// Implementations may return `Rgb` or `Rgba` buffers; the pipeline adapts the layout
/// to the encoder backend.
pub trait RasterDecoder {
    /// Decode `bytes` (whose header reported `source`) and rasterize to `target`.
    fn decode_at(
        &self,
        bytes: &[u8],
        source: Dimensions,
        target: Dimensions,
    ) -> Result<PixelBuffer, DecodeError>;
}

impl<T: RasterDecoder + ?Sized> RasterDecoder for &T {
    fn decode_at(
        &self,
        bytes: &[u8],
        source: Dimensions,
        target: Dimensions,
    ) -> Result<PixelBuffer, DecodeError> {
        (**self).decode_at(bytes, source, target)
    }
}

impl<T: RasterDecoder + ?Sized> RasterDecoder for std::sync::Arc<T> {
    fn decode_at(
        &self,
        bytes: &[u8],
        source: Dimensions,
        target: Dimensions,
    ) -> Result<PixelBuffer, DecodeError> {
        (**self).decode_at(bytes, source, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_type_conversion() {
        assert!(matches!(
            FilterType::Nearest.to_image_filter(),
            image::imageops::FilterType::Nearest
        ));
        assert!(matches!(
            FilterType::Bilinear.to_image_filter(),
            image::imageops::FilterType::Triangle
        ));
        assert!(matches!(
            FilterType::Lanczos3.to_image_filter(),
            image::imageops::FilterType::Lanczos3
        ));
    }

    #[test]
    fn test_orientation_from_u32() {
        assert_eq!(Orientation::from(1), Orientation::Normal);
        assert_eq!(Orientation::from(6), Orientation::Rotate90CW);
        assert_eq!(Orientation::from(99), Orientation::Normal);
    }

    #[test]
    fn test_orientation_swaps_dimensions() {
        assert!(!Orientation::Normal.swaps_dimensions());
        assert!(!Orientation::Rotate180.swaps_dimensions());
        assert!(Orientation::Rotate90CW.swaps_dimensions());
        assert!(Orientation::Transverse.swaps_dimensions());
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::OutOfMemory {
            required: 200,
            budget: 100,
        };
        assert_eq!(
            err.to_string(),
            "Out of memory during decoding: need 200 bytes, budget is 100 bytes"
        );

        let err = DecodeError::SurfaceUnavailable(Dimensions::new(4096, 2048).unwrap());
        assert_eq!(err.to_string(), "Could not allocate a 4096x2048 pixel surface");
    }
}
