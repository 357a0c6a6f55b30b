//! Raster backend: export through the `image` crate's JPEG encoder.
//!
//! Mirrors a drawing-surface export: accepts RGB or RGBA, drops alpha on export, and
//! takes a linear quality in `[0.1, 1.0]`.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{EncodeError, EncoderBackend, EncoderKind};
use crate::pixels::{ChannelLayout, PixelBuffer};
use crate::quality::{clamp_codec_quality, clamp_raster_quality, NativeQuality, QualityRequest};

#[derive(Debug, Clone, Default)]
pub struct RasterBackend {}

impl RasterBackend {
    pub fn new() -> Self {
        Self {}
    }

    fn linear(quality: NativeQuality) -> f32 {
        match quality {
            NativeQuality::Linear(value) => clamp_raster_quality(value as f64),
            NativeQuality::Stepped(step) => clamp_raster_quality(step as f64 / 100.0),
        }
    }
}

impl EncoderBackend for RasterBackend {
    fn kind(&self) -> EncoderKind {
        EncoderKind::Raster
    }

    fn accepts(&self, layout: ChannelLayout) -> bool {
        matches!(layout, ChannelLayout::Rgb | ChannelLayout::Rgba)
    }

    fn native_quality(&self, quality: QualityRequest) -> NativeQuality {
        NativeQuality::Linear(clamp_raster_quality(quality.value()))
    }

    fn encode_native(
        &self,
        pixels: &PixelBuffer,
        quality: NativeQuality,
    ) -> Result<Vec<u8>, EncodeError> {
        let linear = Self::linear(quality);
        let jpeg_quality = clamp_codec_quality(linear as f64 * 100.0);

        // JPEG has no alpha; the surface export discards it.
        let rgb;
        let data = match pixels.layout() {
            ChannelLayout::Rgb => pixels.bytes(),
            ChannelLayout::Rgba => {
                rgb = pixels.to_rgb();
                rgb.bytes()
            }
        };

        let mut buffer = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut buffer, jpeg_quality)
            .write_image(data, pixels.width(), pixels.height(), ExtendedColorType::Rgb8)
            .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

        Ok(buffer.into_inner())
    }
}
