//! Shared fixtures for unit tests.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use image::{GrayImage, ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};

use crate::decode::{DecodeError, RasterDecoder};
use crate::encode::{EncodeError, EncoderBackend, EncoderKind};
use crate::pixels::{ChannelLayout, PixelBuffer};
use crate::quality::{clamp_codec_quality, NativeQuality, QualityRequest};
use crate::types::Dimensions;

pub fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    })
}

pub fn gradient_rgba(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            64,
            200,
        ])
    })
}

pub fn encode_png(img: &RgbaImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

pub fn encode_gray_png(width: u32, height: u32) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, y| Luma([((x + y) % 256) as u8]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

pub fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = gradient_rgb(width, height);
    let mut buffer = Cursor::new(Vec::new());
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, 90)
        .encode_image(&img)
        .unwrap();
    buffer.into_inner()
}

/// Insert an APP1 Exif segment carrying only an Orientation tag right after SOI.
pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

    let mut payload = b"Exif\0\0".to_vec();
    // Big-endian TIFF header, IFD0 at offset 8
    payload.extend_from_slice(b"MM\0\x2A\0\0\0\x08");
    payload.extend_from_slice(&1u16.to_be_bytes());
    // Tag 0x0112, SHORT, count 1, value left-justified
    payload.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
    payload.extend_from_slice(&orientation.to_be_bytes());
    payload.extend_from_slice(&[0x00, 0x00]);
    payload.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

    let segment_len = (payload.len() + 2) as u16;
    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

pub fn solid_buffer(width: u32, height: u32, layout: ChannelLayout) -> PixelBuffer {
    let dimensions = Dimensions::new(width, height).unwrap();
    let pixel: &[u8] = match layout {
        ChannelLayout::Rgb => &[90, 140, 200],
        ChannelLayout::Rgba => &[90, 140, 200, 255],
    };
    let bytes = pixel.repeat(dimensions.pixel_count() as usize);
    PixelBuffer::new(dimensions, layout, bytes).unwrap()
}

pub fn gradient_buffer(width: u32, height: u32, layout: ChannelLayout) -> PixelBuffer {
    let rgba = PixelBuffer::from_rgba_image(gradient_rgba(width, height)).unwrap();
    match layout {
        ChannelLayout::Rgba => rgba,
        ChannelLayout::Rgb => rgba.into_rgb(),
    }
}

/// Decoder that never touches the bytes. Fails any target whose longest side is above
/// `fail_above` and records every requested target.
#[derive(Debug, Clone, Default)]
pub struct FakeDecoder {
    fail_above: Option<u32>,
    calls: Arc<Mutex<Vec<Dimensions>>>,
}

impl FakeDecoder {
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// `failing_above(0)` fails every attempt.
    pub fn failing_above(limit: u32) -> Self {
        Self {
            fail_above: Some(limit),
            ..Self::default()
        }
    }

    pub fn requested(&self) -> Vec<Dimensions> {
        self.calls.lock().unwrap().clone()
    }
}

impl RasterDecoder for FakeDecoder {
    fn decode_at(
        &self,
        _bytes: &[u8],
        _source: Dimensions,
        target: Dimensions,
    ) -> Result<PixelBuffer, DecodeError> {
        self.calls.lock().unwrap().push(target);
        match self.fail_above {
            Some(limit) if target.longest_side() > limit => {
                Err(DecodeError::SurfaceUnavailable(target))
            }
            _ => Ok(solid_buffer(target.width, target.height, ChannelLayout::Rgba)),
        }
    }
}

/// Encoder that records what reached it and returns a stub JPEG marker pair.
#[derive(Debug, Clone)]
pub struct RecordingEncoder {
    accepts_rgba: bool,
    seen: Arc<Mutex<Vec<(Dimensions, ChannelLayout)>>>,
}

impl RecordingEncoder {
    pub fn rgb_only() -> Self {
        Self {
            accepts_rgba: false,
            seen: Arc::default(),
        }
    }

    pub fn any_layout() -> Self {
        Self {
            accepts_rgba: true,
            seen: Arc::default(),
        }
    }

    pub fn seen(&self) -> Vec<(Dimensions, ChannelLayout)> {
        self.seen.lock().unwrap().clone()
    }
}

impl EncoderBackend for RecordingEncoder {
    fn kind(&self) -> EncoderKind {
        if self.accepts_rgba {
            EncoderKind::Raster
        } else {
            EncoderKind::Codec
        }
    }

    fn accepts(&self, layout: ChannelLayout) -> bool {
        self.accepts_rgba || layout == ChannelLayout::Rgb
    }

    fn native_quality(&self, quality: QualityRequest) -> NativeQuality {
        NativeQuality::Stepped(clamp_codec_quality(quality.value() * 100.0))
    }

    fn encode_native(
        &self,
        pixels: &PixelBuffer,
        _quality: NativeQuality,
    ) -> Result<Vec<u8>, EncodeError> {
        self.seen
            .lock()
            .unwrap()
            .push((pixels.dimensions(), pixels.layout()));
        Ok(vec![0xFF, 0xD8, 0xFF, 0xD9])
    }
}
