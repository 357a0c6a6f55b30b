//! Pixel buffers and channel-layout conversion.

use serde::{Deserialize, Serialize};

use crate::types::Dimensions;

/// Channel arrangement of an interleaved 8-bit pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelLayout {
    Rgb,
    Rgba,
}

impl ChannelLayout {
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }
}

/// Length of a `width`x`height` buffer in `layout`, or `None` on overflow.
pub fn expected_len(dimensions: Dimensions, layout: ChannelLayout) -> Option<usize> {
    (dimensions.width as usize)
        .checked_mul(dimensions.height as usize)?
        .checked_mul(layout.channels())
}

/// Decoded pixels in row-major order.
///
/// `bytes.len() == width * height * channels` holds for every constructed buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    dimensions: Dimensions,
    layout: ChannelLayout,
    bytes: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap `bytes`, returning them back if the length does not match.
    pub fn new(
        dimensions: Dimensions,
        layout: ChannelLayout,
        bytes: Vec<u8>,
    ) -> Result<Self, Vec<u8>> {
        match expected_len(dimensions, layout) {
            Some(len) if len == bytes.len() => Ok(Self {
                dimensions,
                layout,
                bytes,
            }),
            _ => Err(bytes),
        }
    }

    /// Build from an `image::RgbaImage`.
    pub fn from_rgba_image(img: image::RgbaImage) -> Option<Self> {
        let (width, height) = img.dimensions();
        let dimensions = Dimensions::new(width, height)?;
        Self::new(dimensions, ChannelLayout::Rgba, img.into_raw()).ok()
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn width(&self) -> u32 {
        self.dimensions.width
    }

    pub fn height(&self) -> u32 {
        self.dimensions.height
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the pixel data in bytes.
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    /// Drop the alpha channel. Rgb buffers are returned unchanged.
    pub fn into_rgb(self) -> Self {
        match self.layout {
            ChannelLayout::Rgb => self,
            ChannelLayout::Rgba => Self {
                dimensions: self.dimensions,
                layout: ChannelLayout::Rgb,
                bytes: strip_alpha(&self.bytes),
            },
        }
    }

    /// Like [`into_rgb`](Self::into_rgb) but leaves `self` intact.
    pub fn to_rgb(&self) -> Self {
        match self.layout {
            ChannelLayout::Rgb => self.clone(),
            ChannelLayout::Rgba => Self {
                dimensions: self.dimensions,
                layout: ChannelLayout::Rgb,
                bytes: strip_alpha(&self.bytes),
            },
        }
    }
}

/// Convert interleaved RGBA to RGB by discarding every fourth byte.
///
/// Transparency is dropped, not composited. A trailing partial pixel is ignored.
pub fn strip_alpha(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for pixel in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&pixel[..3]);
    }
    rgb
}
