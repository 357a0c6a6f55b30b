//! Core data types shared across the pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Pixel dimensions of an image. Both sides are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Create dimensions, returning `None` if either side is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self { width, height })
        }
    }

    /// Length of the longest side.
    #[inline]
    pub fn longest_side(&self) -> u32 {
        self.width.max(self.height)
    }

    /// Total pixel count.
    #[inline]
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns true if both sides fit within `max_dimension`.
    #[inline]
    pub fn fits_within(&self, max_dimension: u32) -> bool {
        self.width <= max_dimension && self.height <= max_dimension
    }

    /// Dimensions with width and height exchanged.
    #[inline]
    pub fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Declared kind of a compressed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Jpeg,
    Png,
}

impl ContentKind {
    /// Detect the kind from the leading signature bytes.
    ///
    /// Only used to flag a mismatch with the declared kind; validation always
    /// goes by the declared kind.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&crate::probe::PNG_SIGNATURE) {
            Some(ContentKind::Png)
        } else if bytes.starts_with(&crate::probe::JPEG_SOI) {
            Some(ContentKind::Jpeg)
        } else {
            None
        }
    }
}

impl FromStr for ContentKind {
    type Err = PipelineError;

    /// Accepts `jpeg`, `jpg`, `png` and their `image/*` MIME forms, case-insensitively.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let bare = normalized.strip_prefix("image/").unwrap_or(&normalized);
        match bare {
            "jpeg" | "jpg" => Ok(ContentKind::Jpeg),
            "png" => Ok(ContentKind::Png),
            _ => Err(PipelineError::UnsupportedContentKind(value.to_string())),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentKind::Jpeg => "jpeg",
            ContentKind::Png => "png",
        };
        f.write_str(name)
    }
}

/// A caller-supplied compressed image. Read-only to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    bytes: Vec<u8>,
    kind: ContentKind,
    file_name: Option<String>,
}

impl CompressedImage {
    pub fn new(bytes: Vec<u8>, kind: ContentKind) -> Self {
        Self {
            bytes,
            kind,
            file_name: None,
        }
    }

    /// Attach the source file name, used to derive the output name.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Parse the declared kind from a string (`"jpg"`, `"image/png"`, ...).
    pub fn from_declared(bytes: Vec<u8>, declared: &str) -> Result<Self, PipelineError> {
        Ok(Self::new(bytes, declared.parse()?))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Size of the compressed input in bytes.
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }
}

/// Output of one encode invocation.
///
/// `compressed_byte_size == encoded_bytes().len()` holds for every result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionResult {
    #[serde(skip)]
    encoded_bytes: Vec<u8>,
    width: u32,
    height: u32,
    original_byte_size: usize,
    compressed_byte_size: usize,
}

impl CompressionResult {
    /// Assemble a result; the compressed size is always taken from `encoded_bytes`.
    pub fn new(encoded_bytes: Vec<u8>, dimensions: Dimensions, original_byte_size: usize) -> Self {
        let compressed_byte_size = encoded_bytes.len();
        Self {
            encoded_bytes,
            width: dimensions.width,
            height: dimensions.height,
            original_byte_size,
            compressed_byte_size,
        }
    }

    pub fn encoded_bytes(&self) -> &[u8] {
        &self.encoded_bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size of the input image in bytes.
    pub fn original_byte_size(&self) -> usize {
        self.original_byte_size
    }

    pub fn compressed_byte_size(&self) -> usize {
        self.compressed_byte_size
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Percentage saved relative to the original, formatted with one decimal.
    pub fn ratio(&self) -> Result<String, PipelineError> {
        crate::quality::compression_ratio(
            self.original_byte_size as i64,
            self.compressed_byte_size as i64,
        )
    }
}
