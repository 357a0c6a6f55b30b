//! Encoder backends behind one encode contract.
//!
//! Two interchangeable backends produce JPEG output:
//! - [`RasterBackend`] - linear quality `[0.1, 1.0]`, accepts RGB and RGBA
//! - [`CodecModuleBackend`] - integer quality `[1, 100]`, RGB only, with fixed codec options
//!
//! Callers always pass a normalized [`QualityRequest`]; the translation into the backend's
//! native domain happens in [`EncoderBackend::encode`], right before encoding.

mod codec;
mod module;
mod raster;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::PipelineError;
use crate::pixels::{ChannelLayout, PixelBuffer};
use crate::quality::{NativeQuality, QualityRequest};

pub use codec::{CodecModuleBackend, CodecOptions, CodecPreset};
pub use module::{CodecModule, ModuleSlot};
pub use raster::RasterBackend;

/// Errors that can occur during encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The image is larger than the backend can represent.
    #[error("Invalid dimensions: {width}x{height} exceeds the encoder limit of {limit}")]
    DimensionsTooLarge { width: u32, height: u32, limit: u32 },

    /// The backend does not accept this channel arrangement.
    #[error("The {backend} encoder does not accept {layout:?} pixels")]
    UnsupportedLayout {
        backend: EncoderKind,
        layout: ChannelLayout,
    },

    /// JPEG encoding failed
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),

    /// The codec module could not be initialized.
    #[error("Codec module initialization failed: {0}")]
    ModuleInit(String),
}

/// Which backend to encode with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderKind {
    #[default]
    Raster,
    Codec,
}

impl fmt::Display for EncoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncoderKind::Raster => f.write_str("raster"),
            EncoderKind::Codec => f.write_str("codec"),
        }
    }
}

impl FromStr for EncoderKind {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "raster" | "canvas" => Ok(EncoderKind::Raster),
            "codec" | "wasm" => Ok(EncoderKind::Codec),
            other => Err(PipelineError::InvalidConfig(format!(
                "unknown encoder: {} (expected raster or codec)",
                other
            ))),
        }
    }
}

/// The encode contract shared by every backend.
pub trait EncoderBackend {
    fn kind(&self) -> EncoderKind;

    /// Whether `encode_native` accepts buffers in `layout`.
    fn accepts(&self, layout: ChannelLayout) -> bool;

    /// Translate a normalized quality into this backend's (clamped) native units.
    fn native_quality(&self, quality: QualityRequest) -> NativeQuality;

    /// Encode with a quality already in native units. Out-of-range values are clamped.
    fn encode_native(
        &self,
        pixels: &PixelBuffer,
        quality: NativeQuality,
    ) -> Result<Vec<u8>, EncodeError>;

    /// Encode `pixels` at a normalized quality.
    fn encode(&self, pixels: &PixelBuffer, quality: QualityRequest) -> Result<Vec<u8>, EncodeError> {
        if !self.accepts(pixels.layout()) {
            return Err(EncodeError::UnsupportedLayout {
                backend: self.kind(),
                layout: pixels.layout(),
            });
        }
        self.encode_native(pixels, self.native_quality(quality))
    }
}

/// Tagged choice of backend, selected at runtime.
#[derive(Debug, Clone)]
pub enum Encoder {
    Raster(RasterBackend),
    Codec(CodecModuleBackend),
}

impl Encoder {
    pub fn raster() -> Self {
        Encoder::Raster(RasterBackend::new())
    }

    /// Codec backend on the process-wide codec module, initializing it on first use.
    pub async fn codec(options: CodecOptions) -> Result<Self, EncodeError> {
        Ok(Encoder::Codec(CodecModuleBackend::connect(options).await?))
    }

    /// Build the backend named by `kind`.
    pub async fn for_kind(kind: EncoderKind, options: CodecOptions) -> Result<Self, EncodeError> {
        match kind {
            EncoderKind::Raster => Ok(Self::raster()),
            EncoderKind::Codec => Self::codec(options).await,
        }
    }

    fn backend(&self) -> &dyn EncoderBackend {
        match self {
            Encoder::Raster(backend) => backend,
            Encoder::Codec(backend) => backend,
        }
    }
}

impl EncoderBackend for Encoder {
    fn kind(&self) -> EncoderKind {
        self.backend().kind()
    }

    fn accepts(&self, layout: ChannelLayout) -> bool {
        self.backend().accepts(layout)
    }

    fn native_quality(&self, quality: QualityRequest) -> NativeQuality {
        self.backend().native_quality(quality)
    }

    fn encode_native(
        &self,
        pixels: &PixelBuffer,
        quality: NativeQuality,
    ) -> Result<Vec<u8>, EncodeError> {
        self.backend().encode_native(pixels, quality)
    }
}

impl<T: EncoderBackend + ?Sized> EncoderBackend for &T {
    fn kind(&self) -> EncoderKind {
        (**self).kind()
    }

    fn accepts(&self, layout: ChannelLayout) -> bool {
        (**self).accepts(layout)
    }

    fn native_quality(&self, quality: QualityRequest) -> NativeQuality {
        (**self).native_quality(quality)
    }

    fn encode_native(
        &self,
        pixels: &PixelBuffer,
        quality: NativeQuality,
    ) -> Result<Vec<u8>, EncodeError> {
        (**self).encode_native(pixels, quality)
    }
}
