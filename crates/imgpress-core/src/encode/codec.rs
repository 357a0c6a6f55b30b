//! Codec module backend: the `jpeg-encoder` codec with fixed encode options.
//!
//! Takes an integer quality in `[1, 100]` and RGB input only. Optimization preset
//! and chroma subsampling are backend configuration, not per-call arguments.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::module::{CodecCall, CodecModule};
use super::{EncodeError, EncoderBackend, EncoderKind};
use crate::pixels::{ChannelLayout, PixelBuffer};
use crate::quality::{clamp_codec_quality, NativeQuality, QualityRequest};

/// Encoder optimization preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CodecPreset {
    /// Baseline JPEG with standard Huffman tables.
    Baseline,
    /// Baseline with optimized Huffman tables.
    Optimized,
    /// Progressive scans with optimized Huffman tables.
    #[default]
    Progressive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodecOptions {
    pub preset: CodecPreset,
    /// 4:2:0 chroma subsampling when true, 4:4:4 otherwise.
    pub chroma_subsampling: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            preset: CodecPreset::default(),
            chroma_subsampling: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CodecModuleBackend {
    module: Arc<CodecModule>,
    options: CodecOptions,
}

impl CodecModuleBackend {
    /// Use the process-wide codec module, initializing it if needed.
    pub async fn connect(options: CodecOptions) -> Result<Self, EncodeError> {
        Ok(Self::with_module(CodecModule::shared().await?, options))
    }

    pub fn with_module(module: Arc<CodecModule>, options: CodecOptions) -> Self {
        Self { module, options }
    }

    /// A backend on a private module instance, for synchronous callers.
    pub fn standalone(options: CodecOptions) -> Result<Self, EncodeError> {
        Ok(Self::with_module(Arc::new(CodecModule::initialize()?), options))
    }

    pub fn options(&self) -> CodecOptions {
        self.options
    }

    pub fn module(&self) -> &CodecModule {
        &self.module
    }

    fn call(&self, quality: u8) -> CodecCall {
        let (progressive, optimized_huffman) = match self.options.preset {
            CodecPreset::Baseline => (false, false),
            CodecPreset::Optimized => (false, true),
            CodecPreset::Progressive => (true, true),
        };
        CodecCall {
            quality,
            progressive,
            optimized_huffman,
            subsample_chroma: self.options.chroma_subsampling,
        }
    }
}

impl EncoderBackend for CodecModuleBackend {
    fn kind(&self) -> EncoderKind {
        EncoderKind::Codec
    }

    fn accepts(&self, layout: ChannelLayout) -> bool {
        layout == ChannelLayout::Rgb
    }

    fn native_quality(&self, quality: QualityRequest) -> NativeQuality {
        NativeQuality::Stepped(clamp_codec_quality(quality.value() * 100.0))
    }

    fn encode_native(
        &self,
        pixels: &PixelBuffer,
        quality: NativeQuality,
    ) -> Result<Vec<u8>, EncodeError> {
        if !self.accepts(pixels.layout()) {
            return Err(EncodeError::UnsupportedLayout {
                backend: EncoderKind::Codec,
                layout: pixels.layout(),
            });
        }

        let step = match quality {
            NativeQuality::Stepped(step) => clamp_codec_quality(step as f64),
            NativeQuality::Linear(value) => clamp_codec_quality(value as f64 * 100.0),
        };

        self.module
            .encode_rgb(pixels.bytes(), pixels.width(), pixels.height(), self.call(step))
    }
}
