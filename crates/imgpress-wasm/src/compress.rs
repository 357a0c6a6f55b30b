//! Compression bindings.
//!
//! - [`compress`] - one-shot: validate, probe, decode, encode
//! - [`create_encoder`] - resolve an encoder backend once (initializes the codec module)
//! - [`JsCompressionSession`] - one selected image, re-encoded at changing qualities
//!
//! Configuration is passed as a plain object in the camelCase form of `PipelineConfig`;
//! omitted fields keep their defaults.
//!
//! # Example
//!
//! ```typescript
//! import { create_encoder, JsCompressionSession } from '@imgpress/wasm';
//!
//! const encoder = await create_encoder('codec', { preset: 'progressive' });
//! const session = new JsCompressionSession({ decodeCaps: [2048, 1024] });
//! session.select(bytes, file.type, file.name);
//!
//! slider.oninput = () => {
//!   const result = session.compress(slider.value / 100, encoder);
//!   download(result.bytes(), session.output_file_name());
//! };
//! ```

use imgpress_core::{
    CodecOptions, CompressedImage, CompressionSession, Compressor, Encoder, EncoderBackend,
    EncoderKind, PipelineConfig, PipelineError, QualityRequest,
};
use wasm_bindgen::prelude::*;

use crate::to_js_error;
use crate::types::JsCompressionResult;

fn parse_config(config: JsValue) -> Result<PipelineConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(PipelineConfig::default());
    }
    let config: PipelineConfig = serde_wasm_bindgen::from_value(config)
        .map_err(|e| to_js_error(PipelineError::InvalidConfig(e.to_string())))?;
    config.validate().map_err(to_js_error)?;
    Ok(config)
}

fn parse_codec_options(options: JsValue) -> Result<CodecOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(CodecOptions::default());
    }
    serde_wasm_bindgen::from_value(options)
        .map_err(|e| to_js_error(PipelineError::InvalidConfig(e.to_string())))
}

fn selected_image(
    bytes: Vec<u8>,
    kind: &str,
    file_name: Option<String>,
) -> Result<CompressedImage, PipelineError> {
    let image = CompressedImage::from_declared(bytes, kind)?;
    Ok(match file_name {
        Some(name) => image.with_file_name(name),
        None => image,
    })
}

/// A resolved encoder backend.
///
/// Creating a codec encoder initializes the shared codec module on first use; later
/// encoders reuse the same module.
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsEncoder {
    inner: Encoder,
}

#[wasm_bindgen]
impl JsEncoder {
    /// `"raster"` or `"codec"`
    #[wasm_bindgen(getter)]
    pub fn kind(&self) -> String {
        self.inner.kind().to_string()
    }
}

/// Resolve an encoder by name (`"raster"`/`"canvas"` or `"codec"`/`"wasm"`).
#[wasm_bindgen]
pub async fn create_encoder(kind: String, options: JsValue) -> Result<JsEncoder, JsValue> {
    let kind: EncoderKind = kind.parse().map_err(to_js_error)?;
    let options = parse_codec_options(options)?;
    let inner = Encoder::for_kind(kind, options).await.map_err(to_js_error)?;
    Ok(JsEncoder { inner })
}

/// Compress one image in a single call.
///
/// # Arguments
///
/// * `bytes` - The uploaded file as a `Uint8Array`
/// * `kind` - Declared content kind (`"image/jpeg"`, `"png"`, ...)
/// * `quality` - Normalized quality in `[0, 1]`
/// * `encoder` - `"raster"` or `"codec"`
/// * `config` - Optional `PipelineConfig` object
///
/// # Errors
///
/// Returns the pipeline error message: unsupported kind, file too large, unreadable
/// header, decode failure at every cap, or encoder failure.
#[wasm_bindgen]
pub async fn compress(
    bytes: Vec<u8>,
    kind: String,
    quality: f64,
    encoder: String,
    config: JsValue,
) -> Result<JsCompressionResult, JsValue> {
    let config = parse_config(config)?;
    let quality = QualityRequest::new(quality).map_err(to_js_error)?;
    let kind_of_encoder: EncoderKind = encoder.parse().map_err(to_js_error)?;
    let image = CompressedImage::from_declared(bytes, &kind).map_err(to_js_error)?;

    let encoder = Encoder::for_kind(kind_of_encoder, config.codec)
        .await
        .map_err(to_js_error)?;
    let compressor = Compressor::new(config).map_err(to_js_error)?;

    compressor
        .compress(&image, quality, &encoder)
        .map(JsCompressionResult::from)
        .map_err(to_js_error)
}

/// A selected image whose decoded frame is reused across quality changes.
#[wasm_bindgen]
#[derive(Debug)]
pub struct JsCompressionSession {
    inner: CompressionSession,
}

#[wasm_bindgen]
impl JsCompressionSession {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsCompressionSession, JsValue> {
        let config = parse_config(config)?;
        let compressor = Compressor::new(config).map_err(to_js_error)?;
        Ok(Self {
            inner: CompressionSession::new(compressor),
        })
    }

    /// Select an image, dropping any previous image and its cached frame.
    pub fn select(
        &mut self,
        bytes: Vec<u8>,
        kind: &str,
        file_name: Option<String>,
    ) -> Result<(), JsValue> {
        match selected_image(bytes, kind, file_name) {
            Ok(image) => self.inner.select(image).map_err(to_js_error),
            Err(err) => {
                self.inner.clear();
                Err(to_js_error(err))
            }
        }
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    #[wasm_bindgen(getter, js_name = hasImage)]
    pub fn has_image(&self) -> bool {
        self.inner.image().is_some()
    }

    #[wasm_bindgen(getter, js_name = hasCachedFrame)]
    pub fn has_cached_frame(&self) -> bool {
        self.inner.has_cached_frame()
    }

    /// Encode the selected image at `quality` (`[0, 1]`).
    pub fn compress(
        &mut self,
        quality: f64,
        encoder: &JsEncoder,
    ) -> Result<JsCompressionResult, JsValue> {
        let quality = QualityRequest::new(quality).map_err(to_js_error)?;
        self.inner
            .compress(quality, &encoder.inner)
            .map(JsCompressionResult::from)
            .map_err(to_js_error)
    }

    /// Download name for the selected image, if any.
    pub fn output_file_name(&self) -> Option<String> {
        self.inner.output_file_name()
    }
}
