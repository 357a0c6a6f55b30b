//! Compression orchestration.
//!
//! [`Compressor`] runs one request end to end:
//!
//! 1. Validate the declared content kind and byte size
//! 2. Probe dimensions (fast window, then full scan)
//! 3. Decode through [`DecodeRetryController`] over the configured caps
//! 4. Strip alpha if the encoder backend needs RGB
//! 5. Encode at the normalized quality and assemble the result
//!
//! [`CompressionSession`] adds the caching policy for repeated quality changes against
//! one selected image. Under [`DecodePolicy::DecodeOnce`] (the default) the decoded frame
//! is kept and only the encoder re-runs; selecting another image always drops it.

use std::borrow::Cow;
use std::sync::Arc;

use crate::config::{DecodePolicy, PipelineConfig};
use crate::decode::{DecodeRetryController, DecodedFrame, ImageRasterizer, RasterDecoder};
use crate::encode::EncoderBackend;
use crate::error::PipelineError;
use crate::naming::output_file_name;
use crate::pixels::ChannelLayout;
use crate::probe::probe_dimensions;
use crate::quality::QualityRequest;
use crate::types::{CompressedImage, CompressionResult, ContentKind, Dimensions};

/// Stateless request -> result pipeline.
#[derive(Debug, Clone)]
pub struct Compressor<D = ImageRasterizer> {
    config: PipelineConfig,
    decoder: D,
}

impl Compressor<ImageRasterizer> {
    /// Pipeline with the default `image`-crate rasterizer.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let decoder = ImageRasterizer::from_config(&config);
        Self::with_decoder(config, decoder)
    }
}

impl<D: RasterDecoder> Compressor<D> {
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidConfig` if `config` fails validation.
    pub fn with_decoder(config: PipelineConfig, decoder: D) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config, decoder })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Reject inputs outside the allow-list or above the size ceiling.
    pub fn validate_input(&self, image: &CompressedImage) -> Result<(), PipelineError> {
        if !self.config.allowed_kinds.contains(&image.kind()) {
            return Err(PipelineError::UnsupportedContentKind(image.kind().to_string()));
        }

        let size = image.byte_size() as u64;
        if size > self.config.max_file_size {
            return Err(PipelineError::FileTooLarge {
                size,
                limit: self.config.max_file_size,
            });
        }

        if let Some(actual) = ContentKind::sniff(image.bytes()) {
            if actual != image.kind() {
                log::warn!(
                    "Declared content kind {} does not match {} signature",
                    image.kind(),
                    actual
                );
            }
        }
        Ok(())
    }

    /// Header dimensions of `image`.
    pub fn probe(&self, image: &CompressedImage) -> Result<Dimensions, PipelineError> {
        probe_dimensions(
            image.bytes(),
            self.config.probe_window_bytes,
            self.config.full_scan_window(),
        )
    }

    /// Validate, probe and decode `image`.
    pub fn decode(&self, image: &CompressedImage) -> Result<DecodedFrame, PipelineError> {
        self.validate_input(image)?;
        let source = self.probe(image)?;

        let controller = DecodeRetryController::new(
            &self.decoder,
            image.bytes(),
            source,
            &self.config.decode_caps,
        )?;
        Ok(controller.run()?)
    }

    /// Encode an already decoded frame.
    pub fn encode_frame<E: EncoderBackend + ?Sized>(
        &self,
        frame: &DecodedFrame,
        original_byte_size: usize,
        quality: QualityRequest,
        encoder: &E,
    ) -> Result<CompressionResult, PipelineError> {
        let pixels = if frame.pixels.layout() == ChannelLayout::Rgba
            && !encoder.accepts(ChannelLayout::Rgba)
        {
            Cow::Owned(frame.pixels.to_rgb())
        } else {
            Cow::Borrowed(&frame.pixels)
        };

        let encoded = encoder.encode(&pixels, quality)?;
        let result = CompressionResult::new(encoded, pixels.dimensions(), original_byte_size);

        log::info!(
            "Compressed {} -> {} with {} encoder: {} -> {} bytes",
            frame.source,
            result.dimensions(),
            encoder.kind(),
            result.original_byte_size(),
            result.compressed_byte_size()
        );
        Ok(result)
    }

    /// Run the full pipeline for one request.
    pub fn compress<E: EncoderBackend + ?Sized>(
        &self,
        image: &CompressedImage,
        quality: QualityRequest,
        encoder: &E,
    ) -> Result<CompressionResult, PipelineError> {
        let frame = self.decode(image)?;
        self.encode_frame(&frame, image.byte_size(), quality, encoder)
    }
}

/// One selected image plus the decoded-frame cache.
#[derive(Debug)]
pub struct CompressionSession<D = ImageRasterizer> {
    compressor: Compressor<D>,
    image: Option<CompressedImage>,
    frame: Option<Arc<DecodedFrame>>,
}

impl<D: RasterDecoder> CompressionSession<D> {
    pub fn new(compressor: Compressor<D>) -> Self {
        Self {
            compressor,
            image: None,
            frame: None,
        }
    }

    pub fn compressor(&self) -> &Compressor<D> {
        &self.compressor
    }

    pub fn image(&self) -> Option<&CompressedImage> {
        self.image.as_ref()
    }

    /// Returns true if a decoded frame is cached for the selected image.
    pub fn has_cached_frame(&self) -> bool {
        self.frame.is_some()
    }

    /// Select a new image, discarding any cached frame.
    ///
    /// An image that fails validation is not selected and leaves the session empty.
    pub fn select(&mut self, image: CompressedImage) -> Result<(), PipelineError> {
        self.clear();
        self.compressor.validate_input(&image)?;
        self.image = Some(image);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.image = None;
        self.frame = None;
    }

    /// Decoded frame for the selected image, decoding on first use.
    pub fn frame(&mut self) -> Result<Arc<DecodedFrame>, PipelineError> {
        let image = self.image.as_ref().ok_or(PipelineError::NoImageSelected)?;
        if let Some(frame) = &self.frame {
            log::debug!("Reusing cached {} frame", frame.dimensions());
            return Ok(Arc::clone(frame));
        }

        let frame = Arc::new(self.compressor.decode(image)?);
        if self.compressor.config().decode_policy == DecodePolicy::DecodeOnce {
            self.frame = Some(Arc::clone(&frame));
        }
        Ok(frame)
    }

    /// Compress the selected image at `quality`.
    pub fn compress<E: EncoderBackend + ?Sized>(
        &mut self,
        quality: QualityRequest,
        encoder: &E,
    ) -> Result<CompressionResult, PipelineError> {
        let frame = self.frame()?;
        let original = self
            .image
            .as_ref()
            .map(CompressedImage::byte_size)
            .ok_or(PipelineError::NoImageSelected)?;
        self.compressor.encode_frame(&frame, original, quality, encoder)
    }

    /// Download name for the selected image.
    pub fn output_file_name(&self) -> Option<String> {
        let image = self.image.as_ref()?;
        Some(output_file_name(
            image.file_name().unwrap_or_default(),
            &self.compressor.config().output_suffix,
        ))
    }
}
