//! imgpress core - client-side image compression
//!
//! This crate turns a user-selected JPEG or PNG into a resized, re-encoded JPEG:
//! header probing, bounded decoding with cap fallback, alpha stripping, and two
//! interchangeable JPEG encoder backends behind one quality contract.

pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod naming;
pub mod pipeline;
pub mod pixels;
pub mod probe;
pub mod quality;
pub mod scale;
#[cfg(feature = "scheduler")]
pub mod scheduler;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{DecodePolicy, PipelineConfig};
pub use decode::{DecodeError, DecodedFrame, FilterType, ImageRasterizer, RasterDecoder};
pub use encode::{
    CodecModuleBackend, CodecOptions, CodecPreset, EncodeError, Encoder, EncoderBackend,
    EncoderKind, RasterBackend,
};
pub use error::PipelineError;
pub use naming::output_file_name;
pub use pipeline::{CompressionSession, Compressor};
pub use pixels::{strip_alpha, ChannelLayout, PixelBuffer};
pub use probe::{probe, probe_dimensions};
pub use quality::{
    clamp_codec_quality, clamp_raster_quality, compression_ratio, NativeQuality, QualityRequest,
};
pub use scale::{scale_dimensions, ScalingPolicy};
#[cfg(feature = "scheduler")]
pub use scheduler::{RequestScheduler, ScheduledResult};
pub use types::{CompressedImage, CompressionResult, ContentKind, Dimensions};
