//! Pipeline-level error taxonomy.
//!
//! Every stage has its own error enum (`DecodeError`, `EncodeError`); this type is what
//! crosses the pipeline boundary. Recoverable failures (header scan window, decode caps)
//! are retried inside the pipeline and only surface here once they are final.

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;

/// Errors returned by the compression pipeline and its helpers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The declared content kind is not on the allow-list.
    #[error("Unsupported content kind: {0}")]
    UnsupportedContentKind(String),

    /// The compressed input exceeds the configured size ceiling.
    #[error("File too large: {size} bytes (limit: {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    /// No PNG signature or JPEG frame header was found in the scanned window.
    #[error("Could not read image dimensions from header (scanned {scanned} bytes)")]
    HeaderParseFailure { scanned: usize },

    /// Every decode attempt failed; carries the last underlying error.
    #[error("Decoding failed: {0}")]
    DecodeFailure(#[from] DecodeError),

    /// Width, height or cap arguments were non-positive or out of range.
    #[error("Invalid dimensions: {width}x{height} (max dimension {max_dimension})")]
    InvalidDimensions {
        width: i64,
        height: i64,
        max_dimension: u32,
    },

    /// A normalized quality value was not a finite number in `[0, 1]`.
    #[error("Invalid quality: {0} (expected a value between 0 and 1)")]
    InvalidQuality(f64),

    /// A byte size argument was not strictly positive.
    #[error("Invalid byte size: {0}")]
    InvalidByteSize(i64),

    /// The active encoder backend failed.
    #[error("Encoding failed: {0}")]
    EncodeFailure(#[from] EncodeError),

    /// A session was asked to compress before any image was selected.
    #[error("No image selected")]
    NoImageSelected,

    /// Configuration rejected by [`PipelineConfig::validate`](crate::PipelineConfig::validate).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
