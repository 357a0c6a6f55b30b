//! Pipeline configuration.
//!
//! All tunable limits and policies live in [`PipelineConfig`]. The struct deserializes
//! from a partial object (missing fields take their defaults), which is how the WASM
//! bindings accept settings from JavaScript.

use serde::{Deserialize, Serialize};

use crate::decode::FilterType;
use crate::encode::CodecOptions;
use crate::error::PipelineError;
use crate::probe::DEFAULT_PROBE_WINDOW;
use crate::types::ContentKind;

/// Default size ceiling for accepted inputs (15 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 15 * 1024 * 1024;
/// Default descending decode resolution caps.
pub const DEFAULT_DECODE_CAPS: [u32; 3] = [4096, 2048, 1024];
/// Default debounce interval for quality changes.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
/// Default suffix inserted before the output extension.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_compressed";

/// How decoded pixels are reused across quality changes for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecodePolicy {
    /// Decode once per selected image and re-run only the encoder on quality changes.
    #[default]
    DecodeOnce,
    /// Run the full pipeline, decode included, for every request.
    PerRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Content kinds accepted as input.
    pub allowed_kinds: Vec<ContentKind>,
    /// Maximum accepted input size in bytes. Also bounds the full header scan.
    pub max_file_size: u64,
    /// Bytes inspected by the fast header probe.
    pub probe_window_bytes: usize,
    /// Strictly descending resolution caps tried in order.
    pub decode_caps: Vec<u32>,
    pub decode_policy: DecodePolicy,
    /// Filter used when rasterizing to the target size.
    pub resize_filter: FilterType,
    /// Memory budget for one decode (source plus target RGBA buffers), in bytes.
    pub max_decoded_bytes: u64,
    /// Apply EXIF orientation to JPEG sources.
    pub apply_orientation: bool,
    /// Delay before a scheduled request starts.
    pub debounce_ms: u64,
    /// Inserted between the source stem and `.jpg`.
    pub output_suffix: String,
    /// Fixed settings for the codec module backend.
    pub codec: CodecOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            allowed_kinds: vec![ContentKind::Jpeg, ContentKind::Png],
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            probe_window_bytes: DEFAULT_PROBE_WINDOW,
            decode_caps: DEFAULT_DECODE_CAPS.to_vec(),
            decode_policy: DecodePolicy::default(),
            resize_filter: FilterType::default(),
            max_decoded_bytes: 512 * 1024 * 1024,
            apply_orientation: true,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            codec: CodecOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidConfig` if the cap list is empty, contains a zero,
    /// or is not strictly descending, or if a size limit is zero.
    pub fn validate(&self) -> Result<(), PipelineError> {
        validate_caps(&self.decode_caps)?;

        if self.allowed_kinds.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "allowedKinds must not be empty".to_string(),
            ));
        }
        if self.max_file_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "maxFileSize must be positive".to_string(),
            ));
        }
        if self.probe_window_bytes == 0 {
            return Err(PipelineError::InvalidConfig(
                "probeWindowBytes must be positive".to_string(),
            ));
        }
        if self.max_decoded_bytes == 0 {
            return Err(PipelineError::InvalidConfig(
                "maxDecodedBytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Byte bound for the full-scan probe fallback.
    pub fn full_scan_window(&self) -> usize {
        usize::try_from(self.max_file_size).unwrap_or(usize::MAX)
    }
}

/// A cap list must be non-empty, free of zeros and strictly descending.
pub(crate) fn validate_caps(caps: &[u32]) -> Result<(), PipelineError> {
    if caps.is_empty() {
        return Err(PipelineError::InvalidConfig(
            "decodeCaps must not be empty".to_string(),
        ));
    }
    if caps.contains(&0) {
        return Err(PipelineError::InvalidConfig(
            "decodeCaps must be positive".to_string(),
        ));
    }
    if caps.windows(2).any(|pair| pair[0] <= pair[1]) {
        return Err(PipelineError::InvalidConfig(format!(
            "decodeCaps must be strictly descending, got {:?}",
            caps
        )));
    }
    Ok(())
}
