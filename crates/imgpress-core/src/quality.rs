//! Quality normalization and clamping.
//!
//! Callers express quality as a fraction of the maximum, `[0, 1]`. Each encoder backend
//! has its own native domain; conversion happens only at the encode call, so nothing
//! upstream ever stores a backend-native value.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Lower bound of the raster backend's linear quality domain.
pub const RASTER_QUALITY_MIN: f32 = 0.1;
/// Upper bound of the raster backend's linear quality domain.
pub const RASTER_QUALITY_MAX: f32 = 1.0;
/// Lower bound of the codec backend's integer quality domain.
pub const CODEC_QUALITY_MIN: u8 = 1;
/// Upper bound of the codec backend's integer quality domain.
pub const CODEC_QUALITY_MAX: u8 = 100;

/// Backend-independent quality: a fraction of the maximum in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct QualityRequest(f64);

impl QualityRequest {
    /// Highest quality the backends support.
    pub const MAX: QualityRequest = QualityRequest(1.0);

    /// # Errors
    ///
    /// Returns `PipelineError::InvalidQuality` for NaN, infinities and values outside `[0, 1]`.
    pub fn new(value: f64) -> Result<Self, PipelineError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(PipelineError::InvalidQuality(value))
        }
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for QualityRequest {
    type Error = PipelineError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QualityRequest> for f64 {
    fn from(quality: QualityRequest) -> Self {
        quality.0
    }
}

/// Quality expressed in a backend's native units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeQuality {
    /// Linear `[0.1, 1.0]`.
    Linear(f32),
    /// Integer `[1, 100]`.
    Stepped(u8),
}

/// Snap a raster-domain value into `[0.1, 1.0]`. Non-finite input maps to the minimum.
pub fn clamp_raster_quality(value: f64) -> f32 {
    if !value.is_finite() {
        return RASTER_QUALITY_MIN;
    }
    (value as f32).clamp(RASTER_QUALITY_MIN, RASTER_QUALITY_MAX)
}

/// Round a codec-domain value to the nearest integer, then snap into `[1, 100]`.
/// Non-finite input maps to the minimum.
pub fn clamp_codec_quality(value: f64) -> u8 {
    if !value.is_finite() {
        return CODEC_QUALITY_MIN;
    }
    value
        .round()
        .clamp(CODEC_QUALITY_MIN as f64, CODEC_QUALITY_MAX as f64) as u8
}

/// Percentage of bytes saved, formatted with one decimal place.
///
/// A file that grew yields a negative percentage.
///
/// # Errors
///
/// Returns `PipelineError::InvalidByteSize` if `original` is not positive or
/// `compressed` is negative.
pub fn compression_ratio(original: i64, compressed: i64) -> Result<String, PipelineError> {
    if original <= 0 {
        return Err(PipelineError::InvalidByteSize(original));
    }
    if compressed < 0 {
        return Err(PipelineError::InvalidByteSize(compressed));
    }

    let saved = (1.0 - compressed as f64 / original as f64) * 100.0;
    let rounded = (saved * 10.0).round() / 10.0;
    // Avoid printing "-0.0" for tiny growth.
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    Ok(format!("{:.1}", rounded))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: raster clamp always lands in the native domain.
        #[test]
        fn prop_raster_clamp_in_domain(value in -10.0f64..10.0) {
            let clamped = clamp_raster_quality(value);
            prop_assert!((RASTER_QUALITY_MIN..=RASTER_QUALITY_MAX).contains(&clamped));
        }

        /// Property: codec clamp always lands in the native domain.
        #[test]
        fn prop_codec_clamp_in_domain(value in -1000.0f64..1000.0) {
            let clamped = clamp_codec_quality(value);
            prop_assert!((CODEC_QUALITY_MIN..=CODEC_QUALITY_MAX).contains(&clamped));
        }

        /// Property: in-range codec values round to nearest.
        #[test]
        fn prop_codec_clamp_rounds(value in 1.0f64..=100.0) {
            prop_assert_eq!(clamp_codec_quality(value) as f64, value.round());
        }
    }
}
