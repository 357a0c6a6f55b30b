//! Aspect-preserving scaling arithmetic against a maximum-dimension cap.
//!
//! Images are never upscaled. When a side exceeds the cap, the longer side is pinned to
//! the cap and the shorter side follows the original aspect ratio, rounded to the nearest
//! pixel (never below one).

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::types::Dimensions;

/// Maximum permitted width or height for one decode attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    max_dimension: u32,
}

impl ScalingPolicy {
    /// Create a policy; `max_dimension` must be non-zero.
    pub fn new(max_dimension: u32) -> Result<Self, PipelineError> {
        if max_dimension == 0 {
            return Err(PipelineError::InvalidDimensions {
                width: 0,
                height: 0,
                max_dimension,
            });
        }
        Ok(Self { max_dimension })
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Scale `source` to fit the cap.
    pub fn apply(&self, source: Dimensions) -> Dimensions {
        if source.fits_within(self.max_dimension) {
            return source;
        }

        let (width, height) = fit_within(source.width, source.height, self.max_dimension);
        Dimensions { width, height }
    }
}

/// Scale `width`x`height` so that neither side exceeds `max_dimension`.
///
/// # Errors
///
/// Returns `PipelineError::InvalidDimensions` if either side is not strictly positive,
/// does not fit in a `u32`, or if `max_dimension` is zero.
pub fn scale_dimensions(
    width: i64,
    height: i64,
    max_dimension: u32,
) -> Result<Dimensions, PipelineError> {
    let invalid = || PipelineError::InvalidDimensions {
        width,
        height,
        max_dimension,
    };

    if width <= 0 || height <= 0 || max_dimension == 0 {
        return Err(invalid());
    }

    let width = u32::try_from(width).map_err(|_| invalid())?;
    let height = u32::try_from(height).map_err(|_| invalid())?;

    Ok(ScalingPolicy { max_dimension }.apply(Dimensions { width, height }))
}

/// Pin the longer side to `max_edge` and round the other side. Inputs are non-zero.
fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width >= height {
        // Landscape or square: constrain by width
        let new_height = (height as f64 / width as f64 * max_edge as f64).round() as u32;
        (max_edge, new_height.max(1))
    } else {
        // Portrait: constrain by height
        let new_width = (width as f64 / height as f64 * max_edge as f64).round() as u32;
        (new_width.max(1), max_edge)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
