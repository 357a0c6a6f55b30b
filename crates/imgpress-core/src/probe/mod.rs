//! Header-only dimension probing for JPEG and PNG.
//!
//! Reads width and height straight from the compressed bytes so the pipeline can plan
//! decode resolutions before committing any memory to pixels.
//!
//! The probe is bounded by a scan window. Callers normally use [`probe_dimensions`],
//! which tries a small prefix first and only falls back to the full byte sequence when
//! metadata (large EXIF/ICC blocks) pushes the JPEG frame header past the fast window.

mod jpeg;
mod png;

use crate::error::PipelineError;
use crate::types::Dimensions;

pub use jpeg::{is_frame_marker, JPEG_SOI};
pub use png::PNG_SIGNATURE;

/// Default size of the fast-path scan window.
pub const DEFAULT_PROBE_WINDOW: usize = 64 * 1024;

/// Read dimensions from at most `max_scan_bytes` leading bytes.
///
/// # Errors
///
/// Returns `PipelineError::HeaderParseFailure` if neither a PNG IHDR nor a JPEG frame
/// header is found in the window.
pub fn probe(bytes: &[u8], max_scan_bytes: usize) -> Result<Dimensions, PipelineError> {
    let window = &bytes[..bytes.len().min(max_scan_bytes)];

    png::read_ihdr(window)
        .or_else(|| jpeg::read_frame_header(window))
        .ok_or(PipelineError::HeaderParseFailure {
            scanned: window.len(),
        })
}

/// Probe with a cheap prefix first, then the full sequence bounded by `full_window`.
pub fn probe_dimensions(
    bytes: &[u8],
    fast_window: usize,
    full_window: usize,
) -> Result<Dimensions, PipelineError> {
    match probe(bytes, fast_window) {
        Ok(dims) => Ok(dims),
        Err(err) if bytes.len() > fast_window && full_window > fast_window => {
            log::debug!(
                "Header not found in first {} bytes ({}), scanning up to {} bytes",
                fast_window,
                err,
                full_window
            );
            probe(bytes, full_window)
        }
        Err(err) => Err(err),
    }
}

#[inline]
fn be_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    let slice = bytes.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([slice[0], slice[1]]))
}

#[inline]
fn be_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let slice = bytes.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]))
}
