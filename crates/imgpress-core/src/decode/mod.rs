//! Decoding for the compression pipeline.
//!
//! This module provides:
//! - The [`RasterDecoder`] capability (compressed bytes to pixels at a target size)
//! - [`ImageRasterizer`], the default implementation on top of the `image` crate
//! - [`DecodeRetryController`], which retries decoding at descending resolution caps
//!
//! # Architecture
//!
//! Decoding is synchronous. Callers that must keep a UI thread responsive run the
//! pipeline on a worker (see the `scheduler` module).

mod rasterizer;
pub mod retry;
mod types;

pub use rasterizer::{extract_orientation, ImageRasterizer};
pub use retry::{AttemptOutcome, DecodeAttempt, DecodeRetryController, DecodeState};
pub use types::{DecodeError, DecodedFrame, FilterType, Orientation, RasterDecoder};
