//! Bindings for the individual pipeline steps.
//!
//! Useful when the page drives its own decoding (for example through a canvas) and only
//! needs the sizing, quality and naming rules.
//!
//! # Example
//!
//! ```typescript
//! import { probe_dimensions, scale_dimensions, clamp_codec_quality } from '@imgpress/wasm';
//!
//! const source = probe_dimensions(bytes);
//! const target = scale_dimensions(source.width, source.height, 2048);
//! const q = clamp_codec_quality(0.8 * 100); // 80
//! ```

use imgpress_core::config::PipelineConfig;
use imgpress_core::probe::DEFAULT_PROBE_WINDOW;
use imgpress_core::quality;
use wasm_bindgen::prelude::*;

use crate::to_js_error;
use crate::types::JsDimensions;

/// Read the dimensions from a JPEG or PNG header.
///
/// Scans the first 64 KiB, then up to the default file size limit. No pixels are decoded.
#[wasm_bindgen]
pub fn probe_dimensions(bytes: &[u8]) -> Result<JsDimensions, JsValue> {
    imgpress_core::probe_dimensions(bytes, DEFAULT_PROBE_WINDOW, full_scan_window())
        .map(JsDimensions::from)
        .map_err(to_js_error)
}

/// Fit `width`x`height` inside a `max_dimension` box, preserving aspect ratio.
///
/// Never upscales. Both outputs are at least 1.
#[wasm_bindgen]
pub fn scale_dimensions(width: i32, height: i32, max_dimension: u32) -> Result<JsDimensions, JsValue> {
    imgpress_core::scale_dimensions(i64::from(width), i64::from(height), max_dimension)
        .map(JsDimensions::from)
        .map_err(to_js_error)
}

/// Drop every 4th byte of an RGBA buffer. Trailing partial pixels are ignored.
#[wasm_bindgen]
pub fn strip_alpha(rgba: &[u8]) -> Vec<u8> {
    imgpress_core::strip_alpha(rgba)
}

/// Clamp to the raster encoder's `[0.1, 1.0]` quality range.
#[wasm_bindgen]
pub fn clamp_raster_quality(value: f64) -> f32 {
    quality::clamp_raster_quality(value)
}

/// Round and clamp to the codec encoder's `[1, 100]` quality range.
#[wasm_bindgen]
pub fn clamp_codec_quality(value: f64) -> u8 {
    quality::clamp_codec_quality(value)
}

/// Percentage of the original size saved, formatted with one decimal.
///
/// Negative when the output is larger than the input.
#[wasm_bindgen]
pub fn compression_ratio(original: f64, compressed: f64) -> Result<String, JsValue> {
    let original = byte_count(original)?;
    let compressed = byte_count(compressed)?;
    quality::compression_ratio(original, compressed).map_err(to_js_error)
}

/// Download name for an upload: `"beach.png"` becomes `"beach_compressed.jpg"`.
#[wasm_bindgen]
pub fn output_file_name(source_name: &str, suffix: Option<String>) -> String {
    let suffix = suffix.unwrap_or_else(|| imgpress_core::config::DEFAULT_OUTPUT_SUFFIX.to_string());
    imgpress_core::output_file_name(source_name, &suffix)
}

fn full_scan_window() -> usize {
    PipelineConfig::default().full_scan_window()
}

/// JS numbers arrive as f64; byte counts must be whole.
fn byte_count(value: f64) -> Result<i64, JsValue> {
    whole_number(value).ok_or_else(|| JsValue::from_str(&format!("Invalid byte size: {}", value)))
}

fn whole_number(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_number() {
        assert_eq!(whole_number(1024.0), Some(1024));
        assert_eq!(whole_number(-5.0), Some(-5));
        assert_eq!(whole_number(1.5), None);
        assert_eq!(whole_number(f64::NAN), None);
        assert_eq!(whole_number(f64::INFINITY), None);
    }

    #[test]
    fn test_full_scan_window_is_file_limit() {
        assert_eq!(full_scan_window(), 15 * 1024 * 1024);
    }

    #[test]
    fn test_frame_header_past_fast_window() {
        // Two maximal APP1 segments push SOF0 past the first 64 KiB
        let mut bytes = vec![0xFF, 0xD8];
        for _ in 0..2 {
            bytes.extend_from_slice(&[0xFF, 0xE1, 0xFF, 0xFF]);
            bytes.resize(bytes.len() + 0xFFFF - 2, 0);
        }
        bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x01, 0xE0, 0x02, 0x80]);
        assert!(bytes.len() > DEFAULT_PROBE_WINDOW);

        let dims =
            imgpress_core::probe_dimensions(&bytes, DEFAULT_PROBE_WINDOW, full_scan_window())
                .unwrap();
        assert_eq!((dims.width, dims.height), (640, 480));
    }

    #[test]
    fn test_output_file_name_default_suffix() {
        assert_eq!(output_file_name("beach.png", None), "beach_compressed.jpg");
        assert_eq!(
            output_file_name("beach.png", Some("_small".to_string())),
            "beach_small.jpg"
        );
    }

    #[test]
    fn test_quality_helpers() {
        assert_eq!(clamp_raster_quality(0.0), 0.1);
        assert_eq!(clamp_codec_quality(50.6), 51);
        assert_eq!(strip_alpha(&[1, 2, 3, 4, 5, 6, 7, 8]), vec![1, 2, 3, 5, 6, 7]);
    }
}
