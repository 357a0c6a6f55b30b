//! WASM-compatible wrapper types.
//!
//! These wrap imgpress-core values and expose them to JavaScript as getters, keeping the
//! encoded bytes in WASM memory until `bytes()` is called.

use imgpress_core::{CompressionResult, Dimensions};
use wasm_bindgen::prelude::*;

use crate::to_js_error;

/// Image dimensions in pixels.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsDimensions {
    width: u32,
    height: u32,
}

#[wasm_bindgen]
impl JsDimensions {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl From<Dimensions> for JsDimensions {
    fn from(dimensions: Dimensions) -> Self {
        Self {
            width: dimensions.width,
            height: dimensions.height,
        }
    }
}

/// The outcome of one compression.
///
/// # Memory Management
///
/// The encoded JPEG stays in WASM memory. `bytes()` copies it into a `Uint8Array`;
/// `free()` releases it early instead of waiting for the finalizer.
#[wasm_bindgen]
#[derive(Debug)]
pub struct JsCompressionResult {
    inner: CompressionResult,
}

#[wasm_bindgen]
impl JsCompressionResult {
    /// Output width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    /// Output height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    #[wasm_bindgen(getter, js_name = originalByteSize)]
    pub fn original_byte_size(&self) -> usize {
        self.inner.original_byte_size()
    }

    #[wasm_bindgen(getter, js_name = compressedByteSize)]
    pub fn compressed_byte_size(&self) -> usize {
        self.inner.compressed_byte_size()
    }

    /// Returns the encoded JPEG as a Uint8Array (copied).
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.encoded_bytes().to_vec()
    }

    /// Percentage of the original size saved, one decimal (`"75.0"`).
    pub fn ratio(&self) -> Result<String, JsValue> {
        self.inner.ratio().map_err(to_js_error)
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {}
}

impl From<CompressionResult> for JsCompressionResult {
    fn from(inner: CompressionResult) -> Self {
        Self { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_from_core() {
        let dims = JsDimensions::from(Dimensions::new(640, 480).unwrap());
        assert_eq!(dims.width(), 640);
        assert_eq!(dims.height(), 480);
    }

    #[test]
    fn test_result_accessors() {
        let core = CompressionResult::new(vec![1, 2, 3, 4], Dimensions::new(20, 10).unwrap(), 16);
        let result = JsCompressionResult::from(core);

        assert_eq!(result.width(), 20);
        assert_eq!(result.height(), 10);
        assert_eq!(result.original_byte_size(), 16);
        assert_eq!(result.compressed_byte_size(), 4);
        assert_eq!(result.bytes(), vec![1, 2, 3, 4]);
    }
}
