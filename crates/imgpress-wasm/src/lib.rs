//! imgpress WASM - WebAssembly bindings for imgpress
//!
//! This crate exposes the imgpress-core compression pipeline to JavaScript/TypeScript.
//!
//! # Module Structure
//!
//! - `compress` - One-shot compression, reusable sessions and encoder handles
//! - `helpers` - The individual pipeline steps (probe, scale, quality, naming)
//! - `logger` - `log` records forwarded to the browser console
//! - `types` - WASM-compatible wrapper types
//!
//! # Usage
//!
//! ```typescript
//! import init, { compress } from '@imgpress/wasm';
//!
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const result = await compress(bytes, file.type, 0.8, 'codec');
//! console.log(`${result.width}x${result.height}, ${result.ratio()}% smaller`);
//! ```

use wasm_bindgen::prelude::*;

mod compress;
mod helpers;
mod logger;
mod types;

pub use compress::{compress, create_encoder, JsCompressionSession, JsEncoder};
pub use helpers::{
    clamp_codec_quality, clamp_raster_quality, compression_ratio, output_file_name,
    probe_dimensions, scale_dimensions, strip_alpha,
};
pub use logger::set_log_level;
pub use types::{JsCompressionResult, JsDimensions};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logger::install(log::LevelFilter::Info);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Convert any displayable error into a JavaScript error value.
pub(crate) fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
