//! One-time codec module initialization shared by concurrent callers.
//!
//! [`ModuleSlot`] memoizes a fallible async initializer. Concurrent first callers all
//! await the same in-flight initialization; a failed initialization is not stored, so
//! the next caller tries again. The process-wide codec module lives in a static slot
//! and is never torn down.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use jpeg_encoder::{ColorType, Encoder as JpegEncoder, SamplingFactor};
use tokio::sync::OnceCell;

use super::EncodeError;

/// Single-flight, initialize-once cell.
pub struct ModuleSlot<T> {
    cell: OnceCell<T>,
}

impl<T> ModuleSlot<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    /// The value, if initialization has completed.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Return the value, running `init` if no initialization has succeeded yet.
    pub async fn get_or_init_with<F, Fut, E>(&self, init: F) -> Result<&T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cell.get_or_try_init(init).await
    }
}

impl<T> Default for ModuleSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

static CODEC_MODULE: ModuleSlot<Arc<CodecModule>> = ModuleSlot::new();

/// Largest side the codec can encode (JPEG frame headers store 16-bit sizes).
pub(crate) const CODEC_MAX_DIMENSION: u32 = u16::MAX as u32;

/// Settings a single encode call passes down to the codec.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CodecCall {
    pub quality: u8,
    pub progressive: bool,
    pub optimized_huffman: bool,
    pub subsample_chroma: bool,
}

/// The initialized JPEG codec.
#[derive(Debug)]
pub struct CodecModule {
    encodes: AtomicU64,
}

impl CodecModule {
    /// Initialize the codec and verify it with a small self-test encode.
    pub fn initialize() -> Result<Self, EncodeError> {
        let module = Self {
            encodes: AtomicU64::new(0),
        };

        let probe = vec![128u8; 8 * 8 * 3];
        let call = CodecCall {
            quality: 75,
            progressive: false,
            optimized_huffman: false,
            subsample_chroma: true,
        };
        let bytes = module
            .encode_rgb(&probe, 8, 8, call)
            .map_err(|e| EncodeError::ModuleInit(e.to_string()))?;
        if !bytes.starts_with(&[0xFF, 0xD8]) {
            return Err(EncodeError::ModuleInit(
                "self-test produced no JPEG stream".to_string(),
            ));
        }
        module.encodes.store(0, Ordering::Relaxed);

        log::debug!("Codec module initialized");
        Ok(module)
    }

    /// The process-wide module, initialized on first use.
    pub async fn shared() -> Result<Arc<Self>, EncodeError> {
        CODEC_MODULE
            .get_or_init_with(|| async { Self::initialize().map(Arc::new) })
            .await
            .cloned()
    }

    /// Number of encodes performed since initialization.
    pub fn encode_count(&self) -> u64 {
        self.encodes.load(Ordering::Relaxed)
    }

    pub(crate) fn encode_rgb(
        &self,
        rgb: &[u8],
        width: u32,
        height: u32,
        call: CodecCall,
    ) -> Result<Vec<u8>, EncodeError> {
        let too_large = || EncodeError::DimensionsTooLarge {
            width,
            height,
            limit: CODEC_MAX_DIMENSION,
        };
        let w = u16::try_from(width).map_err(|_| too_large())?;
        let h = u16::try_from(height).map_err(|_| too_large())?;

        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new(&mut buffer, call.quality);
        encoder.set_sampling_factor(if call.subsample_chroma {
            SamplingFactor::R_4_2_0
        } else {
            SamplingFactor::R_4_4_4
        });
        encoder.set_progressive(call.progressive);
        encoder.set_optimized_huffman_tables(call.optimized_huffman);

        encoder
            .encode(rgb, w, h, ColorType::Rgb)
            .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

        self.encodes.fetch_add(1, Ordering::Relaxed);
        Ok(buffer)
    }
}
