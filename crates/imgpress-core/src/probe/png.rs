//! PNG IHDR reader.

use super::be_u32;
use crate::types::Dimensions;

/// The 8-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// IHDR is always the first chunk, so width and height sit at fixed offsets.
const WIDTH_OFFSET: usize = 16;
const HEIGHT_OFFSET: usize = 20;
const MIN_HEADER_LEN: usize = 24;

/// Read width/height from the IHDR chunk.
///
/// Returns `None` if the signature is missing, the buffer is shorter than 24 bytes,
/// or either side is zero.
pub(super) fn read_ihdr(bytes: &[u8]) -> Option<Dimensions> {
    if bytes.len() < MIN_HEADER_LEN || !bytes.starts_with(&PNG_SIGNATURE) {
        return None;
    }

    let width = be_u32(bytes, WIDTH_OFFSET)?;
    let height = be_u32(bytes, HEIGHT_OFFSET)?;
    Dimensions::new(width, height)
}
