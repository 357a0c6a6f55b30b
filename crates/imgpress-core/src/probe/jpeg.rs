//! JPEG marker-segment walker.

use super::be_u16;
use crate::types::Dimensions;

/// Start-of-image marker.
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

const DHT: u8 = 0xC4;
const JPG: u8 = 0xC8;
const DAC: u8 = 0xCC;

/// Returns true for start-of-frame markers (`SOF0`..`SOF15`).
///
/// `0xC4`, `0xC8` and `0xCC` share the range but are not frame headers.
#[inline]
pub fn is_frame_marker(marker: u8) -> bool {
    (0xC0..=0xCF).contains(&marker) && !matches!(marker, DHT | JPG | DAC)
}

/// Walk marker segments from just after SOI until the first frame header.
///
/// Segment layout: `FF <marker> <length: u16 BE> <length - 2 bytes>`. The frame header
/// payload is `precision, height, width, ...`, so height is at `offset + 5` and width
/// at `offset + 7`.
pub(super) fn read_frame_header(bytes: &[u8]) -> Option<Dimensions> {
    if !bytes.starts_with(&JPEG_SOI) {
        return None;
    }

    let mut offset = JPEG_SOI.len();
    loop {
        if *bytes.get(offset)? != 0xFF {
            return None;
        }
        let marker = *bytes.get(offset + 1)?;

        if is_frame_marker(marker) {
            let height = be_u16(bytes, offset + 5)?;
            let width = be_u16(bytes, offset + 7)?;
            return Dimensions::new(width as u32, height as u32);
        }

        let length = be_u16(bytes, offset + 2)? as usize;
        if length < 2 {
            return None;
        }
        offset += 2 + length;
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{jpeg_header, segment, sof};
    use super::*;

    #[test]
    fn test_frame_marker_range() {
        for marker in 0xC0..=0xCF {
            let expected = !matches!(marker, 0xC4 | 0xC8 | 0xCC);
            assert_eq!(is_frame_marker(marker), expected, "marker {:#04X}", marker);
        }
        assert!(!is_frame_marker(0xBF));
        assert!(!is_frame_marker(0xD0));
        assert!(!is_frame_marker(0xDA));
    }

    #[test]
    fn test_skips_dht_segment() {
        // DHT uses 0xC4, inside the SOF range; it must be skipped, not parsed.
        let dht = segment(0xC4, 28);
        let bytes = jpeg_header(0xC0, 320, 240, &[dht]);
        assert_eq!(read_frame_header(&bytes), Dimensions::new(320, 240));
    }

    #[test]
    fn test_skips_jpg_and_dac_markers() {
        let bytes = jpeg_header(0xC1, 64, 48, &[segment(0xC8, 4), segment(0xCC, 2)]);
        assert_eq!(read_frame_header(&bytes), Dimensions::new(64, 48));
    }

    #[test]
    fn test_first_frame_header_wins() {
        let mut bytes = jpeg_header(0xC0, 10, 20, &[]);
        bytes.truncate(bytes.len() - 2);
        bytes.extend(sof(0xC2, 30, 40));
        assert_eq!(read_frame_header(&bytes), Dimensions::new(10, 20));
    }

    #[test]
    fn test_missing_soi() {
        let bytes = jpeg_header(0xC0, 10, 10, &[]);
        assert_eq!(read_frame_header(&bytes[2..]), None);
    }

    #[test]
    fn test_stops_on_non_marker_byte() {
        let mut bytes = vec![0xFF, 0xD8];
        bytes.extend(segment(0xE0, 14));
        bytes.push(0x00);
        bytes.extend(sof(0xC0, 10, 10));
        assert_eq!(read_frame_header(&bytes), None);
    }

    #[test]
    fn test_rejects_short_segment_length() {
        let bytes = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x01, 0xFF, 0xC0];
        assert_eq!(read_frame_header(&bytes), None);
    }

    #[test]
    fn test_truncated_frame_header() {
        let bytes = jpeg_header(0xC0, 700, 500, &[]);
        let sof_offset = 2 + 18;
        // Cut right after the height field.
        assert_eq!(read_frame_header(&bytes[..sof_offset + 7]), None);
        assert_eq!(
            read_frame_header(&bytes[..sof_offset + 9]),
            Dimensions::new(700, 500)
        );
    }

    #[test]
    fn test_zero_width_rejected() {
        let bytes = jpeg_header(0xC0, 0, 500, &[]);
        assert_eq!(read_frame_header(&bytes), None);
    }
}
