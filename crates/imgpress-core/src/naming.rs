//! Output file naming.

/// Fallback stem when the source has no usable name.
const DEFAULT_STEM: &str = "image";

/// Derive the download name: drop the trailing extension, append `suffix`, then `.jpg`.
///
/// Only the final path component is used. A leading dot (`.hidden`) is part of the
/// stem, not an extension.
pub fn output_file_name(source_name: &str, suffix: &str) -> String {
    let base = source_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source_name)
        .trim();

    let stem = match base.rfind('.') {
        Some(dot) if dot > 0 => &base[..dot],
        _ => base,
    };
    let stem = if stem.is_empty() { DEFAULT_STEM } else { stem };

    format!("{stem}{suffix}.jpg")
}
