//! Image decoding into RGBA rasters.
//!
//! Accepts encoded image bytes (PNG, JPEG, BMP, WebP) and produces the
//! RGBA buffer the extractor reads alpha from. Browser hosts read pixels
//! back from a canvas instead; this is the native equivalent.

use image::RgbaImage;

use crate::types::AssetError;

/// Decode raw image bytes into an RGBA8 buffer.
///
/// Images without an alpha channel decode as fully opaque.
///
/// # Errors
///
/// Returns [`AssetError::EmptyInput`] if `bytes` is empty.
/// Returns [`AssetError::Decode`] if the image format is unrecognized or
/// the data is corrupt.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, AssetError> {
    if bytes.is_empty() {
        return Err(AssetError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}
