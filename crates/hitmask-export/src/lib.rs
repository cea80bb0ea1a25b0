//! hitmask-export: Pure serializers for hitmask contours (sans-IO)
//!
//! Converts contours into SVG documents and renders the registry's
//! cached screen paths into a debug overlay image.

pub mod overlay;
pub mod svg;

use image::RgbaImage;

pub use overlay::render_overlay;
pub use svg::{SvgMetadata, build_path_data, to_svg};

/// Errors from rendering or encoding a debug overlay.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The viewport does not round to a drawable pixel size.
    #[error("cannot render a {width}x{height} overlay")]
    InvalidViewport {
        /// Viewport width in pixels.
        width: f64,
        /// Viewport height in pixels.
        height: f64,
    },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(#[from] image::ImageError),
}

/// Encode an RGBA image as PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::PngEncode`] if the encoder rejects the image.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn encoded_png_decodes_back() {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 40]));
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }
}
