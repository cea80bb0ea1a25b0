//! hitmask-core: pixel-contour hitboxes for 3D-anchored images (sans-IO).
//!
//! Turns the alpha silhouette of an image into a clickable screen-space
//! polygon through:
//! seed search -> raycast -> clockwise sort -> simplification ->
//! normalization -> world/camera projection -> point-in-polygon.
//!
//! This crate has **no I/O dependencies**. The host scene (renderer,
//! camera, asset loader, input) is reached only through the
//! [`SceneHost`] trait; encoded images arrive as byte slices.

pub mod diagnostics;
pub mod extract;
pub mod geometry;
pub mod project;
pub mod raster;
pub mod registry;
pub mod types;

/// Re-export `glam` so hosts build transforms with the same version.
pub use glam;

pub use extract::{ExtractionOutcome, detect_contour, find_bounding_box};
pub use project::{Viewport, project_contour};
pub use registry::{
    ContourSource, HitEvent, HitOptions, HitRegistry, HitTarget, RasterStatus, SceneHost,
    ScreenPath, StoredContour, TargetId,
};
pub use types::{
    AssetError, ConfigError, Contour, Dimensions, ExtractConfig, Point, RasterError, RasterImage,
    Size,
};

/// Decode an encoded image and detect its contour.
///
/// Returns the contour in image-pixel coordinates together with the image
/// dimensions, which projection needs to normalize the contour.
///
/// # Errors
///
/// Returns [`AssetError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`AssetError::Decode`] if the image format is unrecognized.
pub fn detect_contour_from_bytes(
    image_bytes: &[u8],
    config: &ExtractConfig,
) -> Result<(Contour, Dimensions), AssetError> {
    let image = raster::decode_rgba(image_bytes)?;
    let raster = RasterImage::try_from(&image)?;
    Ok((detect_contour(&raster, config), raster.dimensions()))
}
