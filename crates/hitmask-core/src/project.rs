//! Projection of image-local contours into viewport pixels.
//!
//! A contour is stored in the frame it was produced in (image pixels, or
//! declared size for rectangles). Projection first maps it onto the unit
//! plane the host renders the image on, centered at the origin with Y up:
//!
//! ```text
//! nx = x / width  - 0.5
//! ny = 0.5 - y / height
//! ```
//!
//! then places `(nx, ny, 0)` in the world with the target's transform,
//! projects it through the camera's view-projection matrix (with
//! perspective divide), and maps normalized device coordinates to Y-down
//! viewport pixels.

use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::types::{Contour, Point, Size};

/// Viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Viewport {
    /// Create a new viewport.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Map normalized device coordinates (Y up, `[-1, 1]`) to pixels
    /// (Y down, `[0, width] x [0, height]`).
    #[must_use]
    pub fn ndc_to_pixels(self, ndc_x: f64, ndc_y: f64) -> Point {
        Point::new(
            (ndc_x + 1.0) * self.width / 2.0,
            (1.0 - ndc_y) * self.height / 2.0,
        )
    }
}

/// Map a contour point into normalized object space.
#[must_use]
pub fn normalize_point(p: Point, size: Size) -> Point {
    Point::new(p.x / size.width - 0.5, 0.5 - p.y / size.height)
}

/// Project a contour into viewport pixels.
///
/// Returns one viewport point per contour point, in the same order. With
/// no active camera the result is empty, which callers treat as "nothing
/// hit-testable this frame".
#[must_use = "returns the projected points"]
pub fn project_contour(
    contour: &Contour,
    size: Size,
    world: &DMat4,
    camera_view_projection: Option<&DMat4>,
    viewport: Viewport,
) -> Vec<Point> {
    let Some(view_projection) = camera_view_projection else {
        return Vec::new();
    };

    let clip_from_local = *view_projection * *world;

    contour
        .points()
        .iter()
        .map(|&p| {
            let local = normalize_point(p, size);
            let ndc = clip_from_local.project_point3(DVec3::new(local.x, local.y, 0.0));
            viewport.ndc_to_pixels(ndc.x, ndc.y)
        })
        .collect()
}
