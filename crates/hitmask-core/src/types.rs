//! Shared types for hitmask contour extraction and hit testing.

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so hosts can hand decoded rasters to the
/// registry without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point.
///
/// The coordinate space is fixed by whichever function produces or
/// consumes the point: image pixels (Y down), normalized object space
/// (Y up, centered on the origin), or viewport pixels (Y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// An implicitly closed outline: the last point connects back to the first.
///
/// A contour is never edited in place. Re-detection produces a new
/// contour that replaces the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour(Vec<Point>);

impl Contour {
    /// Minimum number of points for a contour to enclose any area.
    pub const MIN_HIT_POINTS: usize = 3;

    /// Create a new contour from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Axis-aligned rectangle `[(0,0), (w,0), (w,h), (0,h)]`.
    #[must_use]
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self(vec![
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, height),
            Point::new(0.0, height),
        ])
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the contour.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the contour has enough points to be hit tested.
    #[must_use]
    pub const fn is_hit_testable(&self) -> bool {
        self.0.len() >= Self::MIN_HIT_POINTS
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the contour and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// The frame a contour was produced in.
///
/// For detected contours this is the source image size in pixels; for
/// rectangle hitboxes it is the target's declared size in scene units.
/// Projection divides contour coordinates by this size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl From<Dimensions> for Size {
    fn from(d: Dimensions) -> Self {
        Self::new(f64::from(d.width), f64::from(d.height))
    }
}

/// A borrowed row-major RGBA8 pixel buffer.
///
/// The extractor only reads from it for the duration of one call.
#[derive(Debug, Clone, Copy)]
pub struct RasterImage<'a> {
    width: u32,
    height: u32,
    pixels: &'a [u8],
}

impl<'a> RasterImage<'a> {
    /// Wrap an RGBA buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::ZeroDimension`] if either dimension is zero.
    /// Returns [`RasterError::BufferLength`] if `pixels.len()` is not
    /// `width * height * 4`.
    pub fn new(width: u32, height: u32, pixels: &'a [u8]) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::ZeroDimension { width, height });
        }
        let expected = u64::from(width) * u64::from(height) * 4;
        if u64::try_from(pixels.len()).ok() != Some(expected) {
            return Err(RasterError::BufferLength {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Image dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Alpha channel of the pixel at `(x, y)`, or `None` outside the image.
    #[must_use]
    pub fn alpha(&self, x: i64, y: i64) -> Option<u8> {
        let x = u32::try_from(x).ok().filter(|&x| x < self.width)?;
        let y = u32::try_from(y).ok().filter(|&y| y < self.height)?;
        let idx = (y as usize * self.width as usize + x as usize) * 4 + 3;
        self.pixels.get(idx).copied()
    }
}

impl<'a> TryFrom<&'a RgbaImage> for RasterImage<'a> {
    type Error = RasterError;

    fn try_from(img: &'a RgbaImage) -> Result<Self, Self::Error> {
        Self::new(img.width(), img.height(), img.as_raw())
    }
}

/// Configuration for alpha-contour extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Pixels with alpha strictly above this value are opaque.
    pub alpha_threshold: u8,

    /// Number of evenly spaced rays cast from the detection center.
    pub ray_count: u32,

    /// Douglas-Peucker tolerance in pixels. A point survives only when its
    /// distance strictly exceeds this value.
    pub simplify_tolerance: f64,

    /// Ray hits below this count are considered unreliable and the
    /// bounding box is used instead.
    pub min_boundary_points: usize,
}

impl ExtractConfig {
    /// Default alpha threshold (of 255).
    pub const DEFAULT_ALPHA_THRESHOLD: u8 = 20;
    /// Default number of rays.
    pub const DEFAULT_RAY_COUNT: u32 = 64;
    /// Default simplification tolerance in pixels.
    pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 2.0;
    /// Default minimum number of ray hits.
    pub const DEFAULT_MIN_BOUNDARY_POINTS: usize = 6;

    /// Check that the settings can produce a traced contour.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if no rays are cast, if fewer ray hits than
    /// a polygon needs would be accepted, or if the tolerance is negative
    /// or not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ray_count == 0 {
            return Err(ConfigError::NoRays);
        }
        if self.min_boundary_points < Contour::MIN_HIT_POINTS {
            return Err(ConfigError::MinBoundaryPoints {
                min: Contour::MIN_HIT_POINTS,
                actual: self.min_boundary_points,
            });
        }
        if !(self.simplify_tolerance.is_finite() && self.simplify_tolerance >= 0.0) {
            return Err(ConfigError::Tolerance(self.simplify_tolerance));
        }
        Ok(())
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            alpha_threshold: Self::DEFAULT_ALPHA_THRESHOLD,
            ray_count: Self::DEFAULT_RAY_COUNT,
            simplify_tolerance: Self::DEFAULT_SIMPLIFY_TOLERANCE,
            min_boundary_points: Self::DEFAULT_MIN_BOUNDARY_POINTS,
        }
    }
}

/// Invalid extraction configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// `ray_count` is zero.
    #[error("invalid extraction configuration: ray_count must be at least 1")]
    NoRays,

    /// `min_boundary_points` would accept too few points for a polygon.
    #[error("invalid extraction configuration: min_boundary_points must be at least {min}, got {actual}")]
    MinBoundaryPoints {
        /// Smallest accepted value.
        min: usize,
        /// Supplied value.
        actual: usize,
    },

    /// `simplify_tolerance` is negative or not finite.
    #[error("invalid extraction configuration: simplify_tolerance must be finite and non-negative, got {0}")]
    Tolerance(f64),
}

/// Invalid raster buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RasterError {
    /// Width or height is zero.
    #[error("raster dimensions must be positive, got {width}x{height}")]
    ZeroDimension {
        /// Supplied width.
        width: u32,
        /// Supplied height.
        height: u32,
    },

    /// Pixel buffer does not hold exactly `width * height` RGBA pixels.
    #[error("raster buffer holds {actual} bytes, expected {expected}")]
    BufferLength {
        /// `width * height * 4`.
        expected: u64,
        /// Actual buffer length.
        actual: usize,
    },
}

/// Failure to obtain readable pixels for a target's image.
///
/// These are reported through the log and leave the target without a
/// contour. They never propagate out of a tick.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The encoded image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the encoded image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The host refused pixel readback (e.g. a cross-origin image).
    #[error("image pixels are not readable: {0}")]
    Inaccessible(String),

    /// The decoded buffer is not a usable raster.
    #[error(transparent)]
    Raster(#[from] RasterError),
}
