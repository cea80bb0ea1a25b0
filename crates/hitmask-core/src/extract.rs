//! Alpha-silhouette extraction by radial raycasting.
//!
//! Finds an opaque seed pixel near the image center, casts evenly spaced
//! rays outward from it, and records where each ray first leaves the
//! opaque region. The hits are sorted around the seed and simplified into
//! a [`Contour`] in image-pixel coordinates.
//!
//! Extraction never fails. When no seed is found, or too few rays find a
//! boundary, the full-image bounding box is returned instead.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::geometry;
use crate::types::{Contour, ExtractConfig, Point, RasterImage};

/// Angular step between samples on one seed-search ring.
const SEED_RING_STEP: f64 = PI / 8.0;
/// Samples per seed-search ring (`2π / SEED_RING_STEP`).
const SEED_RING_SAMPLES: u32 = 16;

/// How an extraction arrived at its contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionOutcome {
    /// Ray hits were sorted and simplified into a contour.
    Traced,
    /// No opaque pixel within the seed search radius; bounding box used.
    NoSeed,
    /// Fewer ray hits than the configured minimum; bounding box used.
    TooFewBoundaryPoints {
        /// Number of rays that found a boundary.
        found: usize,
    },
    /// Simplification left fewer points than a polygon needs; bounding box
    /// used.
    Degenerate {
        /// Points left after simplification.
        points: usize,
    },
}

impl ExtractionOutcome {
    /// Returns `true` if the contour is the bounding-box fallback.
    #[must_use]
    pub const fn is_fallback(self) -> bool {
        !matches!(self, Self::Traced)
    }
}

/// Full result of one extraction, including intermediate state.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// The final contour, in image-pixel coordinates.
    pub contour: Contour,
    /// The detection center, if a seed pixel was found.
    pub seed: Option<Point>,
    /// Raw ray hits, in ray order, before sorting and simplification.
    pub boundary_points: Vec<Point>,
    /// Which path produced `contour`.
    pub outcome: ExtractionOutcome,
}

/// Detect the silhouette contour of `raster`.
///
/// Returns either the simplified ray-cast outline or the bounding box
/// `[(0,0), (w,0), (w,h), (0,h)]`. Both are usable contours.
#[must_use = "returns the detected contour"]
pub fn detect_contour(raster: &RasterImage<'_>, config: &ExtractConfig) -> Contour {
    extract(raster, config).contour
}

/// Run extraction and keep the intermediate seed and ray hits.
#[must_use = "returns the extraction result"]
pub fn extract(raster: &RasterImage<'_>, config: &ExtractConfig) -> Extraction {
    let Some(seed) = find_seed(raster, config.alpha_threshold) else {
        return Extraction {
            contour: find_bounding_box(raster.width(), raster.height()),
            seed: None,
            boundary_points: Vec::new(),
            outcome: ExtractionOutcome::NoSeed,
        };
    };

    let boundary_points = cast_rays(raster, seed, config);

    if boundary_points.len() < config.min_boundary_points {
        return Extraction {
            contour: find_bounding_box(raster.width(), raster.height()),
            seed: Some(seed),
            outcome: ExtractionOutcome::TooFewBoundaryPoints {
                found: boundary_points.len(),
            },
            boundary_points,
        };
    }

    let sorted = geometry::sort_clockwise(&boundary_points, seed);
    let contour = Contour::new(geometry::simplify(&sorted, config.simplify_tolerance));

    if !contour.is_hit_testable() {
        return Extraction {
            contour: find_bounding_box(raster.width(), raster.height()),
            seed: Some(seed),
            boundary_points,
            outcome: ExtractionOutcome::Degenerate {
                points: contour.len(),
            },
        };
    }

    Extraction {
        contour,
        seed: Some(seed),
        boundary_points,
        outcome: ExtractionOutcome::Traced,
    }
}

/// The fallback contour covering the whole image.
#[must_use]
pub fn find_bounding_box(width: u32, height: u32) -> Contour {
    Contour::rectangle(f64::from(width), f64::from(height))
}

/// Search rings around the image center for the first opaque pixel.
///
/// Ring radius steps by one pixel from 0 while below a quarter of the
/// shorter side; each ring is sampled every π/8.
fn find_seed(raster: &RasterImage<'_>, alpha_threshold: u8) -> Option<Point> {
    let center_x = f64::from(raster.width() / 2);
    let center_y = f64::from(raster.height() / 2);
    let radius = f64::from(raster.width().min(raster.height())) / 4.0;

    let mut r = 0u32;
    while f64::from(r) < radius {
        let rf = f64::from(r);
        for k in 0..SEED_RING_SAMPLES {
            let angle = f64::from(k) * SEED_RING_STEP;
            let x = rf.mul_add(angle.cos(), center_x).floor();
            let y = rf.mul_add(angle.sin(), center_y).floor();
            if is_opaque(raster, x, y, alpha_threshold) {
                return Some(Point::new(x, y));
            }
        }
        r += 1;
    }
    None
}

/// Cast `config.ray_count` rays from `center` and collect boundary hits.
///
/// A hit is the first sample that is transparent while the previous
/// sample was opaque. Rays that leave the image first record nothing.
fn cast_rays(raster: &RasterImage<'_>, center: Point, config: &ExtractConfig) -> Vec<Point> {
    let max_dist = raster.width().max(raster.height());
    let ray_count = f64::from(config.ray_count);
    let mut hits = Vec::new();

    for i in 0..config.ray_count {
        let angle = f64::from(i) / ray_count * TAU;
        let (dir_y, dir_x) = angle.sin_cos();
        let mut last_opaque = false;

        for dist in 0..max_dist {
            let d = f64::from(dist);
            let x = dir_x.mul_add(d, center.x).floor();
            let y = dir_y.mul_add(d, center.y).floor();

            let Some(alpha) = alpha_at(raster, x, y) else {
                break;
            };
            let opaque = alpha > config.alpha_threshold;

            if last_opaque && !opaque {
                hits.push(Point::new(x, y));
                break;
            }
            last_opaque = opaque;
        }
    }

    hits
}

/// Alpha at floored pixel coordinates, `None` outside the image.
#[allow(clippy::cast_possible_truncation)]
fn alpha_at(raster: &RasterImage<'_>, x: f64, y: f64) -> Option<u8> {
    // The cast saturates; `alpha` rejects anything outside the image.
    raster.alpha(x as i64, y as i64)
}

fn is_opaque(raster: &RasterImage<'_>, x: f64, y: f64, alpha_threshold: u8) -> bool {
    alpha_at(raster, x, y).is_some_and(|a| a > alpha_threshold)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;

    fn disc_image(size: u32, cx: f64, cy: f64, radius: f64) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, y| {
            let dx = f64::from(x) + 0.5 - cx;
            let dy = f64::from(y) + 0.5 - cy;
            if dx.hypot(dy) <= radius {
                Rgba([200, 40, 40, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    fn run(img: &RgbaImage, config: &ExtractConfig) -> Extraction {
        let raster = RasterImage::try_from(img).unwrap();
        extract(&raster, config)
    }

    #[test]
    fn fully_opaque_image_falls_back_to_bounding_box() {
        let img = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let result = run(&img, &ExtractConfig::default());
        assert_eq!(result.seed, Some(Point::new(5.0, 5.0)));
        assert!(result.boundary_points.is_empty());
        assert_eq!(
            result.outcome,
            ExtractionOutcome::TooFewBoundaryPoints { found: 0 }
        );
        assert_eq!(result.contour, Contour::rectangle(10.0, 10.0));
    }

    #[test]
    fn fully_transparent_image_has_no_seed() {
        let img = RgbaImage::from_pixel(12, 8, Rgba([255, 255, 255, 0]));
        let result = run(&img, &ExtractConfig::default());
        assert_eq!(result.seed, None);
        assert_eq!(result.outcome, ExtractionOutcome::NoSeed);
        assert_eq!(result.contour, find_bounding_box(12, 8));
    }

    #[test]
    fn alpha_equal_to_threshold_is_transparent() {
        let img = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 20]));
        let result = run(&img, &ExtractConfig::default());
        assert_eq!(result.outcome, ExtractionOutcome::NoSeed);
    }

    #[test]
    fn centered_disc_is_traced() {
        let img = disc_image(64, 32.0, 32.0, 16.0);
        let result = run(&img, &ExtractConfig::default());
        assert_eq!(result.outcome, ExtractionOutcome::Traced);
        assert_eq!(result.seed, Some(Point::new(32.0, 32.0)));
        assert_eq!(result.boundary_points.len(), 64);

        let points = result.contour.points();
        assert!(points.len() >= 6, "got {} points", points.len());
        assert!(points.len() <= 64);
        for p in points {
            let r = (p.x - 32.0).hypot(p.y - 32.0);
            assert!((14.0..=19.0).contains(&r), "point {p:?} at radius {r}");
        }
    }

    #[test]
    fn traced_contour_is_in_ascending_angle_order() {
        let img = disc_image(64, 32.0, 32.0, 20.0);
        let result = run(&img, &ExtractConfig::default());
        let seed = result.seed.unwrap();
        let angles: Vec<f64> = result
            .contour
            .points()
            .iter()
            .map(|p| (p.y - seed.y).atan2(p.x - seed.x))
            .collect();
        // Simplification may append the last sorted point, which is still
        // the largest angle, so the whole sequence is non-decreasing.
        for w in angles.windows(2) {
            assert!(w[0] <= w[1], "angles out of order: {angles:?}");
        }
    }

    #[test]
    fn off_center_shape_found_by_ring_search() {
        // Transparent at the exact center, opaque disc slightly to the right.
        let img = disc_image(64, 38.0, 32.0, 5.0);
        let result = run(&img, &ExtractConfig::default());
        let seed = result.seed.unwrap();
        assert!(seed.x > 32.0, "seed {seed:?} should be right of center");
    }

    #[test]
    fn shape_beyond_search_radius_is_missed() {
        // Search radius is 64 / 4 = 16; the disc sits near a corner.
        let img = disc_image(64, 6.0, 6.0, 4.0);
        let result = run(&img, &ExtractConfig::default());
        assert_eq!(result.outcome, ExtractionOutcome::NoSeed);
        assert_eq!(result.contour, find_bounding_box(64, 64));
    }

    #[test]
    fn rays_touching_the_edge_record_nothing() {
        // Opaque horizontal band spanning the full width: rays along the
        // band leave the image while opaque, vertical rays hit its edges.
        let img = RgbaImage::from_fn(40, 40, |_, y| {
            if (15..25).contains(&y) {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        let result = run(&img, &ExtractConfig::default());
        assert!(result.boundary_points.len() < 64);
        assert!(
            result
                .boundary_points
                .iter()
                .all(|p| p.y == 14.0 || p.y == 25.0),
            "unexpected hits: {:?}",
            result.boundary_points
        );
    }

    #[test]
    fn ray_count_below_minimum_falls_back() {
        let img = disc_image(64, 32.0, 32.0, 16.0);
        let config = ExtractConfig {
            ray_count: 4,
            ..ExtractConfig::default()
        };
        let result = run(&img, &config);
        assert_eq!(
            result.outcome,
            ExtractionOutcome::TooFewBoundaryPoints { found: 4 }
        );
        assert!(result.outcome.is_fallback());
        assert_eq!(result.contour, find_bounding_box(64, 64));
    }

    #[test]
    fn zero_rays_fall_back_instead_of_empty_contour() {
        let img = disc_image(64, 32.0, 32.0, 16.0);
        let config = ExtractConfig {
            ray_count: 0,
            min_boundary_points: 0,
            ..ExtractConfig::default()
        };
        let result = run(&img, &config);
        assert_eq!(result.outcome, ExtractionOutcome::Degenerate { points: 0 });
        assert_eq!(result.contour, find_bounding_box(64, 64));
        assert!(result.contour.is_hit_testable());
    }

    #[test]
    fn two_ray_hits_fall_back() {
        let img = disc_image(64, 32.0, 32.0, 16.0);
        let config = ExtractConfig {
            ray_count: 2,
            min_boundary_points: 2,
            ..ExtractConfig::default()
        };
        let result = run(&img, &config);
        assert_eq!(result.boundary_points.len(), 2);
        assert_eq!(result.outcome, ExtractionOutcome::Degenerate { points: 2 });
        assert!(result.contour.is_hit_testable());
    }

    #[test]
    fn tolerance_collapsing_the_outline_falls_back() {
        let img = disc_image(64, 32.0, 32.0, 16.0);
        let config = ExtractConfig {
            simplify_tolerance: 1000.0,
            ..ExtractConfig::default()
        };
        let result = run(&img, &config);
        assert_eq!(result.outcome, ExtractionOutcome::Degenerate { points: 2 });
        assert!(result.outcome.is_fallback());
        assert_eq!(result.contour, find_bounding_box(64, 64));
    }

    #[test]
    fn detect_contour_matches_extract() {
        let img = disc_image(48, 24.0, 24.0, 12.0);
        let raster = RasterImage::try_from(&img).unwrap();
        let config = ExtractConfig::default();
        assert_eq!(
            detect_contour(&raster, &config),
            extract(&raster, &config).contour
        );
    }

    #[test]
    fn one_pixel_image() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let result = run(&img, &ExtractConfig::default());
        // Search radius 0.25 still probes r = 0.
        assert_eq!(result.seed, Some(Point::new(0.0, 0.0)));
        assert_eq!(result.contour, find_bounding_box(1, 1));
    }
}
