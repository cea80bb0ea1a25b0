//! Planar geometry helpers for contour post-processing.
//!
//! Angular sorting around a center, clamped point-to-segment distance, and
//! Ramer-Douglas-Peucker simplification. All functions are pure and work
//! in whatever coordinate space their inputs share.

use std::cmp::Ordering;

use crate::types::Point;

/// Sort points by `atan2(y - center.y, x - center.x)`, ascending.
///
/// In a Y-down image space ascending angle runs clockwise on screen.
/// The sort is stable: points with equal angles keep their input order.
#[must_use = "returns the sorted points"]
pub fn sort_clockwise(points: &[Point], center: Point) -> Vec<Point> {
    let angle = |p: &Point| (p.y - center.y).atan2(p.x - center.x);
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| angle(a).partial_cmp(&angle(b)).unwrap_or(Ordering::Equal));
    sorted
}

/// Distance from `p` to the closed segment `a`-`b`.
///
/// The projection of `p` onto the line through `a` and `b` is clamped to
/// the segment, so points beyond either end measure to that endpoint.
/// When `a == b` this is the distance from `p` to `a`.
#[must_use]
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let t = (p.x - a.x).mul_add(dx, (p.y - a.y) * dy) / length_sq;
    let t = t.clamp(0.0, 1.0);
    let projection = Point::new(t.mul_add(dx, a.x), t.mul_add(dy, a.y));
    p.distance(projection)
}

/// Simplify an open point sequence with Ramer-Douglas-Peucker.
///
/// The first and last points are fixed endpoints. A point is kept only when
/// its distance to the current segment strictly exceeds `tolerance`, so
/// points lying exactly at the tolerance are dropped. If the simplified
/// sequence does not end on the input's last point, that point is appended
/// so the closing edge of a loop is preserved.
///
/// Sequences of two or fewer points are returned unchanged.
#[must_use = "returns the simplified points"]
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let tolerance = tolerance.max(0.0);
    let last = points.len() - 1;
    let mut simplified = douglas_peucker(points, 0, last, tolerance);

    if simplified.last() != Some(&points[last]) {
        simplified.push(points[last]);
    }
    simplified
}

/// Simplify `points[start..=end]` into a fresh vector.
///
/// A range with no interior points yields only its start point.
fn douglas_peucker(points: &[Point], start: usize, end: usize, tolerance: f64) -> Vec<Point> {
    if end <= start + 1 {
        return vec![points[start]];
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for (i, &p) in points.iter().enumerate().take(end).skip(start + 1) {
        let d = point_segment_distance(p, points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist <= tolerance {
        return vec![points[start], points[end]];
    }

    let mut left = douglas_peucker(points, start, max_idx, tolerance);
    let right = douglas_peucker(points, max_idx, end, tolerance);

    let skip = usize::from(left.last() == right.first());
    left.extend_from_slice(&right[skip..]);
    left
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    // --- sort_clockwise ---

    #[test]
    fn sort_orders_by_ascending_angle() {
        let center = Point::new(0.0, 0.0);
        let input = pts(&[(0.0, 1.0), (-1.0, 0.0), (1.0, 0.0), (0.0, -1.0)]);
        let sorted = sort_clockwise(&input, center);
        // atan2: (0,-1) = -pi/2, (1,0) = 0, (0,1) = pi/2, (-1,0) = pi
        assert_eq!(
            sorted,
            pts(&[(0.0, -1.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)])
        );
    }

    #[test]
    fn sort_is_stable_for_equal_angles() {
        let center = Point::new(0.0, 0.0);
        let input = pts(&[(2.0, 2.0), (1.0, 0.0), (1.0, 1.0)]);
        let sorted = sort_clockwise(&input, center);
        assert_eq!(sorted, pts(&[(1.0, 0.0), (2.0, 2.0), (1.0, 1.0)]));
    }

    #[test]
    fn sort_is_idempotent() {
        let center = Point::new(5.0, 5.0);
        let input = pts(&[(9.0, 5.0), (5.0, 1.0), (1.0, 6.0), (6.0, 9.0), (2.0, 2.0)]);
        let once = sort_clockwise(&input, center);
        let twice = sort_clockwise(&once, center);
        assert_eq!(once, twice);
    }

    #[test]
    fn sort_uses_given_center() {
        let input = pts(&[(10.0, 10.0), (10.0, 12.0)]);
        let sorted = sort_clockwise(&input, Point::new(10.0, 11.0));
        assert_eq!(sorted, pts(&[(10.0, 10.0), (10.0, 12.0)]));
    }

    // --- point_segment_distance ---

    #[test]
    fn distance_perpendicular_inside_segment() {
        let d = point_segment_distance(
            Point::new(1.0, 3.0),
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
        );
        assert!((d - 3.0).abs() < 1e-10);
    }

    #[test]
    fn distance_clamps_before_start() {
        // Nearest point on the infinite line is (-3, 0); clamped to (0, 0).
        let d = point_segment_distance(
            Point::new(-3.0, 4.0),
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
        );
        assert!((d - 5.0).abs() < 1e-10, "got {d}");
    }

    #[test]
    fn distance_clamps_past_end() {
        let d = point_segment_distance(
            Point::new(5.0, 4.0),
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
        );
        assert!((d - 5.0).abs() < 1e-10, "got {d}");
    }

    #[test]
    fn distance_degenerate_segment_is_point_distance() {
        let a = Point::new(1.0, 1.0);
        for p in pts(&[(4.0, 5.0), (1.0, 1.0), (-2.0, 1.0), (0.5, -3.0)]) {
            let d = point_segment_distance(p, a, a);
            assert!((d - p.distance(a)).abs() < 1e-12);
        }
    }

    #[test]
    fn distance_diagonal_segment() {
        let d = point_segment_distance(
            Point::new(2.0, -1.0),
            Point::new(0.0, 0.0),
            Point::new(4.0, 2.0),
        );
        let expected = 8.0 / 20.0_f64.sqrt();
        assert!((d - expected).abs() < 1e-10, "got {d}, expected {expected}");
    }

    // --- simplify ---

    #[test]
    fn short_inputs_unchanged() {
        assert!(simplify(&[], 1.0).is_empty());
        let one = pts(&[(1.0, 2.0)]);
        assert_eq!(simplify(&one, 1.0), one);
        let two = pts(&[(0.0, 0.0), (10.0, 0.0)]);
        assert_eq!(simplify(&two, 1.0), two);
    }

    #[test]
    fn collinear_points_collapse_to_endpoints() {
        let input = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]);
        assert_eq!(simplify(&input, 0.1), pts(&[(0.0, 0.0), (4.0, 4.0)]));
    }

    #[test]
    fn zero_tolerance_drops_exactly_collinear_points() {
        let input = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (2.0, 2.0)]);
        assert_eq!(
            simplify(&input, 0.0),
            pts(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)])
        );
    }

    #[test]
    fn zero_tolerance_keeps_non_collinear_points() {
        let input = pts(&[(0.0, 0.0), (1.0, 0.5), (2.0, 0.0), (3.0, 0.5), (4.0, 0.0)]);
        assert_eq!(simplify(&input, 0.0), input);
    }

    #[test]
    fn point_at_tolerance_is_dropped() {
        // Middle point is exactly 2.0 from the baseline.
        let input = pts(&[(0.0, 0.0), (5.0, 2.0), (10.0, 0.0)]);
        assert_eq!(simplify(&input, 2.0), pts(&[(0.0, 0.0), (10.0, 0.0)]));
        assert_eq!(simplify(&input, 1.999), input);
    }

    #[test]
    fn zigzag_retains_peaks() {
        let input = pts(&[(0.0, 0.0), (2.0, 5.0), (4.0, 0.0), (6.0, 5.0), (8.0, 0.0)]);
        assert_eq!(simplify(&input, 1.0), input);
    }

    #[test]
    fn large_tolerance_collapses_zigzag() {
        let input = pts(&[(0.0, 0.0), (2.0, 5.0), (4.0, 0.0), (6.0, 5.0), (8.0, 0.0)]);
        assert_eq!(simplify(&input, 10.0), pts(&[(0.0, 0.0), (8.0, 0.0)]));
    }

    #[test]
    fn split_point_appears_once() {
        let input = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 6.0), (3.0, 0.0), (4.0, 0.0)]);
        let result = simplify(&input, 1.0);
        let peaks = result.iter().filter(|p| **p == Point::new(2.0, 6.0)).count();
        assert_eq!(peaks, 1, "got {result:?}");
    }

    #[test]
    fn closed_ring_keeps_first_and_last() {
        // Points sampled around a circle, as a ray-cast contour would be.
        let ring: Vec<Point> = (0..32)
            .map(|i| {
                let a = f64::from(i) / 32.0 * std::f64::consts::TAU;
                Point::new(a.cos().mul_add(20.0, 50.0), a.sin().mul_add(20.0, 50.0))
            })
            .collect();
        for tol in [0.0, 0.5, 2.0, 8.0, 100.0] {
            let result = simplify(&ring, tol);
            assert_eq!(result.first(), ring.first(), "tol={tol}");
            assert_eq!(result.last(), ring.last(), "tol={tol}");
        }
    }

    #[test]
    fn negative_tolerance_behaves_like_zero() {
        let input = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (2.0, 2.0)]);
        assert_eq!(simplify(&input, -1.0), simplify(&input, 0.0));
    }

    #[test]
    fn input_is_not_modified() {
        let input = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        let copy = input.clone();
        let _ = simplify(&input, 5.0);
        assert_eq!(input, copy);
    }
}
