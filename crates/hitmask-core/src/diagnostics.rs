//! Extraction diagnostics: timing and counts for one contour detection.
//!
//! Intended for tuning the alpha threshold, ray count and simplification
//! tolerance against real assets. Timestamps come from the `web-time`
//! crate, which uses `performance.now()` on WASM and
//! `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::extract::{self, ExtractionOutcome};
use crate::types::{Contour, Dimensions, ExtractConfig, Point, RasterImage};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionDiagnostics {
    /// Source raster size.
    pub dimensions: Dimensions,
    /// Configuration the extraction ran with.
    pub config: ExtractConfig,
    /// Detection center, `None` when the seed search failed.
    pub seed: Option<Point>,
    /// Rays that found an opaque-to-transparent transition.
    pub boundary_points: usize,
    /// Points in the returned contour.
    pub contour_points: usize,
    /// Which path produced the contour.
    pub outcome: ExtractionOutcome,
    /// Wall-clock duration (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl ExtractionDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Extraction Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{}",
            self.dimensions.width, self.dimensions.height,
        ));
        lines.push(format!(
            "Config: alpha>{} rays={} tol={:.2} min_hits={}",
            self.config.alpha_threshold,
            self.config.ray_count,
            self.config.simplify_tolerance,
            self.config.min_boundary_points,
        ));
        lines.push(format!("Duration: {:.3}ms", duration_ms(self.duration)));
        lines.push(match self.seed {
            Some(p) => format!("Seed: ({}, {})", p.x, p.y),
            None => "Seed: none".to_string(),
        });
        lines.push(format!(
            "Ray hits: {}/{}",
            self.boundary_points, self.config.ray_count,
        ));

        let outcome = match self.outcome {
            ExtractionOutcome::Traced => "traced".to_string(),
            ExtractionOutcome::NoSeed => "bounding box (no opaque seed)".to_string(),
            ExtractionOutcome::TooFewBoundaryPoints { found } => format!(
                "bounding box ({found} hits < {})",
                self.config.min_boundary_points
            ),
            ExtractionOutcome::Degenerate { points } => {
                format!("bounding box (simplified to {points} points)")
            }
        };
        lines.push(format!(
            "Contour: {} points, {outcome}",
            self.contour_points
        ));

        lines.join("\n")
    }
}

/// Run [`extract::extract`] and time it.
#[must_use = "returns the contour and its diagnostics"]
pub fn detect_contour_with_diagnostics(
    raster: &RasterImage<'_>,
    config: &ExtractConfig,
) -> (Contour, ExtractionDiagnostics) {
    let start = web_time::Instant::now();
    let extraction = extract::extract(raster, config);
    let duration = start.elapsed();

    let diagnostics = ExtractionDiagnostics {
        dimensions: raster.dimensions(),
        config: config.clone(),
        seed: extraction.seed,
        boundary_points: extraction.boundary_points.len(),
        contour_points: extraction.contour.len(),
        outcome: extraction.outcome,
        duration,
    };
    (extraction.contour, diagnostics)
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
