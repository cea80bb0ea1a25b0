//! hitmask-bench: CLI tool for contour extraction experiments and hit probes.
//!
//! Traces the alpha silhouette of an image with configurable parameters,
//! printing extraction diagnostics. The image is then registered as the
//! only target of a static scene whose camera maps it onto a viewport of
//! the same pixel size, so `--probe X,Y` clicks are in image pixels.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin hitmask-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use clap::Parser;
use glam::DMat4;
use hitmask_core::diagnostics::{ExtractionDiagnostics, detect_contour_with_diagnostics};
use hitmask_core::{
    Contour, ExtractConfig, HitOptions, HitRegistry, Point, RasterImage, RasterStatus, SceneHost,
    Size, Viewport,
};
use image::RgbaImage;

/// Contour extraction experiments and hit probes for hitmask.
///
/// Runs extraction on a given image with configurable parameters and
/// prints timing and count diagnostics.
#[derive(Parser)]
#[command(name = "hitmask-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Alpha values strictly above this count as opaque.
    #[arg(long, default_value_t = ExtractConfig::DEFAULT_ALPHA_THRESHOLD)]
    alpha_threshold: u8,

    /// Number of rays cast from the seed.
    #[arg(long, default_value_t = ExtractConfig::DEFAULT_RAY_COUNT, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    rays: u32,

    /// Douglas-Peucker tolerance in pixels.
    #[arg(long, default_value_t = ExtractConfig::DEFAULT_SIMPLIFY_TOLERANCE)]
    tolerance: f64,

    /// Full extraction config as a JSON string.
    ///
    /// When provided, all other extraction flags are ignored. The JSON
    /// must be a valid `ExtractConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Use the plane's rectangle as the hitbox instead of tracing.
    #[arg(long)]
    rectangle: bool,

    /// Click position in image pixels, `X,Y`. May be repeated.
    #[arg(long = "probe")]
    probes: Vec<Probe>,

    /// Write SVG output to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write a PNG debug overlay of the hitbox to file.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,
}

/// A click position parsed from `X,Y`.
#[derive(Debug, Clone, Copy)]
struct Probe(Point);

impl FromStr for Probe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("expected X,Y but got {s:?}"))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid coordinate {v:?}: {e}"))
        };
        Ok(Self(Point::new(parse(x)?, parse(y)?)))
    }
}

/// Build an [`ExtractConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual extraction flags are ignored. Either way the result is
/// validated.
fn config_from_cli(cli: &Cli) -> Result<ExtractConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        ExtractConfig {
            alpha_threshold: cli.alpha_threshold,
            ray_count: cli.rays,
            simplify_tolerance: cli.tolerance,
            ..ExtractConfig::default()
        }
    };

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// A scene holding one image plane that fills the viewport exactly.
struct StaticHost {
    image: RgbaImage,
}

impl StaticHost {
    fn viewport_size(&self) -> Viewport {
        Viewport::new(f64::from(self.image.width()), f64::from(self.image.height()))
    }
}

impl SceneHost for StaticHost {
    type Handle = ();

    fn world_transform(&self, _: &()) -> DMat4 {
        DMat4::IDENTITY
    }

    fn camera_view_projection(&self) -> Option<DMat4> {
        Some(DMat4::orthographic_rh_gl(-0.5, 0.5, -0.5, 0.5, -1.0, 1.0))
    }

    fn viewport(&self) -> Viewport {
        self.viewport_size()
    }

    fn declared_size(&self, _: &()) -> Size {
        Size::new(1.0, 1.0)
    }

    fn opacity(&self, _: &()) -> Option<f64> {
        None
    }

    fn is_visible(&self, _: &()) -> bool {
        true
    }

    fn raster(&self, _: &()) -> RasterStatus {
        RasterStatus::Ready(self.image.clone())
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let image = match hitmask_core::raster::decode_rgba(&image_bytes) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error decoding {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let raster = match RasterImage::try_from(&image) {
        Ok(raster) => raster,
        Err(e) => {
            eprintln!("Unusable image: {e}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes, {}x{})",
        cli.image_path.display(),
        image_bytes.len(),
        image.width(),
        image.height(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);
    let mut traced = None;

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        let (contour, diagnostics) = detect_contour_with_diagnostics(&raster, &config);
        if cli.json {
            match serde_json::to_string_pretty(&diagnostics) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!("{}", diagnostics.report());
        }

        if traced.is_none() {
            traced = Some(contour);
        }
        all_diagnostics.push(diagnostics);

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    if let Some(ref svg_path) = cli.svg
        && let Some(ref contour) = traced
    {
        write_svg(&cli, &config, contour, raster.dimensions(), svg_path);
    }

    let host = StaticHost { image };
    let options = if cli.rectangle {
        HitOptions::rectangle()
    } else {
        HitOptions::default()
    };
    let mut registry = HitRegistry::new(config);
    let id = registry.register((), options, &host);
    registry.tick(&host);
    eprintln!("Hitboxes drawn: {}", registry.drawn_count());

    let mut last_hit = None;
    for Probe(point) in &cli.probes {
        match registry.click(*point, &host) {
            Some(event) => {
                println!("probe ({}, {}): hit {}", point.x, point.y, event.id);
                last_hit = Some(event.id);
            }
            None => println!("probe ({}, {}): miss", point.x, point.y),
        }
    }

    if let Some(ref overlay_path) = cli.overlay {
        let written = hitmask_export::render_overlay(&registry, host.viewport(), last_hit)
            .and_then(|img| hitmask_export::encode_png(&img));
        match written {
            Ok(png) => match std::fs::write(overlay_path, &png) {
                Ok(()) => eprintln!(
                    "Overlay for {id} written to {} ({} bytes)",
                    overlay_path.display(),
                    png.len(),
                ),
                Err(e) => eprintln!("Error writing overlay to {}: {e}", overlay_path.display()),
            },
            Err(e) => {
                eprintln!("Error rendering overlay: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

/// Write the traced contour as SVG, reporting the outcome on stderr.
fn write_svg(
    cli: &Cli,
    config: &ExtractConfig,
    contour: &Contour,
    dimensions: hitmask_core::Dimensions,
    svg_path: &std::path::Path,
) {
    let title = cli
        .image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bench");
    let config_json = serde_json::to_string(config).ok();
    let metadata = hitmask_export::SvgMetadata {
        title: Some(title),
        description: Some("hitmask contour"),
        config_json: config_json.as_deref(),
    };
    let svg = hitmask_export::to_svg(std::slice::from_ref(contour), dimensions, &metadata);
    match std::fs::write(svg_path, &svg) {
        Ok(()) => {
            eprintln!(
                "SVG written to {} ({} bytes)",
                svg_path.display(),
                svg.len(),
            );
        }
        Err(e) => {
            eprintln!("Error writing SVG to {}: {e}", svg_path.display());
        }
    }
}

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[ExtractionDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Extraction duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn probe_parses_pair() {
        let Probe(p) = "12.5, 7".parse().unwrap();
        assert_eq!(p, Point::new(12.5, 7.0));
    }

    #[test]
    fn probe_rejects_garbage() {
        assert!("12".parse::<Probe>().is_err());
        assert!("a,b".parse::<Probe>().is_err());
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = Cli::parse_from([
            "hitmask-bench",
            "img.png",
            "--rays",
            "8",
            "--config-json",
            r#"{"ray_count": 128}"#,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.ray_count, 128);
        assert_eq!(config.alpha_threshold, ExtractConfig::DEFAULT_ALPHA_THRESHOLD);
    }

    #[test]
    fn invalid_config_json_is_rejected() {
        let cli = Cli::parse_from([
            "hitmask-bench",
            "img.png",
            "--config-json",
            r#"{"ray_count": 0, "min_boundary_points": 0}"#,
        ]);
        let err = config_from_cli(&cli).unwrap_err();
        assert!(err.contains("ray_count"), "{err}");
    }

    #[test]
    fn negative_tolerance_flag_is_rejected() {
        let cli = Cli::parse_from(["hitmask-bench", "img.png", "--tolerance=-1"]);
        assert!(config_from_cli(&cli).is_err());
    }

    #[test]
    fn flags_build_config() {
        let cli = Cli::parse_from([
            "hitmask-bench",
            "img.png",
            "--alpha-threshold",
            "100",
            "--tolerance",
            "0.5",
            "--probe",
            "1,2",
            "--probe",
            "3,4",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.alpha_threshold, 100);
        assert!((config.simplify_tolerance - 0.5).abs() < f64::EPSILON);
        assert_eq!(cli.probes.len(), 2);
    }

    #[test]
    fn static_host_hits_opaque_center() {
        let image = RgbaImage::from_pixel(20, 10, image::Rgba([0, 0, 0, 255]));
        let host = StaticHost { image };
        let mut registry = HitRegistry::default();
        registry.register((), HitOptions::default(), &host);
        registry.tick(&host);
        assert!(registry.click(Point::new(10.0, 5.0), &host).is_some());
        assert!(registry.click(Point::new(25.0, 5.0), &host).is_none());
    }
}
