//! Debug overlay: draw the hitbox paths cached by the last tick.
//!
//! Produces a transparent viewport-sized image with every cached screen
//! path stroked on it, for compositing over a rendered frame. Pixel
//! contours are stroked in translucent red and rectangle hitboxes in
//! translucent green; an optional highlighted target (typically the last
//! click's hit) is stroked in opaque green on top.
//!
//! Rendering uses `tiny-skia`, which handles sub-pixel positioning and
//! anti-aliasing internally.

use image::{Rgba, RgbaImage};
use tiny_skia::{Color, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use hitmask_core::{ContourSource, HitRegistry, Point, TargetId, Viewport};

use crate::ExportError;

/// Stroke width for ordinary hitbox outlines, in pixels.
const OUTLINE_WIDTH: f32 = 2.0;
/// Stroke width for the highlighted hitbox, in pixels.
const HIGHLIGHT_WIDTH: f32 = 3.0;

/// Render the registry's cached paths into a transparent RGBA image.
///
/// # Errors
///
/// Returns [`ExportError::InvalidViewport`] if the viewport rounds to a
/// zero or unrepresentable pixel size.
pub fn render_overlay<H>(
    registry: &HitRegistry<H>,
    viewport: Viewport,
    highlight: Option<TargetId>,
) -> Result<RgbaImage, ExportError> {
    let (width, height) = pixel_size(viewport)?;
    let mut pixmap = Pixmap::new(width, height).ok_or(ExportError::InvalidViewport {
        width: viewport.width,
        height: viewport.height,
    })?;

    let mut highlighted = None;

    for (target, path) in registry.cached_paths() {
        if Some(target.id()) == highlight {
            highlighted = Some(path.points());
            continue;
        }
        let color = match target.contour().map(|c| c.source) {
            Some(ContourSource::Rectangle) => Color::from_rgba8(0, 255, 0, 178),
            _ => Color::from_rgba8(255, 0, 0, 128),
        };
        stroke_closed(&mut pixmap, path.points(), color, OUTLINE_WIDTH);
    }

    if let Some(points) = highlighted {
        stroke_closed(
            &mut pixmap,
            points,
            Color::from_rgba8(0, 255, 0, 255),
            HIGHLIGHT_WIDTH,
        );
    }

    Ok(pixmap_to_rgba(&pixmap))
}

/// Stroke a closed polygon onto `pixmap`. Degenerate input draws nothing.
#[allow(clippy::cast_possible_truncation)]
fn stroke_closed(pixmap: &mut Pixmap, points: &[Point], color: Color, width: f32) {
    let mut pb = PathBuilder::new();
    if let Some(first) = points.first() {
        pb.move_to(first.x as f32, first.y as f32);
        for p in &points[1..] {
            pb.line_to(p.x as f32, p.y as f32);
        }
        pb.close();
    }

    let Some(path) = pb.finish() else {
        return;
    };

    let stroke = Stroke {
        width,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;

    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

/// Round a viewport to whole pixels.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pixel_size(viewport: Viewport) -> Result<(u32, u32), ExportError> {
    let invalid = || ExportError::InvalidViewport {
        width: viewport.width,
        height: viewport.height,
    };
    let w = viewport.width.round();
    let h = viewport.height.round();
    if !(w >= 1.0 && h >= 1.0 && w <= f64::from(u32::MAX) && h <= f64::from(u32::MAX)) {
        return Err(invalid());
    }
    Ok((w as u32, h as u32))
}

/// Convert a premultiplied pixmap into a straight-alpha `RgbaImage`.
#[allow(clippy::cast_possible_truncation)]
fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let data = pixmap.data();
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (i, pixel) in img.pixels_mut().enumerate() {
        let off = i * 4;
        let a = data[off + 3];
        if a == 0 {
            *pixel = Rgba([0, 0, 0, 0]);
        } else {
            // Un-premultiply: channel = premultiplied * 255 / alpha.
            let r = u16::from(data[off]) * 255 / u16::from(a);
            let g = u16::from(data[off + 1]) * 255 / u16::from(a);
            let b = u16::from(data[off + 2]) * 255 / u16::from(a);
            *pixel = Rgba([r as u8, g as u8, b as u8, a]);
        }
    }
    img
}
