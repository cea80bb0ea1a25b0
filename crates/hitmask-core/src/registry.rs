//! Registry of hit-testable targets and per-frame path caching.
//!
//! The registry owns one [`HitTarget`] record per registration, in
//! registration order. Host display objects are referenced only through an
//! opaque handle; everything the registry learns about a target (its
//! contour, its projected path, whether generation was attempted) lives in
//! the record.
//!
//! The host drives three entry points:
//!
//! - [`HitRegistry::tick`] once per rendered frame, which re-projects every
//!   eligible contour and caches a closed screen-space polygon;
//! - [`HitRegistry::click`] on pointer input, which tests the cached
//!   polygons in registration order and notifies listeners of the first hit;
//! - [`HitRegistry::image_loaded`] when a target's image finishes decoding.
//!
//! All three take `&mut self`, so a click can never observe a tick that is
//! only partly rebuilt. None of them return errors: failures are logged
//! and isolated to the target they concern.

use std::fmt;

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Coord, LineString, Polygon};
use glam::DMat4;
use serde::{Deserialize, Serialize};

use crate::extract::{self, ExtractionOutcome};
use crate::project::{self, Viewport};
use crate::types::{AssetError, Contour, ExtractConfig, Point, RasterImage, RgbaImage, Size};

/// Capabilities the registry needs from the host scene.
///
/// All queries are synchronous and answered for the current frame.
pub trait SceneHost {
    /// Opaque reference to a host display object.
    type Handle;

    /// The target's local-to-world matrix.
    fn world_transform(&self, target: &Self::Handle) -> DMat4;

    /// The active camera's combined view-projection matrix, if there is one.
    fn camera_view_projection(&self) -> Option<DMat4>;

    /// Viewport size in pixels.
    fn viewport(&self) -> Viewport;

    /// The target's declared width and height, used for rectangle hitboxes.
    fn declared_size(&self, target: &Self::Handle) -> Size;

    /// Material opacity in `[0, 1]`, or `None` if the target has no
    /// material (in which case it is never filtered by opacity).
    fn opacity(&self, target: &Self::Handle) -> Option<f64>;

    /// Whether the target is currently rendered.
    fn is_visible(&self, target: &Self::Handle) -> bool;

    /// The decoded pixels of the target's image, if available.
    fn raster(&self, target: &Self::Handle) -> RasterStatus;
}

/// State of a target's image as reported by the host.
#[derive(Debug)]
pub enum RasterStatus {
    /// The image has not finished loading.
    Pending,
    /// The image is loaded and its pixels are readable.
    Ready(RgbaImage),
    /// The image loaded but its pixels cannot be used.
    Failed(AssetError),
}

/// Per-target registration options.
///
/// Field names deserialize from the host component schema
/// (`useRectangle`, `minOpacity`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HitOptions {
    /// Use the target's declared rectangle instead of a pixel contour.
    pub use_rectangle: bool,
    /// Targets with material opacity below this are not hit-testable.
    pub min_opacity: f64,
}

impl HitOptions {
    /// Default minimum opacity.
    pub const DEFAULT_MIN_OPACITY: f64 = 0.1;

    /// Options for a rectangle hitbox with the default opacity threshold.
    #[must_use]
    pub fn rectangle() -> Self {
        Self {
            use_rectangle: true,
            ..Self::default()
        }
    }
}

impl Default for HitOptions {
    fn default() -> Self {
        Self {
            use_rectangle: false,
            min_opacity: Self::DEFAULT_MIN_OPACITY,
        }
    }
}

/// Identity of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Where a stored contour came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContourSource {
    /// Extracted from the target's image pixels.
    Raster(ExtractionOutcome),
    /// Synthesized from the target's declared size.
    Rectangle,
}

/// A contour together with the frame it is expressed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredContour {
    /// Contour points in `size` units, Y down.
    pub contour: Contour,
    /// Image pixel size or declared size the contour was produced in.
    pub size: Size,
    /// How the contour was produced.
    pub source: ContourSource,
}

/// Convert a viewport `Point` to a `geo::Coord`.
const fn point_to_coord(p: Point) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

/// A closed polygon in viewport pixels, rebuilt every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenPath {
    points: Vec<Point>,
    polygon: Polygon<f64>,
}

impl ScreenPath {
    /// Build a closed path, or `None` if there are fewer than three points
    /// or any coordinate is not finite.
    #[must_use]
    pub fn from_points(points: Vec<Point>) -> Option<Self> {
        let outline = Contour::new(points);
        if !outline.is_hit_testable()
            || outline
                .points()
                .iter()
                .any(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return None;
        }
        let points = outline.into_points();
        let ring: LineString<f64> = points.iter().copied().map(point_to_coord).collect();
        let polygon = Polygon::new(ring, Vec::new());
        Some(Self { points, polygon })
    }

    /// Whether `p` lies inside the path or on its boundary.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        self.polygon.coordinate_position(&point_to_coord(p)) != CoordPos::Outside
    }

    /// The path vertices, without the closing repeat.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

/// Registry-owned record for one registered target.
#[derive(Debug, Clone)]
pub struct HitTarget<H> {
    id: TargetId,
    handle: H,
    options: HitOptions,
    contour: Option<StoredContour>,
    path: Option<ScreenPath>,
    has_tried_generation: bool,
}

impl<H> HitTarget<H> {
    /// Registration identity.
    #[must_use]
    pub const fn id(&self) -> TargetId {
        self.id
    }

    /// The active contour, if one has been produced.
    #[must_use]
    pub const fn contour(&self) -> Option<&StoredContour> {
        self.contour.as_ref()
    }

    /// The screen path cached by the most recent tick.
    #[must_use]
    pub const fn path(&self) -> Option<&ScreenPath> {
        self.path.as_ref()
    }

    /// Whether pixel contour generation has been attempted.
    #[must_use]
    pub const fn has_tried_generation(&self) -> bool {
        self.has_tried_generation
    }
}

/// Notification for a pointer click that landed on a target.
#[derive(Debug, Clone, PartialEq)]
pub struct HitEvent<H> {
    /// Registration that was hit.
    pub id: TargetId,
    /// Host handle of the target.
    pub handle: H,
    /// Click position in viewport pixels.
    pub point: Point,
}

/// Callback invoked for every hit.
pub type HitListener<H> = Box<dyn FnMut(&HitEvent<H>)>;

/// Ordered collection of hit-testable targets.
pub struct HitRegistry<H> {
    targets: Vec<HitTarget<H>>,
    next_id: u64,
    config: ExtractConfig,
    listeners: Vec<HitListener<H>>,
    drawn_count: usize,
}

impl<H: fmt::Debug> fmt::Debug for HitRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HitRegistry")
            .field("targets", &self.targets)
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .field("drawn_count", &self.drawn_count)
            .finish_non_exhaustive()
    }
}

impl<H> Default for HitRegistry<H> {
    fn default() -> Self {
        Self::new(ExtractConfig::default())
    }
}

impl<H> HitRegistry<H> {
    /// Create an empty registry that extracts contours with `config`.
    #[must_use]
    pub const fn new(config: ExtractConfig) -> Self {
        Self {
            targets: Vec::new(),
            next_id: 0,
            config,
            listeners: Vec::new(),
            drawn_count: 0,
        }
    }

    /// Number of registered targets.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Look up a registration.
    #[must_use]
    pub fn get(&self, id: TargetId) -> Option<&HitTarget<H>> {
        self.targets.iter().find(|t| t.id == id)
    }

    /// Targets with a path cached by the last tick, with their paths.
    pub fn cached_paths(&self) -> impl Iterator<Item = (&HitTarget<H>, &ScreenPath)> {
        self.targets
            .iter()
            .filter_map(|t| t.path.as_ref().map(|p| (t, p)))
    }

    /// Number of paths the last tick cached.
    #[must_use]
    pub const fn drawn_count(&self) -> usize {
        self.drawn_count
    }

    /// Register a callback for hit notifications.
    pub fn subscribe(&mut self, listener: impl FnMut(&HitEvent<H>) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Remove a registration. Unknown ids are ignored.
    ///
    /// Returns `true` if a target was removed.
    pub fn unregister(&mut self, id: TargetId) -> bool {
        let Some(index) = self.targets.iter().position(|t| t.id == id) else {
            return false;
        };
        self.targets.remove(index);
        log::debug!("unregistered {id}");
        true
    }

    /// Drop a rectangle target's contour so the next tick rebuilds it from
    /// the current declared size.
    ///
    /// Pixel targets never regenerate once attempted; for them, and for
    /// unknown ids, this returns `false` and changes nothing.
    pub fn invalidate_contour(&mut self, id: TargetId) -> bool {
        match self.targets.iter_mut().find(|t| t.id == id) {
            Some(target) if target.options.use_rectangle => {
                target.contour = None;
                target.path = None;
                true
            }
            _ => false,
        }
    }
}

impl<H: Clone + PartialEq + fmt::Debug> HitRegistry<H> {
    /// Register a target.
    ///
    /// Rectangle targets get their contour immediately. Pixel targets
    /// extract one now if the host already has the image decoded, and
    /// otherwise wait for [`image_loaded`](Self::image_loaded) or a tick
    /// that finds the image ready.
    ///
    /// Registering the same handle twice creates two independent entries.
    pub fn register<S>(&mut self, handle: H, options: HitOptions, host: &S) -> TargetId
    where
        S: SceneHost<Handle = H>,
    {
        if self.targets.iter().any(|t| t.handle == handle) {
            log::warn!("{handle:?} is already registered; adding a second entry");
        }

        let id = TargetId(self.next_id);
        self.next_id += 1;

        let mut target = HitTarget {
            id,
            handle,
            options,
            contour: None,
            path: None,
            has_tried_generation: false,
        };

        if options.use_rectangle {
            target.contour = Some(rectangle_contour(host.declared_size(&target.handle)));
            log::debug!("{id}: rectangle hitbox for {:?}", target.handle);
        } else {
            match host.raster(&target.handle) {
                RasterStatus::Pending => {
                    log::debug!("{id}: waiting for image of {:?}", target.handle);
                }
                status => generate_from_raster(&mut target, status, &self.config),
            }
        }

        self.targets.push(target);
        id
    }

    /// Handle an image-load completion for `id`.
    ///
    /// Completions for targets that have since been unregistered are
    /// dropped. Rectangle targets ignore image loads.
    pub fn image_loaded<S>(&mut self, id: TargetId, host: &S)
    where
        S: SceneHost<Handle = H>,
    {
        let Some(target) = self.targets.iter_mut().find(|t| t.id == id) else {
            log::debug!("{id}: image loaded after unregistration, discarding");
            return;
        };
        if target.options.use_rectangle {
            return;
        }
        let status = host.raster(&target.handle);
        generate_from_raster(target, status, &self.config);
    }

    /// Rebuild every eligible target's screen path for the current frame.
    ///
    /// Invisible targets and targets below their opacity threshold lose
    /// their cached path. Missing contours are generated first (rectangles
    /// every time, pixel contours at most once). A projection with fewer
    /// than three points, e.g. with no active camera, leaves the target
    /// without a path until the next tick.
    pub fn tick<S>(&mut self, host: &S)
    where
        S: SceneHost<Handle = H>,
    {
        let camera = host.camera_view_projection();
        let viewport = host.viewport();
        let mut drawn = 0;

        for target in &mut self.targets {
            if !host.is_visible(&target.handle) {
                target.path = None;
                continue;
            }

            if let Some(opacity) = host.opacity(&target.handle)
                && opacity < target.options.min_opacity
            {
                target.path = None;
                continue;
            }

            if target.contour.is_none() {
                if target.options.use_rectangle {
                    target.contour = Some(rectangle_contour(host.declared_size(&target.handle)));
                } else if !target.has_tried_generation {
                    match host.raster(&target.handle) {
                        RasterStatus::Pending => {}
                        status => generate_from_raster(target, status, &self.config),
                    }
                }
            }

            let Some(stored) = &target.contour else {
                target.path = None;
                continue;
            };

            let screen_points = project::project_contour(
                &stored.contour,
                stored.size,
                &host.world_transform(&target.handle),
                camera.as_ref(),
                viewport,
            );
            target.path = ScreenPath::from_points(screen_points);
            if target.path.is_some() {
                drawn += 1;
            }
        }

        if camera.is_none() && !self.targets.is_empty() {
            log::debug!("no active camera; no hitboxes this frame");
        }
        self.drawn_count = drawn;
    }

    /// Test a click against cached paths in registration order.
    ///
    /// The first visible target whose path contains `point` is reported to
    /// every listener and returned; later targets are not tested even if
    /// they overlap.
    pub fn click<S>(&mut self, point: Point, host: &S) -> Option<HitEvent<H>>
    where
        S: SceneHost<Handle = H>,
    {
        let target = self.targets.iter().find(|t| {
            host.is_visible(&t.handle) && t.path.as_ref().is_some_and(|path| path.contains(point))
        })?;

        let event = HitEvent {
            id: target.id,
            handle: target.handle.clone(),
            point,
        };
        log::debug!("{} hit at ({}, {})", event.id, point.x, point.y);

        for listener in &mut self.listeners {
            listener(&event);
        }
        Some(event)
    }
}

/// Rectangle contour in its own declared frame.
///
/// Missing or unusable extents (zero, NaN, infinite) default to 1.
fn rectangle_contour(declared: Size) -> StoredContour {
    let extent = |v: f64| if v.is_finite() && v != 0.0 { v } else { 1.0 };
    let size = Size::new(extent(declared.width), extent(declared.height));
    StoredContour {
        contour: Contour::rectangle(size.width, size.height),
        size,
        source: ContourSource::Rectangle,
    }
}

/// Extract and store a pixel contour, logging any asset failure.
fn generate_from_raster<H: fmt::Debug>(
    target: &mut HitTarget<H>,
    status: RasterStatus,
    config: &ExtractConfig,
) {
    target.has_tried_generation = true;

    let image = match status {
        RasterStatus::Ready(image) => image,
        RasterStatus::Pending => return,
        RasterStatus::Failed(e) => {
            log::error!("{}: cannot read image of {:?}: {e}", target.id, target.handle);
            return;
        }
    };

    let raster = match RasterImage::try_from(&image) {
        Ok(raster) => raster,
        Err(e) => {
            log::error!("{}: unusable image of {:?}: {e}", target.id, target.handle);
            return;
        }
    };

    let extraction = extract::extract(&raster, config);
    log::debug!(
        "{}: {} contour points for {:?} ({:?})",
        target.id,
        extraction.contour.len(),
        target.handle,
        extraction.outcome,
    );

    target.contour = Some(StoredContour {
        contour: extraction.contour,
        size: raster.dimensions().into(),
        source: ContourSource::Raster(extraction.outcome),
    });
}
