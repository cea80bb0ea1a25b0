//! SVG export serializer.
//!
//! Converts contours into an SVG string with one closed `<path>` element
//! per contour, using the [`svg`] crate for document construction, XML
//! escaping, and path data formatting. The `viewBox` matches the source
//! image, so the SVG overlays the image it was traced from.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path, Title};
use svg::node::{Node, Text, Value};

use hitmask_core::{Contour, Dimensions};

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped automatically by
/// the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`. Typically the image file stem.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized extraction config, emitted inside
    /// `<metadata><hitmask:extract>` so exported files record the
    /// settings they were traced with.
    pub config_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from a contour.
///
/// Uses `M` for the first point, `L` for the rest, and closes the path
/// back to the first point. Returns an empty string for contours with
/// fewer than 2 points.
///
/// # Examples
///
/// ```
/// use hitmask_core::{Contour, Point};
/// use hitmask_export::build_path_data;
///
/// let contour = Contour::new(vec![
///     Point::new(10.0, 20.0),
///     Point::new(30.0, 40.0),
/// ]);
/// let d = build_path_data(&contour);
/// assert!(d.starts_with("M10,20 L30,40"));
/// ```
#[must_use]
pub fn build_path_data(contour: &Contour) -> String {
    let points = contour.points();
    if points.len() < 2 {
        return String::new();
    }

    let first = &points[0];
    let mut data = Data::new().move_to((first.x, first.y));
    for p in &points[1..] {
        data = data.line_to((p.x, p.y));
    }
    String::from(Value::from(data.close()))
}

/// Serialize contours into an SVG document sized to the source image.
#[must_use]
pub fn to_svg(contours: &[Contour], dimensions: Dimensions, metadata: &SvgMetadata<'_>) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut extract_el = Element::new("hitmask:extract");
        extract_el.assign("xmlns:hitmask", "urn:hitmask:1");
        extract_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(extract_el);
        doc = doc.add(metadata_el);
    }

    for contour in contours {
        let d = build_path_data(contour);
        if d.is_empty() {
            continue;
        }

        let path = Path::new()
            .set("d", d)
            .set("fill", "none")
            .set("stroke", "red")
            .set("stroke-width", 1);
        doc = doc.add(path);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
