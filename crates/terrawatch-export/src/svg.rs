//! SVG serializers for clip masks, overlays and legends.
//!
//! A mask is expressed the way SVG expresses luminance masks: a `<mask>`
//! whose content is a full-viewport black `<rect>` (hidden) with the
//! locality `<polygon>` painted white on top (revealed). The outline is a
//! second, unfilled `<polygon>` drawn after the masked content, so it sits
//! above the raster and never affects what the mask reveals.
//!
//! Documents are built with the [`svg`] crate, which handles attribute
//! escaping. The crate omits the XML declaration, so standalone documents
//! prepend it.

use svg::Document;
use svg::node::element::{
    Definitions, Description, Element, Image, Mask, Polygon, Rectangle, Title,
};
use svg::node::{Node, Text};

use terrawatch_core::{IndexKind, MaskDescriptor, Ring, Viewport, build_legend};

/// Height of one legend row in user units.
const LEGEND_ROW: u32 = 24;
/// Side of a legend swatch.
const LEGEND_SWATCH: u32 = 16;
/// Width of a legend document.
const LEGEND_WIDTH: u32 = 160;

/// Metadata to embed in a standalone SVG document.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgMetadata<'a> {
    /// Emitted as `<title>`, typically the locality and product.
    pub title: Option<&'a str>,
    /// Emitted as `<desc>`, typically the run timestamp.
    pub description: Option<&'a str>,
}

/// Format a ring as an SVG `points` attribute: `"x,y x,y ..."`.
///
/// # Examples
///
/// ```
/// use terrawatch_core::{Point, Ring};
/// use terrawatch_export::polygon_points;
///
/// let ring = Ring::new(vec![Point::new(0.0, 100.0), Point::new(12.5, 0.0)]);
/// assert_eq!(polygon_points(&ring), "0,100 12.5,0");
/// ```
#[must_use]
pub fn polygon_points(ring: &Ring) -> String {
    ring.points()
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn mask_definition(mask: &MaskDescriptor) -> Definitions {
    let hidden = Rectangle::new()
        .set("width", "100%")
        .set("height", "100%")
        .set("fill", "black");
    let revealed = Polygon::new()
        .set("points", polygon_points(&mask.clip))
        .set("fill", "white");
    Definitions::new().add(
        Mask::new()
            .set("id", mask.id.as_str())
            .set("maskUnits", "userSpaceOnUse")
            .add(hidden)
            .add(revealed),
    )
}

fn outline(mask: &MaskDescriptor) -> Polygon {
    Polygon::new()
        .set("class", "locality-outline")
        .set("points", polygon_points(&mask.clip))
        .set("fill", "none")
        .set("stroke", mask.outline.color.as_str())
        .set("stroke-width", mask.outline.width)
        .set("stroke-opacity", mask.outline.opacity)
        .set("stroke-linejoin", "round")
}

fn sized(viewport: Viewport) -> Document {
    Document::new()
        .set("width", viewport.width)
        .set("height", viewport.height)
        .set("viewBox", (0, 0, viewport.width, viewport.height))
}

/// Inline SVG for a page that already shows the raster.
///
/// Contains the `<mask>` definition (referenced from the raster element
/// as `mask: url(#<id>)`) and the outline. No XML declaration.
#[must_use]
pub fn to_mask_svg(mask: &MaskDescriptor) -> String {
    sized(mask.viewport)
        .set("class", "mask-overlay")
        .add(mask_definition(mask))
        .add(outline(mask))
        .to_string()
}

/// Standalone document showing `raster_url` clipped by `mask`.
///
/// The raster is stretched over the whole `viewport`, the surface the mask
/// was projected into. Without a mask the raster is shown in full and no
/// outline is drawn.
#[must_use]
pub fn to_overlay_svg(
    raster_url: &str,
    viewport: Viewport,
    mask: Option<&MaskDescriptor>,
    metadata: &SvgMetadata<'_>,
) -> String {
    let mut doc = sized(viewport);

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    let mut image = Image::new()
        .set("href", raster_url)
        .set("width", viewport.width)
        .set("height", viewport.height)
        .set("preserveAspectRatio", "none");
    if let Some(mask) = mask {
        doc = doc.add(mask_definition(mask));
        image = image.set("mask", format!("url(#{})", mask.id));
    }
    doc = doc.add(image);
    if let Some(mask) = mask {
        doc = doc.add(outline(mask));
    }

    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

/// Standalone legend document: one swatch and range label per row, in
/// the order [`build_legend`] returns them.
#[must_use]
pub fn to_legend_svg(kind: IndexKind) -> String {
    let entries = build_legend(kind);
    let height = LEGEND_ROW * u32::try_from(entries.len()).unwrap_or(u32::MAX);
    let mut doc = Document::new()
        .set("width", LEGEND_WIDTH)
        .set("height", height)
        .set("viewBox", (0, 0, LEGEND_WIDTH, height))
        .add(Title::new(format!("{} legend", kind.acronym())));

    for (row, entry) in (0_u32..).zip(entries.iter()) {
        let y = row * LEGEND_ROW;
        doc = doc.add(
            Rectangle::new()
                .set("x", 0)
                .set("y", y)
                .set("width", LEGEND_SWATCH)
                .set("height", LEGEND_SWATCH)
                .set("fill", entry.color)
                .set("stroke", "#888888"),
        );
        let mut label = Element::new("text");
        label.assign("x", LEGEND_SWATCH + 8);
        label.assign("y", y + LEGEND_SWATCH - 3);
        label.assign("font-family", "sans-serif");
        label.assign("font-size", 12);
        label.append(Text::new(entry.range_label));
        doc = doc.add(label);
    }

    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use terrawatch_core::{GeoPolygon, Margin, OutlineStyle, Point, build_mask, project};

    fn square_mask(kind: IndexKind) -> MaskDescriptor {
        let poly = GeoPolygon::from_pairs(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
        let projection = project(&poly, Viewport::new(100, 100), Margin::FULL).unwrap();
        build_mask(&projection, kind, &OutlineStyle::default())
    }

    #[test]
    fn points_attribute() {
        let ring = Ring::new(vec![
            Point::new(0.0, 100.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        ]);
        assert_eq!(polygon_points(&ring), "0,100 0,0 100,0");
    }

    #[test]
    fn empty_ring_has_empty_points() {
        assert_eq!(polygon_points(&Ring::new(Vec::new())), "");
    }

    #[test]
    fn mask_svg_has_black_rect_white_polygon_and_outline() {
        let svg = to_mask_svg(&square_mask(IndexKind::Vegetation));
        assert!(svg.contains("<mask"));
        assert!(svg.contains(r#"id="mask-ndvi""#));
        assert!(svg.contains(r#"fill="black""#));
        assert!(svg.contains(r#"fill="white""#));
        assert!(svg.contains(r#"points="0,100 0,0 100,0 100,100""#));
        assert!(svg.contains(r##"stroke="#ffffff""##));
        assert!(svg.contains(r#"stroke-width="3""#));
        assert!(svg.contains(r#"stroke-opacity="0.8""#));
        assert!(!svg.starts_with("<?xml"));
    }

    #[test]
    fn outline_follows_mask() {
        let svg = to_mask_svg(&square_mask(IndexKind::Water));
        let mask_end = svg.find("</defs>").unwrap();
        let outline = svg.find("locality-outline").unwrap();
        assert!(outline > mask_end);
    }

    #[test]
    fn overlay_references_mask_from_image() {
        let mask = square_mask(IndexKind::Water);
        let meta = SvgMetadata {
            title: Some("Springfield NDWI"),
            description: None,
        };
        let svg = to_overlay_svg("/w.gif?t=1", Viewport::new(100, 100), Some(&mask), &meta);
        assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(svg.contains("<title>Springfield NDWI</title>"));
        assert!(svg.contains(r#"href="/w.gif?t=1""#));
        assert!(svg.contains(r#"mask="url(#mask-ndwi)""#));
        let image = svg.find("<image").unwrap();
        assert!(svg.find("locality-outline").unwrap() > image);
    }

    #[test]
    fn overlay_without_mask_shows_full_raster() {
        let svg = to_overlay_svg(
            "/v.gif",
            Viewport::new(64, 32),
            None,
            &SvgMetadata::default(),
        );
        assert!(svg.contains(r#"viewBox="0 0 64 32""#));
        assert!(svg.contains("<image"));
        assert!(!svg.contains("<mask"));
        assert!(!svg.contains("locality-outline"));
    }

    #[test]
    fn metadata_is_escaped() {
        let meta = SvgMetadata {
            title: Some("A & B"),
            description: Some("<run>"),
        };
        let svg = to_overlay_svg("/v.gif", Viewport::new(10, 10), None, &meta);
        assert!(svg.contains("A &amp; B"));
        assert!(svg.contains("&lt;run&gt;"));
    }

    #[test]
    fn legend_rows_in_canonical_order() {
        let svg = to_legend_svg(IndexKind::Vegetation);
        let positions: Vec<usize> = build_legend(IndexKind::Vegetation)
            .iter()
            .map(|e| svg.find(e.color).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(svg.contains("NDVI legend"));
        assert!(svg.contains(r#"height="120""#));
    }
}
