//! Integration test: parse a boundary, project it, and render every export
//! of the resulting mask.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use geo::Area;
use terrawatch_core::{
    IndexKind, Margin, OutlineStyle, Viewport, build_mask, parse_boundary, project,
};
use terrawatch_export::{
    SvgMetadata, coverage_ratio, render_mask_png, render_outline_png, to_legend_svg,
    to_mask_svg, to_overlay_svg,
};

/// A lopsided pentagon in lon/lat, closed as `GeoJSON` rings are.
const KATANA: &str = r#"{
    "type": "Feature",
    "properties": {"NAME_3": "Katana"},
    "geometry": {"type": "MultiPolygon", "coordinates": [[[
        [28.80, -2.20], [28.95, -2.18], [29.02, -2.30], [28.90, -2.42], [28.78, -2.33], [28.80, -2.20]
    ]]]}
}"#;

#[test]
fn katana_renders_consistently_across_formats() {
    let polygon = parse_boundary(KATANA).expect("boundary should parse");
    let viewport = Viewport::new(640, 480);
    let projection = project(&polygon, viewport, Margin::FRAMED).expect("projectable");
    let mask = build_mask(&projection, IndexKind::Water, &OutlineStyle::default());

    // Raster coverage agrees with the exact polygon area.
    let exact = mask.clip_polygon().unsigned_area() / (640.0 * 480.0);
    let rendered = coverage_ratio(&mask).unwrap();
    eprintln!("exact coverage {exact:.4}, rendered {rendered:.4}");
    assert!((exact - rendered).abs() < 0.005);

    // Inline mask and standalone overlay both carry the same ring.
    let ring_attr = format!(
        r#"points="{}""#,
        terrawatch_export::polygon_points(&mask.clip)
    );
    let inline = to_mask_svg(&mask);
    assert!(inline.contains(&ring_attr));

    let overlay = to_overlay_svg(
        "/static/outputs/Katana_gifs/NDWI_spatial.gif?t=1",
        viewport,
        Some(&mask),
        &SvgMetadata {
            title: Some("Katana NDWI"),
            description: Some("generated in a test"),
        },
    );
    assert_eq!(overlay.matches(&ring_attr).count(), 2);
    assert!(overlay.contains(r#"mask="url(#mask-ndwi)""#));

    assert!(!render_mask_png(&mask).unwrap().is_empty());
    assert!(!render_outline_png(&mask).unwrap().is_empty());

    let legend = to_legend_svg(IndexKind::Water);
    for label in ["0 – 0.1", "0.1 – 0.2", "0.2 – 0.3"] {
        assert!(legend.contains(label), "missing {label}");
    }
}
