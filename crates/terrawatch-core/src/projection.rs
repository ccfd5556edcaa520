//! Geographic-to-pixel projection of a locality boundary.
//!
//! Fits the polygon's bounding box into a viewport with a single uniform
//! scale, centers it, and flips the Y axis (latitude grows northward,
//! pixel rows grow downward):
//!
//! ```text
//! px = (x - min_x) * scale + offset_x
//! py = (max_y - y) * scale + offset_y
//! ```
//!
//! The bounding box is recomputed on every call. Viewports change on
//! resize, and a stale cached box is worse than one linear scan.

use geo::{BoundingRect, Coord};
use serde::{Deserialize, Serialize};

use crate::types::{DegenerateGeometry, GeoPolygon, Point, Ring, Viewport};

/// Fraction of the viewport the projected bounding box may occupy.
///
/// Always in `(0, 1]`. `1.0` fits the box edge-to-edge along its
/// constraining axis; smaller values leave a border.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Margin(f64);

impl Margin {
    /// Edge-to-edge fit.
    pub const FULL: Self = Self(1.0);

    /// The border used by the results screen (80% of the viewport).
    pub const FRAMED: Self = Self(0.8);

    /// Validate a margin factor.
    ///
    /// # Errors
    ///
    /// Returns the rejected value if it is not finite or not in `(0, 1]`.
    pub fn new(factor: f64) -> Result<Self, f64> {
        if factor.is_finite() && factor > 0.0 && factor <= 1.0 {
            Ok(Self(factor))
        } else {
            Err(factor)
        }
    }

    /// The raw factor.
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl Default for Margin {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<f64> for Margin {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).map_err(|v| format!("margin must be in (0, 1], got {v}"))
    }
}

impl From<Margin> for f64 {
    fn from(margin: Margin) -> Self {
        margin.0
    }
}

/// A polygon projected into a viewport, plus the parameters of the
/// transform so pixel positions can be mapped back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Uniform pixels-per-geographic-unit factor. Always positive.
    pub scale: f64,
    /// Horizontal centering offset in pixels.
    pub offset_x: f64,
    /// Vertical centering offset in pixels.
    pub offset_y: f64,
    /// Western edge of the source bounding box.
    pub min_x: f64,
    /// Northern edge of the source bounding box.
    pub max_y: f64,
    /// Viewport the projection was computed for.
    pub viewport: Viewport,
    /// The projected ring, one point per source coordinate, same order.
    pub ring: Ring,
}

impl Projection {
    /// Map a geographic coordinate into viewport pixels.
    #[must_use]
    pub fn project_coord(&self, coord: Coord<f64>) -> Point {
        Point::new(
            (coord.x - self.min_x).mul_add(self.scale, self.offset_x),
            (self.max_y - coord.y).mul_add(self.scale, self.offset_y),
        )
    }

    /// Map a viewport pixel back to a geographic coordinate.
    #[must_use]
    pub fn unproject(&self, point: Point) -> Coord<f64> {
        Coord {
            x: self.min_x + (point.x - self.offset_x) / self.scale,
            y: self.max_y - (point.y - self.offset_y) / self.scale,
        }
    }

    /// Pixel extent of the projected bounding box as `(width, height)`.
    #[must_use]
    pub fn extent(&self) -> (f64, f64) {
        let w = f64::from(self.viewport.width) - 2.0 * self.offset_x;
        let h = f64::from(self.viewport.height) - 2.0 * self.offset_y;
        (w, h)
    }
}

/// Project a locality boundary into a viewport.
///
/// # Errors
///
/// Returns [`DegenerateGeometry::EmptyViewport`] if the viewport has a
/// zero side, [`DegenerateGeometry::NonFinite`] if any coordinate is NaN
/// or infinite, [`DegenerateGeometry::TooFewPoints`] for fewer than three
/// distinct coordinates, [`DegenerateGeometry::ZeroExtent`] if the
/// bounding box is flat along either axis, and
/// [`DegenerateGeometry::Unscalable`] if its extent is so small or so large
/// that the scale or offsets would not be finite and positive.
pub fn project(
    polygon: &GeoPolygon,
    viewport: Viewport,
    margin: Margin,
) -> Result<Projection, DegenerateGeometry> {
    if viewport.is_empty() {
        return Err(DegenerateGeometry::EmptyViewport(viewport));
    }
    if polygon.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(DegenerateGeometry::NonFinite);
    }
    let distinct = polygon.distinct_len();
    if distinct < 3 {
        return Err(DegenerateGeometry::TooFewPoints { distinct });
    }

    let bbox = polygon
        .ring()
        .bounding_rect()
        .ok_or(DegenerateGeometry::TooFewPoints { distinct: 0 })?;
    let (bbox_w, bbox_h) = (bbox.width(), bbox.height());
    if bbox_w <= 0.0 || bbox_h <= 0.0 {
        return Err(DegenerateGeometry::ZeroExtent {
            width: bbox_w,
            height: bbox_h,
        });
    }

    let view_w = f64::from(viewport.width);
    let view_h = f64::from(viewport.height);
    let scale = (view_w / bbox_w).min(view_h / bbox_h) * margin.get();
    let offset_x = bbox_w.mul_add(-scale, view_w) / 2.0;
    let offset_y = bbox_h.mul_add(-scale, view_h) / 2.0;
    if !(scale.is_finite() && scale > 0.0 && offset_x.is_finite() && offset_y.is_finite()) {
        return Err(DegenerateGeometry::Unscalable {
            width: bbox_w,
            height: bbox_h,
        });
    }

    let mut projection = Projection {
        scale,
        offset_x,
        offset_y,
        min_x: bbox.min().x,
        max_y: bbox.max().y,
        viewport,
        ring: Ring::new(Vec::new()),
    };
    let points = polygon
        .coords()
        .map(|c| projection.project_coord(*c))
        .collect();
    projection.ring = Ring::new(points);
    Ok(projection)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn square() -> GeoPolygon {
        GeoPolygon::from_pairs(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)])
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < TOLERANCE, "{a} != {b}");
    }

    #[test]
    fn square_fills_square_viewport() {
        let p = project(&square(), Viewport::new(100, 100), Margin::FULL).unwrap();
        assert_close(p.scale, 10.0);
        assert_close(p.offset_x, 0.0);
        assert_close(p.offset_y, 0.0);
        let expected = [
            Point::new(0.0, 100.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
        ];
        for (got, want) in p.ring.points().iter().zip(expected) {
            assert_close(got.x, want.x);
            assert_close(got.y, want.y);
        }
    }

    #[test]
    fn scale_uses_constraining_axis() {
        // 20 wide, 5 tall in a 200x200 viewport: width constrains (10 vs 40).
        let poly = GeoPolygon::from_pairs(&[(0.0, 0.0), (20.0, 0.0), (20.0, 5.0), (0.0, 5.0)]);
        let p = project(&poly, Viewport::new(200, 200), Margin::FULL).unwrap();
        assert_close(p.scale, 10.0);
        assert_close(p.offset_x, 0.0);
        assert_close(p.offset_y, 75.0);
    }

    #[test]
    fn projected_box_is_centered() {
        let poly = GeoPolygon::from_pairs(&[(3.0, -2.0), (7.5, 1.0), (4.0, 6.0), (1.0, 0.5)]);
        let viewport = Viewport::new(320, 180);
        let p = project(&poly, viewport, Margin::FULL).unwrap();
        let (w, h) = (6.5 * p.scale, 8.0 * p.scale);
        assert_close(p.offset_x + w + p.offset_x, 320.0);
        assert_close(p.offset_y + h + p.offset_y, 180.0);
        assert_close(p.scale, (320.0 / 6.5_f64).min(180.0 / 8.0));
        let (ew, eh) = p.extent();
        assert_close(ew, w);
        assert_close(eh, h);
    }

    #[test]
    fn margin_shrinks_scale_and_keeps_center() {
        let full = project(&square(), Viewport::new(100, 100), Margin::FULL).unwrap();
        let framed = project(&square(), Viewport::new(100, 100), Margin::FRAMED).unwrap();
        assert_close(framed.scale, full.scale * 0.8);
        assert_close(framed.offset_x, 10.0);
        assert_close(framed.offset_y, 10.0);
    }

    #[test]
    fn y_axis_is_flipped() {
        let poly = GeoPolygon::from_pairs(&[(5.0, 1.0), (5.0, 9.0), (0.0, 4.0), (10.0, 4.0)]);
        let p = project(&poly, Viewport::new(50, 80), Margin::FULL).unwrap();
        let south = p.ring.points()[0];
        let north = p.ring.points()[1];
        assert_close(south.x, north.x);
        assert!(south.y > north.y, "south {south:?} should be below north {north:?}");
    }

    #[test]
    fn every_point_follows_the_transform() {
        let poly = GeoPolygon::from_pairs(&[(-1.5, 12.25), (-1.2, 12.9), (-0.7, 12.4), (-1.5, 12.25)]);
        let p = project(&poly, Viewport::new(400, 300), Margin::FRAMED).unwrap();
        assert_eq!(p.ring.len(), poly.len());
        for (c, px) in poly.coords().zip(p.ring.points()) {
            assert_close(px.x, (c.x - p.min_x) * p.scale + p.offset_x);
            assert_close(px.y, (p.max_y - c.y) * p.scale + p.offset_y);
        }
    }

    #[test]
    fn unproject_inverts_project() {
        let poly = GeoPolygon::from_pairs(&[(2.0, 48.0), (2.5, 48.9), (3.1, 48.2)]);
        let p = project(&poly, Viewport::new(640, 480), Margin::FRAMED).unwrap();
        for (c, px) in poly.coords().zip(p.ring.points()) {
            let back = p.unproject(*px);
            assert!((back.x - c.x).abs() < 1e-9);
            assert!((back.y - c.y).abs() < 1e-9);
        }
    }

    #[test]
    fn viewport_change_recomputes() {
        let a = project(&square(), Viewport::new(100, 100), Margin::FULL).unwrap();
        let b = project(&square(), Viewport::new(200, 100), Margin::FULL).unwrap();
        assert_close(b.scale, a.scale);
        assert_close(b.offset_x, 50.0);
        assert_eq!(b.viewport, Viewport::new(200, 100));
    }

    #[test]
    fn too_few_points_is_degenerate() {
        let poly = GeoPolygon::from_pairs(&[(0.0, 0.0), (1.0, 1.0)]);
        let err = project(&poly, Viewport::new(10, 10), Margin::FULL).unwrap_err();
        assert_eq!(err, DegenerateGeometry::TooFewPoints { distinct: 2 });
    }

    #[test]
    fn empty_polygon_is_degenerate() {
        let poly = GeoPolygon::from_pairs(&[]);
        let err = project(&poly, Viewport::new(10, 10), Margin::FULL).unwrap_err();
        assert_eq!(err, DegenerateGeometry::TooFewPoints { distinct: 0 });
    }

    #[test]
    fn identical_points_are_degenerate() {
        let poly = GeoPolygon::from_pairs(&[(4.0, 4.0), (4.0, 4.0), (4.0, 4.0), (4.0, 4.0)]);
        let err = project(&poly, Viewport::new(10, 10), Margin::FULL).unwrap_err();
        assert!(matches!(err, DegenerateGeometry::TooFewPoints { distinct: 1 }));
    }

    #[test]
    fn collinear_axis_aligned_points_have_zero_extent() {
        let poly = GeoPolygon::from_pairs(&[(0.0, 3.0), (1.0, 3.0), (2.0, 3.0)]);
        let err = project(&poly, Viewport::new(10, 10), Margin::FULL).unwrap_err();
        assert!(matches!(err, DegenerateGeometry::ZeroExtent { height, .. } if height.abs() < f64::EPSILON));
    }

    #[test]
    fn subnormal_extent_cannot_be_scaled() {
        let tiny = GeoPolygon::from_pairs(&[(0.0, 0.0), (5e-324, 0.0), (0.0, 5e-324)]);
        let err = project(&tiny, Viewport::new(100, 100), Margin::FULL).unwrap_err();
        assert!(matches!(err, DegenerateGeometry::Unscalable { .. }), "{err:?}");
    }

    #[test]
    fn overflowing_extent_cannot_be_scaled() {
        let huge = GeoPolygon::from_pairs(&[(-1e308, -1e308), (1e308, -1e308), (0.0, 1e308)]);
        let err = project(&huge, Viewport::new(100, 100), Margin::FULL).unwrap_err();
        assert!(matches!(err, DegenerateGeometry::Unscalable { .. }), "{err:?}");
    }

    #[test]
    fn non_finite_coordinate_is_rejected() {
        let poly = GeoPolygon::from_pairs(&[(0.0, 0.0), (f64::NAN, 1.0), (1.0, 1.0)]);
        let err = project(&poly, Viewport::new(10, 10), Margin::FULL).unwrap_err();
        assert_eq!(err, DegenerateGeometry::NonFinite);
    }

    #[test]
    fn empty_viewport_is_rejected() {
        let err = project(&square(), Viewport::new(0, 100), Margin::FULL).unwrap_err();
        assert_eq!(err, DegenerateGeometry::EmptyViewport(Viewport::new(0, 100)));
    }

    #[test]
    fn margin_validation() {
        assert!(Margin::new(0.0).is_err());
        assert!(Margin::new(1.01).is_err());
        assert!(Margin::new(f64::NAN).is_err());
        assert_eq!(Margin::new(0.5).map(Margin::get), Ok(0.5));
        assert_eq!(Margin::default(), Margin::FULL);
    }

    #[test]
    fn margin_deserialization_validates() {
        let ok: Margin = serde_json::from_str("0.8").unwrap();
        assert_eq!(ok, Margin::FRAMED);
        assert!(serde_json::from_str::<Margin>("1.5").is_err());
    }
}
