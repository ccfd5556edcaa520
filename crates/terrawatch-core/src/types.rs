//! Shared types for the terrawatch visualization core.

use std::fmt;

use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};

/// A 2D point in pixel coordinates of a drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A closed ring of pixel-space points, in the order they were projected.
///
/// The ring is implicitly closed: renderers connect the last point back
/// to the first. A trailing point equal to the first (as `GeoJSON` rings
/// carry) is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring(Vec<Point>);

impl Ring {
    /// Create a ring from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the ring has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the ring.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }
}

/// Raster dimensions in pixels, as declared by the raster itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Size of the drawing surface a raster is displayed in, in device pixels.
///
/// Read at projection time. The host may resize between calls, so
/// callers re-query rather than cache it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in device pixels.
    pub width: u32,
    /// Height in device pixels.
    pub height: u32,
}

impl Viewport {
    /// Create a viewport of the given size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The outer boundary ring of a locality in geographic coordinates.
///
/// `x` is longitude and `y` is latitude. Holes are not represented.
/// The polygon is stored exactly as received; validity for projection
/// is checked by [`crate::projection::project`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPolygon(LineString<f64>);

impl GeoPolygon {
    /// Wrap an outer ring.
    #[must_use]
    pub const fn new(ring: LineString<f64>) -> Self {
        Self(ring)
    }

    /// Build a polygon from `(x, y)` pairs.
    #[must_use]
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        Self(pairs.iter().map(|&(x, y)| Coord { x, y }).collect())
    }

    /// The outer ring.
    #[must_use]
    pub const fn ring(&self) -> &LineString<f64> {
        &self.0
    }

    /// Number of coordinates in the ring, including any closing duplicate.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.0.len()
    }

    /// Returns `true` if the ring has no coordinates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.0.is_empty()
    }

    /// Iterate over the ring's coordinates in order.
    pub fn coords(&self) -> impl Iterator<Item = &Coord<f64>> {
        self.0.coords()
    }

    /// Number of distinct coordinates in the ring.
    ///
    /// A closing coordinate equal to the first is not counted twice.
    #[must_use]
    pub fn distinct_len(&self) -> usize {
        let mut seen: Vec<Coord<f64>> = Vec::with_capacity(self.len());
        for c in self.coords() {
            if !seen.contains(c) {
                seen.push(*c);
            }
        }
        seen.len()
    }
}

/// Which spectral index product a raster carries.
///
/// A closed set: every match over it is exhaustive, so adding a product
/// kind is a compile-time change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndexKind {
    /// Normalized difference vegetation index (NDVI).
    Vegetation,
    /// Normalized difference water index (NDWI).
    Water,
}

impl IndexKind {
    /// Both kinds, in display order.
    pub const ALL: [Self; 2] = [Self::Vegetation, Self::Water];

    /// Short acronym shown in headings.
    #[must_use]
    pub const fn acronym(self) -> &'static str {
        match self {
            Self::Vegetation => "NDVI",
            Self::Water => "NDWI",
        }
    }

    /// Lowercase identifier, used for element ids, mask ids, and file names.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Vegetation => "ndvi",
            Self::Water => "ndwi",
        }
    }

    /// Human-readable product name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Vegetation => "Vegetation index",
            Self::Water => "Water index",
        }
    }

    /// Position of this kind in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Vegetation => 0,
            Self::Water => 1,
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.acronym())
    }
}

/// One product raster of the current run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterLayer {
    /// Which product this raster shows.
    pub kind: IndexKind,
    /// URL handed to the drawing surface (cache-busted when enabled).
    pub url: String,
    /// Dimensions declared by the raster once loaded, if the surface
    /// reports them.
    pub declared: Option<Dimensions>,
}

impl RasterLayer {
    /// A layer that has not been loaded yet.
    #[must_use]
    pub const fn new(kind: IndexKind, url: String) -> Self {
        Self {
            kind,
            url,
            declared: None,
        }
    }
}

/// A polygon that cannot be projected without dividing by zero or
/// producing non-finite output.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DegenerateGeometry {
    /// Fewer than three distinct coordinates.
    #[error("polygon has {distinct} distinct points, at least 3 are required")]
    TooFewPoints {
        /// Distinct coordinates found.
        distinct: usize,
    },

    /// The bounding box is flat along at least one axis.
    #[error("polygon bounding box has zero extent ({width} x {height})")]
    ZeroExtent {
        /// Bounding box width in geographic units.
        width: f64,
        /// Bounding box height in geographic units.
        height: f64,
    },

    /// The bounding box is too small or too large to scale into the
    /// viewport with finite arithmetic.
    #[error("polygon bounding box ({width} x {height}) cannot be scaled to the viewport")]
    Unscalable {
        /// Bounding box width in geographic units.
        width: f64,
        /// Bounding box height in geographic units.
        height: f64,
    },

    /// A coordinate is NaN or infinite.
    #[error("polygon contains a non-finite coordinate")]
    NonFinite,

    /// The target viewport has no drawable area.
    #[error("viewport {0} has no drawable area")]
    EmptyViewport(Viewport),
}
