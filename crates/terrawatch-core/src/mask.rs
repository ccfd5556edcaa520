//! Polygon clip masks for raster layers.
//!
//! A [`MaskDescriptor`] describes a full-viewport opaque region with the
//! projected locality cut out, plus a stroked outline of the same ring
//! drawn above the clipped raster. The outline is presentation only: it
//! never changes which raster pixels are visible.
//!
//! Descriptors are renderer-agnostic. An SVG `<mask>`, a canvas clip path,
//! or a rasterized alpha mask can all realize one (see `terrawatch-export`).

use std::fmt;

use geo::{Coord, Intersects, LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::projection::Projection;
use crate::types::{IndexKind, Point, RasterLayer, Ring, Viewport};

/// Identifier of a mask, derived from the layer it binds to.
///
/// Rebuilding the mask for the same layer yields the same id, so a host
/// replaces the previous mask instead of accumulating new ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaskId(String);

impl MaskId {
    /// The id of the mask bound to `kind`'s layer.
    #[must_use]
    pub fn for_layer(kind: IndexKind) -> Self {
        Self(format!("mask-{}", kind.slug()))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stroke of the visible locality border.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineStyle {
    /// CSS color of the stroke.
    pub color: String,
    /// Stroke width in pixels.
    pub width: f64,
    /// Stroke opacity in `[0, 1]`.
    pub opacity: f64,
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self {
            color: String::from("#ffffff"),
            width: 3.0,
            opacity: 0.8,
        }
    }
}

/// Clip region and outline for exactly one raster layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskDescriptor {
    /// Stable id derived from the bound layer.
    pub id: MaskId,
    /// The layer this mask belongs to.
    pub layer: IndexKind,
    /// Viewport the clip ring was projected into.
    pub viewport: Viewport,
    /// Pixel ring whose interior stays visible.
    pub clip: Ring,
    /// Border drawn over the clipped raster.
    pub outline: OutlineStyle,
}

impl MaskDescriptor {
    /// The clip ring as a `geo` polygon in pixel coordinates.
    #[must_use]
    pub fn clip_polygon(&self) -> Polygon<f64> {
        let exterior: LineString<f64> = self
            .clip
            .points()
            .iter()
            .map(|p| Coord { x: p.x, y: p.y })
            .collect();
        Polygon::new(exterior, Vec::new())
    }

    /// Whether the raster pixel at `point` is visible through the mask.
    ///
    /// Points on the ring itself count as visible.
    #[must_use]
    pub fn reveals(&self, point: Point) -> bool {
        self.clip_polygon()
            .intersects(&geo::Point::new(point.x, point.y))
    }
}

/// Build the mask for `layer` from a projected boundary.
///
/// Pure: identical inputs give identical descriptors, including the id.
#[must_use = "returns the mask descriptor"]
pub fn build_mask(projection: &Projection, layer: IndexKind, outline: &OutlineStyle) -> MaskDescriptor {
    MaskDescriptor {
        id: MaskId::for_layer(layer),
        layer,
        viewport: projection.viewport,
        clip: projection.ring.clone(),
        outline: outline.clone(),
    }
}

/// A mask was applied to a layer it was not built for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("mask {mask} was built for the {expected} layer, not {actual}")]
pub struct MaskBindingError {
    /// Id of the rejected mask.
    pub mask: MaskId,
    /// Layer the mask was built for.
    pub expected: IndexKind,
    /// Layer it was applied to.
    pub actual: IndexKind,
}

/// A raster layer together with the mask currently clipping it.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedLayer {
    layer: RasterLayer,
    mask: Option<MaskDescriptor>,
}

impl MaskedLayer {
    /// An unclipped layer.
    #[must_use]
    pub const fn new(layer: RasterLayer) -> Self {
        Self { layer, mask: None }
    }

    /// The raster layer.
    #[must_use]
    pub const fn layer(&self) -> &RasterLayer {
        &self.layer
    }

    /// The mask currently applied, if any.
    #[must_use]
    pub const fn mask(&self) -> Option<&MaskDescriptor> {
        self.mask.as_ref()
    }

    /// Bind `mask` to this layer, replacing any previous mask in one step.
    ///
    /// Returns the mask that was replaced.
    ///
    /// # Errors
    ///
    /// Returns [`MaskBindingError`] if `mask` was built for another layer;
    /// the current mask is left in place.
    pub fn apply(&mut self, mask: MaskDescriptor) -> Result<Option<MaskDescriptor>, MaskBindingError> {
        if mask.layer != self.layer.kind {
            return Err(MaskBindingError {
                mask: mask.id,
                expected: mask.layer,
                actual: self.layer.kind,
            });
        }
        Ok(self.mask.replace(mask))
    }
}
