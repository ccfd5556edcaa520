//! Response bodies of the two backend endpoints.
//!
//! Parsing is shared by every backend (browser fetch, native HTTP, test
//! doubles) so they all accept exactly the same documents.

use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};

use crate::error::{Endpoint, FetchError};
use crate::status::Timestamp;
use crate::types::{GeoPolygon, IndexKind};

/// A response body that could not be turned into domain values.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Not JSON, or JSON of the wrong shape.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// The feature has a `null` geometry.
    #[error("feature has no geometry")]
    MissingGeometry,

    /// The geometry has no outer ring.
    #[error("geometry has no outer ring")]
    MissingRing,

    /// A position has fewer than two components.
    #[error("position {index} has {len} component(s), expected at least 2")]
    ShortPosition {
        /// Index of the position in the outer ring.
        index: usize,
        /// Components found.
        len: usize,
    },

    /// A position holds NaN or an infinity.
    #[error("position {index} is not finite")]
    NonFinite {
        /// Index of the position in the outer ring.
        index: usize,
    },
}

impl WireError {
    /// Attribute this error to the endpoint whose body failed to parse.
    #[must_use]
    pub fn at(self, endpoint: Endpoint) -> FetchError {
        FetchError::Parse {
            endpoint,
            reason: self.to_string(),
        }
    }
}

// --- Boundary -----------------------------------------------------------

type Position = Vec<f64>;

#[derive(Deserialize)]
struct FeatureBody {
    geometry: Option<GeometryBody>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum GeometryBody {
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

impl GeometryBody {
    fn into_outer_ring(self) -> Option<Vec<Position>> {
        match self {
            Self::Polygon { coordinates } => coordinates.into_iter().next(),
            Self::MultiPolygon { coordinates } => {
                coordinates.into_iter().next()?.into_iter().next()
            }
        }
    }
}

/// Parse a `GeoJSON` Feature into the locality's outer ring.
///
/// Accepts `Polygon` and `MultiPolygon` geometries; for the latter the
/// first polygon is used. Holes are dropped. Altitude components are
/// ignored.
///
/// # Errors
///
/// Returns [`WireError`] if the body is not a Feature with a polygonal
/// geometry, or if any outer-ring position is short or non-finite.
pub fn parse_boundary(body: &str) -> Result<GeoPolygon, WireError> {
    let feature: FeatureBody = serde_json::from_str(body)?;
    let ring = feature
        .geometry
        .ok_or(WireError::MissingGeometry)?
        .into_outer_ring()
        .ok_or(WireError::MissingRing)?;

    let coords = ring
        .iter()
        .enumerate()
        .map(|(index, position)| match position.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
            [_, _, ..] => Err(WireError::NonFinite { index }),
            short => Err(WireError::ShortPosition {
                index,
                len: short.len(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GeoPolygon::new(LineString::new(coords)))
}

// --- Products -----------------------------------------------------------

/// Raster URLs returned by the product endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUrls {
    /// Locality the products were generated for, as echoed by the server.
    pub locality: String,
    /// Vegetation index raster.
    #[serde(rename = "ndvi_gif", alias = "vegetationRasterUrl")]
    pub vegetation: String,
    /// Water index raster.
    #[serde(rename = "ndwi_gif", alias = "waterRasterUrl")]
    pub water: String,
}

impl ProductUrls {
    /// The raster URL for `kind`.
    #[must_use]
    pub fn url(&self, kind: IndexKind) -> &str {
        match kind {
            IndexKind::Vegetation => &self.vegetation,
            IndexKind::Water => &self.water,
        }
    }
}

/// Parse a successful product response.
///
/// # Errors
///
/// Returns [`WireError::Json`] if a field is missing or mistyped.
pub fn parse_products(body: &str) -> Result<ProductUrls, WireError> {
    Ok(serde_json::from_str(body)?)
}

// --- Errors -------------------------------------------------------------

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Extract the `error` message from a non-2xx body, if it has one.
#[must_use]
pub fn parse_error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|e| !e.trim().is_empty())
}

/// Turn a raw HTTP exchange into a domain value.
///
/// Non-2xx statuses become [`FetchError::Status`] carrying the body's
/// `error` message when present; 2xx bodies go through `parse`.
///
/// # Errors
///
/// Returns [`FetchError::Status`] for non-2xx responses and
/// [`FetchError::Parse`] if `parse` rejects the body.
pub fn interpret<T>(
    endpoint: Endpoint,
    status: u16,
    body: &str,
    parse: impl FnOnce(&str) -> Result<T, WireError>,
) -> Result<T, FetchError> {
    if !(200..300).contains(&status) {
        return Err(FetchError::Status {
            endpoint,
            status,
            detail: parse_error_detail(body),
        });
    }
    parse(body).map_err(|e| e.at(endpoint))
}

// --- Cache busting ------------------------------------------------------

/// Append a `t=<millis>` query parameter so the surface refetches a raster
/// the server may have regenerated under the same path.
///
/// Existing query strings are extended and fragments are preserved.
#[must_use]
pub fn cache_busted(url: &str, at: Timestamp) -> String {
    let (base, fragment) = url.split_once('#').map_or((url, None), |(b, f)| (b, Some(f)));
    let sep = if base.contains('?') { '&' } else { '?' };
    let mut out = format!("{base}{sep}t={}", at.millis());
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}
