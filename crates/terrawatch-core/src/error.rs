//! Errors raised while driving an analysis run.
//!
//! Geometry problems live with the geometry types
//! ([`crate::types::DegenerateGeometry`]) and mask binding with the masks
//! ([`crate::mask::MaskBindingError`]).

use std::fmt;

/// One of the two backend endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /get_locality_geojson`
    Boundary,
    /// `POST /process`
    Products,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Boundary => "GET /get_locality_geojson",
            Self::Products => "POST /process",
        })
    }
}

/// A backend call that did not produce a usable body.
///
/// Every variant aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-2xx status.
    #[error("{endpoint} returned HTTP {status}{}", detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Status {
        /// Endpoint that failed.
        endpoint: Endpoint,
        /// HTTP status code.
        status: u16,
        /// The server's `error` message, if the body carried one.
        detail: Option<String>,
    },

    /// The request never produced a response.
    #[error("{endpoint} failed: {reason}")]
    Transport {
        /// Endpoint that failed.
        endpoint: Endpoint,
        /// Transport-level description.
        reason: String,
    },

    /// The response body did not have the expected shape.
    #[error("{endpoint} returned an unreadable body: {reason}")]
    Parse {
        /// Endpoint that failed.
        endpoint: Endpoint,
        /// What was wrong with the body.
        reason: String,
    },
}

impl FetchError {
    /// The endpoint this error came from.
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        match self {
            Self::Status { endpoint, .. }
            | Self::Transport { endpoint, .. }
            | Self::Parse { endpoint, .. } => *endpoint,
        }
    }

    /// The HTTP status code, for [`Self::Status`] errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Parse { .. } => None,
        }
    }
}

/// A product raster could not be loaded by the drawing surface.
///
/// Local to one layer; the sibling layer is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("raster failed to load: {0}")]
pub struct RasterLoadError(pub String);

/// A submission that was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// The locality name was empty after trimming.
    #[error("please enter a locality name")]
    EmptyLocality,

    /// A run is already in flight.
    #[error("an analysis is already running")]
    Busy,
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Outline stroke width must be finite and non-negative.
    #[error("outline width must be finite and >= 0, got {0}")]
    OutlineWidth(f64),

    /// Outline opacity must be in `[0, 1]`.
    #[error("outline opacity must be in [0, 1], got {0}")]
    OutlineOpacity(f64),

    /// Outline color must not be empty.
    #[error("outline color must not be empty")]
    OutlineColor,

    /// History retention needs room for at least one event.
    #[error("history retention capacity must be at least 1")]
    HistoryCapacity,

    /// The backend base URL could not be parsed.
    #[error("invalid base URL {url:?}: {reason}")]
    BaseUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        reason: String,
    },
}
