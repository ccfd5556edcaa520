//! terrawatch-core: Locality analysis visualization core (sans-IO).
//!
//! Turns a locality boundary into pixel-space clip masks over the
//! vegetation and water index rasters, builds their legends, and
//! sequences the two backend calls of an analysis run:
//! boundary lookup -> product generation -> raster rendering.
//!
//! This crate performs **no I/O**. Backend calls and raster loads are
//! [`Request`] effects carried out by the host (browser fetch in
//! `terrawatch-io`, HTTP client in `terrawatch-cli`), or by the
//! [`driver`] through the [`AnalysisBackend`] and [`RenderSurface`]
//! traits.

pub mod config;
pub mod driver;
pub mod error;
pub mod legend;
pub mod mask;
pub mod orchestrator;
pub mod projection;
pub mod status;
pub mod types;
pub mod wire;

pub use config::{AnalysisConfig, EndpointConfig};
pub use driver::{AnalysisBackend, RenderSurface, abortable_analysis, run_analysis};
pub use error::{ConfigError, Endpoint, FetchError, RasterLoadError, SubmitError};
pub use legend::{LEGEND_LEN, LegendEntry, bucket_for, build_legend};
pub use mask::{MaskBindingError, MaskDescriptor, MaskId, MaskedLayer, OutlineStyle, build_mask};
pub use orchestrator::{
    Effect, LayerSlot, Orchestrator, Request, RunId, RunState, Submission, View,
};
pub use projection::{Margin, Projection, project};
pub use status::{Clock, Retention, Severity, StatusEvent, StatusFeed, SystemClock, Timestamp};
pub use types::{
    DegenerateGeometry, Dimensions, GeoPolygon, IndexKind, Point, RasterLayer, Ring, Viewport,
};
pub use wire::{
    ProductUrls, WireError, cache_busted, interpret, parse_boundary, parse_error_detail,
    parse_products,
};
