//! Dioxus UI components for terrawatch.
//!
//! Provides the locality form, the status banner, one raster panel per
//! index and its legend.

mod form;
mod layer;
mod legend;
mod status;

pub use form::LocalityForm;
pub use layer::LayerPanel;
pub use legend::Legend;
pub use status::StatusBanner;
