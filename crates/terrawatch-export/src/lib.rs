//! terrawatch-export: Pure renderers for masked layers (sans-IO)
//!
//! Realizes a [`terrawatch_core::MaskDescriptor`] as SVG markup (for the
//! browser overlay and standalone documents) or as anti-aliased PNG
//! rasters, and draws legends as SVG. Every function returns bytes or a
//! `String`; writing them anywhere is the caller's job.

pub mod raster;
pub mod svg;

pub use raster::{
    RenderError, coverage, coverage_ratio, render_mask_png, render_outline_png,
};
pub use svg::{SvgMetadata, polygon_points, to_legend_svg, to_mask_svg, to_overlay_svg};
