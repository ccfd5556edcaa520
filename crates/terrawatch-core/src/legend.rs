//! Value legends for the index products.
//!
//! Each product kind has five fixed buckets over the index value, listed
//! in ascending threshold order. The order is canonical: renderers show
//! entries as returned and never sort them.

use serde::Serialize;

use crate::types::IndexKind;

/// One swatch of a legend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LegendEntry {
    /// Label of the value range, e.g. `"0.1 – 0.2"`.
    pub range_label: &'static str,
    /// CSS hex color of the swatch.
    pub color: &'static str,
    /// Inclusive lower bound, `None` for the open-ended first bucket.
    #[serde(skip)]
    pub lower: Option<f64>,
    /// Exclusive upper bound, `None` for the open-ended last bucket.
    #[serde(skip)]
    pub upper: Option<f64>,
}

impl LegendEntry {
    const fn new(
        range_label: &'static str,
        color: &'static str,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Self {
        Self {
            range_label,
            color,
            lower,
            upper,
        }
    }

    /// Whether `value` falls in this bucket's half-open range.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lower.is_none_or(|lo| value >= lo) && self.upper.is_none_or(|hi| value < hi)
    }
}

/// Number of buckets in every legend.
pub const LEGEND_LEN: usize = 5;

const VEGETATION: [LegendEntry; LEGEND_LEN] = [
    LegendEntry::new("< 0", "#7b3294", None, Some(0.0)),
    LegendEntry::new("0 – 0.1", "#f1e51d", Some(0.0), Some(0.1)),
    LegendEntry::new("0.1 – 0.2", "#a6dba0", Some(0.1), Some(0.2)),
    LegendEntry::new("0.2 – 0.3", "#2ca25f", Some(0.2), Some(0.3)),
    LegendEntry::new("> 0.3", "#006d2c", Some(0.3), None),
];

const WATER: [LegendEntry; LEGEND_LEN] = [
    LegendEntry::new("< 0", "#ffffff", None, Some(0.0)),
    LegendEntry::new("0 – 0.1", "#c6dbef", Some(0.0), Some(0.1)),
    LegendEntry::new("0.1 – 0.2", "#6baed6", Some(0.1), Some(0.2)),
    LegendEntry::new("0.2 – 0.3", "#2171b5", Some(0.2), Some(0.3)),
    LegendEntry::new("> 0.3", "#08306b", Some(0.3), None),
];

/// The legend for a product kind, in ascending threshold order.
#[must_use]
pub const fn build_legend(kind: IndexKind) -> &'static [LegendEntry; LEGEND_LEN] {
    match kind {
        IndexKind::Vegetation => &VEGETATION,
        IndexKind::Water => &WATER,
    }
}

/// The legend entry an index value falls into.
///
/// Returns `None` only for NaN.
#[must_use]
pub fn bucket_for(kind: IndexKind, value: f64) -> Option<&'static LegendEntry> {
    build_legend(kind).iter().find(|e| e.contains(value))
}
