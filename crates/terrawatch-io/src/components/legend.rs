//! Color legend next to a raster panel.

use dioxus::prelude::*;
use terrawatch_core::{IndexKind, LEGEND_LEN, LegendEntry};

/// Props for the [`Legend`] component.
#[derive(Props, Clone, PartialEq)]
pub struct LegendProps {
    /// Index the legend describes.
    kind: IndexKind,
    /// Rows in display order.
    entries: &'static [LegendEntry; LEGEND_LEN],
}

#[component]
pub fn Legend(props: LegendProps) -> Element {
    let title = format!("{} legend", props.kind.acronym());
    rsx! {
        figure { class: "legend",
            figcaption { "{title}" }
            ul {
                for entry in props.entries.iter() {
                    li { key: "{entry.range_label}", class: "legend-entry",
                        span {
                            class: "swatch",
                            style: "background-color: {entry.color}",
                        }
                        span { class: "range", "{entry.range_label}" }
                    }
                }
            }
        }
    }
}
