//! One raster panel: the index image, its inline clip mask and outline.
//!
//! The `<img>` references the mask by id with the CSS `mask` property; the
//! `<mask>` itself lives in an absolutely positioned inline SVG produced by
//! [`to_mask_svg`], which also draws the outline above the image. The
//! panel frame and image carry stable ids (see [`crate::dom`]) so the host
//! can measure them when a load settles or the frame is resized.

use dioxus::prelude::*;
use terrawatch_core::IndexKind;
use terrawatch_export::to_mask_svg;

use crate::dom::{panel_id, raster_id};
use crate::screen::PanelState;

/// Props for the [`LayerPanel`] component.
#[derive(Props, Clone, PartialEq)]
pub struct LayerPanelProps {
    /// Index shown in this panel.
    kind: IndexKind,
    /// What to draw.
    state: PanelState,
    /// The `<img>` finished loading.
    on_load: EventHandler<()>,
    /// The `<img>` failed to load.
    on_error: EventHandler<()>,
    /// The panel frame changed size.
    on_resize: EventHandler<()>,
}

#[component]
pub fn LayerPanel(props: LayerPanelProps) -> Element {
    let kind = props.kind;
    let title = format!("{} ({})", kind.acronym(), kind.label());
    let frame_id = panel_id(kind);
    let image_id = raster_id(kind);
    let (on_load, on_error, on_resize) = (props.on_load, props.on_error, props.on_resize);

    let (src, mask) = match &props.state {
        PanelState::Loading { url } => (Some(url.clone()), None),
        PanelState::Shown { url, mask } => (Some(url.clone()), mask.clone()),
        PanelState::Empty | PanelState::Placeholder { .. } => (None, None),
    };
    let placeholder = match &props.state {
        PanelState::Empty => Some(String::from("No analysis yet")),
        PanelState::Placeholder { message } => Some(message.clone()),
        PanelState::Loading { .. } | PanelState::Shown { .. } => None,
    };
    let image_class = if matches!(props.state, PanelState::Loading { .. }) {
        "raster loading"
    } else {
        "raster"
    };
    let image_style = mask
        .as_ref()
        .map(|m| format!("mask: url(#{0}); -webkit-mask: url(#{0});", m.id))
        .unwrap_or_default();
    let overlay = mask.as_ref().map(to_mask_svg);

    rsx! {
        section { class: "layer-panel",
            h2 { "{title}" }
            div {
                id: "{frame_id}",
                class: "raster-frame",
                onresize: move |_| on_resize.call(()),

                if let Some(src) = src {
                    img {
                        id: "{image_id}",
                        class: "{image_class}",
                        src: "{src}",
                        alt: "{title}",
                        style: "{image_style}",
                        onload: move |_| on_load.call(()),
                        onerror: move |_| on_error.call(()),
                    }
                }

                if let Some(svg) = overlay {
                    div { class: "mask-layer", dangerous_inner_html: "{svg}" }
                }

                if let Some(text) = placeholder {
                    div { class: "placeholder", "{text}" }
                }
            }
        }
    }
}
