//! DOM queries: panel sizes, raster dimensions, local time.
//!
//! All functions require a browser environment and return `None` when
//! the element is missing (e.g. the panel was unmounted).

use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlImageElement;

use terrawatch_core::{Dimensions, IndexKind, Timestamp, Viewport};

/// Element id of the frame a layer's raster is drawn in.
#[must_use]
pub fn panel_id(kind: IndexKind) -> String {
    format!("panel-{}", kind.slug())
}

/// Element id of a layer's `<img>`.
#[must_use]
pub fn raster_id(kind: IndexKind) -> String {
    format!("raster-{}", kind.slug())
}

fn element(id: &str) -> Option<web_sys::Element> {
    web_sys::window()?.document()?.get_element_by_id(id)
}

/// Current client size of the element `id`, read fresh on every call.
#[must_use]
pub fn element_viewport(id: &str) -> Option<Viewport> {
    let el = element(id)?;
    let width = u32::try_from(el.client_width()).ok()?;
    let height = u32::try_from(el.client_height()).ok()?;
    Some(Viewport::new(width, height))
}

/// Intrinsic size of a loaded `<img>`, if the browser reports one.
#[must_use]
pub fn image_dimensions(id: &str) -> Option<Dimensions> {
    let img = element(id)?.dyn_into::<HtmlImageElement>().ok()?;
    let (width, height) = (img.natural_width(), img.natural_height());
    (width > 0 && height > 0).then_some(Dimensions { width, height })
}

/// A timestamp as local wall-clock time, e.g. `"14:03:27"`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_time(at: Timestamp) -> String {
    let date = js_sys::Date::new(&JsValue::from_f64(at.millis() as f64));
    date.to_locale_time_string("default").into()
}
