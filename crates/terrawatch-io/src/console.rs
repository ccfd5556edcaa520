//! Mirror status messages to the browser developer console.

use terrawatch_core::{Severity, StatusEvent};
use wasm_bindgen::JsValue;
use web_sys::console;

/// Log `event` at the console level matching its severity.
pub fn mirror(event: &StatusEvent) {
    let line = JsValue::from_str(&format!("[terrawatch] {}: {}", event.severity, event.message));
    match event.severity {
        Severity::Info | Severity::Success => console::log_1(&line),
        Severity::Warning => console::warn_1(&line),
        Severity::Error => console::error_1(&line),
    }
}
