//! terrawatch-io: Browser I/O and Dioxus component library.
//!
//! Talks to the analysis backend through the browser's `fetch`, reads
//! panel sizes and raster dimensions from the DOM, mirrors status
//! messages to the developer console, and provides the UI components of
//! the terrawatch web application.

pub mod components;
pub mod console;
pub mod dom;
pub mod http;
pub mod screen;

pub use components::{LayerPanel, Legend, LocalityForm, StatusBanner};
pub use http::BrowserBackend;
pub use screen::{PanelState, Screen};
