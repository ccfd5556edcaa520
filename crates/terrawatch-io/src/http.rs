//! Backend client over the browser `fetch` API.
//!
//! Requests go to the page's own origin unless the [`EndpointConfig`]
//! names another base URL. Response classification (status, `error`
//! detail, body parsing) is shared with every other backend through
//! [`terrawatch_core::interpret`].

use std::fmt;

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, Request, RequestInit, Response};

use terrawatch_core::{
    AnalysisBackend, Endpoint, EndpointConfig, FetchError, GeoPolygon, ProductUrls, interpret,
    parse_boundary, parse_products,
};

/// A browser API call failed.
#[derive(Debug, thiserror::Error)]
#[error("browser API error: {0}")]
pub struct JsError(pub String);

impl From<JsValue> for JsError {
    fn from(value: JsValue) -> Self {
        Self(format!("{value:?}"))
    }
}

fn transport(endpoint: Endpoint, err: impl fmt::Display) -> FetchError {
    FetchError::Transport {
        endpoint,
        reason: err.to_string(),
    }
}

/// Send a request and read the whole body as text.
async fn send(request: &Request) -> Result<(u16, String), JsError> {
    let window = web_sys::window().ok_or_else(|| JsError("no global window".into()))?;
    let response: Response = JsFuture::from(window.fetch_with_request(request))
        .await?
        .dyn_into()?;
    let body = JsFuture::from(response.text()?).await?;
    Ok((response.status(), body.as_string().unwrap_or_default()))
}

fn product_request(url: &str, locality: &str) -> Result<Request, JsError> {
    let form = FormData::new()?;
    form.append_with_str("locality", locality)?;
    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&form);
    Ok(Request::new_with_str_and_init(url, &init)?)
}

/// [`AnalysisBackend`] for the web application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserBackend {
    endpoints: EndpointConfig,
}

impl BrowserBackend {
    /// A backend for the given endpoints.
    #[must_use]
    pub const fn new(endpoints: EndpointConfig) -> Self {
        Self { endpoints }
    }
}

#[allow(clippy::future_not_send)]
impl AnalysisBackend for BrowserBackend {
    async fn fetch_boundary(&self, locality: &str) -> Result<GeoPolygon, FetchError> {
        let endpoint = Endpoint::Boundary;
        let url = self
            .endpoints
            .boundary_url(locality)
            .map_err(|e| transport(endpoint, e))?;
        let request = Request::new_with_str(&url)
            .map_err(|e| transport(endpoint, JsError::from(e)))?;
        let (status, body) = send(&request).await.map_err(|e| transport(endpoint, e))?;
        interpret(endpoint, status, &body, parse_boundary)
    }

    async fn request_products(&self, locality: &str) -> Result<ProductUrls, FetchError> {
        let endpoint = Endpoint::Products;
        let url = self
            .endpoints
            .process_url()
            .map_err(|e| transport(endpoint, e))?;
        let request = product_request(&url, locality).map_err(|e| transport(endpoint, e))?;
        let (status, body) = send(&request).await.map_err(|e| transport(endpoint, e))?;
        let mut urls = interpret(endpoint, status, &body, parse_products)?;
        urls.vegetation = self
            .endpoints
            .resolve(&urls.vegetation)
            .map_err(|e| transport(endpoint, e))?;
        urls.water = self
            .endpoints
            .resolve(&urls.water)
            .map_err(|e| transport(endpoint, e))?;
        Ok(urls)
    }
}
