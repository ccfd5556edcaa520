//! Native backend and drawing surface over `reqwest`.

use std::cell::RefCell;
use std::fmt;
use std::io::Cursor;
use std::time::Duration;

use image::ImageReader;
use tracing::{error, info, warn};

use terrawatch_core::{
    AnalysisBackend, Dimensions, Endpoint, EndpointConfig, FetchError, GeoPolygon, IndexKind,
    ProductUrls, RasterLoadError, RenderSurface, Severity, View, Viewport, interpret,
    parse_boundary, parse_products,
};

fn transport(endpoint: Endpoint, err: impl fmt::Display) -> FetchError {
    FetchError::Transport {
        endpoint,
        reason: err.to_string(),
    }
}

/// Build the shared HTTP client.
///
/// # Errors
///
/// Returns the `reqwest` error if the TLS backend cannot be initialised.
pub fn client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("terrawatch-cli/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// [`AnalysisBackend`] talking to a remote server.
pub struct HttpBackend {
    client: reqwest::Client,
    endpoints: EndpointConfig,
}

impl HttpBackend {
    pub const fn new(client: reqwest::Client, endpoints: EndpointConfig) -> Self {
        Self { client, endpoints }
    }

    async fn exchange(
        &self,
        endpoint: Endpoint,
        request: reqwest::RequestBuilder,
    ) -> Result<(u16, String), FetchError> {
        let response = request.send().await.map_err(|e| transport(endpoint, e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport(endpoint, e))?;
        Ok((status, body))
    }
}

impl AnalysisBackend for HttpBackend {
    async fn fetch_boundary(&self, locality: &str) -> Result<GeoPolygon, FetchError> {
        let endpoint = Endpoint::Boundary;
        let url = self
            .endpoints
            .boundary_url(locality)
            .map_err(|e| transport(endpoint, e))?;
        let (status, body) = self.exchange(endpoint, self.client.get(url)).await?;
        interpret(endpoint, status, &body, parse_boundary)
    }

    async fn request_products(&self, locality: &str) -> Result<ProductUrls, FetchError> {
        let endpoint = Endpoint::Products;
        let url = self
            .endpoints
            .process_url()
            .map_err(|e| transport(endpoint, e))?;
        let request = self.client.post(url).form(&[("locality", locality)]);
        let (status, body) = self.exchange(endpoint, request).await?;
        let mut urls = interpret(endpoint, status, &body, parse_products)?;
        for raster in [&mut urls.vegetation, &mut urls.water] {
            *raster = self
                .endpoints
                .resolve(raster)
                .map_err(|e| transport(endpoint, e))?;
        }
        Ok(urls)
    }
}

/// Width and height of an encoded raster, read from its header only.
///
/// Returns `None` for formats that cannot be recognised or headers that
/// are cut short.
pub fn sniff_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()?;
    Some(Dimensions { width, height })
}

/// A headless surface: rasters are downloaded to check they exist, views
/// are logged and recorded.
pub struct FetchSurface {
    client: reqwest::Client,
    viewport: Viewport,
    views: RefCell<Vec<View>>,
}

impl FetchSurface {
    pub const fn new(client: reqwest::Client, viewport: Viewport) -> Self {
        Self {
            client,
            viewport,
            views: RefCell::new(Vec::new()),
        }
    }

    /// Every view shown so far, in order.
    pub fn views(&self) -> Vec<View> {
        self.views.borrow().clone()
    }
}

impl RenderSurface for FetchSurface {
    fn viewport(&self, _kind: IndexKind) -> Viewport {
        self.viewport
    }

    async fn load_raster(
        &self,
        kind: IndexKind,
        url: &str,
    ) -> Result<Option<Dimensions>, RasterLoadError> {
        let failed = |e: reqwest::Error| RasterLoadError(e.to_string());
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(failed)?;
        let bytes = response.bytes().await.map_err(failed)?;
        let declared = sniff_dimensions(&bytes);
        info!(layer = %kind, bytes = bytes.len(), ?declared, "raster downloaded");
        Ok(declared)
    }

    fn show(&self, view: &View) {
        if let View::Status(event) = view {
            match event.severity {
                Severity::Info | Severity::Success => info!("{}", event.message),
                Severity::Warning => warn!("{}", event.message),
                Severity::Error => error!("{}", event.message),
            }
        }
        self.views.borrow_mut().push(view.clone());
    }
}
