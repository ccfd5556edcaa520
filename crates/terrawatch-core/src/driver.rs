//! Async runner for the [`Orchestrator`].
//!
//! Hosts that can await futures implement [`AnalysisBackend`] and
//! [`RenderSurface`] and call [`run_analysis`]. Hosts with their own event
//! loop (the Dioxus app) feed the orchestrator directly instead.

use std::collections::VecDeque;
use std::future::Future;

use futures::StreamExt;
use futures::future::{AbortHandle, Abortable, Aborted};
use futures::stream::FuturesUnordered;
use tracing::debug;

use crate::error::{FetchError, RasterLoadError, SubmitError};
use crate::orchestrator::{Effect, Orchestrator, Request, RunState, View};
use crate::status::Clock;
use crate::types::{Dimensions, GeoPolygon, IndexKind, Viewport};
use crate::wire::ProductUrls;

/// The two backend endpoints.
pub trait AnalysisBackend {
    /// Look up the boundary of `locality`.
    fn fetch_boundary(
        &self,
        locality: &str,
    ) -> impl Future<Output = Result<GeoPolygon, FetchError>>;

    /// Generate the index products for `locality`.
    fn request_products(
        &self,
        locality: &str,
    ) -> impl Future<Output = Result<ProductUrls, FetchError>>;
}

/// Where rasters, masks, legends and status messages are shown.
pub trait RenderSurface {
    /// Current size of the panel that shows `kind`.
    fn viewport(&self, kind: IndexKind) -> Viewport;

    /// Load a raster into the panel for `kind`.
    ///
    /// Resolves with the raster's declared size when the surface knows it.
    fn load_raster(
        &self,
        kind: IndexKind,
        url: &str,
    ) -> impl Future<Output = Result<Option<Dimensions>, RasterLoadError>>;

    /// Apply a screen update.
    fn show(&self, view: &View);
}

/// Run one analysis to completion.
///
/// Raster loads run concurrently; their results are fed back one at a
/// time in completion order, and each panel's viewport is read right
/// before its result is handled.
///
/// # Errors
///
/// Returns the [`SubmitError`] if the submission was rejected. Views the
/// rejection produced (the empty-name warning) are still shown.
#[allow(clippy::future_not_send)]
pub async fn run_analysis<C, B, S>(
    orchestrator: &mut Orchestrator<C>,
    backend: &B,
    surface: &S,
    locality: &str,
) -> Result<RunState, SubmitError>
where
    C: Clock,
    B: AnalysisBackend,
    S: RenderSurface,
{
    let submission = orchestrator.submit(locality);
    let mut queue: VecDeque<Effect> = submission.effects.into();
    if let Err(err) = submission.accepted {
        for effect in queue {
            if let Effect::View(view) = effect {
                surface.show(&view);
            }
        }
        return Err(err);
    }

    let mut loads = FuturesUnordered::new();
    loop {
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::View(view) => surface.show(&view),
                Effect::Request(Request::FetchBoundary { run, locality }) => {
                    let result = backend.fetch_boundary(&locality).await;
                    queue.extend(orchestrator.geometry_fetched(run, result));
                }
                Effect::Request(Request::GenerateProducts { run, locality }) => {
                    let result = backend.request_products(&locality).await;
                    queue.extend(orchestrator.products_ready(run, result));
                }
                Effect::Request(Request::LoadRaster { run, kind, url }) => {
                    debug!(run = %run, layer = %kind, url = %url, "loading raster");
                    loads.push(async move {
                        let result = surface.load_raster(kind, &url).await;
                        (run, kind, result)
                    });
                }
            }
        }

        let Some((run, kind, result)) = loads.next().await else {
            break;
        };
        let viewport = surface.viewport(kind);
        queue.extend(orchestrator.raster_settled(run, kind, result, viewport));
    }

    Ok(orchestrator.state())
}

/// [`run_analysis`] wrapped so it can be stopped from outside.
///
/// Aborting drops the run's pending futures. The orchestrator is still
/// mid-run afterwards; call [`Orchestrator::cancel`] once the future has
/// resolved to `Err(Aborted)` to bump the generation and re-enable input.
pub fn abortable_analysis<'a, C, B, S>(
    orchestrator: &'a mut Orchestrator<C>,
    backend: &'a B,
    surface: &'a S,
    locality: &'a str,
) -> (
    impl Future<Output = Result<Result<RunState, SubmitError>, Aborted>>,
    AbortHandle,
)
where
    C: Clock,
    B: AnalysisBackend,
    S: RenderSurface,
{
    let (handle, registration) = AbortHandle::new_pair();
    let run = Abortable::new(
        run_analysis(orchestrator, backend, surface, locality),
        registration,
    );
    (run, handle)
}
