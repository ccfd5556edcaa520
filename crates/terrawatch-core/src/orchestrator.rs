//! Run state machine.
//!
//! [`Orchestrator`] is sans-IO: every input (a submission, a backend
//! response, a raster load result) is a method call, and every output is
//! a list of [`Effect`]s for the host to carry out. Network calls are
//! described by [`Request`] effects and their results fed back through
//! [`Orchestrator::geometry_fetched`], [`Orchestrator::products_ready`] and
//! [`Orchestrator::raster_settled`]. Screen updates are [`View`] effects.
//!
//! ```text
//! Idle ─submit─▶ FetchingGeometry ─polygon─▶ FetchingProduct ─urls─▶ Rendering ─both layers─▶ Done
//!                      │                            │
//!                      └──────── error ─────────────┴──▶ Failed
//! ```
//!
//! Each run gets a fresh [`RunId`]. Results carrying an older id are
//! dropped, so a late response from a cancelled or superseded run can
//! never touch the current one.

use std::fmt;

use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::error::{FetchError, RasterLoadError, SubmitError};
use crate::legend::{LEGEND_LEN, LegendEntry, build_legend};
use crate::mask::{MaskDescriptor, MaskedLayer, build_mask};
use crate::projection::project;
use crate::status::{Clock, Severity, StatusEvent, StatusFeed, SystemClock};
use crate::types::{Dimensions, GeoPolygon, IndexKind, RasterLayer, Viewport};
use crate::wire::{ProductUrls, cache_busted};

/// Lifecycle of the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run has started, or the last one was cancelled.
    #[default]
    Idle,
    /// Waiting for the locality boundary.
    FetchingGeometry,
    /// Waiting for the product rasters to be generated.
    FetchingProduct,
    /// Waiting for both rasters to load on the surface.
    Rendering,
    /// Both layers reached a terminal state.
    Done,
    /// A backend call failed.
    Failed,
}

impl RunState {
    /// Whether a run is in flight (and the submit control disabled).
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(
            self,
            Self::FetchingGeometry | Self::FetchingProduct | Self::Rendering
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::FetchingGeometry => "fetching geometry",
            Self::FetchingProduct => "fetching products",
            Self::Rendering => "rendering",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// Generation number of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(u64);

impl RunId {
    /// The raw generation number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Work the host must perform on the orchestrator's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Fetch the locality boundary, then call
    /// [`Orchestrator::geometry_fetched`].
    FetchBoundary {
        /// Run the result belongs to.
        run: RunId,
        /// Locality name.
        locality: String,
    },
    /// Ask the backend to generate products, then call
    /// [`Orchestrator::products_ready`].
    GenerateProducts {
        /// Run the result belongs to.
        run: RunId,
        /// Locality name.
        locality: String,
    },
    /// Load a raster into its panel, then call
    /// [`Orchestrator::raster_settled`].
    LoadRaster {
        /// Run the result belongs to.
        run: RunId,
        /// Layer to load.
        kind: IndexKind,
        /// URL to load, already cache-busted.
        url: String,
    },
}

/// A screen update.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// A new status message.
    Status(StatusEvent),
    /// Enable or disable the submit control.
    SubmitControl {
        /// Whether the control accepts input.
        enabled: bool,
    },
    /// Hide the previous run's rasters, masks and legends.
    ClearLayers,
    /// Show a loaded raster, clipped by `mask` when one could be built.
    ShowLayer {
        /// Layer being shown.
        kind: IndexKind,
        /// Raster URL.
        url: String,
        /// Clip mask, `None` when the boundary could not be projected.
        mask: Option<MaskDescriptor>,
    },
    /// Replace a layer that failed to load with a placeholder.
    ShowPlaceholder {
        /// Layer that failed.
        kind: IndexKind,
        /// Text for the placeholder.
        message: String,
    },
    /// Show the legend next to a layer.
    ShowLegend {
        /// Layer the legend belongs to.
        kind: IndexKind,
        /// Swatches in display order.
        entries: &'static [LegendEntry; LEGEND_LEN],
    },
}

/// Output of an orchestrator transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start an asynchronous operation.
    Request(Request),
    /// Update the screen.
    View(View),
}

/// Result of [`Orchestrator::submit`].
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Effects to carry out, whether or not the run started.
    pub effects: Vec<Effect>,
    /// The new run, or why none was started.
    pub accepted: Result<RunId, SubmitError>,
}

/// Where one product layer of the current run stands.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSlot {
    /// Product URLs not known yet.
    Pending,
    /// Handed to the surface, waiting for the load result.
    Loading(RasterLayer),
    /// Loaded and displayed.
    Shown(MaskedLayer),
    /// The surface could not load the raster.
    Failed {
        /// The layer that failed.
        layer: RasterLayer,
        /// Why.
        reason: RasterLoadError,
    },
}

impl LayerSlot {
    /// Whether the layer is finished (shown or failed).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Shown(_) | Self::Failed { .. })
    }

    /// The raster, once its URL is known.
    #[must_use]
    pub const fn raster(&self) -> Option<&RasterLayer> {
        match self {
            Self::Pending => None,
            Self::Loading(layer) | Self::Failed { layer, .. } => Some(layer),
            Self::Shown(masked) => Some(masked.layer()),
        }
    }

    /// The mask clipping the raster, if it is shown and masked.
    #[must_use]
    pub const fn mask(&self) -> Option<&MaskDescriptor> {
        match self {
            Self::Shown(masked) => masked.mask(),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Run {
    id: RunId,
    locality: String,
    geometry: Option<GeoPolygon>,
    layers: [LayerSlot; 2],
}

/// Drives one analysis run at a time.
#[derive(Debug)]
pub struct Orchestrator<C = SystemClock> {
    config: AnalysisConfig,
    clock: C,
    state: RunState,
    generation: u64,
    run: Option<Run>,
    feed: StatusFeed,
}

impl Orchestrator<SystemClock> {
    /// An idle orchestrator using the wall clock.
    #[must_use]
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Orchestrator<C> {
    /// An idle orchestrator reading time from `clock`.
    #[must_use]
    pub fn with_clock(config: AnalysisConfig, clock: C) -> Self {
        let feed = StatusFeed::new(config.retention);
        Self {
            config,
            clock,
            state: RunState::Idle,
            generation: 0,
            run: None,
            feed,
        }
    }

    // ───────────────────────────── Accessors ─────────────────────────────

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Whether the submit control should accept input.
    #[must_use]
    pub const fn submit_enabled(&self) -> bool {
        !self.state.is_busy()
    }

    /// The status feed.
    #[must_use]
    pub const fn feed(&self) -> &StatusFeed {
        &self.feed
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Id of the current (or most recent) run.
    #[must_use]
    pub fn current_run(&self) -> Option<RunId> {
        self.run.as_ref().map(|r| r.id)
    }

    /// Locality of the current run.
    #[must_use]
    pub fn locality(&self) -> Option<&str> {
        self.run.as_ref().map(|r| r.locality.as_str())
    }

    /// Boundary of the current run, once fetched.
    #[must_use]
    pub fn geometry(&self) -> Option<&GeoPolygon> {
        self.run.as_ref().and_then(|r| r.geometry.as_ref())
    }

    /// Slot of one product layer of the current run.
    #[must_use]
    pub fn layer(&self, kind: IndexKind) -> Option<&LayerSlot> {
        self.run.as_ref().map(|r| &r.layers[kind.index()])
    }

    // ──────────────────────────── Transitions ────────────────────────────

    /// Start a run for `locality`.
    ///
    /// An empty name (after trimming) leaves the state unchanged and
    /// reports a warning. A submission while a run is in flight is
    /// rejected without any effect.
    pub fn submit(&mut self, locality: &str) -> Submission {
        if self.state.is_busy() {
            warn!(state = %self.state, "submission rejected: run in flight");
            return Submission {
                effects: Vec::new(),
                accepted: Err(SubmitError::Busy),
            };
        }
        let locality = locality.trim();
        if locality.is_empty() {
            let status = self.status(Severity::Warning, SubmitError::EmptyLocality.to_string());
            return Submission {
                effects: vec![status, View::SubmitControl { enabled: true }.into()],
                accepted: Err(SubmitError::EmptyLocality),
            };
        }

        self.generation += 1;
        let id = RunId(self.generation);
        self.run = Some(Run {
            id,
            locality: locality.to_owned(),
            geometry: None,
            layers: [LayerSlot::Pending, LayerSlot::Pending],
        });
        self.transition(RunState::FetchingGeometry);
        info!(run = %id, locality, "analysis started");

        let status = self.status(
            Severity::Info,
            format!("Starting analysis of {locality}: fetching boundary..."),
        );
        Submission {
            effects: vec![
                View::SubmitControl { enabled: false }.into(),
                View::ClearLayers.into(),
                status,
                Effect::Request(Request::FetchBoundary {
                    run: id,
                    locality: locality.to_owned(),
                }),
            ],
            accepted: Ok(id),
        }
    }

    /// Feed back the result of a [`Request::FetchBoundary`].
    pub fn geometry_fetched(
        &mut self,
        run: RunId,
        result: Result<GeoPolygon, FetchError>,
    ) -> Vec<Effect> {
        if !self.accepts(run, RunState::FetchingGeometry, "boundary") {
            return Vec::new();
        }
        match result {
            Ok(polygon) => {
                let Some(current) = self.run.as_mut() else {
                    return Vec::new();
                };
                debug!(run = %run, points = polygon.len(), "boundary received");
                current.geometry = Some(polygon);
                let locality = current.locality.clone();
                self.transition(RunState::FetchingProduct);
                let status = self.status(
                    Severity::Info,
                    format!("Boundary found: generating satellite products for {locality}..."),
                );
                vec![
                    status,
                    Effect::Request(Request::GenerateProducts { run, locality }),
                ]
            }
            Err(err) => self.fail(&format!("Could not load the boundary: {err}")),
        }
    }

    /// Feed back the result of a [`Request::GenerateProducts`].
    pub fn products_ready(
        &mut self,
        run: RunId,
        result: Result<ProductUrls, FetchError>,
    ) -> Vec<Effect> {
        if !self.accepts(run, RunState::FetchingProduct, "products") {
            return Vec::new();
        }
        let urls = match result {
            Ok(urls) => urls,
            Err(err) => return self.fail(&format!("Could not generate products: {err}")),
        };

        let now = self.clock.now();
        let cache_bust = self.config.cache_bust;
        let Some(current) = self.run.as_mut() else {
            return Vec::new();
        };
        if urls.locality != current.locality {
            debug!(
                requested = %current.locality,
                echoed = %urls.locality,
                "server echoed a different locality name"
            );
        }

        let mut requests = Vec::with_capacity(IndexKind::ALL.len());
        for kind in IndexKind::ALL {
            let url = if cache_bust {
                cache_busted(urls.url(kind), now)
            } else {
                urls.url(kind).to_owned()
            };
            current.layers[kind.index()] = LayerSlot::Loading(RasterLayer::new(kind, url.clone()));
            requests.push(Effect::Request(Request::LoadRaster { run, kind, url }));
        }
        let locality = current.locality.clone();

        self.transition(RunState::Rendering);
        let mut effects = vec![self.status(
            Severity::Info,
            format!("Products ready: rendering {locality}..."),
        )];
        effects.extend(requests);
        effects
    }

    /// Feed back the result of a [`Request::LoadRaster`].
    ///
    /// `viewport` is the size of the layer's drawing surface now, read by
    /// the host right before the call.
    pub fn raster_settled(
        &mut self,
        run: RunId,
        kind: IndexKind,
        result: Result<Option<Dimensions>, RasterLoadError>,
        viewport: Viewport,
    ) -> Vec<Effect> {
        if !self.accepts(run, RunState::Rendering, kind.acronym()) {
            return Vec::new();
        }
        let margin = self.config.margin;
        let Some(current) = self.run.as_mut() else {
            return Vec::new();
        };
        let slot = &mut current.layers[kind.index()];
        let LayerSlot::Loading(layer) = &*slot else {
            warn!(run = %run, layer = %kind, "raster result for a layer that is not loading");
            return Vec::new();
        };
        let mut layer = layer.clone();

        let mut out = Vec::new();
        match result {
            Ok(declared) => {
                layer.declared = declared;
                let url = layer.url.clone();
                let mut masked = MaskedLayer::new(layer);
                let mut warning = None;
                let mask = match current.geometry.as_ref().map(|g| project(g, viewport, margin)) {
                    Some(Ok(projection)) => {
                        debug!(run = %run, layer = %kind, %viewport, scale = projection.scale, "layer masked");
                        Some(build_mask(&projection, kind, &self.config.outline))
                    }
                    Some(Err(err)) => {
                        warn!(run = %run, layer = %kind, %err, "showing raster unmasked");
                        warning = Some(format!(
                            "{kind}: boundary cannot be drawn ({err}), showing the full raster"
                        ));
                        None
                    }
                    None => None,
                };
                if let Some(mask) = &mask
                    && let Err(err) = masked.apply(mask.clone())
                {
                    warn!(run = %run, %err, "mask not applied");
                }
                current.layers[kind.index()] = LayerSlot::Shown(masked);

                if let Some(message) = warning {
                    out.push(self.status(Severity::Warning, message));
                }
                out.push(View::ShowLayer { kind, url, mask }.into());
                out.push(
                    View::ShowLegend {
                        kind,
                        entries: build_legend(kind),
                    }
                    .into(),
                );
            }
            Err(reason) => {
                warn!(run = %run, layer = %kind, %reason, "raster failed to load");
                *slot = LayerSlot::Failed {
                    layer,
                    reason: reason.clone(),
                };
                out.push(self.status(Severity::Warning, format!("{kind} image unavailable: {reason}")));
                out.push(
                    View::ShowPlaceholder {
                        kind,
                        message: format!("{} image unavailable", kind.acronym()),
                    }
                    .into(),
                );
            }
        }
        out.extend(self.finish_if_settled());
        out
    }

    /// Rebuild the mask of a shown layer for a resized surface.
    ///
    /// The new mask replaces the old one. Layers that are not shown, and
    /// calls for a superseded run, produce no effects.
    pub fn relayout(&mut self, run: RunId, kind: IndexKind, viewport: Viewport) -> Vec<Effect> {
        if run.get() != self.generation {
            debug!(run = %run, current = self.generation, "ignoring relayout of superseded run");
            return Vec::new();
        }
        let margin = self.config.margin;
        let outline = self.config.outline.clone();
        let Some(current) = self.run.as_mut().filter(|r| r.id == run) else {
            return Vec::new();
        };
        let Some(geometry) = current.geometry.as_ref() else {
            return Vec::new();
        };
        let LayerSlot::Shown(masked) = &mut current.layers[kind.index()] else {
            return Vec::new();
        };
        let Ok(projection) = project(geometry, viewport, margin) else {
            return Vec::new();
        };
        let mask = build_mask(&projection, kind, &outline);
        if let Err(err) = masked.apply(mask.clone()) {
            warn!(run = %run, %err, "mask not applied");
            return Vec::new();
        }
        debug!(run = %run, layer = %kind, %viewport, "layer re-masked");
        vec![
            View::ShowLayer {
                kind,
                url: masked.layer().url.clone(),
                mask: Some(mask),
            }
            .into(),
        ]
    }

    /// Abandon the run in flight.
    ///
    /// Bumps the generation so any result still on its way is ignored.
    /// Does nothing when idle or finished.
    pub fn cancel(&mut self) -> Vec<Effect> {
        if !self.state.is_busy() {
            return Vec::new();
        }
        self.generation += 1;
        info!(generation = self.generation, "analysis cancelled");
        self.transition(RunState::Idle);
        vec![
            self.status(Severity::Info, String::from("Analysis cancelled")),
            View::SubmitControl { enabled: true }.into(),
        ]
    }

    // ───────────────────────────── Internals ─────────────────────────────

    fn accepts(&self, run: RunId, expected: RunState, what: &str) -> bool {
        if run.get() != self.generation {
            warn!(run = %run, current = self.generation, what, "ignoring result of superseded run");
            return false;
        }
        if self.state != expected {
            warn!(run = %run, state = %self.state, what, "ignoring unexpected result");
            return false;
        }
        true
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = %self.state, to = %next, "transition");
        self.state = next;
    }

    fn status(&mut self, severity: Severity, message: String) -> Effect {
        let event = StatusEvent {
            timestamp: self.clock.now(),
            message,
            severity,
        };
        self.feed.push(event.clone());
        View::Status(event).into()
    }

    fn fail(&mut self, message: &str) -> Vec<Effect> {
        warn!(state = %self.state, message, "analysis failed");
        self.transition(RunState::Failed);
        vec![
            self.status(Severity::Error, message.to_owned()),
            View::SubmitControl { enabled: true }.into(),
        ]
    }

    fn finish_if_settled(&mut self) -> Vec<Effect> {
        let Some(current) = self.run.as_ref() else {
            return Vec::new();
        };
        if !current.layers.iter().all(LayerSlot::is_terminal) {
            return Vec::new();
        }
        let failed: Vec<IndexKind> = IndexKind::ALL
            .into_iter()
            .filter(|k| matches!(current.layers[k.index()], LayerSlot::Failed { .. }))
            .collect();
        let locality = current.locality.clone();

        self.transition(RunState::Done);
        info!(run = self.generation, failed = failed.len(), "analysis finished");
        let status = match failed.as_slice() {
            [] => self.status(Severity::Success, format!("Analysis of {locality} complete")),
            [kind] => self.status(
                Severity::Success,
                format!("Analysis of {locality} complete ({kind} unavailable)"),
            ),
            _ => self.status(
                Severity::Error,
                format!("No product could be displayed for {locality}"),
            ),
        };
        vec![status, View::SubmitControl { enabled: true }.into()]
    }
}

impl From<View> for Effect {
    fn from(view: View) -> Self {
        Self::View(view)
    }
}

impl From<Request> for Effect {
    fn from(request: Request) -> Self {
        Self::Request(request)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Endpoint;
    use crate::status::Timestamp;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            Timestamp(42)
        }
    }

    fn orchestrator() -> Orchestrator<FixedClock> {
        Orchestrator::with_clock(AnalysisConfig::default(), FixedClock)
    }

    fn square() -> GeoPolygon {
        GeoPolygon::from_pairs(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)])
    }

    fn urls() -> ProductUrls {
        ProductUrls {
            locality: String::from("Springfield"),
            vegetation: String::from("/v.gif"),
            water: String::from("/w.gif"),
        }
    }

    fn views(effects: &[Effect]) -> Vec<&View> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::View(v) => Some(v),
                Effect::Request(_) => None,
            })
            .collect()
    }

    fn requests(effects: &[Effect]) -> Vec<&Request> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Request(r) => Some(r),
                Effect::View(_) => None,
            })
            .collect()
    }

    fn to_rendering(o: &mut Orchestrator<FixedClock>) -> RunId {
        let run = o.submit("Springfield").accepted.unwrap();
        o.geometry_fetched(run, Ok(square()));
        o.products_ready(run, Ok(urls()));
        run
    }

    #[test]
    fn submit_disables_control_and_requests_boundary() {
        let mut o = orchestrator();
        let sub = o.submit("  Springfield ");
        let run = sub.accepted.unwrap();
        assert_eq!(o.state(), RunState::FetchingGeometry);
        assert!(!o.submit_enabled());
        assert_eq!(o.locality(), Some("Springfield"));
        assert!(views(&sub.effects).contains(&&View::SubmitControl { enabled: false }));
        assert_eq!(
            requests(&sub.effects),
            [&Request::FetchBoundary {
                run,
                locality: String::from("Springfield")
            }]
        );
    }

    #[test]
    fn empty_submission_warns_and_stays_idle() {
        let mut o = orchestrator();
        let sub = o.submit("   ");
        assert_eq!(sub.accepted, Err(SubmitError::EmptyLocality));
        assert_eq!(o.state(), RunState::Idle);
        assert!(o.submit_enabled());
        assert!(requests(&sub.effects).is_empty());
        assert_eq!(o.feed().latest().unwrap().severity, Severity::Warning);
    }

    #[test]
    fn busy_submission_has_no_effects() {
        let mut o = orchestrator();
        o.submit("Springfield");
        let sub = o.submit("Shelbyville");
        assert_eq!(sub.accepted, Err(SubmitError::Busy));
        assert!(sub.effects.is_empty());
        assert_eq!(o.locality(), Some("Springfield"));
    }

    #[test]
    fn products_are_requested_only_after_geometry() {
        let mut o = orchestrator();
        let run = o.submit("Springfield").accepted.unwrap();
        let effects = o.geometry_fetched(run, Ok(square()));
        assert_eq!(o.state(), RunState::FetchingProduct);
        assert!(matches!(
            requests(&effects).as_slice(),
            [Request::GenerateProducts { .. }]
        ));
    }

    #[test]
    fn boundary_failure_fails_run() {
        let mut o = orchestrator();
        let run = o.submit("Atlantis").accepted.unwrap();
        let effects = o.geometry_fetched(
            run,
            Err(FetchError::Status {
                endpoint: Endpoint::Boundary,
                status: 404,
                detail: None,
            }),
        );
        assert_eq!(o.state(), RunState::Failed);
        assert!(o.submit_enabled());
        assert!(requests(&effects).is_empty());
        let latest = o.feed().latest().unwrap();
        assert_eq!(latest.severity, Severity::Error);
        assert!(latest.message.contains("404"));
    }

    #[test]
    fn raster_urls_are_cache_busted() {
        let mut o = orchestrator();
        let run = o.submit("Springfield").accepted.unwrap();
        o.geometry_fetched(run, Ok(square()));
        let effects = o.products_ready(run, Ok(urls()));
        let loads: Vec<_> = requests(&effects)
            .into_iter()
            .filter_map(|r| match r {
                Request::LoadRaster { url, .. } => Some(url.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(loads, ["/v.gif?t=42", "/w.gif?t=42"]);
    }

    #[test]
    fn cache_busting_can_be_disabled() {
        let config = AnalysisConfig {
            cache_bust: false,
            ..AnalysisConfig::default()
        };
        let mut o = Orchestrator::with_clock(config, FixedClock);
        to_rendering(&mut o);
        let raster = o.layer(IndexKind::Water).unwrap().raster().unwrap();
        assert_eq!(raster.url, "/w.gif");
    }

    #[test]
    fn layers_settle_in_any_order() {
        let mut o = orchestrator();
        let run = to_rendering(&mut o);
        let vp = Viewport::new(100, 100);
        o.raster_settled(run, IndexKind::Water, Ok(None), vp);
        assert_eq!(o.state(), RunState::Rendering);
        let effects = o.raster_settled(run, IndexKind::Vegetation, Ok(None), vp);
        assert_eq!(o.state(), RunState::Done);
        assert!(views(&effects).contains(&&View::SubmitControl { enabled: true }));
        assert_eq!(o.feed().latest().unwrap().severity, Severity::Success);
    }

    #[test]
    fn shown_layer_emits_mask_and_legend() {
        let mut o = orchestrator();
        let run = to_rendering(&mut o);
        let effects = o.raster_settled(
            run,
            IndexKind::Vegetation,
            Ok(Some(Dimensions { width: 512, height: 512 })),
            Viewport::new(100, 100),
        );
        let v = views(&effects);
        assert!(v.iter().any(|view| matches!(
            view,
            View::ShowLayer { kind: IndexKind::Vegetation, mask: Some(_), .. }
        )));
        assert!(v.iter().any(|view| matches!(
            view,
            View::ShowLegend { kind: IndexKind::Vegetation, .. }
        )));
        let slot = o.layer(IndexKind::Vegetation).unwrap();
        assert_eq!(
            slot.raster().unwrap().declared,
            Some(Dimensions { width: 512, height: 512 })
        );
        assert!(slot.mask().is_some());
    }

    #[test]
    fn duplicate_raster_result_is_ignored() {
        let mut o = orchestrator();
        let run = to_rendering(&mut o);
        let vp = Viewport::new(100, 100);
        o.raster_settled(run, IndexKind::Water, Ok(None), vp);
        assert!(o.raster_settled(run, IndexKind::Water, Ok(None), vp).is_empty());
    }

    #[test]
    fn stale_results_are_dropped() {
        let mut o = orchestrator();
        let first = o.submit("Springfield").accepted.unwrap();
        o.cancel();
        let second = o.submit("Shelbyville").accepted.unwrap();
        assert_ne!(first, second);
        assert!(o.geometry_fetched(first, Ok(square())).is_empty());
        assert_eq!(o.state(), RunState::FetchingGeometry);
        assert!(o.geometry().is_none());
    }

    #[test]
    fn cancel_when_idle_is_a_no_op() {
        let mut o = orchestrator();
        assert!(o.cancel().is_empty());
        assert_eq!(o.state(), RunState::Idle);
    }

    #[test]
    fn relayout_replaces_mask() {
        let mut o = orchestrator();
        let run = to_rendering(&mut o);
        o.raster_settled(run, IndexKind::Water, Ok(None), Viewport::new(100, 100));
        let before = o.layer(IndexKind::Water).unwrap().mask().unwrap().clone();
        let effects = o.relayout(run, IndexKind::Water, Viewport::new(200, 100));
        assert_eq!(effects.len(), 1);
        let after = o.layer(IndexKind::Water).unwrap().mask().unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.viewport, Viewport::new(200, 100));
        assert_ne!(after.clip, before.clip);
    }

    #[test]
    fn relayout_after_cancel_is_ignored() {
        let mut o = orchestrator();
        let run = to_rendering(&mut o);
        o.raster_settled(run, IndexKind::Water, Ok(None), Viewport::new(100, 100));
        assert!(!o.cancel().is_empty());
        assert!(o.relayout(run, IndexKind::Water, Viewport::new(200, 100)).is_empty());
        let mask = o.layer(IndexKind::Water).unwrap().mask().unwrap();
        assert_eq!(mask.viewport, Viewport::new(100, 100));
    }

    #[test]
    fn relayout_of_unshown_layer_is_a_no_op() {
        let mut o = orchestrator();
        let run = to_rendering(&mut o);
        assert!(o.relayout(run, IndexKind::Vegetation, Viewport::new(50, 50)).is_empty());
    }
}
