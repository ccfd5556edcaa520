use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use terrawatch_core::{
    AnalysisBackend, AnalysisConfig, Effect, EndpointConfig, IndexKind, Margin, Orchestrator,
    RasterLoadError, Request, StatusEvent, View, Viewport,
};
use terrawatch_io::dom::{element_viewport, image_dimensions, panel_id, raster_id};
use terrawatch_io::{BrowserBackend, LayerPanel, Legend, LocalityForm, PanelState, Screen, StatusBanner};

/// How long Info and Warning messages stay up unless superseded.
const STATUS_DISMISS_MS: u32 = 5_000;

fn main() {
    dioxus::launch(app);
}

fn current_viewport(kind: IndexKind) -> Viewport {
    element_viewport(&panel_id(kind)).unwrap_or(Viewport::new(0, 0))
}

/// Hide `event` after [`STATUS_DISMISS_MS`] if nothing replaced it.
fn schedule_dismiss(event: StatusEvent, mut screen: Signal<Screen>) {
    spawn(async move {
        TimeoutFuture::new(STATUS_DISMISS_MS).await;
        screen.write().dismiss(&event);
    });
}

/// Carry out orchestrator effects: apply views to the screen and start
/// backend requests, feeding each result back into the orchestrator.
///
/// Raster loads are performed by the `<img>` elements themselves; the
/// panels report back through [`settle`].
fn dispatch(
    effects: Vec<Effect>,
    mut orchestrator: Signal<Orchestrator>,
    mut screen: Signal<Screen>,
    backend: Signal<BrowserBackend>,
) {
    for effect in effects {
        match effect {
            Effect::View(view) => {
                if let View::Status(ref event) = view {
                    terrawatch_io::console::mirror(event);
                    if event.severity.is_transient() {
                        schedule_dismiss(event.clone(), screen);
                    }
                }
                screen.write().apply(&view);
            }
            Effect::Request(Request::FetchBoundary { run, locality }) => {
                let client = backend.peek().clone();
                spawn(async move {
                    let result = client.fetch_boundary(&locality).await;
                    let next = orchestrator.write().geometry_fetched(run, result);
                    dispatch(next, orchestrator, screen, backend);
                });
            }
            Effect::Request(Request::GenerateProducts { run, locality }) => {
                let client = backend.peek().clone();
                spawn(async move {
                    let result = client.request_products(&locality).await;
                    let next = orchestrator.write().products_ready(run, result);
                    dispatch(next, orchestrator, screen, backend);
                });
            }
            Effect::Request(Request::LoadRaster { run, kind, url }) => {
                screen.write().begin_load(run, kind, &url);
            }
        }
    }
}

/// Report a panel's `<img>` load outcome, measuring the panel now.
fn settle(
    kind: IndexKind,
    loaded: bool,
    mut orchestrator: Signal<Orchestrator>,
    screen: Signal<Screen>,
    backend: Signal<BrowserBackend>,
) {
    let Some(run) = screen.peek().run else {
        return;
    };
    let outcome = if loaded {
        Ok(image_dimensions(&raster_id(kind)))
    } else {
        Err(RasterLoadError(String::from("the browser could not load the image")))
    };
    let effects = orchestrator
        .write()
        .raster_settled(run, kind, outcome, current_viewport(kind));
    dispatch(effects, orchestrator, screen, backend);
}

/// Re-project a shown layer after its panel changed size.
fn relayout(
    kind: IndexKind,
    mut orchestrator: Signal<Orchestrator>,
    screen: Signal<Screen>,
    backend: Signal<BrowserBackend>,
) {
    let current = screen.peek();
    let Some(run) = current.run else {
        return;
    };
    if !matches!(current.panel(kind), PanelState::Shown { .. }) {
        return;
    }
    drop(current);
    let effects = orchestrator
        .write()
        .relayout(run, kind, current_viewport(kind));
    dispatch(effects, orchestrator, screen, backend);
}

/// Root application component.
fn app() -> Element {
    let mut orchestrator = use_signal(|| {
        Orchestrator::new(AnalysisConfig {
            margin: Margin::FRAMED,
            ..AnalysisConfig::default()
        })
    });
    let screen = use_signal(Screen::default);
    let backend = use_signal(|| BrowserBackend::new(EndpointConfig::default()));

    use_drop(move || {
        if let Ok(mut orch) = orchestrator.try_write() {
            orch.cancel();
        }
    });

    let on_submit = move |name: String| {
        let submission = orchestrator.write().submit(&name);
        dispatch(submission.effects, orchestrator, screen, backend);
    };

    let view = screen.read();

    rsx! {
        style { dangerous_inner_html: include_str!("../assets/app.css") }

        header {
            h1 { "terrawatch" }
            p { "Vegetation (NDVI) and water (NDWI) index maps of a locality" }
        }

        main {
            LocalityForm {
                enabled: view.submit_enabled,
                on_submit: on_submit,
            }

            StatusBanner { event: view.status.clone() }

            div { class: "layers",
                for kind in IndexKind::ALL {
                    div { key: "{kind.slug()}",
                        LayerPanel {
                            kind,
                            state: view.panel(kind).clone(),
                            on_load: move |()| settle(kind, true, orchestrator, screen, backend),
                            on_error: move |()| settle(kind, false, orchestrator, screen, backend),
                            on_resize: move |()| relayout(kind, orchestrator, screen, backend),
                        }
                        if let Some(entries) = view.legend(kind) {
                            Legend { kind, entries }
                        }
                    }
                }
            }
        }
    }
}
