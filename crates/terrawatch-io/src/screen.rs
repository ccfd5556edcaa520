//! What the page currently shows, as plain data.
//!
//! [`Screen`] folds the orchestrator's [`View`] updates into the state the
//! components render from. It has no DOM dependency, so the folding is
//! tested natively.

use terrawatch_core::{
    IndexKind, LEGEND_LEN, LegendEntry, MaskDescriptor, RunId, StatusEvent, View,
};

/// Contents of one raster panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PanelState {
    /// Nothing requested yet, or cleared for a new run.
    #[default]
    Empty,
    /// The raster is being fetched by the `<img>` element.
    Loading {
        /// Cache-busted raster URL.
        url: String,
    },
    /// The raster is loaded and (if possible) clipped.
    Shown {
        /// Raster URL.
        url: String,
        /// Clip mask, absent when the boundary could not be projected.
        mask: Option<MaskDescriptor>,
    },
    /// The raster failed to load.
    Placeholder {
        /// Text shown in place of the raster.
        message: String,
    },
}

type LegendRows = &'static [LegendEntry; LEGEND_LEN];

/// Everything the page renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    /// Latest status message, `None` once dismissed.
    pub status: Option<StatusEvent>,
    /// Whether the locality form accepts submissions.
    pub submit_enabled: bool,
    /// Run whose rasters the panels are loading or showing.
    pub run: Option<RunId>,
    panels: [PanelState; 2],
    legends: [Option<LegendRows>; 2],
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            status: None,
            submit_enabled: true,
            run: None,
            panels: Default::default(),
            legends: [None; 2],
        }
    }
}

impl Screen {
    /// Panel contents for `kind`.
    #[must_use]
    pub const fn panel(&self, kind: IndexKind) -> &PanelState {
        &self.panels[kind.index()]
    }

    /// Legend rows for `kind`, once its raster is shown.
    #[must_use]
    pub const fn legend(&self, kind: IndexKind) -> Option<LegendRows> {
        self.legends[kind.index()]
    }

    /// Fold one view update into the screen.
    pub fn apply(&mut self, view: &View) {
        match view {
            View::Status(event) => self.status = Some(event.clone()),
            View::SubmitControl { enabled } => self.submit_enabled = *enabled,
            View::ClearLayers => {
                self.run = None;
                self.panels = Default::default();
                self.legends = [None; 2];
            }
            View::ShowLayer { kind, url, mask } => {
                self.panels[kind.index()] = PanelState::Shown {
                    url: url.clone(),
                    mask: mask.clone(),
                };
            }
            View::ShowPlaceholder { kind, message } => {
                self.panels[kind.index()] = PanelState::Placeholder {
                    message: message.clone(),
                };
            }
            View::ShowLegend { kind, entries } => self.legends[kind.index()] = Some(*entries),
        }
    }

    /// Point the panel for `kind` at `url`; the `<img>` element reports
    /// back once it settles.
    pub fn begin_load(&mut self, run: RunId, kind: IndexKind, url: &str) {
        self.run = Some(run);
        self.panels[kind.index()] = PanelState::Loading {
            url: url.to_owned(),
        };
    }

    /// Hide `event` if it is still the one displayed. Returns whether it
    /// was hidden; a newer message is left alone.
    pub fn dismiss(&mut self, event: &StatusEvent) -> bool {
        if self.status.as_ref() == Some(event) {
            self.status = None;
            true
        } else {
            false
        }
    }
}
