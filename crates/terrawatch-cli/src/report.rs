//! Files written for a finished run and the summary printed about it.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use terrawatch_core::{
    Clock, IndexKind, LayerSlot, MaskDescriptor, Orchestrator, RunState, StatusEvent, Viewport,
    build_legend,
};
use terrawatch_export::{
    RenderError, SvgMetadata, coverage_ratio, render_mask_png, render_outline_png, to_legend_svg,
    to_overlay_svg,
};

/// Outcome of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerOutcome {
    /// The run ended before the layer was requested.
    Pending,
    /// Still loading when the run stopped.
    Loading,
    /// Downloaded; clipped when `masked` is set.
    Shown,
    /// The raster could not be downloaded.
    Failed,
}

/// Summary of one layer.
#[derive(Debug, Clone, Serialize)]
pub struct LayerReport {
    pub index: &'static str,
    pub outcome: LayerOutcome,
    pub url: Option<String>,
    pub masked: bool,
    pub coverage_ratio: Option<f64>,
    pub error: Option<String>,
    pub legend: Vec<&'static str>,
    pub files: Vec<PathBuf>,
}

/// Summary of the whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub locality: String,
    pub state: RunState,
    pub status: Option<StatusEvent>,
    pub layers: Vec<LayerReport>,
}

/// One file to write.
pub struct Artifact {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

fn masked_artifacts(
    out_dir: &Path,
    kind: IndexKind,
    mask: &MaskDescriptor,
) -> Result<Vec<Artifact>, RenderError> {
    let slug = kind.slug();
    Ok(vec![
        Artifact {
            path: out_dir.join(format!("{slug}-mask.png")),
            contents: render_mask_png(mask)?,
        },
        Artifact {
            path: out_dir.join(format!("{slug}-outline.png")),
            contents: render_outline_png(mask)?,
        },
    ])
}

/// Summarise `orchestrator`'s last run and collect the files describing it.
///
/// Every shown layer gets an overlay document and a legend; masked layers
/// additionally get their mask and outline rasters.
///
/// # Errors
///
/// Returns [`RenderError`] if a mask cannot be rasterised.
pub fn collect<C: Clock>(
    orchestrator: &Orchestrator<C>,
    viewport: Viewport,
    out_dir: &Path,
) -> Result<(RunReport, Vec<Artifact>), RenderError> {
    let locality = orchestrator.locality().unwrap_or_default().to_owned();
    let mut layers = Vec::with_capacity(IndexKind::ALL.len());
    let mut artifacts = Vec::new();

    for kind in IndexKind::ALL {
        let slot = orchestrator.layer(kind);
        let mut report = LayerReport {
            index: kind.acronym(),
            outcome: LayerOutcome::Pending,
            url: slot.and_then(LayerSlot::raster).map(|r| r.url.clone()),
            masked: slot.and_then(LayerSlot::mask).is_some(),
            coverage_ratio: None,
            error: None,
            legend: Vec::new(),
            files: Vec::new(),
        };

        match slot {
            None | Some(LayerSlot::Pending) => {}
            Some(LayerSlot::Loading(_)) => report.outcome = LayerOutcome::Loading,
            Some(LayerSlot::Failed { reason, .. }) => {
                report.outcome = LayerOutcome::Failed;
                report.error = Some(reason.0.clone());
            }
            Some(LayerSlot::Shown(masked)) => {
                report.outcome = LayerOutcome::Shown;
                report.legend = build_legend(kind).iter().map(|e| e.range_label).collect();

                let title = format!("{locality} {}", kind.acronym());
                let overlay = to_overlay_svg(
                    &masked.layer().url,
                    viewport,
                    masked.mask(),
                    &SvgMetadata {
                        title: Some(&title),
                        description: Some(kind.label()),
                    },
                );
                let slug = kind.slug();
                let mut files = vec![
                    Artifact {
                        path: out_dir.join(format!("{slug}.svg")),
                        contents: overlay.into_bytes(),
                    },
                    Artifact {
                        path: out_dir.join(format!("{slug}-legend.svg")),
                        contents: to_legend_svg(kind).into_bytes(),
                    },
                ];
                if let Some(mask) = masked.mask() {
                    report.coverage_ratio = Some(coverage_ratio(mask)?);
                    files.extend(masked_artifacts(out_dir, kind, mask)?);
                }
                report.files = files.iter().map(|a| a.path.clone()).collect();
                artifacts.extend(files);
            }
        }
        layers.push(report);
    }

    let report = RunReport {
        locality,
        state: orchestrator.state(),
        status: orchestrator.feed().latest().cloned(),
        layers,
    };
    Ok((report, artifacts))
}

impl RunReport {
    /// Human-readable rendering.
    #[must_use]
    pub fn human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Locality: {}", self.locality);
        let _ = writeln!(out, "State:    {}", self.state);
        if let Some(ref status) = self.status {
            let _ = writeln!(out, "Status:   [{}] {}", status.severity, status.message);
        }
        for layer in &self.layers {
            let _ = writeln!(out);
            let _ = write!(out, "{}: {:?}", layer.index, layer.outcome);
            if let Some(ratio) = layer.coverage_ratio {
                let _ = write!(out, ", {:.1}% of the frame inside the boundary", ratio * 100.0);
            } else if layer.outcome == LayerOutcome::Shown {
                let _ = write!(out, ", unclipped");
            }
            let _ = writeln!(out);
            if let Some(ref url) = layer.url {
                let _ = writeln!(out, "  raster  {url}");
            }
            if let Some(ref err) = layer.error {
                let _ = writeln!(out, "  error   {err}");
            }
            for file in &layer.files {
                let _ = writeln!(out, "  wrote   {}", file.display());
            }
        }
        out
    }
}
