//! terrawatch-cli: run one locality analysis against a live backend.
//!
//! Looks up the locality boundary, asks the backend for its vegetation and
//! water index rasters, downloads them, and writes per layer:
//!
//! - `<index>.svg`: the raster clipped to the boundary, with its outline
//! - `<index>-legend.svg`: the color legend
//! - `<index>-mask.png` and `<index>-outline.png`: the clip mask and outline
//!   as rasters (only when the boundary could be projected)
//!
//! # Usage
//!
//! ```text
//! cargo run --bin terrawatch-cli -- --base-url http://localhost:5000 Katana
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod http;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{info, warn};

use terrawatch_core::{
    AnalysisConfig, EndpointConfig, Margin, Orchestrator, OutlineStyle, Retention, Viewport,
    abortable_analysis,
};

use crate::http::{FetchSurface, HttpBackend};

/// Vegetation and water index maps of a locality, clipped to its boundary.
#[derive(Parser)]
#[command(name = "terrawatch-cli", version)]
struct Cli {
    /// Locality to analyse.
    locality: String,

    /// Backend base URL, e.g. `http://localhost:5000`.
    #[arg(long)]
    base_url: String,

    /// Size of the frame each raster is drawn into, as `WIDTHxHEIGHT`.
    #[arg(long, default_value = "640x480", value_parser = parse_viewport)]
    viewport: Viewport,

    /// Fraction of the frame the boundary may occupy, in (0, 1].
    #[arg(long, default_value_t = Margin::FRAMED.get())]
    margin: f64,

    /// Outline color (`#rgb` or `#rrggbb`).
    #[arg(long, default_value_t = OutlineStyle::default().color)]
    outline_color: String,

    /// Outline stroke width in pixels.
    #[arg(long, default_value_t = OutlineStyle::default().width)]
    outline_width: f64,

    /// Outline opacity, in [0, 1].
    #[arg(long, default_value_t = OutlineStyle::default().opacity)]
    outline_opacity: f64,

    /// Keep this many status messages instead of only the latest.
    #[arg(long)]
    history: Option<usize>,

    /// Do not append `t=<millis>` to raster URLs.
    #[arg(long)]
    no_cache_bust: bool,

    /// Full analysis config as a JSON string.
    ///
    /// When provided, the margin, outline, history and cache-busting flags
    /// are ignored. The JSON must be a valid `AnalysisConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Directory for the exported files.
    #[arg(long, default_value = "terrawatch-out")]
    out_dir: PathBuf,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Print the run summary as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,
}

/// Parse `WIDTHxHEIGHT`.
fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let dim = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid dimension {v:?}: {e}"))
    };
    let viewport = Viewport::new(dim(w)?, dim(h)?);
    if viewport.is_empty() {
        return Err(format!("viewport must not be empty, got {s:?}"));
    }
    Ok(viewport)
}

/// Build an [`AnalysisConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual flags are ignored.
fn config_from_cli(cli: &Cli) -> anyhow::Result<AnalysisConfig> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).context("parsing --config-json")?
    } else {
        let Ok(margin) = Margin::new(cli.margin) else {
            bail!("--margin must be in (0, 1], got {}", cli.margin);
        };
        AnalysisConfig {
            margin,
            outline: OutlineStyle {
                color: cli.outline_color.clone(),
                width: cli.outline_width,
                opacity: cli.outline_opacity,
            },
            retention: cli
                .history
                .map_or(Retention::Latest, |capacity| Retention::History { capacity }),
            cache_bust: !cli.no_cache_bust,
        }
    };
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = config_from_cli(&cli)?;
    let endpoints = EndpointConfig::with_base(cli.base_url.clone());
    endpoints.process_url().context("checking --base-url")?;

    let client = http::client(Duration::from_secs(cli.timeout)).context("building HTTP client")?;
    let backend = HttpBackend::new(client.clone(), endpoints);
    let surface = FetchSurface::new(client, cli.viewport);
    let mut orchestrator = Orchestrator::new(config);

    info!(locality = %cli.locality, viewport = %cli.viewport, "starting analysis");
    let outcome = {
        let (analysis, abort) =
            abortable_analysis(&mut orchestrator, &backend, &surface, &cli.locality);
        let mut analysis = std::pin::pin!(analysis);
        tokio::select! {
            outcome = analysis.as_mut() => outcome,
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted, cancelling the run");
                abort.abort();
                analysis.await
            }
        }
    };
    let state = match outcome {
        Ok(result) => result?,
        Err(aborted) => {
            orchestrator.cancel();
            bail!("analysis {aborted}");
        }
    };
    info!(%state, views = surface.views().len(), "analysis finished");

    let (summary, artifacts) =
        report::collect(&orchestrator, cli.viewport, &cli.out_dir).context("rendering masks")?;
    if !artifacts.is_empty() {
        tokio::fs::create_dir_all(&cli.out_dir)
            .await
            .with_context(|| format!("creating {}", cli.out_dir.display()))?;
    }
    for artifact in &artifacts {
        tokio::fs::write(&artifact.path, &artifact.contents)
            .await
            .with_context(|| format!("writing {}", artifact.path.display()))?;
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.human());
    }

    let shown = summary
        .layers
        .iter()
        .any(|l| l.outcome == report::LayerOutcome::Shown);
    Ok(if shown {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["terrawatch-cli", "--base-url", "http://localhost:5000"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn viewport_parsing() {
        assert_eq!(parse_viewport("640x480"), Ok(Viewport::new(640, 480)));
        assert_eq!(parse_viewport("800X600"), Ok(Viewport::new(800, 600)));
        assert!(parse_viewport("640").is_err());
        assert!(parse_viewport("0x480").is_err());
        assert!(parse_viewport("ax480").is_err());
    }

    #[test]
    fn defaults_are_framed_analysis_config() {
        let parsed = cli(&["Katana"]);
        assert_eq!(parsed.viewport, Viewport::new(640, 480));
        let expected = AnalysisConfig {
            margin: Margin::FRAMED,
            ..AnalysisConfig::default()
        };
        assert_eq!(config_from_cli(&parsed).unwrap(), expected);
    }

    #[test]
    fn flags_build_config() {
        let parsed = cli(&[
            "--margin",
            "1",
            "--outline-color",
            "#000",
            "--history",
            "10",
            "--no-cache-bust",
            "Katana",
        ]);
        let config = config_from_cli(&parsed).unwrap();
        assert_eq!(config.margin, Margin::FULL);
        assert_eq!(config.outline.color, "#000");
        assert_eq!(config.retention, Retention::History { capacity: 10 });
        assert!(!config.cache_bust);
    }

    #[test]
    fn config_json_overrides_flags() {
        let parsed = cli(&[
            "--margin",
            "0.5",
            "--config-json",
            r#"{"cache_bust": false, "outline": {"width": 1.5}}"#,
            "Katana",
        ]);
        let config = config_from_cli(&parsed).unwrap();
        assert_eq!(config.margin, Margin::FULL);
        assert!((config.outline.width - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.outline.color, "#ffffff");
        assert!(!config.cache_bust);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(config_from_cli(&cli(&["--margin", "1.5", "Katana"])).is_err());
        assert!(config_from_cli(&cli(&["--outline-opacity", "2", "Katana"])).is_err());
        assert!(config_from_cli(&cli(&["--history", "0", "Katana"])).is_err());
        assert!(config_from_cli(&cli(&["--config-json", "{", "Katana"])).is_err());
    }
}
