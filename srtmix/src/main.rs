//! srtmix - command-line front end
//!
//! Reads an SRT timeline and a directory of numbered clips, renders the mixed
//! track to MP3, and optionally writes the processing report as JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use srtmix::clips::scan_directory;
use srtmix::render::{RenderRequest, RenderService};
use srtmix_common::config::{load_with_source, OutputConfig};
use srtmix_common::events::RenderEvent;
use srtmix_common::{DurationMode, RenderConfig};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for srtmix
#[derive(Parser, Debug)]
#[command(name = "srtmix")]
#[command(about = "Assemble numbered audio clips into one track timed by an SRT file")]
#[command(version)]
struct Args {
    /// SRT timeline file
    #[arg(short, long)]
    timeline: PathBuf,

    /// Directory containing clips named by entry id (1.mp3, 2_take.wav, ...)
    #[arg(short, long)]
    clips: PathBuf,

    /// Output MP3 file [default: <timeline>_merged.mp3]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the processing report as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Pitch shift in semitones (-12 to 12)
    #[arg(long, allow_negative_numbers = true)]
    pitch: Option<i32>,

    /// Playback rate (0.5 to 2.0)
    #[arg(long)]
    rate: Option<f64>,

    /// Keep full clips or truncate them to their timeline span
    #[arg(long, value_name = "keep|truncate")]
    duration_mode: Option<DurationMode>,

    /// Trim leading and trailing silence from clips
    #[arg(long, value_name = "true|false")]
    sound_optimization: Option<bool>,

    /// Configuration file (overrides SRTMIX_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    /// Apply command-line overrides on top of the configured defaults
    fn render_config(&self, defaults: RenderConfig) -> RenderConfig {
        RenderConfig {
            pitch_shift_semitones: self.pitch.unwrap_or(defaults.pitch_shift_semitones),
            playback_rate: self.rate.unwrap_or(defaults.playback_rate),
            duration_mode: self.duration_mode.unwrap_or(defaults.duration_mode),
            sound_optimization: self.sound_optimization.unwrap_or(defaults.sound_optimization),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load the config file before tracing starts so its log level applies
    let (file_config, config_source) = load_with_source(args.config.as_deref());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("srtmix={},srtmix_common={}", file_config.logging.level, file_config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting srtmix {}", env!("CARGO_PKG_VERSION"));
    config_source.log();

    let config = args.render_config(file_config.render);
    config.validate().context("Invalid render settings")?;
    info!(
        pitch = config.pitch_shift_semitones,
        rate = config.playback_rate,
        duration_mode = ?config.duration_mode,
        sound_optimization = config.sound_optimization,
        "Render settings"
    );

    let timeline = std::fs::read_to_string(&args.timeline)
        .with_context(|| format!("Failed to read timeline {}", args.timeline.display()))?;
    let clips = scan_directory(&args.clips)
        .with_context(|| format!("Failed to load clips from {}", args.clips.display()))?;

    let output_path = output_path(&args.timeline, args.output.as_deref(), &file_config.output);
    let report_path = args
        .report
        .clone()
        .or_else(|| file_config.output.write_report.then(|| report_path_for(&output_path)));

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling render");
            interrupt.cancel();
        }
    });

    let service = RenderService::new();
    let mut handle = service.submit(
        RenderRequest {
            timeline,
            clips,
            config,
        },
        Some(cancel),
    );

    while let Some(event) = handle.next_event().await {
        log_event(&event);
    }

    match handle.wait().await {
        Ok(output) => {
            std::fs::write(&output_path, &output.bytes)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            info!(
                "Wrote {} ({} bytes)",
                output_path.display(),
                output.bytes.len()
            );

            if let Some(path) = &report_path {
                output
                    .report
                    .write_json(path)
                    .with_context(|| format!("Failed to write report {}", path.display()))?;
                info!("Wrote report {}", path.display());
            }

            if output.report.has_warnings() {
                warn!("Completed with warnings: {}", output.report.summary());
                for error in &output.report.errors {
                    warn!("  {}", error);
                }
            } else {
                info!("Completed: {}", output.report.summary());
            }
            Ok(())
        }
        Err(failure) => {
            if let Some(path) = &report_path {
                if let Err(e) = failure.report.write_json(path) {
                    warn!("Failed to write report {}: {}", path.display(), e);
                }
            }
            Err(anyhow::Error::new(failure.error).context("Render failed"))
        }
    }
}

fn log_event(event: &RenderEvent) {
    match event {
        RenderEvent::RenderStarted {
            entry_count,
            clip_count,
            ..
        } => info!("Rendering {} timeline entries from {} clips", entry_count, clip_count),
        RenderEvent::Progress {
            message, percent, ..
        } => info!("[{:5.1}%] {}", percent, message),
        RenderEvent::ClipFailed {
            source_id, message, ..
        } => warn!("Clip {} skipped: {}", source_id, message),
        RenderEvent::RenderCompleted { merged_tracks, .. } => {
            info!("Render complete, {} clips merged", merged_tracks)
        }
        RenderEvent::RenderFailed { message, .. } => warn!("Render failed: {}", message),
    }
}

/// Explicit output, else `<timeline stem>_merged.mp3` in the configured output
/// directory or next to the timeline
fn output_path(timeline: &Path, explicit: Option<&Path>, output: &OutputConfig) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let stem = timeline
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let file_name = format!("{}_merged.mp3", stem);
    match &output.directory {
        Some(dir) => dir.join(file_name),
        None => timeline.with_file_name(file_name),
    }
}

fn report_path_for(output: &Path) -> PathBuf {
    output.with_extension("report.json")
}
