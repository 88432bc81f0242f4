//! Render configuration and TOML configuration loading
//!
//! Configuration sources, highest priority first:
//! 1. Command-line arguments (applied by the binary on top of the loaded file)
//! 2. Config file named on the command line
//! 3. `SRTMIX_CONFIG` environment variable
//! 4. `<config_dir>/srtmix/config.toml`
//! 5. Built-in defaults
//!
//! A missing or unreadable config file is never fatal: a warning is logged and
//! the built-in defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SRTMIX_CONFIG";

/// Pitch shift bounds in semitones (one octave each way)
pub const MIN_PITCH_SHIFT: i32 = -12;
pub const MAX_PITCH_SHIFT: i32 = 12;

/// Playback rate bounds
pub const MIN_PLAYBACK_RATE: f64 = 0.5;
pub const MAX_PLAYBACK_RATE: f64 = 2.0;

/// How a clip's length relates to its timeline entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationMode {
    /// Keep the full processed clip, even if it runs past the entry's end time
    #[default]
    Keep,
    /// Cut the processed clip to the entry's span
    Truncate,
}

impl std::str::FromStr for DurationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(DurationMode::Keep),
            "truncate" => Ok(DurationMode::Truncate),
            other => Err(Error::InvalidInput(format!(
                "Unknown duration mode '{}' (expected 'keep' or 'truncate')",
                other
            ))),
        }
    }
}

/// Per-render signal processing configuration.
///
/// Immutable for the duration of a render. Defaults match the settings the
/// tool ships with: +2 semitones, 1.2x speed, keep clip length, trim silence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Pitch shift in semitones, `[-12, 12]`
    pub pitch_shift_semitones: i32,

    /// Playback rate (tempo) multiplier, `[0.5, 2.0]`
    pub playback_rate: f64,

    /// Whether clips are cut to their entry span
    pub duration_mode: DurationMode,

    /// Trim leading and trailing silence from each clip
    pub sound_optimization: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pitch_shift_semitones: 2,
            playback_rate: 1.2,
            duration_mode: DurationMode::Keep,
            sound_optimization: true,
        }
    }
}

impl RenderConfig {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PITCH_SHIFT..=MAX_PITCH_SHIFT).contains(&self.pitch_shift_semitones) {
            return Err(Error::InvalidInput(format!(
                "Pitch shift {} semitones is outside [{}, {}]",
                self.pitch_shift_semitones, MIN_PITCH_SHIFT, MAX_PITCH_SHIFT
            )));
        }

        if !self.playback_rate.is_finite()
            || self.playback_rate < MIN_PLAYBACK_RATE
            || self.playback_rate > MAX_PLAYBACK_RATE
        {
            return Err(Error::InvalidInput(format!(
                "Playback rate {} is outside [{}, {}]",
                self.playback_rate, MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE
            )));
        }

        Ok(())
    }
}

/// Configuration file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Default render settings (overridable per invocation)
    #[serde(default)]
    pub render: RenderConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Output placement
    #[serde(default)]
    pub output: OutputConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for rendered files (defaults to the timeline's directory)
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Write `<output>.report.json` next to the rendered file
    #[serde(default)]
    pub write_report: bool,
}

/// Resolve which config file to read.
///
/// Returns `None` when no candidate exists; the caller then uses defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("srtmix").join("config.toml"))
        .filter(|path| path.exists())
}

/// Parse configuration from TOML text.
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    let config: TomlConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
    config.render.validate()?;
    Ok(config)
}

/// Load configuration from a TOML file.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    parse_toml_config(&content)
}

/// Where the effective configuration came from
#[derive(Debug)]
pub enum ConfigSource {
    /// No config file was found
    Defaults,
    /// Loaded from this file
    File(PathBuf),
    /// This file was named but failed to load; defaults are in effect
    Fallback { path: PathBuf, error: Error },
}

impl ConfigSource {
    /// Log how configuration was resolved.
    ///
    /// Kept separate from loading so the binary can log after its tracing
    /// subscriber exists, even though the file decides the log level.
    pub fn log(&self) {
        match self {
            ConfigSource::Defaults => info!("No config file found, using built-in defaults"),
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Fallback { path, error } => {
                warn!("{} ({}) - using built-in defaults", error, path.display())
            }
        }
    }
}

/// Resolve and load configuration, reporting where it came from.
///
/// An explicitly named file (CLI or environment) that fails to load is still
/// not fatal; the returned [`ConfigSource::Fallback`] carries the reason.
pub fn load_with_source(cli_arg: Option<&Path>) -> (TomlConfig, ConfigSource) {
    let Some(path) = resolve_config_path(cli_arg) else {
        return (TomlConfig::default(), ConfigSource::Defaults);
    };

    match load_toml_config(&path) {
        Ok(config) => (config, ConfigSource::File(path)),
        Err(error) => (TomlConfig::default(), ConfigSource::Fallback { path, error }),
    }
}

/// Resolve and load configuration, falling back to defaults and logging the
/// outcome.
pub fn load_or_default(cli_arg: Option<&Path>) -> TomlConfig {
    let (config, source) = load_with_source(cli_arg);
    source.log();
    config
}
