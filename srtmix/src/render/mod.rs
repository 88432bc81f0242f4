//! Rendering: clip processing, mixdown, and the background render service

pub mod engine;
pub mod mixdown;
pub mod service;

pub use engine::{process_clip, run_render};
pub use mixdown::{mixdown, PlacedClip};
pub use service::{RenderHandle, RenderService};

use crate::clips::ClipLibrary;
use crate::error::Error;
use crate::report::ProcessReport;
use srtmix_common::RenderConfig;

/// Everything one render needs
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// SRT timeline text
    pub timeline: String,
    /// Clips keyed by id
    pub clips: ClipLibrary,
    pub config: RenderConfig,
}

/// Encoded output of a successful render
#[derive(Debug)]
pub struct RenderOutput {
    /// MP3 bytes
    pub bytes: Vec<u8>,
    pub report: ProcessReport,
}

/// A fatal render error together with the partial report
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct RenderFailure {
    pub error: Error,
    /// Report up to the point of failure; `errors` ends with the fatal message
    pub report: ProcessReport,
}
