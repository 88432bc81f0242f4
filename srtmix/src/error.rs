//! Error types for srtmix
//!
//! Three classes of failure flow through the pipeline:
//! - **Input errors** (`EmptyTimeline`, `InvalidTimeline`, `NoMatchingClips`,
//!   invalid configuration): returned before any audio work starts.
//! - **Per-clip errors** (`Decode`, `Resample`, `InvalidPlan`): caught by the
//!   render engine, recorded in the report, never abort the render.
//! - **Fatal errors** (`AllClipsFailed`, `ZeroDuration`, encoder errors):
//!   abort the render and reach the caller with the partial report.

use thiserror::Error;

/// Main error type for srtmix
#[derive(Error, Debug)]
pub enum Error {
    /// Timeline text was empty or whitespace only
    #[error("Timeline is empty")]
    EmptyTimeline,

    /// Timeline text contained no valid entries
    #[error("Timeline contains no valid entries")]
    InvalidTimeline,

    /// Timeline had entries but no supplied clip matched any of them
    #[error("No audio clips match the timeline entry ids")]
    NoMatchingClips,

    /// Clip could not be decoded
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Sample rate conversion failed
    #[error("Resampling error: {0}")]
    Resample(String),

    /// Transform plan failed validation
    #[error("Invalid transform plan: {0}")]
    InvalidPlan(String),

    /// Every matched clip failed to process
    #[error("All {failed} matched clips failed to process")]
    AllClipsFailed {
        /// Number of failed clips
        failed: usize,
    },

    /// The rendered timeline has zero length
    #[error("Rendered timeline has zero duration")]
    ZeroDuration,

    /// Encoder could not be initialized
    #[error("Encoder initialization failed: {0}")]
    EncoderInit(String),

    /// Encoder worker is not running or stopped responding
    #[error("Encoder unavailable: {0}")]
    EncoderUnavailable(String),

    /// Encoding a frame or flushing failed
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Render was cancelled at a checkpoint
    #[error("Render cancelled")]
    Cancelled,

    /// The background render task panicked or was aborted
    #[error("Render task failed: {0}")]
    TaskFailed(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shared library errors (configuration, input validation)
    #[error(transparent)]
    Common(#[from] srtmix_common::Error),
}

impl Error {
    /// Whether the error aborts a render (as opposed to a single clip)
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::Decode(_) | Error::Resample(_) | Error::InvalidPlan(_)
        )
    }
}

/// Convenience Result type using srtmix Error
pub type Result<T> = std::result::Result<T, Error>;
