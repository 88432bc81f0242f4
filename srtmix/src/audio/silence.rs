//! Leading/trailing silence trimming
//!
//! Windowed RMS over a mono guide signal; a run of windows below the threshold
//! at either end of the clip is removed when it lasts at least the minimum
//! silence duration. A clip that is silent throughout becomes empty.

use super::types::AudioClip;
use crate::error::{Error, Result};
use tracing::debug;

/// Default silence threshold in dBFS
pub const DEFAULT_THRESHOLD_DB: f32 = -50.0;

/// Default minimum silent run in seconds
pub const DEFAULT_MIN_SILENCE_SECONDS: f64 = 0.1;

/// RMS analysis window in seconds
const WINDOW_SECONDS: f64 = 0.01;

/// Frames removed from each end of a clip
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrimResult {
    pub leading_frames: usize,
    pub trailing_frames: usize,
}

impl TrimResult {
    /// Whether anything was removed
    pub fn is_trimmed(&self) -> bool {
        self.leading_frames > 0 || self.trailing_frames > 0
    }
}

/// Silence trimmer
#[derive(Debug, Clone)]
pub struct SilenceTrimmer {
    /// Silence threshold in dBFS
    threshold_db: f32,

    /// Minimum silent run to remove, in seconds
    min_silence_seconds: f64,
}

impl SilenceTrimmer {
    /// Create a trimmer.
    ///
    /// The threshold must not be positive and the minimum duration must not be
    /// negative.
    pub fn new(threshold_db: f32, min_silence_seconds: f64) -> Result<Self> {
        if !threshold_db.is_finite() || threshold_db > 0.0 {
            return Err(Error::InvalidPlan(format!(
                "Silence threshold must be a non-positive dB value, got {}",
                threshold_db
            )));
        }
        if !min_silence_seconds.is_finite() || min_silence_seconds < 0.0 {
            return Err(Error::InvalidPlan(format!(
                "Minimum silence duration must be >= 0, got {}",
                min_silence_seconds
            )));
        }
        Ok(Self {
            threshold_db,
            min_silence_seconds,
        })
    }

    /// Remove leading and trailing silence from `clip` in place
    pub fn trim(&self, clip: &mut AudioClip) -> TrimResult {
        let frames = clip.frames();
        if frames == 0 {
            return TrimResult::default();
        }

        let guide = clip.mono_mix();
        let window = ((WINDOW_SECONDS * clip.sample_rate as f64).round() as usize).max(1);
        let min_frames = (self.min_silence_seconds * clip.sample_rate as f64).round() as usize;
        let threshold = db_to_linear(self.threshold_db);

        let leading = guide
            .chunks(window)
            .take_while(|chunk| calculate_rms(chunk) < threshold)
            .map(<[f32]>::len)
            .sum::<usize>();

        if leading == frames {
            clip.truncate(0);
            debug!(frames, "Clip is silent throughout");
            return TrimResult {
                leading_frames: frames,
                trailing_frames: 0,
            };
        }

        let trailing = guide
            .rchunks(window)
            .take_while(|chunk| calculate_rms(chunk) < threshold)
            .map(<[f32]>::len)
            .sum::<usize>();

        let result = TrimResult {
            leading_frames: if leading >= min_frames { leading } else { 0 },
            trailing_frames: if trailing >= min_frames { trailing } else { 0 },
        };

        if result.is_trimmed() {
            clip.slice_frames(result.leading_frames, frames - result.trailing_frames);
            debug!(
                leading = result.leading_frames,
                trailing = result.trailing_frames,
                remaining = clip.frames(),
                "Trimmed silence"
            );
        }

        result
    }
}

impl Default for SilenceTrimmer {
    fn default() -> Self {
        Self {
            threshold_db: DEFAULT_THRESHOLD_DB,
            min_silence_seconds: DEFAULT_MIN_SILENCE_SECONDS,
        }
    }
}

fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}
