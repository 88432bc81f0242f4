//! Sample-rate normalization using rubato
//!
//! Converts decoded clips to the master rate so clips recorded at any rate mix
//! on one timeline.

use super::types::{AudioClip, MASTER_SAMPLE_RATE};
use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Extra frames fed past the end of the clip so the resampler's tail is flushed
const TAIL_MARGIN: usize = 4;

/// Resample `clip` to [`MASTER_SAMPLE_RATE`].
///
/// Clips already at the master rate (and empty clips) are returned unchanged.
pub fn normalize_sample_rate(clip: AudioClip) -> Result<AudioClip> {
    resample_to(clip, MASTER_SAMPLE_RATE)
}

/// Resample `clip` to `output_rate`.
///
/// The result is delay-compensated and has exactly `round(frames × ratio)`
/// frames.
pub fn resample_to(clip: AudioClip, output_rate: u32) -> Result<AudioClip> {
    if clip.sample_rate == output_rate || clip.is_empty() {
        return Ok(AudioClip::new(clip.channels, output_rate));
    }
    if clip.sample_rate == 0 {
        return Err(Error::Resample("Source sample rate is zero".to_string()));
    }

    debug!(
        "Resampling from {}Hz to {}Hz ({} channels)",
        clip.sample_rate,
        output_rate,
        clip.channel_count()
    );

    let ratio = output_rate as f64 / clip.sample_rate as f64;
    let input_frames = clip.frames();
    let expected_frames = (input_frames as f64 * ratio).round() as usize;
    if expected_frames == 0 {
        return Err(Error::Resample(format!(
            "{} frames at {}Hz produce no audio at {}Hz",
            input_frames, clip.sample_rate, output_rate
        )));
    }

    // Probe the delay so the input can be padded far enough to flush it
    let delay = FastFixedIn::<f32>::new(ratio, 1.0, PolynomialDegree::Septic, 1, 1)
        .map_err(|e| Error::Resample(format!("Failed to create resampler: {}", e)))?
        .output_delay();
    let padding = ((delay + TAIL_MARGIN) as f64 / ratio).ceil() as usize + TAIL_MARGIN;
    let chunk_frames = input_frames + padding;

    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        1.0,
        PolynomialDegree::Septic,
        chunk_frames,
        clip.channel_count(),
    )
    .map_err(|e| Error::Resample(format!("Failed to create resampler: {}", e)))?;
    let delay = resampler.output_delay();

    let padded: Vec<Vec<f32>> = clip
        .channels
        .into_iter()
        .map(|mut ch| {
            ch.resize(chunk_frames, 0.0);
            ch
        })
        .collect();

    let channels = resampler
        .process(&padded, None)
        .map_err(|e| Error::Resample(format!("Resampling failed: {}", e)))?
        .into_iter()
        .map(|ch| {
            let mut aligned: Vec<f32> = ch.into_iter().skip(delay).take(expected_frames).collect();
            aligned.resize(expected_frames, 0.0);
            aligned
        })
        .collect();

    let resampled = AudioClip::new(channels, output_rate);
    debug!(
        "Resampled {} input frames to {} output frames (delay {})",
        input_frames,
        resampled.frames(),
        delay
    );

    Ok(resampled)
}
