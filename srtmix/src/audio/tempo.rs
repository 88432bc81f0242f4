//! Tempo correction without pitch change
//!
//! Waveform-similarity overlap-add (WSOLA): Hann-windowed frames are read from
//! the input at `rate` times the output hop and overlap-added at a fixed output
//! hop. Each frame's read position is nudged within a small tolerance to the
//! offset whose waveform best continues the previous frame, which keeps
//! periodic content phase-aligned across the seams.
//!
//! The alignment search runs on a mono guide and the chosen offset is applied
//! to every channel, so the stereo image stays coherent.

use super::types::AudioClip;
use crate::error::{Error, Result};
use tracing::debug;

/// Analysis frame length in seconds
const FRAME_SECONDS: f64 = 0.03;

/// Stride used when evaluating the alignment cross-correlation
const CORRELATION_STRIDE: usize = 4;

/// Time-scale modifier for one playback rate
#[derive(Debug, Clone)]
pub struct TempoStretcher {
    rate: f64,
}

impl TempoStretcher {
    /// `rate > 1` speeds up (shorter output), `rate < 1` slows down
    pub fn new(rate: f64) -> Result<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(Error::InvalidPlan(format!(
                "Tempo rate must be a positive finite number, got {}",
                rate
            )));
        }
        Ok(Self { rate })
    }

    /// Playback rate
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Output length in frames for an input of `frames` frames
    pub fn output_frames(&self, frames: usize) -> usize {
        (frames as f64 / self.rate).round() as usize
    }

    /// Time-stretch `clip`; the result has `round(frames / rate)` frames
    pub fn process(&self, clip: &AudioClip) -> AudioClip {
        if self.rate == 1.0 || clip.is_empty() {
            return clip.clone();
        }

        let input_len = clip.frames();
        let output_len = self.output_frames(input_len);

        let mut frame_len = ((FRAME_SECONDS * clip.sample_rate as f64).round() as usize).max(4);
        frame_len += frame_len % 2;
        let hop_out = frame_len / 2;
        let hop_in = hop_out as f64 * self.rate;
        let tolerance = frame_len / 4;

        let window = hann_window(frame_len);
        let guide = clip.mono_mix();

        let mut output = vec![vec![0.0f32; output_len + frame_len]; clip.channel_count()];
        let mut weight = vec![0.0f32; output_len + frame_len];

        let mut previous: Option<usize> = None;
        let mut k = 0usize;
        while k * hop_out < output_len {
            let nominal = (k as f64 * hop_in).round() as i64;
            let start = match previous {
                None => nominal.max(0) as usize,
                Some(prev) => best_alignment(&guide, prev + hop_out, nominal, tolerance, frame_len),
            };

            let out_start = k * hop_out;
            for (ch, out) in output.iter_mut().enumerate() {
                let source = &clip.channels[ch];
                for n in 0..frame_len {
                    let sample = source.get(start + n).copied().unwrap_or(0.0);
                    out[out_start + n] += sample * window[n];
                }
            }
            for n in 0..frame_len {
                weight[out_start + n] += window[n];
            }

            previous = Some(start);
            k += 1;
        }

        for out in &mut output {
            for (sample, &w) in out.iter_mut().zip(weight.iter()) {
                *sample = if w > 1e-6 { *sample / w } else { 0.0 };
            }
            out.truncate(output_len);
        }

        debug!(
            rate = self.rate,
            input_frames = input_len,
            output_frames = output_len,
            frames_used = k,
            "Tempo corrected"
        );

        AudioClip::new(output, clip.sample_rate)
    }
}

/// Periodic Hann window; 50% overlapped copies sum to one
fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| {
            let phase = 2.0 * std::f64::consts::PI * n as f64 / len as f64;
            (0.5 - 0.5 * phase.cos()) as f32
        })
        .collect()
}

/// Read position within `nominal ± tolerance` whose frame best matches the
/// natural continuation of the previous frame (which starts at `continuation`)
fn best_alignment(
    guide: &[f32],
    continuation: usize,
    nominal: i64,
    tolerance: usize,
    frame_len: usize,
) -> usize {
    let last_start = guide.len().saturating_sub(frame_len) as i64;
    let low = (nominal - tolerance as i64).clamp(0, last_start);
    let high = (nominal + tolerance as i64).clamp(0, last_start);
    let fallback = nominal.max(0) as usize;

    if continuation >= guide.len() || low > high {
        return fallback;
    }

    let target_len = frame_len.min(guide.len() - continuation);
    let target = &guide[continuation..continuation + target_len];

    let mut best = fallback;
    let mut best_score = f32::NEG_INFINITY;
    for candidate in low..=high {
        let candidate = candidate as usize;
        let score: f32 = target
            .iter()
            .zip(&guide[candidate..])
            .step_by(CORRELATION_STRIDE)
            .map(|(a, b)| a * b)
            .sum();
        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 44100;

    fn sine(frequency: f32, frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / RATE as f32).sin() * 0.5)
            .collect()
    }

    fn zero_crossings(samples: &[f32]) -> usize {
        samples
            .windows(2)
            .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
            .count()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_invalid_rate() {
        assert!(TempoStretcher::new(0.0).is_err());
        assert!(TempoStretcher::new(-1.0).is_err());
        assert!(TempoStretcher::new(f64::NAN).is_err());
    }

    #[test]
    fn test_unity_rate_is_identity() {
        let clip = AudioClip::mono(sine(440.0, 4410), RATE);
        assert_eq!(TempoStretcher::new(1.0).unwrap().process(&clip), clip);
    }

    #[test]
    fn test_output_length_scales_with_rate() {
        let clip = AudioClip::new(vec![sine(220.0, 44100), sine(330.0, 44100)], RATE);
        for (rate, expected) in [(2.0, 22050), (1.2, 36750), (0.5, 88200), (0.8, 55125)] {
            let out = TempoStretcher::new(rate).unwrap().process(&clip);
            assert_eq!(out.frames(), expected, "rate {}", rate);
            assert_eq!(out.channel_count(), 2);
            assert_eq!(out.sample_rate, RATE);
        }
    }

    #[test]
    fn test_pitch_and_level_are_preserved() {
        let input = sine(440.0, 44100);
        let clip = AudioClip::mono(input.clone(), RATE);

        for rate in [0.75, 1.5] {
            let out = TempoStretcher::new(rate).unwrap().process(&clip);
            let body = &out.channels[0][2000..out.frames() - 2000];

            let crossings_per_sample = zero_crossings(body) as f64 / body.len() as f64;
            let reference = zero_crossings(&input) as f64 / input.len() as f64;
            assert!(
                (crossings_per_sample / reference - 1.0).abs() < 0.1,
                "rate {}: {} vs {}",
                rate,
                crossings_per_sample,
                reference
            );

            let level = rms(body);
            assert!((level / rms(&input) - 1.0).abs() < 0.15, "rate {}: rms {}", rate, level);
        }
    }

    #[test]
    fn test_short_clip_still_produces_scaled_length() {
        let clip = AudioClip::mono(sine(440.0, 300), RATE);
        let out = TempoStretcher::new(1.5).unwrap().process(&clip);
        assert_eq!(out.frames(), 200);
    }
}
