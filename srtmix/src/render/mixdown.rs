//! Timeline placement and mixdown
//!
//! # Architecture
//!
//! - Each processed clip arrives with a frame offset on the master timeline
//! - The master buffer is as long as the latest clip end
//! - Overlapping samples are summed (simple addition, no limiter or
//!   normalization)
//! - Mono clips are duplicated into a stereo master; channels beyond two are
//!   dropped

use crate::audio::types::{AudioClip, MAX_MASTER_CHANNELS};
use crate::error::{Error, Result};
use tracing::debug;

/// A processed clip and its position on the master timeline
#[derive(Debug, Clone)]
pub struct PlacedClip {
    pub source_id: u32,
    pub offset_frames: usize,
    pub audio: AudioClip,
}

impl PlacedClip {
    /// First frame after the clip
    pub fn end_frame(&self) -> usize {
        self.offset_frames + self.audio.frames()
    }
}

/// Frame offset for a placement in seconds
pub fn offset_frames(seconds: f64, sample_rate: u32) -> usize {
    (seconds.max(0.0) * sample_rate as f64).round() as usize
}

/// Sum placed clips into one master buffer.
///
/// Empty clips are ignored. The master has one channel when every clip is
/// mono, two otherwise.
///
/// # Errors
/// [`Error::ZeroDuration`] when no clip has any samples.
pub fn mixdown(clips: &[PlacedClip], sample_rate: u32) -> Result<AudioClip> {
    let audible: Vec<&PlacedClip> = clips.iter().filter(|c| !c.audio.is_empty()).collect();

    let length = audible.iter().map(|c| c.end_frame()).max().unwrap_or(0);
    if length == 0 {
        return Err(Error::ZeroDuration);
    }

    let channel_count = audible
        .iter()
        .map(|c| c.audio.channel_count().min(MAX_MASTER_CHANNELS))
        .max()
        .unwrap_or(1);

    let mut master = AudioClip::silent(channel_count, length, sample_rate);

    for clip in &audible {
        for (dest, source) in master
            .channels
            .iter_mut()
            .zip(clip.audio.to_layout(channel_count))
        {
            for (out, sample) in dest[clip.offset_frames..].iter_mut().zip(source) {
                *out += sample;
            }
        }
    }

    debug!(
        clips = audible.len(),
        channels = channel_count,
        frames = length,
        "Mixdown complete"
    );

    Ok(master)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 44100;

    fn placed(id: u32, offset: usize, channels: Vec<Vec<f32>>) -> PlacedClip {
        PlacedClip {
            source_id: id,
            offset_frames: offset,
            audio: AudioClip::new(channels, RATE),
        }
    }

    #[test]
    fn test_offset_frames_rounds() {
        assert_eq!(offset_frames(0.0, RATE), 0);
        assert_eq!(offset_frames(1.5, RATE), 66150);
        assert_eq!(offset_frames(0.001, RATE), 44);
        assert_eq!(offset_frames(-2.0, RATE), 0);
    }

    #[test]
    fn test_length_is_latest_end() {
        let clips = vec![
            placed(1, 0, vec![vec![0.1; 100]]),
            placed(2, 250, vec![vec![0.1; 50]]),
            placed(3, 10, vec![vec![0.1; 20]]),
        ];
        let master = mixdown(&clips, RATE).unwrap();
        assert_eq!(master.frames(), 300);
        assert_eq!(master.channel_count(), 1);
    }

    #[test]
    fn test_overlaps_are_summed_without_limiting() {
        let clips = vec![
            placed(1, 0, vec![vec![0.75; 4]]),
            placed(2, 2, vec![vec![0.5; 4]]),
        ];
        let master = mixdown(&clips, RATE).unwrap();
        assert_eq!(master.channels[0], vec![0.75, 0.75, 1.25, 1.25, 0.5, 0.5]);
    }

    #[test]
    fn test_mono_duplicated_into_stereo_master() {
        let clips = vec![
            placed(1, 0, vec![vec![0.5; 2]]),
            placed(2, 1, vec![vec![0.25; 2], vec![-0.25; 2]]),
        ];
        let master = mixdown(&clips, RATE).unwrap();
        assert_eq!(master.channel_count(), 2);
        assert_eq!(master.channels[0], vec![0.5, 0.75, 0.25]);
        assert_eq!(master.channels[1], vec![0.5, 0.25, -0.25]);
    }

    #[test]
    fn test_empty_clips_do_not_extend_master() {
        let clips = vec![placed(1, 0, vec![vec![0.1; 10]]), placed(2, 5000, vec![Vec::new()])];
        let master = mixdown(&clips, RATE).unwrap();
        assert_eq!(master.frames(), 10);
    }

    #[test]
    fn test_zero_duration() {
        assert!(matches!(mixdown(&[], RATE), Err(Error::ZeroDuration)));
        let clips = vec![placed(1, 100, vec![Vec::new(), Vec::new()])];
        assert!(matches!(mixdown(&clips, RATE), Err(Error::ZeroDuration)));
    }
}
