//! Core audio data types

/// Master sample rate; every clip is normalized to it before processing
pub const MASTER_SAMPLE_RATE: u32 = 44100;

/// Maximum channel count of the master buffer
pub const MAX_MASTER_CHANNELS: usize = 2;

/// Decoded PCM audio held entirely in memory.
///
/// **Format:**
/// - Samples are f32 (nominally -1.0 to 1.0)
/// - Planar: one `Vec<f32>` per channel, all of equal length
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Per-channel sample data
    pub channels: Vec<Vec<f32>>,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioClip {
    /// Create a clip from planar channel data
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        debug_assert!(
            channels.windows(2).all(|w| w[0].len() == w[1].len()),
            "Planar channels must have equal length"
        );
        Self {
            channels,
            sample_rate,
        }
    }

    /// Create a single-channel clip
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(vec![samples], sample_rate)
    }

    /// Create a clip with `channel_count` channels of silence
    pub fn silent(channel_count: usize, frames: usize, sample_rate: u32) -> Self {
        Self::new(vec![vec![0.0; frames]; channel_count], sample_rate)
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Whether the clip contains no samples
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Average all channels into one guide signal
    pub fn mono_mix(&self) -> Vec<f32> {
        match self.channels.len() {
            0 => Vec::new(),
            1 => self.channels[0].clone(),
            n => {
                let scale = 1.0 / n as f32;
                (0..self.frames())
                    .map(|i| self.channels.iter().map(|ch| ch[i]).sum::<f32>() * scale)
                    .collect()
            }
        }
    }

    /// Keep only frames in `start..end`
    pub fn slice_frames(&mut self, start: usize, end: usize) {
        let end = end.min(self.frames());
        let start = start.min(end);
        for ch in &mut self.channels {
            ch.truncate(end);
            ch.drain(..start);
        }
    }

    /// Shorten the clip to at most `frames` frames
    pub fn truncate(&mut self, frames: usize) {
        for ch in &mut self.channels {
            ch.truncate(frames);
        }
    }

    /// Map the clip onto a master layout of `target` channels.
    ///
    /// Mono is duplicated across channels; extra source channels beyond the
    /// target are dropped.
    pub fn to_layout(&self, target: usize) -> Vec<Vec<f32>> {
        let Some(first) = self.channels.first() else {
            return vec![Vec::new(); target];
        };
        (0..target)
            .map(|ch| self.channels.get(ch).unwrap_or(first).clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_and_frames() {
        let clip = AudioClip::silent(2, 22050, MASTER_SAMPLE_RATE);
        assert_eq!(clip.frames(), 22050);
        assert_eq!(clip.channel_count(), 2);
        assert!((clip.duration_seconds() - 0.5).abs() < 1e-12);
        assert!(!clip.is_empty());
        assert!(AudioClip::mono(Vec::new(), 44100).is_empty());
    }

    #[test]
    fn test_mono_mix_averages_channels() {
        let clip = AudioClip::new(vec![vec![1.0, 0.0], vec![0.0, -1.0]], 44100);
        assert_eq!(clip.mono_mix(), vec![0.5, -0.5]);
    }

    #[test]
    fn test_slice_frames() {
        let mut clip = AudioClip::mono(vec![0.0, 1.0, 2.0, 3.0, 4.0], 44100);
        clip.slice_frames(1, 4);
        assert_eq!(clip.channels[0], vec![1.0, 2.0, 3.0]);

        clip.slice_frames(5, 10);
        assert!(clip.is_empty());
    }

    #[test]
    fn test_to_layout() {
        let mono = AudioClip::mono(vec![0.25, 0.5], 44100);
        assert_eq!(mono.to_layout(2), vec![vec![0.25, 0.5], vec![0.25, 0.5]]);

        let surround = AudioClip::new(vec![vec![1.0], vec![2.0], vec![3.0]], 44100);
        assert_eq!(surround.to_layout(2), vec![vec![1.0], vec![2.0]]);
        assert_eq!(surround.to_layout(1), vec![vec![1.0]]);
    }
}
