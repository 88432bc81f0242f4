//! In-memory WAV clip generation
//!
//! Clips are written with hound into byte buffers so pipeline tests can build
//! a clip library without touching the filesystem.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::io::Cursor;

/// Standard test sample rate (44.1 kHz)
pub const TEST_SAMPLE_RATE: u32 = 44100;

fn frames_for(duration_ms: u64, sample_rate: u32) -> usize {
    (sample_rate as u64 * duration_ms / 1000) as usize
}

/// Encode per-frame sample values as a 16-bit WAV, every channel identical
fn write_wav(samples: &[f32], channels: u16, sample_rate: u32) -> Vec<u8> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).expect("create WAV writer");
        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            for _ in 0..channels {
                writer.write_sample(value).expect("write sample");
            }
        }
        writer.finalize().expect("finalize WAV");
    }
    cursor.into_inner()
}

fn sine(frames: usize, frequency_hz: f32, amplitude: f32, sample_rate: u32) -> Vec<f32> {
    (0..frames)
        .map(|i| (2.0 * PI * frequency_hz * i as f32 / sample_rate as f32).sin() * amplitude)
        .collect()
}

/// Sine wave clip
///
/// # Arguments
/// * `duration_ms` - Duration in milliseconds
/// * `frequency_hz` - Sine frequency
/// * `channels` - 1 (mono) or 2 (stereo)
/// * `sample_rate` - Sample rate in Hz
pub fn sine_wav(duration_ms: u64, frequency_hz: f32, channels: u16, sample_rate: u32) -> Vec<u8> {
    let frames = frames_for(duration_ms, sample_rate);
    write_wav(&sine(frames, frequency_hz, 0.5, sample_rate), channels, sample_rate)
}

/// Stereo 440 Hz clip at the standard rate
pub fn tone_wav(duration_ms: u64) -> Vec<u8> {
    sine_wav(duration_ms, 440.0, 2, TEST_SAMPLE_RATE)
}

/// Silent stereo clip
pub fn silent_wav(duration_ms: u64) -> Vec<u8> {
    let frames = frames_for(duration_ms, TEST_SAMPLE_RATE);
    write_wav(&vec![0.0; frames], 2, TEST_SAMPLE_RATE)
}

/// Tone with leading and trailing silence
pub fn padded_tone_wav(lead_ms: u64, body_ms: u64, tail_ms: u64) -> Vec<u8> {
    let mut samples = vec![0.0; frames_for(lead_ms, TEST_SAMPLE_RATE)];
    samples.extend(sine(
        frames_for(body_ms, TEST_SAMPLE_RATE),
        440.0,
        0.5,
        TEST_SAMPLE_RATE,
    ));
    samples.extend(vec![0.0; frames_for(tail_ms, TEST_SAMPLE_RATE)]);
    write_wav(&samples, 1, TEST_SAMPLE_RATE)
}

/// Bytes no decoder recognizes
pub fn corrupt_clip() -> Vec<u8> {
    // No 0xFF bytes, so nothing resembles an MPEG frame sync
    (0..4096u32).map(|i| (i * 37 % 239) as u8).collect()
}
