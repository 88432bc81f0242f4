//! MP3 encoding
//!
//! The master buffer is converted to 16-bit PCM and fed to a [`FrameEncoder`]
//! in fixed frames of [`FRAME_SIZE`] samples per channel, followed by one
//! flush. Encoded chunks are concatenated in submission order.
//!
//! Encoding runs on a dedicated worker thread owned by an [`EncoderSession`].

pub mod mp3;
pub mod worker;

pub use mp3::{LameEncoder, LameFactory};
pub use worker::{EncodeRequest, EncodeResponse, EncoderSession};

use crate::error::{Error, Result};
use tokio_util::sync::CancellationToken;

/// Samples per channel in one MPEG-1 Layer III frame
pub const FRAME_SIZE: usize = 1152;

/// Output bitrate in kbps
pub const BITRATE_KBPS: u32 = 192;

/// Frame-at-a-time encoder
pub trait FrameEncoder {
    /// Encode one frame. `channels` holds one slice per channel, all the same
    /// length (at most [`FRAME_SIZE`]).
    fn encode_frame(&mut self, channels: &[&[i16]]) -> Result<Vec<u8>>;

    /// Emit any buffered output; called once after the last frame
    fn flush(&mut self) -> Result<Vec<u8>>;
}

/// Creates encoders on the worker thread
pub trait EncoderFactory: Send + 'static {
    /// Check the encoding engine can be used at all
    fn probe(&self) -> Result<()>;

    /// Create an encoder for `channels` channels at `sample_rate`
    fn create(&self, channels: usize, sample_rate: u32) -> Result<Box<dyn FrameEncoder>>;
}

/// Clamp to [-1, 1] and scale to i16 (asymmetric: -1 → -32768, 1 → 32767)
pub fn sample_to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Encode planar PCM frame by frame.
///
/// `on_progress` receives the completed share in percent after every frame.
/// The cancellation token is checked before every frame.
pub fn encode_pcm(
    encoder: &mut dyn FrameEncoder,
    channels: &[Vec<f32>],
    cancel: Option<&CancellationToken>,
    mut on_progress: impl FnMut(f64),
) -> Result<Vec<u8>> {
    let total = channels.first().map_or(0, Vec::len);
    if channels.iter().any(|ch| ch.len() != total) {
        return Err(Error::Encode("Channels have different lengths".to_string()));
    }

    let mut output = Vec::new();
    let mut pcm: Vec<Vec<i16>> = vec![Vec::with_capacity(FRAME_SIZE); channels.len()];

    let mut start = 0;
    while start < total {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::Cancelled);
        }

        let end = (start + FRAME_SIZE).min(total);
        for (dest, source) in pcm.iter_mut().zip(channels) {
            dest.clear();
            dest.extend(source[start..end].iter().map(|&s| sample_to_i16(s)));
        }
        let frame: Vec<&[i16]> = pcm.iter().map(Vec::as_slice).collect();
        output.extend(encoder.encode_frame(&frame)?);

        start = end;
        on_progress(start as f64 / total as f64 * 100.0);
    }

    output.extend(encoder.flush()?);
    Ok(output)
}
