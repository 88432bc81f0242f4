//! LAME-backed frame encoder

use super::{EncoderFactory, FrameEncoder, BITRATE_KBPS};
use crate::error::{Error, Result};
use mp3lame_encoder::{Bitrate, Builder, DualPcm, Encoder, FlushNoGap, MonoPcm, Quality};
use tracing::debug;

/// Extra room LAME may need when flushing its internal buffers
const FLUSH_BUFFER_SIZE: usize = 7200;

/// MP3 encoder at a constant 192 kbps
pub struct LameEncoder {
    encoder: Encoder,
    channels: usize,
}

impl LameEncoder {
    pub fn new(channels: usize, sample_rate: u32) -> Result<Self> {
        if !(1..=2).contains(&channels) {
            return Err(Error::EncoderInit(format!(
                "MP3 supports 1 or 2 channels, got {}",
                channels
            )));
        }

        let mut builder = Builder::new()
            .ok_or_else(|| Error::EncoderInit("Failed to allocate LAME encoder".to_string()))?;
        builder
            .set_num_channels(channels as u8)
            .map_err(|e| Error::EncoderInit(format!("Invalid channel count: {:?}", e)))?;
        builder
            .set_sample_rate(sample_rate)
            .map_err(|e| Error::EncoderInit(format!("Invalid sample rate: {:?}", e)))?;
        builder
            .set_brate(Bitrate::Kbps192)
            .map_err(|e| Error::EncoderInit(format!("Invalid bitrate: {:?}", e)))?;
        builder
            .set_quality(Quality::Best)
            .map_err(|e| Error::EncoderInit(format!("Invalid quality: {:?}", e)))?;

        let encoder = builder
            .build()
            .map_err(|e| Error::EncoderInit(format!("Failed to initialize LAME: {:?}", e)))?;

        debug!(channels, sample_rate, bitrate_kbps = BITRATE_KBPS, "LAME encoder ready");
        Ok(Self { encoder, channels })
    }
}

impl FrameEncoder for LameEncoder {
    fn encode_frame(&mut self, channels: &[&[i16]]) -> Result<Vec<u8>> {
        if channels.len() != self.channels {
            return Err(Error::Encode(format!(
                "Expected {} channels, got {}",
                self.channels,
                channels.len()
            )));
        }

        let samples = channels.first().map_or(0, |c| c.len());
        let mut output = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(samples));

        let result = match channels {
            [mono] => self.encoder.encode_to_vec(MonoPcm(*mono), &mut output),
            [left, right] => self.encoder.encode_to_vec(
                DualPcm {
                    left: *left,
                    right: *right,
                },
                &mut output,
            ),
            _ => return Err(Error::Encode("Unsupported channel layout".to_string())),
        };
        result.map_err(|e| Error::Encode(format!("{:?}", e)))?;

        Ok(output)
    }

    fn flush(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(FLUSH_BUFFER_SIZE);
        self.encoder
            .flush_to_vec::<FlushNoGap>(&mut output)
            .map_err(|e| Error::Encode(format!("Flush failed: {:?}", e)))?;
        Ok(output)
    }
}

/// Creates [`LameEncoder`]s on the encoder worker
#[derive(Debug, Clone, Copy, Default)]
pub struct LameFactory;

impl EncoderFactory for LameFactory {
    fn probe(&self) -> Result<()> {
        Builder::new()
            .map(|_| ())
            .ok_or_else(|| Error::EncoderInit("LAME encoder unavailable".to_string()))
    }

    fn create(&self, channels: usize, sample_rate: u32) -> Result<Box<dyn FrameEncoder>> {
        Ok(Box::new(LameEncoder::new(channels, sample_rate)?))
    }
}
