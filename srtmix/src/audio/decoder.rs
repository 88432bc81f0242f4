//! Clip decoder using symphonia
//!
//! Decodes an in-memory clip (MP3, WAV, M4A/AAC, OGG/Vorbis, FLAC) to planar
//! f32 PCM at its native sample rate and channel count.

use super::types::AudioClip;
use crate::error::{Error, Result};
use std::io::Cursor;
use std::sync::Arc;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, warn};

/// Decode a whole clip from its raw bytes.
///
/// `file_name` is used only as a format hint (its extension).
///
/// # Errors
/// [`Error::Decode`] if the format is unrecognized, there is no audio track,
/// or no audio could be decoded.
pub fn decode_bytes(bytes: Arc<[u8]>, file_name: &str) -> Result<AudioClip> {
    debug!(file_name, size = bytes.len(), "Decoding clip");

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some((_, extension)) = file_name.rsplit_once('.') {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut channels: Vec<Vec<f32>> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                warn!(file_name, "Error reading packet: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if sample_rate.is_none() {
                    sample_rate = Some(decoded.spec().rate);
                }
                append_decoded(&decoded, &mut channels)?;
            }
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                warn!(file_name, "Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => {
                return Err(Error::Decode(format!("Decoder failed: {}", e)));
            }
        }
    }

    let sample_rate =
        sample_rate.ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

    if channels.is_empty() {
        return Err(Error::Decode("No audio decoded".to_string()));
    }

    let clip = AudioClip::new(channels, sample_rate);
    debug!(
        file_name,
        sample_rate,
        channels = clip.channel_count(),
        frames = clip.frames(),
        "Clip decoded"
    );

    Ok(clip)
}

fn append_decoded(decoded: &AudioBufferRef<'_>, out: &mut Vec<Vec<f32>>) -> Result<()> {
    match decoded {
        AudioBufferRef::U8(buf) => append_planar(&**buf, out),
        AudioBufferRef::U16(buf) => append_planar(&**buf, out),
        AudioBufferRef::U24(buf) => append_planar(&**buf, out),
        AudioBufferRef::U32(buf) => append_planar(&**buf, out),
        AudioBufferRef::S8(buf) => append_planar(&**buf, out),
        AudioBufferRef::S16(buf) => append_planar(&**buf, out),
        AudioBufferRef::S24(buf) => append_planar(&**buf, out),
        AudioBufferRef::S32(buf) => append_planar(&**buf, out),
        AudioBufferRef::F32(buf) => append_planar(&**buf, out),
        AudioBufferRef::F64(buf) => append_planar(&**buf, out),
    }
}

fn append_planar<S: Sample>(buf: &AudioBuffer<S>, out: &mut Vec<Vec<f32>>) -> Result<()>
where
    f32: FromSample<S>,
{
    let channel_count = buf.spec().channels.count();
    if out.is_empty() {
        out.resize_with(channel_count, Vec::new);
    } else if out.len() != channel_count {
        return Err(Error::Decode(format!(
            "Channel count changed mid-stream ({} -> {})",
            out.len(),
            channel_count
        )));
    }

    for (ch, dest) in out.iter_mut().enumerate() {
        dest.extend(buf.chan(ch).iter().map(|&s| f32::from_sample(s)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(channels: u16, sample_rate: u32, frames: usize) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..frames {
                let value = ((i as f32 * 0.05).sin() * 16000.0) as i16;
                for _ in 0..channels {
                    writer.write_sample(value).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_stereo_wav() {
        let bytes = wav_bytes(2, 44100, 4410);
        let clip = decode_bytes(Arc::from(bytes), "1.wav").unwrap();

        assert_eq!(clip.sample_rate, 44100);
        assert_eq!(clip.channel_count(), 2);
        assert_eq!(clip.frames(), 4410);
        assert_eq!(clip.channels[0], clip.channels[1]);
        assert!(clip.channels[0].iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_decode_mono_wav_at_other_rate() {
        let bytes = wav_bytes(1, 22050, 2205);
        let clip = decode_bytes(Arc::from(bytes), "7_take.WAV").unwrap();

        assert_eq!(clip.sample_rate, 22050);
        assert_eq!(clip.channel_count(), 1);
        assert_eq!(clip.frames(), 2205);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let bytes: Vec<u8> = (0..2048u32).map(|i| (i * 31 % 251) as u8).collect();
        let result = decode_bytes(Arc::from(bytes), "3.mp3");
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_empty_bytes_fail_to_decode() {
        let result = decode_bytes(Arc::from(Vec::<u8>::new()), "3.wav");
        assert!(matches!(result, Err(Error::Decode(_))));
    }
}
