//! Test helpers for srtmix integration tests
//!
//! - `audio_generator`: in-memory WAV clips
//! - timeline and clip-library builders

#![allow(dead_code)]

pub mod audio_generator;

pub use audio_generator::*;

use srtmix::clips::{library_from_files, ClipLibrary};
use srtmix_common::time::format_srt_timestamp;

/// SRT text for `(id, start, end, text)` entries
pub fn srt(entries: &[(u32, f64, f64, &str)]) -> String {
    entries
        .iter()
        .map(|(id, start, end, text)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                id,
                format_srt_timestamp(*start),
                format_srt_timestamp(*end),
                text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Clip library from `(file name, bytes)` pairs
pub fn library(files: Vec<(&str, Vec<u8>)>) -> ClipLibrary {
    library_from_files(files.into_iter().map(|(name, bytes)| (name.to_string(), bytes)))
}

/// Whether `bytes` contains an MPEG audio frame header
pub fn has_mpeg_sync(bytes: &[u8]) -> bool {
    bytes
        .windows(2)
        .any(|w| w[0] == 0xFF && (w[1] & 0xE0) == 0xE0)
}
