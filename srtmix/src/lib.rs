//! # srtmix
//!
//! Assembles independently-timed audio clips into one mixed track, driven by an
//! SRT timeline, and encodes the result as MP3.
//!
//! **Pipeline:** timeline parse → clip matching → transform plans → per-clip
//! processing (silence trim, Lanczos pitch resampling, tempo correction,
//! duration trim) → placement and mixdown → MP3 encoding.
//!
//! **Architecture:** symphonia decodes clips, rubato normalizes sample rates,
//! LAME (via mp3lame-encoder) encodes on a dedicated worker thread, and the
//! whole render runs off the caller's thread behind [`render::RenderService`].

pub mod audio;
pub mod clips;
pub mod encoder;
pub mod error;
pub mod plan;
pub mod progress;
pub mod render;
pub mod report;
pub mod timeline;

pub use error::{Error, Result};
pub use report::{MergedTrackInfo, ProcessReport};
pub use srtmix_common::{DurationMode, RenderConfig};
