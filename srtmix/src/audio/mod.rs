//! Audio processing for clip rendering
//!
//! Decoding (symphonia), sample-rate normalization (rubato), and the signal
//! transforms a render applies to each clip: silence trimming, Lanczos pitch
//! resampling, and tempo correction.

pub mod decoder;
pub mod lanczos;
pub mod resampler;
pub mod silence;
pub mod tempo;
pub mod types;

pub use lanczos::{lanczos_kernel, pitch_factor, LanczosResampler, LANCZOS_A};
pub use types::{AudioClip, MASTER_SAMPLE_RATE};
