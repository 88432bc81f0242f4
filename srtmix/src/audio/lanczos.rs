//! Streaming Lanczos resampler used for pitch shifting
//!
//! Reading a signal faster than it was recorded raises its pitch and shortens
//! it by the same factor. The resampler reads its input at fractional
//! positions `0, ratio, 2·ratio, ...` and interpolates each one with a
//! windowed-sinc (Lanczos) kernel.
//!
//! **Streaming model:**
//! - Input arrives in blocks of any size; each block is appended to the
//!   samples carried over from the previous call
//! - An output is produced once every sample under the right half of its
//!   kernel has arrived
//! - Only the prefix the kernel can no longer reach is discarded, so the
//!   `a - 1` samples of left history survive across block boundaries
//! - [`LanczosResampler::finish`] flushes the tail against zero padding
//!
//! The output depends only on the concatenated input, never on how it was
//! split into blocks.

use crate::error::{Error, Result};

/// Kernel half-width (number of lobes)
pub const LANCZOS_A: usize = 3;

/// Lanczos window: `a·sin(πx)·sin(πx/a) / (πx)²` on `(-a, a)`, 1 at 0, 0 elsewhere.
pub fn lanczos_kernel(x: f64, a: usize) -> f64 {
    if x == 0.0 {
        return 1.0;
    }
    let a = a as f64;
    if x.abs() >= a {
        return 0.0;
    }
    let pi_x = std::f64::consts::PI * x;
    a * pi_x.sin() * (pi_x / a).sin() / (pi_x * pi_x)
}

/// Interpolate `samples` at fractional `position`.
///
/// Samples outside the slice count as silence.
pub fn lanczos_interpolate(samples: &[f32], position: f64, a: usize) -> f32 {
    let floor = position.floor() as i64;
    let a_i = a as i64;
    let mut acc = 0.0f64;
    for j in (floor - a_i + 1)..=(floor + a_i) {
        if j < 0 || j >= samples.len() as i64 {
            continue;
        }
        acc += samples[j as usize] as f64 * lanczos_kernel(position - j as f64, a);
    }
    acc as f32
}

/// Resampling ratio for a pitch shift of `semitones` (equal temperament)
pub fn pitch_factor(semitones: i32) -> f64 {
    2f64.powf(semitones as f64 / 12.0)
}

/// Single-channel streaming Lanczos resampler.
///
/// A ratio of exactly 1.0 is a pass-through that keeps no state.
#[derive(Debug, Clone)]
pub struct LanczosResampler {
    ratio: f64,
    a: usize,
    /// Retained input; `buffer[0]` is input sample number `base`
    buffer: Vec<f32>,
    base: u64,
    /// Total input samples received
    received: u64,
    /// Output samples produced so far
    produced: u64,
}

impl LanczosResampler {
    /// Create a resampler that advances `ratio` input samples per output sample
    pub fn new(ratio: f64) -> Result<Self> {
        Self::with_lobes(ratio, LANCZOS_A)
    }

    /// Create a resampler with a custom kernel half-width
    pub fn with_lobes(ratio: f64, a: usize) -> Result<Self> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(Error::Resample(format!(
                "Resampling ratio must be a positive finite number, got {}",
                ratio
            )));
        }
        if a == 0 {
            return Err(Error::Resample("Kernel half-width must be at least 1".to_string()));
        }
        Ok(Self {
            ratio,
            a,
            buffer: Vec::new(),
            base: 0,
            received: 0,
            produced: 0,
        })
    }

    /// Input samples consumed per output sample
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    fn is_passthrough(&self) -> bool {
        self.ratio == 1.0
    }

    fn position(&self) -> f64 {
        self.produced as f64 * self.ratio
    }

    /// Feed one block and return every output sample that is now complete
    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        if self.is_passthrough() {
            return input.to_vec();
        }

        self.buffer.extend_from_slice(input);
        self.received += input.len() as u64;

        let mut output = Vec::with_capacity((input.len() as f64 / self.ratio).ceil() as usize + 1);
        loop {
            let position = self.position();
            if position.floor() as i64 + self.a as i64 >= self.received as i64 {
                break;
            }
            output.push(self.sample_at(position));
            self.produced += 1;
        }

        self.discard_consumed();
        output
    }

    /// Flush the remaining outputs and reset for a new stream.
    ///
    /// Over a whole stream of `n` input samples the resampler produces
    /// `ceil(n / ratio)` outputs.
    pub fn finish(&mut self) -> Vec<f32> {
        if self.is_passthrough() {
            return Vec::new();
        }

        let total = self.received as f64;
        let mut output = Vec::new();
        loop {
            let position = self.position();
            if position >= total {
                break;
            }
            output.push(self.sample_at(position));
            self.produced += 1;
        }

        self.buffer.clear();
        self.base = 0;
        self.received = 0;
        self.produced = 0;
        output
    }

    /// Resample a whole signal in one call
    pub fn resample_all(&mut self, input: &[f32]) -> Vec<f32> {
        let mut output = self.process(input);
        output.extend(self.finish());
        output
    }

    fn sample_at(&self, position: f64) -> f32 {
        let floor = position.floor() as i64;
        let a = self.a as i64;
        let mut acc = 0.0f64;
        for j in (floor - a + 1)..=(floor + a) {
            // Before the stream start or past its end (zero padding)
            if j < 0 || j >= self.received as i64 {
                continue;
            }
            let index = (j as u64 - self.base) as usize;
            acc += self.buffer[index] as f64 * lanczos_kernel(position - j as f64, self.a);
        }
        acc as f32
    }

    fn discard_consumed(&mut self) {
        let floor = self.position().floor() as i64;
        let keep_from = (floor - self.a as i64 + 1).max(0) as u64;
        if keep_from > self.base {
            let drop = ((keep_from - self.base) as usize).min(self.buffer.len());
            self.buffer.drain(..drop);
            self.base += drop as u64;
        }
    }
}
