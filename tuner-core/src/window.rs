//! # Windowing Module
//!
//! Converts raw 16-bit capture samples into floating-point amplitudes and
//! tapers them with a Hamming window before the transform. Tapering the
//! block edges reduces spectral leakage into neighbouring bins.

use std::f64::consts::PI;

/// Largest positive 16-bit sample, used as the normalization divisor.
const FULL_SCALE: f64 = i16::MAX as f64;

/// Converts signed 16-bit samples into amplitudes in [-1.0, 1.0].
///
/// `i16::MIN` would land just below -1.0, so the result is clamped.
pub fn normalize(samples: &[i16]) -> Vec<f64> {
    samples
        .iter()
        .map(|&s| (s as f64 / FULL_SCALE).max(-1.0))
        .collect()
}

/// Returns the Hamming multiplier for `index` in a block of `len` samples.
///
/// For `len <= 1` the window is undefined (the denominator `len - 1` is
/// zero), so the sample is passed through unchanged with a multiplier of 1.
pub fn hamming_coefficient(index: usize, len: usize) -> f64 {
    if len <= 1 {
        return 1.0;
    }
    0.54 - 0.46 * (2.0 * PI * index as f64 / (len - 1) as f64).cos()
}

/// Applies a Hamming window to the buffer in place.
///
/// Buffers of zero or one sample are left untouched.
pub fn apply_hamming(buffer: &mut [f64]) {
    let n = buffer.len();
    if n <= 1 {
        return;
    }
    for (i, sample) in buffer.iter_mut().enumerate() {
        *sample *= hamming_coefficient(i, n);
    }
}

/// Normalizes and windows a capture block in one step.
pub fn windowed(samples: &[i16]) -> Vec<f64> {
    let mut buffer = normalize(samples);
    apply_hamming(&mut buffer);
    buffer
}
