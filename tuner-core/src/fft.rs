//! # Fast Fourier Transform (FFT) Module
//!
//! An iterative, in-place radix-2 Cooley-Tukey transform over split
//! real/imaginary buffers, plus the magnitude spectrum used for peak picking.
//!
//! ## Features
//! - Zero-padding to the next power of two (no extra windowing)
//! - Bit-reversal permutation driven by a running reversed index
//! - Twiddle factors advanced by complex rotation instead of per-element
//!   `sin`/`cos` calls
//!
//! The rotation recurrence accumulates rounding drift with every step. For the
//! block sizes a tuner uses (a few thousand samples) the error stays far below
//! one bin; much larger transforms would want a precomputed twiddle table.

use std::f64::consts::PI;

/// Returns the smallest power of two that is `>= n`.
///
/// `n = 0` yields 1, a degenerate transform size that produces an empty
/// magnitude spectrum downstream.
pub fn next_power_of_two(n: usize) -> usize {
    n.next_power_of_two()
}

/// Computes the forward DFT of `(re, im)` in place.
///
/// Both slices must have the same power-of-two length. Lengths 0 and 1 are
/// already their own transform and are left untouched.
///
/// # Panics
/// * If the slices differ in length or the length is not a power of two
pub fn transform_in_place(re: &mut [f64], im: &mut [f64]) {
    let n = re.len();
    assert_eq!(n, im.len(), "real and imaginary buffers must match in length");
    assert!(n.is_power_of_two() || n == 0, "FFT length must be a power of two");
    if n <= 1 {
        return;
    }

    bit_reverse_permute(re, im);

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let angle = -2.0 * PI / len as f64;
        let (step_im, step_re) = angle.sin_cos();

        for start in (0..n).step_by(len) {
            let mut w_re = 1.0;
            let mut w_im = 0.0;
            for k in 0..half {
                let even = start + k;
                let odd = even + half;

                let t_re = re[odd] * w_re - im[odd] * w_im;
                let t_im = re[odd] * w_im + im[odd] * w_re;

                re[odd] = re[even] - t_re;
                im[odd] = im[even] - t_im;
                re[even] += t_re;
                im[even] += t_im;

                let next_re = w_re * step_re - w_im * step_im;
                w_im = w_re * step_im + w_im * step_re;
                w_re = next_re;
            }
        }
        len <<= 1;
    }
}

/// Reorders both buffers into bit-reversed index order.
///
/// `j` tracks the bit reversal of `i` incrementally: adding one to a reversed
/// number means clearing its leading ones from the top and setting the first
/// zero. Each pair is swapped once, when `i < j`.
fn bit_reverse_permute(re: &mut [f64], im: &mut [f64]) {
    let n = re.len();
    let mut j = 0;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;

        if i < j {
            re.swap(i, j);
            im.swap(i, j);
        }
    }
}

/// Transforms a real-valued signal and returns its magnitude spectrum.
///
/// The signal is zero-padded to [`next_power_of_two`] and only the first
/// half of the bins is returned, since the upper half of a real signal's
/// transform mirrors the lower half.
///
/// # Returns
/// * `Vec<f64>` of length `next_power_of_two(signal.len()) / 2`
pub fn magnitude_spectrum(signal: &[f64]) -> Vec<f64> {
    let fft_size = next_power_of_two(signal.len());

    let mut re = vec![0.0; fft_size];
    re[..signal.len()].copy_from_slice(signal);
    let mut im = vec![0.0; fft_size];

    transform_in_place(&mut re, &mut im);

    re.iter()
        .zip(im.iter())
        .take(fft_size / 2)
        .map(|(r, i)| r.hypot(*i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustfft::{FftPlanner, num_complex::Complex};

    #[test]
    fn next_power_of_two_cases() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(2), 2);
        assert_eq!(next_power_of_two(1000), 1024);
        assert_eq!(next_power_of_two(1024), 1024);
        assert_eq!(next_power_of_two(1025), 2048);
    }

    #[test]
    fn unit_impulse_has_flat_spectrum() {
        let mut signal = vec![0.0; 256];
        signal[0] = 1.0;
        let spectrum = magnitude_spectrum(&signal);
        assert_eq!(spectrum.len(), 128);
        for m in spectrum {
            assert!((m - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn silence_has_zero_spectrum() {
        let spectrum = magnitude_spectrum(&[0.0; 100]);
        assert_eq!(spectrum.len(), 64);
        assert!(spectrum.iter().all(|m| m.abs() < 1e-12));
    }

    #[test]
    fn power_of_two_input_is_not_padded() {
        assert_eq!(magnitude_spectrum(&[0.5; 512]).len(), 256);
    }

    #[test]
    fn degenerate_lengths() {
        assert!(magnitude_spectrum(&[]).is_empty());
        assert!(magnitude_spectrum(&[1.0]).is_empty());
        assert_eq!(magnitude_spectrum(&[1.0, -1.0]), vec![0.0]);
    }

    #[test]
    fn bit_reversal_of_eight() {
        let mut re: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let mut im = vec![0.0; 8];
        bit_reverse_permute(&mut re, &mut im);
        assert_eq!(re, vec![0.0, 4.0, 2.0, 6.0, 1.0, 5.0, 3.0, 7.0]);
    }

    #[test]
    fn matches_rustfft() {
        for &n in &[2usize, 8, 64, 1024, 4096] {
            let input: Vec<f64> = (0..n)
                .map(|i| ((i * 7919) % 113) as f64 / 56.0 - 1.0 + (i as f64 * 0.37).sin())
                .collect();

            let mut re = input.clone();
            let mut im = vec![0.0; n];
            transform_in_place(&mut re, &mut im);

            let mut reference: Vec<Complex<f64>> =
                input.iter().map(|&x| Complex { re: x, im: 0.0 }).collect();
            FftPlanner::new().plan_fft_forward(n).process(&mut reference);

            let tolerance = 1e-9 * n as f64;
            for (k, c) in reference.iter().enumerate() {
                assert!((re[k] - c.re).abs() < tolerance, "re mismatch at bin {k} for n={n}");
                assert!((im[k] - c.im).abs() < tolerance, "im mismatch at bin {k} for n={n}");
            }
        }
    }

    #[test]
    fn pure_cosine_lands_in_its_bin() {
        let n = 256;
        let bin = 10;
        let signal: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * bin as f64 * i as f64 / n as f64).cos())
            .collect();
        let spectrum = magnitude_spectrum(&signal);
        assert!((spectrum[bin] - n as f64 / 2.0).abs() < 1e-9);
        for (k, m) in spectrum.iter().enumerate() {
            if k != bin {
                assert!(*m < 1e-9, "leakage into bin {k}: {m}");
            }
        }
    }
}
