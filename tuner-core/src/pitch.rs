//! # Pitch Detection Module
//!
//! Picks the dominant fundamental out of a magnitude spectrum. The estimate
//! is the centre frequency of the strongest bin, with no interpolation, so its
//! resolution is `sample_rate / fft_size` (about 10.8 Hz for a 4096-point
//! transform at 44.1 kHz).

/// Lowest frequency reported as a tone, inclusive.
pub const MIN_FREQUENCY_HZ: f64 = 20.0;

/// Upper edge of the reported band, exclusive.
pub const MAX_FREQUENCY_HZ: f64 = 4000.0;

/// Returns `true` when `freq` lies in `[MIN_FREQUENCY_HZ, MAX_FREQUENCY_HZ)`.
pub fn in_audible_band(freq: f64) -> bool {
    (MIN_FREQUENCY_HZ..MAX_FREQUENCY_HZ).contains(&freq)
}

/// Width of one spectrum bin in Hz.
///
/// `spectrum_len` is the magnitude spectrum length, i.e. half the FFT size.
pub fn bin_resolution(sample_rate: u32, spectrum_len: usize) -> f64 {
    sample_rate as f64 / (spectrum_len * 2) as f64
}

/// Finds the index of the strongest non-DC bin.
///
/// Bin 0 is never considered. The scan keeps the first of several equal
/// maxima, and a spectrum without any positive energy (silence) has no peak.
pub fn find_peak_bin(spectrum: &[f64]) -> Option<usize> {
    let mut peak: Option<(usize, f64)> = None;
    for (i, &magnitude) in spectrum.iter().enumerate().skip(1) {
        let best = peak.map_or(0.0, |(_, m)| m);
        if magnitude > best {
            peak = Some((i, magnitude));
        }
    }
    peak.map(|(i, _)| i)
}

/// Converts the strongest bin of `spectrum` into a frequency estimate.
///
/// # Returns
/// * `Some(frequency)` - peak bin times the bin resolution
/// * `None` - the spectrum has at most one bin, or no peak
pub fn peak_frequency(spectrum: &[f64], sample_rate: u32) -> Option<f64> {
    if spectrum.len() <= 1 {
        return None;
    }
    let peak = find_peak_bin(spectrum)?;
    Some(peak as f64 * bin_resolution(sample_rate, spectrum.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dc_bin_is_ignored() {
        let spectrum = [100.0, 1.0, 3.0, 2.0];
        assert_eq!(find_peak_bin(&spectrum), Some(2));
    }

    #[test]
    fn ties_resolve_to_first_occurrence() {
        let spectrum = [0.0, 1.0, 5.0, 5.0, 5.0];
        assert_eq!(find_peak_bin(&spectrum), Some(2));
    }

    #[test]
    fn silence_has_no_peak() {
        assert_eq!(find_peak_bin(&[0.0; 32]), None);
        assert_eq!(peak_frequency(&[0.0; 32], 44100), None);
    }

    #[test]
    fn degenerate_spectrum_has_no_frequency() {
        assert_eq!(peak_frequency(&[], 44100), None);
        assert_eq!(peak_frequency(&[7.0], 44100), None);
    }

    #[test]
    fn frequency_is_bin_times_resolution() {
        let mut spectrum = vec![0.0; 1024];
        spectrum[41] = 10.0;
        let freq = peak_frequency(&spectrum, 44100).unwrap();
        assert!((freq - 41.0 * 44100.0 / 2048.0).abs() < 1e-9);
    }

    #[test]
    fn band_edges() {
        assert!(!in_audible_band(19.999));
        assert!(in_audible_band(20.0));
        assert!(in_audible_band(3999.99));
        assert!(!in_audible_band(4000.0));
        assert!(!in_audible_band(f64::NAN));
    }
}
