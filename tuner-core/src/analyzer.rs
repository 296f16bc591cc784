//! # Pitch Analyzer
//!
//! The analysis kernel: window, transform, pick the peak, map it to a note.
//! A [`PitchAnalyzer`] holds nothing but its sample rate. Every scratch
//! buffer lives for one call, so a single analyzer can be shared freely
//! across threads.

use crate::{AnalysisResult, ConfigError, fft, pitch, tuning::PitchReading, window};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchAnalyzer {
    sample_rate: u32,
}

impl PitchAnalyzer {
    /// Creates an analyzer for audio captured at `sample_rate` Hz.
    ///
    /// # Returns
    /// * `Err(ConfigError::InvalidSampleRate)` - if `sample_rate` is zero
    pub fn new(sample_rate: u32) -> Result<Self, ConfigError> {
        if sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        Ok(Self { sample_rate })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Width of one FFT bin for a block of `block_len` samples.
    pub fn bin_width(&self, block_len: usize) -> f64 {
        self.sample_rate as f64 / fft::next_power_of_two(block_len) as f64
    }

    /// Windowed magnitude spectrum of a block, half the padded FFT length.
    pub fn spectrum(&self, samples: &[i16]) -> Vec<f64> {
        fft::magnitude_spectrum(&window::windowed(samples))
    }

    /// Analyzes one capture block.
    ///
    /// # Returns
    /// * `Some(result)` - the dominant tone and its nearest note
    /// * `None` - empty or degenerate block, silence, or a peak outside
    ///   the audible band
    pub fn analyze(&self, samples: &[i16]) -> Option<AnalysisResult> {
        if samples.is_empty() {
            return None;
        }

        let spectrum = self.spectrum(samples);
        let frequency = pitch::peak_frequency(&spectrum, self.sample_rate)?;
        if !pitch::in_audible_band(frequency) {
            return None;
        }

        let reading = PitchReading::from_frequency(frequency)?;
        Some(AnalysisResult {
            frequency,
            note: reading.note,
            octave: reading.octave,
            cents_off: reading.cents_off,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoteName;
    use std::f64::consts::PI;

    fn sine(freq: f64, sample_rate: u32, len: usize, amplitude: f64) -> Vec<i16> {
        (0..len)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (amplitude * i16::MAX as f64 * (2.0 * PI * freq * t).sin()).round() as i16
            })
            .collect()
    }

    #[test]
    fn rejects_zero_sample_rate() {
        assert!(matches!(PitchAnalyzer::new(0), Err(ConfigError::InvalidSampleRate)));
    }

    #[test]
    fn concert_a_at_cd_rate() {
        let analyzer = PitchAnalyzer::new(44100).unwrap();
        let result = analyzer.analyze(&sine(440.0, 44100, 4096, 0.5)).unwrap();
        assert!((result.frequency - 440.0).abs() <= analyzer.bin_width(4096));
        assert_eq!(result.note, NoteName::A);
        assert_eq!(result.octave, 4);
        assert_eq!(result.label(), "A4");
    }

    #[test]
    fn non_power_of_two_block_is_padded() {
        let analyzer = PitchAnalyzer::new(8000).unwrap();
        let result = analyzer.analyze(&sine(1000.0, 8000, 1000, 0.8)).unwrap();
        assert!((result.frequency - 1000.0).abs() <= analyzer.bin_width(1000));
        assert_eq!(analyzer.spectrum(&[0; 1000]).len(), 512);
    }

    #[test]
    fn silence_is_no_tone() {
        let analyzer = PitchAnalyzer::new(44100).unwrap();
        assert!(analyzer.spectrum(&[0; 2048]).iter().all(|m| m.abs() < 1e-12));
        assert_eq!(analyzer.analyze(&[0; 2048]), None);
    }

    #[test]
    fn degenerate_blocks_are_no_tone() {
        let analyzer = PitchAnalyzer::new(44100).unwrap();
        assert_eq!(analyzer.analyze(&[]), None);
        assert_eq!(analyzer.analyze(&[1234]), None);
        assert_eq!(analyzer.analyze(&[1234, -1234]), None);
    }

    #[test]
    fn out_of_band_tones_are_rejected() {
        let analyzer = PitchAnalyzer::new(8000).unwrap();
        // 10 Hz lands near bin 5 (about 9.8 Hz), under the floor
        assert_eq!(analyzer.analyze(&sine(10.0, 8000, 4096, 0.8)), None);

        let analyzer = PitchAnalyzer::new(44100).unwrap();
        assert_eq!(analyzer.analyze(&sine(6000.0, 44100, 4096, 0.8)), None);
    }

    #[test]
    fn repeated_analysis_is_identical() {
        let analyzer = PitchAnalyzer::new(44100).unwrap();
        let block = sine(329.63, 44100, 4096, 0.3);
        assert_eq!(analyzer.analyze(&block), analyzer.analyze(&block));
        assert_eq!(analyzer.spectrum(&block), analyzer.spectrum(&block));
    }
}
