// tuner-core/src/lib.rs

//! The core logic for the chromatic tuner.
//! This crate turns blocks of 16-bit audio into a dominant frequency and the
//! nearest equal-tempered note. It also carries the capture sources, the
//! paced analysis worker and the text display sink that surround the
//! kernel. It contains no GUI code.

pub mod analyzer;
pub mod audio;
pub mod config;
pub mod display;
pub mod error;
pub mod fft;
pub mod pitch;
pub mod tuning;
pub mod window;
pub mod worker;

use serde::Serialize;

pub use analyzer::PitchAnalyzer;
pub use error::{CaptureError, ConfigError};
pub use tuning::NoteName;

/// Represents the result of a single audio analysis frame.
///
/// Only produced when a tone was found inside the audible band; "no tone"
/// is expressed as `Option::None` by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// The dominant frequency in Hz, quantized to the FFT bin grid.
    pub frequency: f64,
    /// Pitch class of the nearest equal-tempered note.
    pub note: NoteName,
    /// Octave of the nearest note; C0 starts octave 0.
    pub octave: i32,
    /// Deviation from the nearest note in cents, in `(-50, 50]`.
    pub cents_off: f64,
}

impl AnalysisResult {
    /// Combined note and octave label, e.g. `"A4"` or `"C#-1"`.
    pub fn label(&self) -> String {
        format!("{}{}", self.note, self.octave)
    }
}
