//! # Musical Tuning Module
//!
//! Maps a frequency onto 12-tone equal temperament referenced to A4 = 440 Hz.
//!
//! Pitches are addressed by a *key index*: semitones counted from C0, so
//! A4 sits at `4 * 12 + 9 = 57`. Indices below zero are valid and name notes
//! under C0; pitch class and octave are derived with Euclidean remainder and
//! floor division so those still classify correctly.
//!
//! ## Rounding
//! The nearest semitone is `ceil(x - 0.5)`: an exact half rounds *down*. This
//! keeps the cents offset in `(-50, 50]` on both sides of zero, which
//! round-half-away-from-zero would not.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference pitch in Hz.
pub const A4_FREQUENCY_HZ: f64 = 440.0;

/// Key index of A4, counted in semitones from C0.
pub const A4_KEY_INDEX: i64 = 57;

const SEMITONES_PER_OCTAVE: i64 = 12;

/// The twelve equal-tempered pitch classes, starting at C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteName {
    C,
    #[serde(rename = "C#")]
    CSharp,
    D,
    #[serde(rename = "D#")]
    DSharp,
    E,
    F,
    #[serde(rename = "F#")]
    FSharp,
    G,
    #[serde(rename = "G#")]
    GSharp,
    A,
    #[serde(rename = "A#")]
    ASharp,
    B,
}

impl NoteName {
    /// All pitch classes in ascending order; position equals pitch-class number.
    pub const ALL: [NoteName; 12] = [
        NoteName::C,
        NoteName::CSharp,
        NoteName::D,
        NoteName::DSharp,
        NoteName::E,
        NoteName::F,
        NoteName::FSharp,
        NoteName::G,
        NoteName::GSharp,
        NoteName::A,
        NoteName::ASharp,
        NoteName::B,
    ];

    /// Looks up a pitch class, wrapping any integer into `[0, 12)`.
    pub fn from_index(index: i64) -> NoteName {
        Self::ALL[index.rem_euclid(SEMITONES_PER_OCTAVE) as usize]
    }

    pub fn label(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::CSharp => "C#",
            NoteName::D => "D",
            NoteName::DSharp => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::FSharp => "F#",
            NoteName::G => "G",
            NoteName::GSharp => "G#",
            NoteName::A => "A",
            NoteName::ASharp => "A#",
            NoteName::B => "B",
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A frequency placed on the equal-tempered grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchReading {
    pub note: NoteName,
    pub octave: i32,
    /// Offset from the nearest semitone in cents, in `(-50, 50]`.
    pub cents_off: f64,
}

impl PitchReading {
    /// Maps a frequency to its nearest note, octave and cents offset.
    ///
    /// # Returns
    /// * `None` for zero, negative or non-finite frequencies
    pub fn from_frequency(freq: f64) -> Option<PitchReading> {
        if !freq.is_finite() || freq <= 0.0 {
            return None;
        }
        let exact = exact_key_index(freq);
        let nearest = nearest_key_index(exact);
        let (note, octave) = note_for_key_index(nearest);
        Some(PitchReading {
            note,
            octave,
            cents_off: (exact - nearest as f64) * 100.0,
        })
    }
}

/// Fractional key index of `freq`: `57 + 12 * log2(freq / 440)`.
pub fn exact_key_index(freq: f64) -> f64 {
    A4_KEY_INDEX as f64 + SEMITONES_PER_OCTAVE as f64 * (freq / A4_FREQUENCY_HZ).log2()
}

/// Rounds a fractional key index to the nearest semitone, halves rounding down.
pub fn nearest_key_index(exact: f64) -> i64 {
    (exact - 0.5).ceil() as i64
}

/// Splits a key index into pitch class and octave.
///
/// Uses Euclidean remainder and floor division, so index -1 is B in
/// octave -1 rather than an out-of-range class in octave 0.
pub fn note_for_key_index(key_index: i64) -> (NoteName, i32) {
    let note = NoteName::from_index(key_index);
    let octave = key_index.div_euclid(SEMITONES_PER_OCTAVE) as i32;
    (note, octave)
}

/// Equal-tempered frequency of a key index.
pub fn frequency_of_key_index(key_index: i64) -> f64 {
    A4_FREQUENCY_HZ * 2.0_f64.powf((key_index - A4_KEY_INDEX) as f64 / SEMITONES_PER_OCTAVE as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(freq: f64) -> PitchReading {
        PitchReading::from_frequency(freq).unwrap()
    }

    #[test]
    fn concert_a() {
        let r = reading(440.0);
        assert_eq!(r.note, NoteName::A);
        assert_eq!(r.octave, 4);
        assert!(r.cents_off.abs() < 0.01);
    }

    #[test]
    fn a_sharp_four() {
        let r = reading(466.1638);
        assert_eq!(r.note, NoteName::ASharp);
        assert_eq!(r.octave, 4);
        assert!(r.cents_off.abs() < 0.01);
    }

    #[test]
    fn a_three() {
        let r = reading(220.0);
        assert_eq!(r.note, NoteName::A);
        assert_eq!(r.octave, 3);
    }

    #[test]
    fn middle_c_and_octave_boundary() {
        let c4 = reading(261.6256);
        assert_eq!((c4.note, c4.octave), (NoteName::C, 4));
        let b3 = reading(246.9417);
        assert_eq!((b3.note, b3.octave), (NoteName::B, 3));
    }

    #[test]
    fn below_c0_wraps_into_valid_class() {
        // 15 Hz is about 1.5 semitones under C0
        let r = reading(15.0);
        assert_eq!(r.note, NoteName::B);
        assert_eq!(r.octave, -1);
        assert!(r.cents_off > -50.0 && r.cents_off <= 50.0);

        for key in -40..0 {
            let (note, octave) = note_for_key_index(key);
            assert!(octave < 0);
            assert_eq!(NoteName::ALL[key.rem_euclid(12) as usize], note);
        }
        assert_eq!(note_for_key_index(-12), (NoteName::C, -1));
        assert_eq!(note_for_key_index(-13), (NoteName::B, -2));
    }

    #[test]
    fn half_semitone_rounds_down() {
        assert_eq!(nearest_key_index(57.5), 57);
        assert_eq!(nearest_key_index(57.5 + 1e-9), 58);
        assert_eq!(nearest_key_index(57.5 - 1e-9), 57);
        assert_eq!(nearest_key_index(-0.5), -1);
        assert_eq!(nearest_key_index(-0.5 + 1e-9), 0);
        assert_eq!(nearest_key_index(-0.5 - 1e-9), -1);
    }

    #[test]
    fn cents_stay_in_half_open_range() {
        let quarter_tone_up = 440.0 * 2.0_f64.powf(0.5 / 12.0);
        for freq in [
            quarter_tone_up * (1.0 - 1e-9),
            quarter_tone_up * (1.0 + 1e-9),
            27.5,
            4186.0,
            1234.5,
        ] {
            let r = reading(freq);
            assert!(r.cents_off > -50.0 && r.cents_off <= 50.0, "{freq}: {}", r.cents_off);
        }
        assert_eq!(reading(quarter_tone_up * (1.0 - 1e-9)).note, NoteName::A);
        assert_eq!(reading(quarter_tone_up * (1.0 + 1e-9)).note, NoteName::ASharp);
    }

    #[test]
    fn rejects_non_positive_frequencies() {
        assert!(PitchReading::from_frequency(0.0).is_none());
        assert!(PitchReading::from_frequency(-440.0).is_none());
        assert!(PitchReading::from_frequency(f64::NAN).is_none());
        assert!(PitchReading::from_frequency(f64::INFINITY).is_none());
    }

    #[test]
    fn key_index_round_trip_for_piano_range() {
        // A0 (9) through C8 (96)
        for key in 9..=96 {
            let r = reading(frequency_of_key_index(key));
            let (note, octave) = note_for_key_index(key);
            assert_eq!((r.note, r.octave), (note, octave));
            assert!(r.cents_off.abs() < 1e-6);
        }
    }

    #[test]
    fn labels() {
        assert_eq!(NoteName::from_index(9).to_string(), "A");
        assert_eq!(NoteName::from_index(-1).label(), "B");
        assert_eq!(NoteName::from_index(13), NoteName::CSharp);
    }
}
