//! # Display Module
//!
//! Text rendering of analysis results: frequency, note label and a tuning
//! indicator, or a distinct "no clear tone" line when nothing was detected.

use std::fmt;
use std::io::{self, Write};

use crate::AnalysisResult;

/// Offsets strictly inside this many cents count as in tune.
pub const IN_TUNE_CENTS: f64 = 5.0;

/// Text shown when no tone was detected.
pub const NO_TONE_TEXT: &str = "--.-- Hz  --  no clear tone";

/// How far a reading is from its nearest note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TuningIndicator {
    InTune,
    /// Cents above the note, always positive.
    Sharp(f64),
    /// Cents below the note, always positive.
    Flat(f64),
}

impl TuningIndicator {
    pub fn from_cents(cents_off: f64) -> Self {
        if cents_off.abs() < IN_TUNE_CENTS {
            TuningIndicator::InTune
        } else if cents_off > 0.0 {
            TuningIndicator::Sharp(cents_off)
        } else {
            TuningIndicator::Flat(-cents_off)
        }
    }
}

impl fmt::Display for TuningIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningIndicator::InTune => f.write_str("in tune"),
            TuningIndicator::Sharp(cents) => write!(f, "{cents:.0} cents sharp"),
            TuningIndicator::Flat(cents) => write!(f, "{cents:.0} cents flat"),
        }
    }
}

/// Formats one reading as a single line, e.g. `"440.00 Hz  A4  in tune"`.
pub fn format_reading(result: Option<&AnalysisResult>) -> String {
    match result {
        Some(r) => format!(
            "{:.2} Hz  {}  {}",
            r.frequency,
            r.label(),
            TuningIndicator::from_cents(r.cents_off)
        ),
        None => NO_TONE_TEXT.to_string(),
    }
}

/// Consumer of analysis readings.
pub trait DisplaySink {
    fn render(&mut self, result: Option<&AnalysisResult>) -> io::Result<()>;
}

/// Writes one human-readable line per reading.
pub struct TextDisplay<W: Write> {
    out: W,
}

impl<W: Write> TextDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySink for TextDisplay<W> {
    fn render(&mut self, result: Option<&AnalysisResult>) -> io::Result<()> {
        writeln!(self.out, "{}", format_reading(result))?;
        self.out.flush()
    }
}

/// Writes one JSON value per line; `null` when there is no tone.
pub struct JsonDisplay<W: Write> {
    out: W,
}

impl<W: Write> JsonDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySink for JsonDisplay<W> {
    fn render(&mut self, result: Option<&AnalysisResult>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, &result)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}
