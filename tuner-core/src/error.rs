//! # Error Types
//!
//! The analysis kernel itself never fails: an out-of-band or degenerate
//! buffer is reported as "no tone", not as an error. The errors here belong
//! to the surfaces around it: capture sources and configuration.

use thiserror::Error;

/// Stream-ending errors raised by a [`crate::audio::CaptureSource`].
///
/// A zero-length or partial read is *not* an error; sources report those as
/// `Ok(n)`. Every variant of this enum means the caller must stop reading.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// The source was used in a state that does not allow reading
    /// (for example after it was closed).
    #[error("invalid capture operation: {0}")]
    InvalidOperation(String),

    /// A read was requested with an argument the source cannot honour.
    #[error("bad capture value: {0}")]
    BadValue(String),

    /// No usable input device, or the device disappeared mid-stream.
    #[error("input device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Any other failure reported by the audio backend or file decoder.
    #[error("capture backend error: {0}")]
    Backend(String),
}

/// Errors raised while building or loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("sample rate must be a positive number of Hz")]
    InvalidSampleRate,

    #[error("buffer size must be at least 2 samples, got {0}")]
    InvalidBufferSize(usize),

    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config file: {0}")]
    Parse(#[from] serde_json::Error),
}
