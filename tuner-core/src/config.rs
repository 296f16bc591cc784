//! # Configuration
//!
//! Runtime settings for a tuning session, stored as pretty-printed JSON.
//! Missing fields fall back to their defaults, so a config file only needs
//! the values it overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::{audio::BUFFER_SIZE, error::ConfigError};

/// Settings for capture, analysis cadence and device choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Requested capture rate in Hz (default: 44100).
    /// The analyzer always uses the rate the source actually delivers.
    pub sample_rate: u32,

    /// Samples per analysis block (default: 4096).
    pub buffer_size: usize,

    /// Pause between readings in milliseconds (default: 100).
    pub refresh_interval_ms: u64,

    /// Input device name; `None` picks the host default.
    pub device: Option<String>,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: BUFFER_SIZE,
            refresh_interval_ms: 100,
            device: None,
        }
    }
}

impl TunerConfig {
    /// Loads and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let config: TunerConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json_string = serde_json::to_string_pretty(self)?;
        fs::write(path, json_string)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        if self.buffer_size < 2 {
            return Err(ConfigError::InvalidBufferSize(self.buffer_size));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_uses_defaults() {
        let config: TunerConfig = serde_json::from_str(r#"{ "sample_rate": 48000 }"#).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_size, BUFFER_SIZE);
        assert_eq!(config.refresh_interval(), Duration::from_millis(100));
        assert_eq!(config.device, None);
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("tuner-config-{}.json", std::process::id()));
        let config = TunerConfig {
            sample_rate: 22050,
            buffer_size: 2048,
            refresh_interval_ms: 50,
            device: Some("USB Mic".into()),
        };
        config.save(&path).unwrap();
        assert_eq!(TunerConfig::load(&path).unwrap(), config);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn validation() {
        assert!(TunerConfig::default().validate().is_ok());
        let zero_rate = TunerConfig { sample_rate: 0, ..Default::default() };
        assert!(matches!(zero_rate.validate(), Err(ConfigError::InvalidSampleRate)));
        let tiny = TunerConfig { buffer_size: 1, ..Default::default() };
        assert!(matches!(tiny.validate(), Err(ConfigError::InvalidBufferSize(1))));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let path = std::env::temp_dir().join(format!("tuner-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(TunerConfig::load(&path), Err(ConfigError::Parse(_))));
        std::fs::remove_file(&path).ok();
    }
}
