//! Detector and service configuration.
//!
//! Threshold settings are fixed at startup: the detection threshold
//! decides what counts as an ionization pulse, and the zero threshold
//! decides when the pulse has decayed enough to resume detection.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::detector::Sample;

/// Highest reading a 12-bit converter can produce.
pub const ADC_FULL_SCALE: Sample = 4095;

/// Configuration for the detector channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Analog input pin the tube's amplifier is wired to.
    pub channel: u32,
    /// Readings above this value count as a pulse edge.
    pub detect_threshold: Sample,
    /// Readings must fall below this value before detection resumes
    /// (falling-edge debounce baseline).
    pub zero_threshold: Sample,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            channel: 31,
            detect_threshold: 2500,
            zero_threshold: 100,
        }
    }
}

impl DetectorConfig {
    /// Validates the threshold configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detect_threshold > ADC_FULL_SCALE {
            return Err(ConfigError::ThresholdOutOfRange);
        }
        if self.zero_threshold >= self.detect_threshold {
            return Err(ConfigError::ThresholdsInverted);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("detection threshold exceeds the ADC range")]
    ThresholdOutOfRange,
    #[error("zero threshold must be below the detection threshold")]
    ThresholdsInverted,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// `[server]` section of the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// TCP port the protocol server listens on.
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { port: 6666 }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub server: ServerSection,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.detector.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detect_threshold, 2500);
        assert_eq!(config.zero_threshold, 100);
    }

    #[test]
    fn test_threshold_beyond_adc_range() {
        let mut config = DetectorConfig::default();
        config.detect_threshold = ADC_FULL_SCALE + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange)
        ));
    }

    #[test]
    fn test_inverted_thresholds() {
        let mut config = DetectorConfig::default();
        config.zero_threshold = config.detect_threshold;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdsInverted)
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = FileConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: FileConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.detector.channel, config.detector.channel);
        assert_eq!(parsed.server.port, 6666);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: FileConfig = toml::from_str("[server]\nport = 7000\n").unwrap();
        assert_eq!(parsed.server.port, 7000);
        assert_eq!(parsed.detector.detect_threshold, 2500);
    }
}
