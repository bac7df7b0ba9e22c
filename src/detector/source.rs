//! Analog sample source abstraction.
//!
//! This module provides a trait-based abstraction over the ADC channel,
//! allowing for both real detector hardware and mock implementations
//! for testing.

use super::DetectorConfig;
use thiserror::Error;

/// One unsigned analog reading from the detector channel.
///
/// Real converters in this class are 12-bit, so valid readings sit in
/// `0..4096`.
pub type Sample = u16;

/// Errors that can occur while operating a sample source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open channel: {0}")]
    OpenFailed(String),
    #[error("failed to configure channel: {0}")]
    ConfigFailed(String),
    #[error("failed to read sample: {0}")]
    ReadFailed(String),
    #[error("channel not initialized")]
    NotInitialized,
}

/// Trait for detector channel implementations.
///
/// This abstraction allows swapping between real ADC hardware and mock
/// implementations for testing. `read` blocks for the duration of one
/// conversion.
pub trait SampleSource {
    /// Opens and configures the analog channel.
    fn open(&mut self, config: &DetectorConfig) -> Result<(), SourceError>;

    /// Performs one blocking conversion and returns the reading.
    fn read(&mut self) -> Result<Sample, SourceError>;

    /// Checks whether the channel is currently open.
    fn is_open(&self) -> bool;
}

/// Mock detector that generates a synthetic pulse train.
///
/// Produces baseline noise with a spike above the detection threshold at
/// a fixed cadence, followed by a decaying tail so the falling-edge
/// debounce has something to wait out. Deterministic by construction:
/// NOT an entropy source, only a stand-in for the hardware.
#[derive(Debug, Default)]
pub struct MockDetector {
    config: Option<DetectorConfig>,
    tick: u64,
}

/// Ticks between synthetic pulses. Prime, so the pulse phase drifts
/// against any power-of-two consumer cadence.
const MOCK_PULSE_PERIOD: u64 = 977;

/// Ticks the synthetic pulse tail stays above the zero threshold.
const MOCK_TAIL_TICKS: u64 = 3;

impl MockDetector {
    /// Creates a closed mock detector.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SampleSource for MockDetector {
    fn open(&mut self, config: &DetectorConfig) -> Result<(), SourceError> {
        config
            .validate()
            .map_err(|e| SourceError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.tick = 0;
        tracing::info!(channel = config.channel, "MockDetector opened");
        Ok(())
    }

    fn read(&mut self) -> Result<Sample, SourceError> {
        let config = self.config.as_ref().ok_or(SourceError::NotInitialized)?;

        self.tick += 1;
        let phase = self.tick % MOCK_PULSE_PERIOD;
        if phase == 0 {
            // Pulse edge: well above the detection threshold.
            Ok(config.detect_threshold.saturating_add(200))
        } else if phase <= MOCK_TAIL_TICKS {
            // Decaying tail, still above the zero threshold.
            Ok(config.zero_threshold.saturating_add(50))
        } else {
            // Baseline noise under the zero threshold.
            Ok((self.tick * 31 % u64::from(config.zero_threshold.max(1))) as Sample)
        }
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }
}
