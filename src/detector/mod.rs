//! Detector input and configuration.
//!
//! This module provides the abstraction over the analog channel the
//! Geiger tube is wired to. The channel is treated as a source of raw
//! voltage samples; pulse detection and entropy extraction live in the
//! engine.

mod config;
mod source;

pub use config::{ConfigError, DetectorConfig, FileConfig, ServerSection};
pub use source::{MockDetector, Sample, SampleSource, SourceError};
