//! Geiger-Muller Entropy Source Library
//!
//! A hardware entropy source that samples a Geiger-Muller radiation
//! detector through an analog channel, extracts random bytes from
//! pulse-arrival jitter, buffers them in a bounded concurrent queue,
//! and serves them to a remote client over a line-oriented TCP
//! protocol alongside live rate/latency diagnostics.
//!
//! # Architecture
//!
//! ```text
//! detector channel → detection loop → entropy queue → protocol server
//!                         ↓
//!               rate / latency statistics
//! ```
//!
//! The detection loop runs on a dedicated thread: every iteration reads
//! one sample and advances a free-running counter; a sample crossing
//! the detection threshold captures the counter (modulo 256) into the
//! queue. The protocol server runs on the service context and answers
//! `req`/`sta`/`end` tokens from a single client at a time.
//!
//! # Design Principles
//!
//! - **Raw output**: no whitening or statistical health testing; the
//!   near-uniformity of sampled bytes is a documented assumption about
//!   counter-wrap frequency versus pulse-timing jitter, not a
//!   cryptographic guarantee.
//! - **Bounded buffering**: the queue drops its oldest entry on
//!   overflow, silently.
//! - **Firmware-style failure handling**: unrecoverable detector faults
//!   halt their thread forever; there is no graceful shutdown path.
//!
//! # Example
//!
//! ```no_run
//! use geiger_entropy::{
//!     detector::{DetectorConfig, MockDetector},
//!     engine::EntropyEngine,
//!     server::{ProtocolServer, ServerConfig},
//! };
//!
//! let engine = EntropyEngine::new(DetectorConfig::default()).unwrap();
//!
//! let mut source = MockDetector::new();
//! engine.init(&mut source).unwrap();
//! engine.start_detection(source);
//!
//! let server = ProtocolServer::new(ServerConfig::default(), engine);
//! let runtime = tokio::runtime::Builder::new_current_thread()
//!     .enable_all()
//!     .build()
//!     .unwrap();
//! runtime.block_on(server.run()).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod detector;
pub mod engine;
pub mod server;
pub mod stats;

// Re-export commonly used types at crate root
pub use detector::{DetectorConfig, FileConfig, MockDetector, Sample, SampleSource};
pub use engine::{EntropyEngine, EntropyQueue, Popped, RandomEntry, NO_DATA, QUEUE_CAPACITY};
pub use server::{ProtocolServer, ServerConfig, SessionEnd, DEFAULT_PORT};
pub use stats::{IntervalTimer, LoopLatencyTracker, MonotonicClock, RateTracker};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
