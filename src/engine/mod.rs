//! Entropy detection engine.
//!
//! The engine owns the bounded entropy queue and the rate/latency
//! trackers, and runs the detection loop on a dedicated thread. Each
//! loop iteration reads one sample from the detector channel and
//! advances a free-running counter; when a sample crosses the detection
//! threshold, the counter is captured into the queue as a random entry.
//!
//! The randomness argument is an assumption, not a guarantee: the
//! counter wraps at a deterministic high frequency while pulse arrival
//! is physically random, so the counter value sampled at a pulse instant
//! is close to uniform modulo 256. No whitening or statistical health
//! test is applied to the output.

mod queue;

pub use queue::{EntropyQueue, RandomEntry, QUEUE_CAPACITY};

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::detector::{ConfigError, DetectorConfig, SampleSource, SourceError};
use crate::stats::{LoopLatencyTracker, MonotonicClock, RateTracker};

/// Sentinel value returned in place of a byte when the queue is empty.
pub const NO_DATA: u16 = 256;

/// Microseconds slept between re-samples while debouncing a falling edge.
const DEBOUNCE_SLEEP_US: u64 = 10;

/// Pulses between periodic tally log lines from the detection loop.
const TALLY_LOG_INTERVAL: u64 = 1000;

/// Result of popping the entropy queue.
///
/// `value` is `0..=255` for a real entry, or [`NO_DATA`] (with `raw` 0)
/// when the queue was empty. `available` is the queue length observed at
/// pop time, counting the entry being popped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Popped {
    /// The random byte, or [`NO_DATA`].
    pub value: u16,
    /// The raw counter the byte was sampled from, 0 for the sentinel.
    pub raw: u32,
    /// Queue length observed at pop time.
    pub available: usize,
}

/// Trackers mutated by the detection thread and read by the service
/// context. One mutex covers both so a stats read never observes a torn
/// multi-word update; staleness is acceptable.
#[derive(Debug, Default)]
struct TrackerSet {
    rate: RateTracker,
    latency: LoopLatencyTracker,
}

/// The entropy detection engine.
///
/// Constructed once at startup and shared by handle between the
/// detection thread and the protocol server.
pub struct EntropyEngine {
    config: DetectorConfig,
    queue: EntropyQueue,
    stats: Mutex<TrackerSet>,
    pulses: AtomicU64,
    clock: MonotonicClock,
}

impl EntropyEngine {
    /// Creates an engine for the given detector configuration.
    pub fn new(config: DetectorConfig) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;
        Ok(Arc::new(Self {
            config,
            queue: EntropyQueue::new(),
            stats: Mutex::new(TrackerSet::default()),
            pulses: AtomicU64::new(0),
            clock: MonotonicClock::new(),
        }))
    }

    /// One-time setup of the analog channel. Must succeed before
    /// [`start_detection`](Self::start_detection).
    pub fn init(&self, source: &mut impl SampleSource) -> Result<(), SourceError> {
        source.open(&self.config)?;
        tracing::info!(
            channel = self.config.channel,
            detect_threshold = self.config.detect_threshold,
            zero_threshold = self.config.zero_threshold,
            "detector channel initialized"
        );
        Ok(())
    }

    /// Launches the detection loop on a dedicated thread and returns
    /// immediately. Fire-and-forget: no join handle is kept and the
    /// loop runs for the process lifetime.
    pub fn start_detection<S>(self: &Arc<Self>, mut source: S)
    where
        S: SampleSource + Send + 'static,
    {
        if !source.is_open() {
            fatal("detector channel not initialized before detection start");
        }

        let engine = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("detection".into())
            .spawn(move || {
                engine.stats.lock().rate.start(engine.clock.now_us());
                let mut roulette: u32 = 0;
                loop {
                    if let Err(e) = engine.poll_iteration(&mut source, &mut roulette) {
                        tracing::error!(error = %e, "detector read fault");
                        fatal("unrecoverable detector fault in detection loop");
                    }
                }
            });

        if spawned.is_err() {
            fatal("failed to launch detection thread");
        }
    }

    /// Runs one iteration of the detection loop.
    ///
    /// The free-running counter advances exactly once per call, pulse or
    /// not; its deterministic high frequency against the physically
    /// random pulse timing is what yields near-uniform sampled bytes.
    fn poll_iteration(
        &self,
        source: &mut impl SampleSource,
        roulette: &mut u32,
    ) -> Result<(), SourceError> {
        let sample = source.read()?;
        let started = self.clock.now_us();

        if sample > self.config.detect_threshold {
            self.queue.push(RandomEntry::capture(*roulette));

            let tally = self.pulses.fetch_add(1, Ordering::Relaxed) + 1;
            self.stats.lock().rate.on_pulse(self.clock.now_us());
            if tally % TALLY_LOG_INTERVAL == 0 {
                tracing::debug!(pulses = tally, queued = self.queue.len(), "pulse tally");
            }

            // Debounce the falling edge so one physical pulse is not
            // recorded twice.
            loop {
                let decay = source.read()?;
                if decay <= self.config.zero_threshold {
                    break;
                }
                thread::sleep(Duration::from_micros(DEBOUNCE_SLEEP_US));
            }
        }

        *roulette = roulette.wrapping_add(1);

        let ended = self.clock.now_us();
        let mut stats = self.stats.lock();
        stats.latency.begin(started);
        stats.latency.end(ended);
        Ok(())
    }

    /// Pops the oldest random entry, or the sentinel if none is queued.
    /// Never blocks beyond the queue mutex.
    pub fn pop_random(&self) -> Popped {
        match self.queue.pop() {
            (Some(entry), observed) => Popped {
                value: u16::from(entry.byte),
                raw: entry.raw,
                available: observed,
            },
            (None, _) => Popped {
                value: NO_DATA,
                raw: 0,
                available: 0,
            },
        }
    }

    /// Current queue length. Advisory only.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Lifetime pulse tally.
    pub fn pulse_count(&self) -> u64 {
        self.pulses.load(Ordering::Relaxed)
    }

    /// Produces the diagnostics line served for the `sta` request:
    /// `cpm:<last>:<avg>:loop:<min>:<max>:<under>:<above>`.
    pub fn format_stats(&self) -> String {
        let stats = self.stats.lock();
        format!(
            "cpm:{}:{}:loop:{}:{}:{}:{}",
            stats.rate.last_minute(),
            stats.rate.average().unwrap_or(0),
            stats.latency.min(),
            stats.latency.max(),
            stats.latency.under_count(),
            stats.latency.above_count()
        )
    }

    #[cfg(test)]
    pub(crate) fn push_entry(&self, entry: RandomEntry) {
        self.queue.push(entry);
    }
}

/// Logs an unrecoverable fault and halts the calling thread forever in
/// a low-duty sleep loop. Firmware-style failure escalation: there is no
/// caller able to unwind to, so the thread parks instead of panicking.
pub fn fatal(msg: &str) -> ! {
    tracing::error!(message = msg, "fatal fault, halting");
    loop {
        thread::sleep(Duration::from_secs(1));
    }
}
