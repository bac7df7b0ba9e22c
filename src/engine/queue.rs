//! Bounded concurrent queue of harvested random entries.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Default queue capacity.
pub const QUEUE_CAPACITY: usize = 10240;

/// One harvested random value: the byte handed to clients and the raw
/// free-running counter it was sampled from.
///
/// Invariant: `byte == (raw % 256)`, captured at the instant the pulse
/// edge was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomEntry {
    /// The random byte, `raw` reduced modulo 256.
    pub byte: u8,
    /// The free-running counter value at capture time.
    pub raw: u32,
}

impl RandomEntry {
    /// Captures an entry from the current counter value.
    pub fn capture(counter: u32) -> Self {
        Self {
            byte: (counter % 256) as u8,
            raw: counter,
        }
    }
}

/// Bounded FIFO of [`RandomEntry`] with drop-oldest eviction.
///
/// Eviction fires when the queue already holds more than `capacity`
/// entries immediately before an insert, so the resident size can
/// transiently reach `capacity + 1`. All mutation happens under one
/// mutex; the producer pushes from the detection thread and the
/// consumer pops from the service context.
#[derive(Debug)]
pub struct EntropyQueue {
    inner: Mutex<VecDeque<RandomEntry>>,
    capacity: usize,
}

impl EntropyQueue {
    /// Creates a queue with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(QUEUE_CAPACITY)
    }

    /// Creates a queue with an explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity + 1)),
            capacity,
        }
    }

    /// Appends an entry, silently dropping the oldest entry first if
    /// the queue is over capacity.
    pub fn push(&self, entry: RandomEntry) {
        let mut queue = self.inner.lock();
        if queue.len() > self.capacity {
            queue.pop_front();
        }
        queue.push_back(entry);
    }

    /// Removes and returns the oldest entry together with the length
    /// observed at pop time (counting the entry being removed).
    /// Never blocks beyond the mutex.
    pub fn pop(&self) -> (Option<RandomEntry>, usize) {
        let mut queue = self.inner.lock();
        let observed = queue.len();
        (queue.pop_front(), observed)
    }

    /// Current number of resident entries. Advisory: the value may be
    /// stale by the time the caller acts on it.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True when no entries are resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The configured capacity `C`.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EntropyQueue {
    fn default() -> Self {
        Self::new()
    }
}
