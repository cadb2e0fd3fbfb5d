//! Bounded sample queue.
//!
//! Fixed-capacity FIFO between the sample producer and the delivery worker.
//! Overwrite-oldest on overflow: `push` never blocks and never fails, so the
//! producer is immune to a stalled uplink — under a sustained outage the
//! queue holds the most recent [`QUEUE_CAPACITY`] samples and silently sheds
//! the rest. A failed delivery goes back to the consumption end via
//! [`SampleQueue::requeue_front`] so it is the next one retried, without
//! reordering the organically produced samples behind it.
//!
//! [`SharedQueue`] is the cross-thread handle: one mutex held only for the
//! duration of a single queue operation. No queue operation ever waits for
//! space or for data.

use std::sync::{Arc, Mutex, PoisonError};

use heapless::Deque;

/// Fixed queue capacity.
pub const QUEUE_CAPACITY: usize = 16;

/// One timestamped, fault-annotated temperature reading.
/// Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Delivered temperature in Celsius (filtered for fault-free reads,
    /// raw for faulty ones).
    pub temperature_c: f64,
    /// Converter fault bitmask at capture time (0 = healthy).
    pub fault_flags: u8,
    /// Capture timestamp, UTC milliseconds.
    pub captured_at: i64,
}

/// The bounded FIFO itself. Not thread-safe; see [`SharedQueue`].
#[derive(Debug, Default)]
pub struct SampleQueue {
    buf: Deque<Sample, QUEUE_CAPACITY>,
}

impl SampleQueue {
    pub fn new() -> Self {
        Self { buf: Deque::new() }
    }

    /// Append a sample. If the queue is full the oldest entry is evicted
    /// first and returned, so the caller can surface the data loss.
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        let evicted = if self.buf.is_full() {
            self.buf.pop_front()
        } else {
            None
        };
        // Cannot fail: either there was room, or eviction just made some.
        let _ = self.buf.push_back(sample);
        evicted
    }

    /// Remove and return the oldest sample, or `None` if empty.
    pub fn pop(&mut self) -> Option<Sample> {
        self.buf.pop_front()
    }

    /// Reinsert a sample at the consumption end so it is retried next.
    ///
    /// In the pipeline a `requeue_front` always follows a `pop`, so there is
    /// room. The operation is still total: on a full queue it evicts the
    /// newest (back) entry, never the requeued sample.
    pub fn requeue_front(&mut self, sample: Sample) {
        if self.buf.is_full() {
            let _ = self.buf.pop_back();
        }
        let _ = self.buf.push_front(sample);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// SharedQueue — the cross-thread handle
// ───────────────────────────────────────────────────────────────

/// Clonable handle to the queue, shared between the two workers.
///
/// Every method locks, performs exactly one queue operation, and unlocks.
/// A poisoned lock is recovered rather than propagated: the queue state is
/// valid after any interrupted operation, and the watchdog handles a truly
/// wedged worker.
#[derive(Clone, Debug, Default)]
pub struct SharedQueue {
    inner: Arc<Mutex<SampleQueue>>,
}

impl SharedQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SampleQueue::new())),
        }
    }

    pub fn push(&self, sample: Sample) -> Option<Sample> {
        self.lock().push(sample)
    }

    pub fn pop(&self) -> Option<Sample> {
        self.lock().pop()
    }

    pub fn requeue_front(&self, sample: Sample) {
        self.lock().requeue_front(sample);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SampleQueue> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
