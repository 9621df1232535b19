use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic diagnostic counters. The only shared mutable state the
/// pipeline holds; updated with relaxed atomics so concurrent adapter
/// threads never contend.
#[derive(Debug, Default)]
pub struct PipelineCounters {
    pub received: AtomicU64,
    pub stored: AtomicU64,
    pub malformed: AtomicU64,
    pub delivery_retries: AtomicU64,
    pub instruction_updates: AtomicU64,
}

impl PipelineCounters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            received: self.received.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            delivery_retries: self.delivery_retries.load(Ordering::Relaxed),
            instruction_updates: self.instruction_updates.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PipelineCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    pub received: u64,
    pub stored: u64,
    pub malformed: u64,
    pub delivery_retries: u64,
    pub instruction_updates: u64,
}
