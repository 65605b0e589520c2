use crate::sync::{AtomicU64, Ordering};

/// Thread-safe queue counters, updated with relaxed atomics.
///
/// Only touched when `Config::enable_metrics` is set.
#[derive(Debug)]
pub(crate) struct QueueMetrics {
    pushed: AtomicU64,
    popped: AtomicU64,
    full_waits: AtomicU64,
    empty_waits: AtomicU64,
}

impl QueueMetrics {
    pub(crate) fn new() -> Self {
        Self {
            pushed: AtomicU64::new(0),
            popped: AtomicU64::new(0),
            full_waits: AtomicU64::new(0),
            empty_waits: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn add_pushed(&self, n: u64) {
        self.pushed.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_popped(&self, n: u64) {
        self.popped.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_full_wait(&self) {
        self.full_waits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_empty_wait(&self) {
        self.empty_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pushed: self.pushed.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
            full_waits: self.full_waits.load(Ordering::Relaxed),
            empty_waits: self.empty_waits.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a queue's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Values written into the ring.
    pub pushed: u64,
    /// Values read out of the ring.
    pub popped: u64,
    /// Pushes that found the ring full and had to wait.
    pub full_waits: u64,
    /// Pops that found the ring empty and had to wait.
    pub empty_waits: u64,
}

/// Point-in-time copy of a [`HybridLock`](crate::HybridLock)'s path counters.
///
/// Diagnostic only; nothing in the lock protocol reads these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockStats {
    /// Critical sections committed as hardware transactions.
    pub transactional: u64,
    /// Critical sections run under the fallback flag.
    pub fallback: u64,
    /// Transactions aborted because a fallback holder owned the flag.
    pub lock_held_aborts: u64,
}

impl LockStats {
    /// Total completed critical sections on either path.
    pub fn total(&self) -> u64 {
        self.transactional + self.fallback
    }
}
