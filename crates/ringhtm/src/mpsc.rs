//! Multi-producer single-consumer queue.
//!
//! Producers serialize the write-slot / advance-tail / publish sequence on a
//! [`ProducerLock`] picked once at construction from [`Config::lock`]. The
//! consumer takes no lock: it alone moves `head`, and the atomic occupancy
//! decrement is all the producers need to see.
//!
//! # Example
//!
//! ```
//! use ringhtm_rs::{mpsc, Config, LockStrategy};
//!
//! let config = Config::new(64).with_lock(LockStrategy::Spin);
//! let (tx, mut rx) = mpsc::channel::<(usize, u32)>(config).unwrap();
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|id| {
//!         let tx = tx.clone();
//!         std::thread::spawn(move || {
//!             for i in 0..100 {
//!                 tx.push((id, i));
//!             }
//!         })
//!     })
//!     .collect();
//!
//! let mut received = 0;
//! while received < 400 {
//!     rx.pop();
//!     received += 1;
//! }
//! for h in handles {
//!     h.join().unwrap();
//! }
//! ```

use crate::backend::ProducerLock;
use crate::ring::Ring;
use crate::{Config, ConfigError, LockStats, LockStrategy, MetricsSnapshot, TryPushError};
use std::sync::Arc;

/// Shared state of an MPSC queue, reachable from every handle.
pub struct MpscQueue<T> {
    ring: Ring<T>,
    lock: ProducerLock,
}

impl<T> MpscQueue<T> {
    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Momentary occupancy; advisory only.
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// The producer lock in use; `Auto` has already been resolved.
    pub fn lock_strategy(&self) -> LockStrategy {
        self.lock.strategy()
    }

    /// Hybrid lock path counters, when the hybrid lock is in use and metrics are on.
    pub fn lock_stats(&self) -> Option<LockStats> {
        self.lock.stats()
    }

    /// Counters, all zero unless `Config::enable_metrics` was set.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.ring.metrics()
    }

    /// One locked attempt; gives the value back if the ring filled up
    /// between the unlocked wait and the lock.
    #[inline]
    fn push_locked(&self, value: T) -> Result<(), T> {
        let pushed = self.lock.with_lock(|| {
            if !self.ring.has_space() {
                return Err(value);
            }
            // SAFETY: the producer lock makes this thread the only writer of
            // `tail`; space was observed while holding it.
            unsafe { self.ring.write_slot(value) };
            Ok(())
        });
        if pushed.is_ok() {
            self.ring.record_push();
        }
        pushed
    }
}

/// Creates an MPSC queue and returns a producer (clone it for more) and the consumer.
pub fn channel<T>(config: Config) -> Result<(Producer<T>, Consumer<T>), ConfigError> {
    let ring = Ring::new(&config)?;
    let queue = Arc::new(MpscQueue {
        ring,
        lock: ProducerLock::from_config(&config),
    });
    Ok((
        Producer {
            queue: Arc::clone(&queue),
        },
        Consumer { queue },
    ))
}

/// A writing end of an MPSC queue. Clone it to add producers.
pub struct Producer<T> {
    queue: Arc<MpscQueue<T>>,
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<T> Producer<T> {
    /// Pushes `value`, spinning while the queue is full.
    ///
    /// The full-wait happens before the producer lock is taken, so a waiting
    /// producer never blocks the others. Never fails and cannot be cancelled.
    #[inline]
    pub fn push(&self, value: T) {
        let mut value = value;
        loop {
            self.queue.ring.wait_for_space();
            match self.queue.push_locked(value) {
                Ok(()) => return,
                // Another producer took the last slot first.
                Err(rejected) => value = rejected,
            }
        }
    }

    /// Pushes `value` if a slot is free, otherwise hands it back.
    ///
    /// Still takes the producer lock, so it may briefly spin on contention.
    #[inline]
    pub fn try_push(&self, value: T) -> Result<(), TryPushError<T>> {
        if !self.queue.ring.has_space() {
            return Err(TryPushError::Full(value));
        }
        self.queue.push_locked(value).map_err(TryPushError::Full)
    }

    /// The shared queue state.
    #[inline]
    pub fn queue(&self) -> &MpscQueue<T> {
        &self.queue
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}

/// The single reading end of an MPSC queue.
pub struct Consumer<T> {
    queue: Arc<MpscQueue<T>>,
}

impl<T> Consumer<T> {
    /// Pops the oldest value, spinning while the queue is empty.
    ///
    /// Never fails and cannot be cancelled.
    #[inline]
    pub fn pop(&mut self) -> T {
        let ring = &self.queue.ring;
        ring.wait_for_item();
        // SAFETY: the unique consumer is the only reader of `head`; an item
        // was observed just above.
        let value = unsafe { ring.read_slot() };
        ring.record_pop();
        value
    }

    /// Pops the oldest value if there is one.
    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        let ring = &self.queue.ring;
        if !ring.has_items() {
            return None;
        }
        // SAFETY: as in `pop`.
        let value = unsafe { ring.read_slot() };
        ring.record_pop();
        Some(value)
    }

    /// The shared queue state.
    #[inline]
    pub fn queue(&self) -> &MpscQueue<T> {
        &self.queue
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}
