//! Single-producer single-consumer queue.
//!
//! The producer and consumer coordinate only through the ring's atomic
//! occupancy counter; there is no lock. Each role is a unique handle taking
//! `&mut self`, so the one-producer/one-consumer contract holds by ownership.
//!
//! # Example
//!
//! ```
//! use ringhtm_rs::{spsc, Config};
//!
//! let (mut tx, mut rx) = spsc::channel::<u32>(Config::new(4)).unwrap();
//! let producer = std::thread::spawn(move || {
//!     for i in 0..100 {
//!         tx.push(i);
//!     }
//! });
//! for i in 0..100 {
//!     assert_eq!(rx.pop(), i);
//! }
//! producer.join().unwrap();
//! ```

use crate::ring::Ring;
use crate::{Config, ConfigError, MetricsSnapshot, TryPushError};
use std::sync::Arc;

/// Shared state of an SPSC queue, reachable from both handles.
pub struct SpscQueue<T> {
    ring: Ring<T>,
}

impl<T> SpscQueue<T> {
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

    /// Counters, all zero unless `Config::enable_metrics` was set.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.ring.metrics()
    }
}

/// Creates an SPSC queue and returns its two ends.
pub fn channel<T>(config: Config) -> Result<(Producer<T>, Consumer<T>), ConfigError> {
    let queue = Arc::new(SpscQueue {
        ring: Ring::new(&config)?,
    });
    Ok((
        Producer {
            queue: Arc::clone(&queue),
        },
        Consumer { queue },
    ))
}

/// The single writing end of an SPSC queue.
pub struct Producer<T> {
    queue: Arc<SpscQueue<T>>,
}

impl<T> Producer<T> {
    /// Pushes `value`, spinning while the queue is full.
    ///
    /// Never fails and cannot be cancelled: if the consumer stops popping
    /// this waits forever.
    #[inline]
    pub fn push(&mut self, value: T) {
        let ring = &self.queue.ring;
        ring.wait_for_space();
        // SAFETY: `&mut self` on the unique producer makes this the only
        // writer of `tail`; space was observed just above.
        unsafe { ring.write_slot(value) };
        ring.record_push();
    }

    /// Pushes `value` if a slot is free, otherwise hands it back.
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<(), TryPushError<T>> {
        let ring = &self.queue.ring;
        if !ring.has_space() {
            return Err(TryPushError::Full(value));
        }
        // SAFETY: as in `push`.
        unsafe { ring.write_slot(value) };
        ring.record_push();
        Ok(())
    }

    /// The shared queue state.
    #[inline]
    pub fn queue(&self) -> &SpscQueue<T> {
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

/// The single reading end of an SPSC queue.
pub struct Consumer<T> {
    queue: Arc<SpscQueue<T>>,
}

impl<T> Consumer<T> {
    /// Pops the oldest value, spinning while the queue is empty.
    ///
    /// Never fails and cannot be cancelled: if the producer stops pushing
    /// this waits forever.
    #[inline]
    pub fn pop(&mut self) -> T {
        let ring = &self.queue.ring;
        ring.wait_for_item();
        // SAFETY: `&mut self` on the unique consumer makes this the only
        // reader of `head`; an item was observed just above.
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
    pub fn queue(&self) -> &SpscQueue<T> {
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
