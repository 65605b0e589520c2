use crate::backoff::wait_until;
use crate::invariants::{
    debug_assert_bounded_occupancy, debug_assert_index_in_range, debug_assert_slot_readable,
    debug_assert_slot_writable,
};
use crate::metrics::QueueMetrics;
use crate::sync::{AtomicUsize, Ordering};
use crate::{Config, ConfigError, MetricsSnapshot, WaitStrategy};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::{self, MaybeUninit};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// `head` and `tail` are plain wrapped indices in `[0, capacity)`. Neither is
// ever read by the other side: the consumer owns `head`, the producer (or
// whoever holds the producer lock) owns `tail`. The only shared word is
// `occupancy`.
//
// **Producer (push):**
// 1. Wait until `occupancy < capacity` (Acquire: the consumer's Release
//    decrement means it has finished reading the slot we are about to reuse)
// 2. Write `buffer[tail]`, advance `tail`
// 3. `occupancy.fetch_add(1, AcqRel)` publishes the slot
//
// **Consumer (pop):**
// 1. Wait until `occupancy > 0` (Acquire: pairs with the producer's increment)
// 2. Read `buffer[head]`, advance `head`
// 3. `occupancy.fetch_sub(1, AcqRel)` hands the slot back
//
// Every write to `occupancy` is a read-modify-write, so an Acquire load that
// observes any of them synchronizes with all earlier Release increments, no
// matter which producer made them.
//
// With several producers, steps 2-3 must run under the producer lock; the
// ring itself does not know about it.
//
// =============================================================================

/// Fixed-capacity ring shared by the SPSC and MPSC queues.
pub(crate) struct Ring<T> {
    /// Next slot to pop (consumer only)
    head: CachePadded<UnsafeCell<usize>>,
    /// Next slot to push (producer, or producer-lock holder)
    tail: CachePadded<UnsafeCell<usize>>,
    /// Number of published slots, in `[0, capacity]`
    occupancy: CachePadded<AtomicUsize>,

    capacity: usize,
    wait: WaitStrategy,
    enable_metrics: bool,
    metrics: QueueMetrics,

    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// Safety: Ring is Send + Sync as long as T is Send.
// Slots are handed between threads through `occupancy`; indices are single-owner.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    pub(crate) fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let capacity = config.capacity;
        let slot_size = mem::size_of::<T>().max(1);
        if capacity > isize::MAX as usize / slot_size {
            return Err(ConfigError::CapacityOverflow { capacity });
        }

        let buffer = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();

        Ok(Self {
            head: CachePadded::new(UnsafeCell::new(0)),
            tail: CachePadded::new(UnsafeCell::new(0)),
            occupancy: CachePadded::new(AtomicUsize::new(0)),
            capacity,
            wait: config.wait,
            enable_metrics: config.enable_metrics,
            metrics: QueueMetrics::new(),
            buffer,
        })
    }

    // ---------------------------------------------------------------------
    // STATUS
    // ---------------------------------------------------------------------

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.occupancy.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn has_space(&self) -> bool {
        self.occupancy.load(Ordering::Acquire) < self.capacity
    }

    #[inline]
    pub(crate) fn has_items(&self) -> bool {
        self.occupancy.load(Ordering::Acquire) > 0
    }

    #[inline]
    fn next(&self, idx: usize) -> usize {
        if idx + 1 == self.capacity {
            0
        } else {
            idx + 1
        }
    }

    // ---------------------------------------------------------------------
    // WAITS
    // ---------------------------------------------------------------------

    /// Spins until a slot is free. No timeout.
    #[inline]
    pub(crate) fn wait_for_space(&self) {
        if wait_until(self.wait, || self.has_space()) && self.enable_metrics {
            self.metrics.add_full_wait();
        }
    }

    /// Spins until a slot is published. No timeout.
    #[inline]
    pub(crate) fn wait_for_item(&self) {
        if wait_until(self.wait, || self.has_items()) && self.enable_metrics {
            self.metrics.add_empty_wait();
        }
    }

    // ---------------------------------------------------------------------
    // SLOT ACCESS
    // ---------------------------------------------------------------------

    /// Writes `value` at `tail`, advances `tail` and publishes the slot.
    ///
    /// Performs no metrics update so it can run inside a hardware transaction
    /// without widening its write set.
    ///
    /// # Safety
    ///
    /// The caller must be the only thread touching `tail` (the SPSC producer,
    /// or the holder of the MPSC producer lock) and must have observed
    /// `occupancy < capacity` since its last push.
    #[inline]
    pub(crate) unsafe fn write_slot(&self, value: T) {
        let tail = *self.tail.get();
        debug_assert_index_in_range!("tail", tail, self.capacity);
        debug_assert_slot_writable!(self.occupancy.load(Ordering::Relaxed), self.capacity);

        (*self.buffer[tail].get()).write(value);
        *self.tail.get() = self.next(tail);

        let prev = self.occupancy.fetch_add(1, Ordering::AcqRel);
        debug_assert_bounded_occupancy!(prev + 1, self.capacity);
    }

    /// Moves the value out of `head`, advances `head` and frees the slot.
    ///
    /// # Safety
    ///
    /// The caller must be the single consumer and must have observed
    /// `occupancy > 0` since its last pop.
    #[inline]
    pub(crate) unsafe fn read_slot(&self) -> T {
        let head = *self.head.get();
        debug_assert_index_in_range!("head", head, self.capacity);
        debug_assert_slot_readable!(self.occupancy.load(Ordering::Relaxed));

        let value = (*self.buffer[head].get()).assume_init_read();
        *self.head.get() = self.next(head);

        self.occupancy.fetch_sub(1, Ordering::AcqRel);
        value
    }

    // ---------------------------------------------------------------------
    // METRICS
    // ---------------------------------------------------------------------

    #[inline]
    pub(crate) fn record_push(&self) {
        if self.enable_metrics {
            self.metrics.add_pushed(1);
        }
    }

    #[inline]
    pub(crate) fn record_pop(&self) {
        if self.enable_metrics {
            self.metrics.add_popped(1);
        }
    }

    pub(crate) fn metrics(&self) -> MetricsSnapshot {
        if self.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        // Drop all values still buffered
        let count = self.occupancy.load(Ordering::Acquire);
        let mut idx = *self.head.get_mut();

        for _ in 0..count {
            // SAFETY: the `count` slots starting at `head` hold initialized
            // values, and `&mut self` rules out concurrent access.
            unsafe { self.buffer[idx].get_mut().assume_init_drop() };
            idx = self.next(idx);
        }
    }
}
