//! Debug assertion macros for ring buffer invariants.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so there is zero
//! overhead in release builds. Used by `Ring<T>` on both the SPSC and MPSC
//! paths.

// =============================================================================
// Bounded Occupancy
// =============================================================================

/// Assert that occupancy never exceeds capacity.
///
/// **Invariant**: `0 ≤ occupancy ≤ capacity` (the lower bound is implied by `usize`)
///
/// Used in: `publish()` after the increment
macro_rules! debug_assert_bounded_occupancy {
    ($occupancy:expr, $capacity:expr) => {
        debug_assert!(
            $occupancy <= $capacity,
            "occupancy {} exceeds capacity {}",
            $occupancy,
            $capacity
        )
    };
}

// =============================================================================
// Index Range
// =============================================================================

/// Assert that a head or tail index lies in `[0, capacity)`.
///
/// Used in: `write_slot()` and `read_slot()` before touching the buffer
macro_rules! debug_assert_index_in_range {
    ($name:literal, $idx:expr, $capacity:expr) => {
        debug_assert!(
            $idx < $capacity,
            "{} index {} outside [0, {})",
            $name,
            $idx,
            $capacity
        )
    };
}

// =============================================================================
// Slot Ownership
// =============================================================================

/// Assert that the producer only writes while a slot is free.
///
/// **Invariant**: slot `tail` may be written only while `occupancy < capacity`
macro_rules! debug_assert_slot_writable {
    ($occupancy:expr, $capacity:expr) => {
        debug_assert!(
            $occupancy < $capacity,
            "writing into a full ring (occupancy {}, capacity {})",
            $occupancy,
            $capacity
        )
    };
}

/// Assert that the consumer only reads a published slot.
///
/// **Invariant**: slot `head` holds a value only while `occupancy > 0`
macro_rules! debug_assert_slot_readable {
    ($occupancy:expr) => {
        debug_assert!(
            $occupancy > 0,
            "reading from an empty ring (occupancy {})",
            $occupancy
        )
    };
}

pub(crate) use debug_assert_bounded_occupancy;
pub(crate) use debug_assert_index_in_range;
pub(crate) use debug_assert_slot_readable;
pub(crate) use debug_assert_slot_writable;
