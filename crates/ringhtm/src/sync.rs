//! Synchronization primitives with optional loom support.
//!
//! Production builds use `std` atomics. With the `loom` feature enabled the
//! same names resolve to loom's model-checked atomics, so the lock and ring
//! protocols can be explored exhaustively by `tests/loom_tests.rs`.

#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

#[cfg(feature = "loom")]
pub(crate) use loom::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Spin loop hint for busy waiting.
///
/// Under loom this yields instead, otherwise a spinning thread would never let
/// the model scheduler run the thread it is waiting on.
#[inline]
pub(crate) fn spin_loop() {
    #[cfg(not(feature = "loom"))]
    std::hint::spin_loop();

    #[cfg(feature = "loom")]
    loom::thread::yield_now();
}

/// Cooperative yield to the OS scheduler (or the loom scheduler).
#[inline]
pub(crate) fn yield_now() {
    #[cfg(not(feature = "loom"))]
    std::thread::yield_now();

    #[cfg(feature = "loom")]
    loom::thread::yield_now();
}
