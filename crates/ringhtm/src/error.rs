//! Error types for queue construction and non-blocking pushes.

use std::fmt;
use thiserror::Error;

/// Errors returned when a queue cannot be built from a [`Config`](crate::Config).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A ring needs at least one slot.
    #[error("queue capacity must be non-zero")]
    ZeroCapacity,

    /// The backing storage would not fit in the address space.
    #[error("queue capacity {capacity} exceeds the maximum allocation size")]
    CapacityOverflow {
        /// The requested capacity.
        capacity: usize,
    },
}

/// Error returned by `try_push` when the ring has no free slot.
///
/// Carries the rejected value back to the caller. `Debug` and `Display` do not
/// require `T: Debug`, so the error can be propagated for any payload.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum TryPushError<T> {
    /// The ring is full.
    Full(T),
}

impl<T> TryPushError<T> {
    /// Returns the value that could not be pushed.
    #[inline]
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(value) => value,
        }
    }
}

impl<T> fmt::Debug for TryPushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => f.write_str("Full(..)"),
        }
    }
}

impl<T> fmt::Display for TryPushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => f.write_str("queue is full"),
        }
    }
}

impl<T> std::error::Error for TryPushError<T> {}
