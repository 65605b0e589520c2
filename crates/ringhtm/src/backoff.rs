use crate::sync::{spin_loop, yield_now};
use crate::WaitStrategy;

/// Exponential spin that turns into `yield_now` once the ring stays blocked.
#[derive(Debug, Default)]
pub(crate) struct Backoff {
    step: u32,
}

impl Backoff {
    /// Up to 2^6 PAUSEs per snooze before yielding.
    const SPIN_LIMIT: u32 = 6;

    #[inline]
    pub(crate) fn snooze(&mut self) {
        if self.is_yielding() {
            yield_now();
            return;
        }
        for _ in 0..1u32 << self.step {
            spin_loop();
        }
        self.step += 1;
    }

    #[inline]
    fn is_yielding(&self) -> bool {
        self.step > Self::SPIN_LIMIT
    }
}

/// Busy-waits until `ready` returns true.
///
/// There is no timeout: if the other side never makes progress this never
/// returns. Returns `true` if at least one wait iteration was needed.
#[inline]
pub(crate) fn wait_until<F>(strategy: WaitStrategy, mut ready: F) -> bool
where
    F: FnMut() -> bool,
{
    if ready() {
        return false;
    }

    match strategy {
        WaitStrategy::Spin => {
            while !ready() {
                spin_loop();
            }
        }
        WaitStrategy::SpinThenYield => {
            let mut backoff = Backoff::default();
            while !ready() {
                backoff.snooze();
            }
        }
    }
    true
}
