//! Producer-side lock selection for [`MpscQueue`](crate::MpscQueue).

use crate::htm::TxBackend;
use crate::sync::{spin_loop, AtomicBool, Ordering};
use crate::{has_htm, Config, HybridGuard, HybridLock, LockStats, LockStrategy, SpinGuard, SpinLock};
use crossbeam_utils::CachePadded;

/// A mutual-exclusion primitive whose guard ends the critical section on drop.
pub trait RawLock {
    /// Scoped acquisition.
    type Guard<'a>
    where
        Self: 'a;

    /// Spins until the critical section is entered.
    fn lock(&self) -> Self::Guard<'_>;
}

impl RawLock for SpinLock {
    type Guard<'a> = SpinGuard<'a>;

    #[inline]
    fn lock(&self) -> SpinGuard<'_> {
        SpinLock::lock(self)
    }
}

impl<B: TxBackend> RawLock for HybridLock<B> {
    type Guard<'a> = HybridGuard<'a, B>
    where
        Self: 'a;

    #[inline]
    fn lock(&self) -> HybridGuard<'_, B> {
        HybridLock::lock(self)
    }
}

/// Bare busy-wait flag: every retry is a test-and-set write.
#[derive(Debug)]
pub(crate) struct FlagLock {
    flag: AtomicBool,
}

pub(crate) struct FlagGuard<'a> {
    flag: &'a AtomicBool,
}

impl FlagLock {
    pub(crate) fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }
}

impl RawLock for FlagLock {
    type Guard<'a> = FlagGuard<'a>;

    #[inline]
    fn lock(&self) -> FlagGuard<'_> {
        while self.flag.swap(true, Ordering::Acquire) {
            spin_loop();
        }
        FlagGuard { flag: &self.flag }
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// The lock an MPSC queue's producers serialize on, chosen once at construction.
#[derive(Debug)]
pub(crate) enum ProducerLock {
    Flag(CachePadded<FlagLock>),
    Spin(CachePadded<SpinLock>),
    Hybrid(HybridLock),
}

impl ProducerLock {
    /// Resolves `LockStrategy::Auto` against the capability probe.
    pub(crate) fn from_config(config: &Config) -> Self {
        let strategy = match config.lock {
            LockStrategy::Auto if has_htm() => LockStrategy::Hybrid,
            LockStrategy::Auto => LockStrategy::Spin,
            other => other,
        };

        if strategy == LockStrategy::Hybrid && !has_htm() {
            log::info!("hybrid producer lock requested without RTM support; using its fallback path only");
        }
        log::debug!("mpsc producer lock: requested {:?}, using {:?}", config.lock, strategy);

        match strategy {
            LockStrategy::Flag => Self::Flag(CachePadded::new(FlagLock::new())),
            LockStrategy::Spin | LockStrategy::Auto => Self::Spin(CachePadded::new(SpinLock::new())),
            LockStrategy::Hybrid => Self::Hybrid(
                HybridLock::new()
                    .with_max_retries(config.max_tx_retries)
                    .with_stats(config.enable_metrics),
            ),
        }
    }

    /// The strategy actually in use (never `Auto`).
    pub(crate) fn strategy(&self) -> LockStrategy {
        match self {
            Self::Flag(_) => LockStrategy::Flag,
            Self::Spin(_) => LockStrategy::Spin,
            Self::Hybrid(_) => LockStrategy::Hybrid,
        }
    }

    pub(crate) fn stats(&self) -> Option<LockStats> {
        match self {
            Self::Hybrid(lock) => lock.stats(),
            _ => None,
        }
    }

    /// Runs `f` as the critical section.
    ///
    /// Under a transactional hybrid acquisition `f` may run speculatively and
    /// be rolled back and re-run; it must not have effects outside memory.
    #[inline]
    pub(crate) fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        match self {
            Self::Flag(lock) => locked(&**lock, f),
            Self::Spin(lock) => locked(&**lock, f),
            Self::Hybrid(lock) => locked(lock, f),
        }
    }
}

#[inline]
fn locked<L: RawLock, R>(lock: &L, f: impl FnOnce() -> R) -> R {
    let _guard = lock.lock();
    f()
}
