use crate::htm::{Rtm, TxBackend, TxStatus};
use crate::sync::{spin_loop, AtomicBool, AtomicU64, Ordering};
use crate::{has_htm, Config, LockStats};
use crossbeam_utils::CachePadded;
use std::marker::PhantomData;

// =============================================================================
// LOCK ELISION PROTOCOL
// =============================================================================
//
// Transactional and fallback holders contend on the same `flag`:
//
// 1. Up to `max_retries` times, begin a hardware transaction.
// 2. Inside it, read `flag`. The read puts the flag in the transaction's read
//    set, so a later fallback acquisition (a write) aborts the transaction.
//    If the flag is already HELD, abort explicitly with LOCK_HELD_CODE: the
//    holder's plain writes are not isolated from us.
// 3. On a LOCK_HELD_CODE abort, wait for the flag to clear before the next
//    attempt instead of burning it on a guaranteed abort.
// 4. On a definitive abort or an exhausted budget, take the flag with
//    test-and-set exactly like `SpinLock`.
// 5. A transactional holder never writes the flag. Release commits (`xend`);
//    a fallback holder clears the flag. The guard remembers which.
//
// =============================================================================

/// How a [`HybridGuard`] entered its critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Inside an open hardware transaction.
    Transactional,
    /// Holding the fallback flag.
    Fallback,
}

/// Mutual exclusion by hardware lock elision with a spinlock fallback.
///
/// On CPUs without RTM (or when built with [`fallback_only`](Self::fallback_only))
/// every acquisition takes the fallback flag, giving plain [`SpinLock`](crate::SpinLock)
/// semantics.
///
/// Critical sections run under the transactional path must avoid anything a
/// transaction cannot contain (system calls, I/O); such code simply aborts the
/// transaction and re-runs under the fallback flag.
///
/// `B` supplies the transaction primitives; it is [`Rtm`] outside of tests.
#[derive(Debug)]
pub struct HybridLock<B: TxBackend = Rtm> {
    flag: CachePadded<AtomicBool>,
    backend: B,
    htm: bool,
    max_retries: u32,
    stats: Option<CachePadded<PathCounters>>,
}

#[derive(Debug)]
struct PathCounters {
    transactional: AtomicU64,
    fallback: AtomicU64,
    lock_held_aborts: AtomicU64,
}

impl HybridLock {
    /// Creates a lock that elides through RTM when [`has_htm`] reports support.
    pub fn new() -> Self {
        Self::with_htm(has_htm())
    }

    /// Creates a lock that never attempts a transaction.
    pub fn fallback_only() -> Self {
        Self::with_htm(false)
    }

    fn with_htm(htm: bool) -> Self {
        Self::from_parts(Rtm, htm)
    }
}

impl<B: TxBackend> HybridLock<B> {
    /// Creates a lock that always attempts transactions through `backend`.
    ///
    /// # Safety
    ///
    /// Every [`TxBackend`] call must be sound on this machine; for [`Rtm`]
    /// that means [`has_htm`] is `true`.
    pub unsafe fn with_backend(backend: B) -> Self {
        Self::from_parts(backend, true)
    }

    fn from_parts(backend: B, htm: bool) -> Self {
        Self {
            flag: CachePadded::new(AtomicBool::new(false)),
            backend,
            htm,
            max_retries: Config::DEFAULT_TX_RETRIES,
            stats: None,
        }
    }

    /// Sets the number of transactional attempts before falling back.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Enables per-path completion counters (see [`stats`](Self::stats)).
    pub fn with_stats(mut self, enable: bool) -> Self {
        self.stats = enable.then(|| {
            CachePadded::new(PathCounters {
                transactional: AtomicU64::new(0),
                fallback: AtomicU64::new(0),
                lock_held_aborts: AtomicU64::new(0),
            })
        });
        self
    }

    /// Whether acquisitions attempt a hardware transaction first.
    pub fn uses_htm(&self) -> bool {
        self.htm
    }

    /// Transactional attempts per acquisition.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Momentary view of the fallback flag; advisory only.
    ///
    /// Transactional holders never set the flag, so this can be `false` while
    /// a critical section is running.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Enters the critical section and returns a guard that leaves it on drop.
    #[inline]
    pub fn lock(&self) -> HybridGuard<'_, B> {
        let mode = self.acquire();
        HybridGuard {
            lock: self,
            mode,
            _not_send: PhantomData,
        }
    }

    /// Path counters, or `None` when stats are disabled.
    pub fn stats(&self) -> Option<LockStats> {
        self.stats.as_ref().map(|c| LockStats {
            transactional: c.transactional.load(Ordering::Relaxed),
            fallback: c.fallback.load(Ordering::Relaxed),
            lock_held_aborts: c.lock_held_aborts.load(Ordering::Relaxed),
        })
    }

    fn acquire(&self) -> LockMode {
        if self.htm {
            for _ in 0..self.max_retries {
                // SAFETY: `htm` is only set when the backend is usable here; a
                // started transaction is committed by the guard's drop.
                match unsafe { self.backend.begin() } {
                    TxStatus::Started => {
                        if !self.flag.load(Ordering::Acquire) {
                            return LockMode::Transactional;
                        }
                        // SAFETY: a transaction was started above. On RTM control
                        // resumes at `begin` with AbortedLockHeld.
                        unsafe { self.backend.abort_lock_held() };
                        self.lock_held_abort();
                    }
                    TxStatus::AbortedLockHeld => self.lock_held_abort(),
                    TxStatus::AbortedRetryable => {}
                    TxStatus::AbortedDefinitive => break,
                }
            }
        }

        self.acquire_fallback();
        LockMode::Fallback
    }

    /// The attempt is spent; wait for the fallback holder before the next one.
    fn lock_held_abort(&self) {
        if let Some(c) = &self.stats {
            c.lock_held_aborts.fetch_add(1, Ordering::Relaxed);
        }
        self.wait_until_free();
    }

    #[inline]
    fn wait_until_free(&self) {
        while self.flag.load(Ordering::Relaxed) {
            spin_loop();
        }
    }

    #[inline]
    fn acquire_fallback(&self) {
        while self.flag.swap(true, Ordering::Acquire) {
            self.wait_until_free();
        }
    }

    fn release(&self, mode: LockMode) {
        match mode {
            LockMode::Transactional => {
                // SAFETY: Transactional mode is only returned with a transaction open.
                unsafe {
                    debug_assert!(self.backend.in_transaction(), "transactional guard outside a transaction");
                    self.backend.commit();
                }
                // Counted after commit so the counter stays out of the write set.
                if let Some(c) = &self.stats {
                    c.transactional.fetch_add(1, Ordering::Relaxed);
                }
            }
            LockMode::Fallback => {
                debug_assert!(self.is_locked(), "fallback guard released an unheld flag");
                self.flag.store(false, Ordering::Release);
                if let Some(c) = &self.stats {
                    c.fallback.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}

impl Default for HybridLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped acquisition of a [`HybridLock`].
///
/// Dropping it commits the transaction or clears the flag, depending on
/// [`mode`](Self::mode). Not `Send`: a transaction belongs to its thread.
#[must_use = "the critical section ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct HybridGuard<'a, B: TxBackend = Rtm> {
    lock: &'a HybridLock<B>,
    mode: LockMode,
    _not_send: PhantomData<*const ()>,
}

impl<B: TxBackend> HybridGuard<'_, B> {
    /// Which path this acquisition took.
    #[inline]
    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl<B: TxBackend> Drop for HybridGuard<'_, B> {
    fn drop(&mut self) {
        self.lock.release(self.mode);
    }
}
