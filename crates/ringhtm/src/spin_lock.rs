use crate::sync::{spin_loop, AtomicBool, Ordering};
use std::marker::PhantomData;

/// Test-and-test-and-set spinlock guarding no data of its own.
///
/// `acquire` performs an atomic swap; while the flag is held it spins on plain
/// loads so waiters do not bounce the cache line with writes. Prefer
/// [`lock`](Self::lock), whose guard releases on every exit path.
#[derive(Debug)]
pub struct SpinLock {
    locked: AtomicBool,
}

impl SpinLock {
    /// Creates an unlocked spinlock.
    pub fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Spins until this thread holds the lock.
    #[inline]
    pub fn acquire(&self) {
        while self.locked.swap(true, Ordering::Acquire) {
            while self.locked.load(Ordering::Relaxed) {
                spin_loop();
            }
        }
    }

    /// Takes the lock if it is free, without spinning.
    #[inline]
    pub fn try_acquire(&self) -> bool {
        !self.locked.load(Ordering::Relaxed) && !self.locked.swap(true, Ordering::Acquire)
    }

    /// Releases the lock.
    ///
    /// # Safety
    ///
    /// The caller must hold the lock through a matching [`acquire`](Self::acquire)
    /// or successful [`try_acquire`](Self::try_acquire), and release it exactly once.
    #[inline]
    pub unsafe fn release(&self) {
        debug_assert!(self.is_locked(), "releasing a spinlock that is not held");
        self.locked.store(false, Ordering::Release);
    }

    /// Acquires the lock and returns a guard that releases it on drop.
    #[inline]
    pub fn lock(&self) -> SpinGuard<'_> {
        self.acquire();
        SpinGuard::new(self)
    }

    /// Non-spinning variant of [`lock`](Self::lock).
    #[inline]
    pub fn try_lock(&self) -> Option<SpinGuard<'_>> {
        self.try_acquire().then(|| SpinGuard::new(self))
    }

    /// Momentary view of the flag; advisory only.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped acquisition of a [`SpinLock`].
///
/// Released when dropped, including during unwinding. Not `Send`: the thread
/// that acquired is the thread that releases.
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SpinGuard<'a> {
    lock: &'a SpinLock,
    _not_send: PhantomData<*const ()>,
}

impl<'a> SpinGuard<'a> {
    fn new(lock: &'a SpinLock) -> Self {
        Self {
            lock,
            _not_send: PhantomData,
        }
    }
}

impl Drop for SpinGuard<'_> {
    fn drop(&mut self) {
        // SAFETY: a guard exists only for a successful acquisition.
        unsafe { self.lock.release() };
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lock_unlock() {
        let lock = SpinLock::new();
        assert!(!lock.is_locked());
        {
            let _guard = lock.lock();
            assert!(lock.is_locked());
            assert!(lock.try_lock().is_none());
        }
        assert!(!lock.is_locked());
        assert!(lock.try_lock().is_some());
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_raw_acquire_release() {
        let lock = SpinLock::new();
        lock.acquire();
        assert!(!lock.try_acquire());
        // SAFETY: acquired above.
        unsafe { lock.release() };
        assert!(lock.try_acquire());
        // SAFETY: acquired by try_acquire.
        unsafe { lock.release() };
    }

    #[test]
    fn test_early_return_releases() {
        fn bail(lock: &SpinLock, fail: bool) -> Result<u32, &'static str> {
            let _guard = lock.lock();
            if fail {
                return Err("early exit");
            }
            Ok(1)
        }

        let lock = Arc::new(SpinLock::new());
        assert!(bail(&lock, true).is_err());

        let other = Arc::clone(&lock);
        let acquired = thread::spawn(move || other.try_lock().is_some())
            .join()
            .unwrap();
        assert!(acquired);
    }

    #[test]
    fn test_mutual_exclusion() {
        const THREADS: usize = 4;
        const ITERS: usize = 10_000;

        let lock = Arc::new(SpinLock::new());
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..ITERS {
                        let _guard = lock.lock();
                        // Non-atomic read-modify-write: loses updates without exclusion.
                        let v = counter.load(std::sync::atomic::Ordering::Relaxed);
                        counter.store(v + 1, std::sync::atomic::Ordering::Relaxed);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.load(std::sync::atomic::Ordering::Relaxed), THREADS * ITERS);
    }
}
