//! Platform interface to hardware transactional memory.
//!
//! On `x86_64` this wraps the RTM instructions (`xbegin`, `xend`, `xabort`,
//! `xtest`). Every other target (and Miri/loom builds) gets a backend whose
//! transactions always abort definitively, which sends
//! [`HybridLock`](crate::HybridLock) straight to its fallback flag.
//!
//! Calling [`begin_transaction`] on a CPU without RTM raises `#UD`, so callers
//! must gate it on [`has_htm`](crate::has_htm).

/// Abort code used when a transaction finds the fallback flag held.
pub const LOCK_HELD_CODE: u8 = 0xff;

// RTM abort status bits (EAX after an abort).
const ABORT_EXPLICIT: u32 = 1 << 0;
const ABORT_RETRY: u32 = 1 << 1;
const ABORT_CONFLICT: u32 = 1 << 2;
const ABORT_CAPACITY: u32 = 1 << 3;
const ABORT_NESTED: u32 = 1 << 5;
const STARTED: u32 = u32::MAX;

/// Outcome of [`begin_transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// A transaction is now open on this thread.
    Started,
    /// Transient abort (conflict, capacity, or the CPU suggests a retry).
    AbortedRetryable,
    /// Retrying is pointless; take the fallback path.
    AbortedDefinitive,
    /// Explicit abort with [`LOCK_HELD_CODE`]: a fallback holder owns the lock.
    AbortedLockHeld,
}

impl TxStatus {
    /// Decodes the raw status `xbegin` leaves in EAX.
    pub fn from_raw(status: u32) -> Self {
        if status == STARTED {
            return Self::Started;
        }
        if status & ABORT_EXPLICIT != 0 && (status >> 24) as u8 == LOCK_HELD_CODE {
            // An inner lock's abort unwinds the outer transaction too; the
            // outer lock must not wait on a flag it never read.
            if status & ABORT_NESTED != 0 {
                return Self::AbortedDefinitive;
            }
            return Self::AbortedLockHeld;
        }
        if status & (ABORT_RETRY | ABORT_CONFLICT | ABORT_CAPACITY) != 0 {
            Self::AbortedRetryable
        } else {
            Self::AbortedDefinitive
        }
    }
}

/// Starts a hardware transaction.
///
/// If the transaction later aborts, execution resumes here with an abort
/// status and every memory write made inside it is discarded.
///
/// # Safety
///
/// The CPU must support RTM ([`has_htm`](crate::has_htm)). A `Started`
/// transaction must be ended by [`commit_transaction`] on the same thread.
#[inline]
pub unsafe fn begin_transaction() -> TxStatus {
    TxStatus::from_raw(imp::xbegin())
}

/// Commits the open transaction, publishing its writes atomically.
///
/// # Safety
///
/// A transaction must be open on this thread.
#[inline]
pub unsafe fn commit_transaction() {
    imp::xend();
}

/// Aborts the open transaction with [`LOCK_HELD_CODE`].
///
/// Inside a transaction this does not return: control resumes at the matching
/// [`begin_transaction`], which reports [`TxStatus::AbortedLockHeld`].
///
/// # Safety
///
/// The CPU must support RTM.
#[inline]
pub unsafe fn abort_transaction_lock_held() {
    imp::xabort_lock_held();
}

/// Returns `true` while a transaction is open on this thread.
///
/// # Safety
///
/// The CPU must support RTM.
#[inline]
pub unsafe fn in_transaction() -> bool {
    imp::xtest()
}

/// The transaction primitives [`HybridLock`](crate::HybridLock) elides through.
///
/// [`Rtm`] is the hardware implementation. A backend whose
/// `abort_lock_held` returns instead of unwinding is treated by the lock as
/// if `begin` had reported [`TxStatus::AbortedLockHeld`].
pub trait TxBackend {
    /// See [`begin_transaction`].
    ///
    /// # Safety
    ///
    /// Same contract as [`begin_transaction`].
    unsafe fn begin(&self) -> TxStatus;

    /// See [`commit_transaction`].
    ///
    /// # Safety
    ///
    /// Same contract as [`commit_transaction`].
    unsafe fn commit(&self);

    /// See [`abort_transaction_lock_held`].
    ///
    /// # Safety
    ///
    /// Same contract as [`abort_transaction_lock_held`].
    unsafe fn abort_lock_held(&self);

    /// See [`in_transaction`].
    ///
    /// # Safety
    ///
    /// Same contract as [`in_transaction`].
    unsafe fn in_transaction(&self) -> bool;
}

/// Intel RTM, or the always-abort stand-in on targets without it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rtm;

impl TxBackend for Rtm {
    #[inline]
    unsafe fn begin(&self) -> TxStatus {
        begin_transaction()
    }

    #[inline]
    unsafe fn commit(&self) {
        commit_transaction();
    }

    #[inline]
    unsafe fn abort_lock_held(&self) {
        abort_transaction_lock_held();
    }

    #[inline]
    unsafe fn in_transaction(&self) -> bool {
        in_transaction()
    }
}

#[cfg(all(target_arch = "x86_64", not(miri), not(feature = "loom")))]
mod imp {
    use std::arch::asm;

    #[inline(always)]
    pub(super) unsafe fn xbegin() -> u32 {
        // On abort the CPU jumps to the fallback label with the status in EAX;
        // on start EAX keeps its initial value.
        let mut status = super::STARTED;
        asm!("xbegin 2f", "2:", inout("eax") status, options(nostack));
        status
    }

    #[inline(always)]
    pub(super) unsafe fn xend() {
        asm!("xend", options(nostack));
    }

    #[inline(always)]
    pub(super) unsafe fn xabort_lock_held() {
        // imm8 must match LOCK_HELD_CODE
        asm!("xabort 0xff", options(nostack));
    }

    #[inline(always)]
    pub(super) unsafe fn xtest() -> bool {
        let active: u8;
        asm!("xtest", "setnz {0}", out(reg_byte) active, options(nostack, nomem));
        active != 0
    }
}

#[cfg(not(all(target_arch = "x86_64", not(miri), not(feature = "loom"))))]
mod imp {
    // No RTM: every transaction aborts before it starts.
    const NO_RETRY_ABORT: u32 = 0;

    #[inline(always)]
    pub(super) unsafe fn xbegin() -> u32 {
        NO_RETRY_ABORT
    }

    #[inline(always)]
    pub(super) unsafe fn xend() {}

    #[inline(always)]
    pub(super) unsafe fn xabort_lock_held() {}

    #[inline(always)]
    pub(super) unsafe fn xtest() -> bool {
        false
    }
}
