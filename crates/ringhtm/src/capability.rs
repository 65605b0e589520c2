//! One-time, process-wide probe for hardware transactional memory.

use std::sync::OnceLock;

static HTM_SUPPORTED: OnceLock<bool> = OnceLock::new();

/// Returns `true` if this CPU supports Intel RTM (`xbegin`/`xend`).
///
/// The CPU is queried on first call only; every later call returns the same
/// answer. Always `false` on targets without an RTM backend, under Miri and
/// under loom.
pub fn has_htm() -> bool {
    *HTM_SUPPORTED.get_or_init(|| {
        let supported = detect();
        log::debug!("hardware transactional memory (RTM) supported: {supported}");
        supported
    })
}

#[cfg(all(target_arch = "x86_64", not(miri), not(feature = "loom")))]
fn detect() -> bool {
    use std::arch::x86_64::{__cpuid, __cpuid_count};

    // CPUID.(EAX=07H, ECX=0):EBX[bit 11]
    const RTM_BIT: u32 = 1 << 11;

    // SAFETY: `cpuid` exists on every x86_64 processor.
    let max_leaf = unsafe { __cpuid(0) }.eax;
    if max_leaf < 7 {
        return false;
    }
    // SAFETY: leaf 7 is within the range reported by leaf 0.
    let features = unsafe { __cpuid_count(7, 0) };
    features.ebx & RTM_BIT != 0
}

#[cfg(not(all(target_arch = "x86_64", not(miri), not(feature = "loom"))))]
fn detect() -> bool {
    false
}
