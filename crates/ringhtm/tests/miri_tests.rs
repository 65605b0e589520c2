//! Miri-compatible tests for detecting undefined behavior.
//!
//! Run with: `cargo +nightly miri test --test miri_tests`
//!
//! The capability probe reports no HTM under Miri, so the hybrid lock runs its
//! fallback path and no inline assembly is executed.

#![cfg(not(feature = "loom"))]

use ringhtm_rs::{mpsc, spsc, Config, LockStrategy};
use std::thread;

/// Wrap-around with heap-owning values: every slot is written, read and
/// dropped exactly once.
#[test]
fn miri_spsc_wrap_around_owned_values() {
    let (mut tx, mut rx) = spsc::channel::<String>(Config::new(3)).unwrap();

    for round in 0..4 {
        for i in 0..3 {
            tx.push(format!("{round}-{i}"));
        }
        for i in 0..3 {
            assert_eq!(rx.pop(), format!("{round}-{i}"));
        }
    }
}

/// Values left in the ring are dropped with it.
#[test]
fn miri_drop_with_buffered_values() {
    let (mut tx, mut rx) = spsc::channel::<Box<u64>>(Config::new(4)).unwrap();
    tx.push(Box::new(1));
    tx.push(Box::new(2));
    tx.push(Box::new(3));
    assert_eq!(*rx.pop(), 1);
    // Two boxes remain and must be freed without a leak.
    drop(tx);
    drop(rx);
}

/// Zero-sized values still occupy logical slots.
#[test]
fn miri_zero_sized_values() {
    let (tx, mut rx) = mpsc::channel::<()>(Config::new(2).with_lock(LockStrategy::Flag)).unwrap();
    tx.push(());
    tx.push(());
    assert!(tx.try_push(()).is_err());
    rx.pop();
    assert!(tx.try_push(()).is_ok());
}

/// Small cross-thread hand-off for Miri's data race detector.
#[test]
fn miri_threaded_handoff() {
    for strategy in [LockStrategy::Spin, LockStrategy::Hybrid] {
        let (tx, mut rx) = mpsc::channel::<Vec<u8>>(Config::new(2).with_lock(strategy)).unwrap();

        let handles: Vec<_> = (0..2u8)
            .map(|id| {
                let tx = tx.clone();
                thread::spawn(move || {
                    for i in 0..5 {
                        tx.push(vec![id, i]);
                    }
                })
            })
            .collect();

        let mut total = 0;
        for _ in 0..10 {
            total += rx.pop().len();
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(total, 20);
    }
}
