#![cfg(not(feature = "loom"))]

use ringhtm_rs::{mpsc, spsc, Config, LockStrategy, WaitStrategy};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const ALL_LOCKS: [LockStrategy; 4] = [
    LockStrategy::Auto,
    LockStrategy::Flag,
    LockStrategy::Spin,
    LockStrategy::Hybrid,
];

#[test]
fn test_spsc_fifo_ordering() {
    for n in [0u64, 1, 7, 10_000] {
        let (mut tx, mut rx) = spsc::channel::<u64>(Config::new(64)).unwrap();

        let producer = thread::spawn(move || {
            for i in 0..n {
                tx.push(i);
            }
        });

        for expected in 0..n {
            let item = rx.pop();
            assert_eq!(item, expected, "FIFO violation: expected {}, got {}", expected, item);
        }
        producer.join().unwrap();
        assert!(rx.is_empty());
    }
}

#[test]
fn test_spsc_blocked_push_scenario() {
    let (mut tx, mut rx) = spsc::channel::<u32>(Config::new(4)).unwrap();
    for i in 0..4 {
        tx.push(i);
    }
    assert!(tx.queue().is_full());

    let done = Arc::new(AtomicBool::new(false));
    let done_flag = Arc::clone(&done);
    let producer = thread::spawn(move || {
        tx.push(4);
        done_flag.store(true, Ordering::SeqCst);
    });

    thread::sleep(Duration::from_millis(50));
    assert!(!done.load(Ordering::SeqCst), "push into a full queue returned");

    assert_eq!(rx.pop(), 0);
    producer.join().unwrap();
    assert!(done.load(Ordering::SeqCst));

    for expected in 1..=4 {
        assert_eq!(rx.pop(), expected);
    }
    assert!(rx.is_empty());
}

#[test]
fn test_mpsc_blocked_push_scenario() {
    for strategy in ALL_LOCKS {
        let (tx, mut rx) = mpsc::channel::<u32>(Config::new(4).with_lock(strategy)).unwrap();
        for i in 0..4 {
            tx.push(i);
        }

        let done = Arc::new(AtomicBool::new(false));
        let done_flag = Arc::clone(&done);
        let tx2 = tx.clone();
        let producer = thread::spawn(move || {
            tx2.push(4);
            done_flag.store(true, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(20));
        assert!(!done.load(Ordering::SeqCst), "{:?}: push into a full queue returned", strategy);

        assert_eq!(rx.pop(), 0);
        producer.join().unwrap();
        for expected in 1..=4 {
            assert_eq!(rx.pop(), expected);
        }
    }
}

#[test]
fn test_capacity_one_is_strict_handoff() {
    let (mut tx, mut rx) = spsc::channel::<u64>(Config::new(1)).unwrap();

    let producer = thread::spawn(move || {
        for i in 0..1_000 {
            tx.push(i);
            // At most one value can be outstanding.
            assert!(tx.len() <= 1);
        }
    });

    for i in 0..1_000 {
        assert!(rx.len() <= 1);
        assert_eq!(rx.pop(), i);
    }
    producer.join().unwrap();
}

#[test]
fn test_zero_capacity_rejected() {
    assert!(spsc::channel::<u8>(Config::new(0)).is_err());
    assert!(mpsc::channel::<u8>(Config::new(0)).is_err());
}

fn run_mpsc(strategy: LockStrategy, wait: WaitStrategy, producers: usize, per_producer: u64) {
    let config = Config::new(128).with_lock(strategy).with_wait(wait);
    let (tx, mut rx) = mpsc::channel::<(usize, u64)>(config).unwrap();

    let handles: Vec<_> = (0..producers)
        .map(|id| {
            let tx = tx.clone();
            thread::spawn(move || {
                for i in 0..per_producer {
                    tx.push((id, i));
                }
            })
        })
        .collect();
    drop(tx);

    let total = producers as u64 * per_producer;
    let mut seen: HashMap<usize, Vec<u64>> = HashMap::new();
    for _ in 0..total {
        let (id, value) = rx.pop();
        seen.entry(id).or_default().push(value);
    }
    for h in handles {
        h.join().unwrap();
    }

    assert!(rx.is_empty(), "{:?}: values left over", strategy);
    assert_eq!(seen.len(), producers);
    for (id, values) in seen {
        // Per-producer FIFO also proves no loss and no duplication.
        let expected: Vec<u64> = (0..per_producer).collect();
        assert_eq!(values, expected, "{:?}: producer {} stream corrupted", strategy, id);
    }
}

#[test]
fn test_mpsc_no_lost_or_duplicated_values() {
    for strategy in ALL_LOCKS {
        for producers in [1, 2, 8] {
            run_mpsc(strategy, WaitStrategy::SpinThenYield, producers, 2_000);
        }
    }
}

#[test]
fn test_mpsc_pure_spin_two_producers() {
    for strategy in ALL_LOCKS {
        run_mpsc(strategy, WaitStrategy::Spin, 2, 5_000);
    }
}

fn net_zero_stress(strategy: LockStrategy, ops: u64) {
    let config = Config::new(64)
        .with_lock(strategy)
        .with_wait(WaitStrategy::SpinThenYield)
        .with_metrics(true);
    let (tx, mut rx) = mpsc::channel::<u64>(config).unwrap();

    // Seed a few values so the starting occupancy is non-zero.
    for i in 0..3 {
        tx.push(i);
    }
    let initial = rx.len();

    const PRODUCERS: u64 = 4;
    let per_producer = ops / PRODUCERS;
    let handles: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let tx = tx.clone();
            thread::spawn(move || {
                for i in 0..per_producer {
                    tx.push(i);
                }
            })
        })
        .collect();

    for _ in 0..per_producer * PRODUCERS {
        rx.pop();
    }
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(rx.len(), initial);
    let metrics = rx.queue().metrics();
    assert_eq!(metrics.pushed - metrics.popped, initial as u64);
    if let Some(stats) = rx.queue().lock_stats() {
        assert_eq!(stats.total(), metrics.pushed);
    }
}

#[test]
fn test_hybrid_net_zero_occupancy() {
    for _ in 0..3 {
        net_zero_stress(LockStrategy::Hybrid, 100_000);
        net_zero_stress(LockStrategy::Spin, 100_000);
    }
}

#[test]
#[ignore = "long-running: one million pushes and pops per run"]
fn test_hybrid_net_zero_occupancy_million() {
    for _ in 0..3 {
        net_zero_stress(LockStrategy::Hybrid, 1_000_000);
    }
}

#[test]
fn test_buffered_values_dropped_with_queue() {
    let drops = Arc::new(());
    {
        let (tx, _rx) = mpsc::channel::<Arc<()>>(Config::new(8)).unwrap();
        for _ in 0..5 {
            tx.push(Arc::clone(&drops));
        }
        assert_eq!(Arc::strong_count(&drops), 6);
    }
    assert_eq!(Arc::strong_count(&drops), 1);
}
