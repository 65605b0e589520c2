//! Runs producers and one consumer flat out and prints throughput periodically.
//!
//! Usage: `throughput_monitor [spsc|flag|spin|hybrid|auto] [producers] [seconds]`
//!
//! Defaults: `spsc`, 1 producer, 10 seconds, reporting every second.

use ringhtm_rs::{has_htm, mpsc, spsc, Config, LockStrategy};
use std::env;
use std::process;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const CAPACITY: usize = 1024 * 1024;
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Default)]
struct Progress {
    stop: AtomicBool,
    received: AtomicU64,
    last_value: AtomicU64,
    queue_len: AtomicUsize,
}

impl Progress {
    fn running(&self) -> bool {
        !self.stop.load(Ordering::Relaxed)
    }

    fn record(&self, value: u32, len: usize) {
        self.last_value.store(value as u64, Ordering::Relaxed);
        self.queue_len.store(len, Ordering::Relaxed);
        self.received.fetch_add(1, Ordering::Relaxed);
    }
}

fn parse_mode(arg: &str) -> Option<Option<LockStrategy>> {
    match arg {
        "spsc" => Some(None),
        "flag" => Some(Some(LockStrategy::Flag)),
        "spin" => Some(Some(LockStrategy::Spin)),
        "hybrid" => Some(Some(LockStrategy::Hybrid)),
        "auto" => Some(Some(LockStrategy::Auto)),
        _ => None,
    }
}

/// Prints one line per interval until `deadline`, then raises `stop`.
fn report(progress: &Progress, start: Instant, deadline: Duration) {
    let mut prev = 0;
    while start.elapsed() < deadline {
        thread::sleep(REPORT_INTERVAL);
        let now = progress.received.load(Ordering::Relaxed);
        println!(
            "[{:>5.1}s] val = {} ({:.0} ops/s), len = {}",
            start.elapsed().as_secs_f64(),
            progress.last_value.load(Ordering::Relaxed),
            (now - prev) as f64 / REPORT_INTERVAL.as_secs_f64(),
            progress.queue_len.load(Ordering::Relaxed)
        );
        prev = now;
    }
    progress.stop.store(true, Ordering::Relaxed);
}

fn run_spsc(progress: &Arc<Progress>, start: Instant, deadline: Duration) {
    let (mut tx, mut rx) = spsc::channel::<u32>(Config::new(CAPACITY)).unwrap();

    let p = Arc::clone(progress);
    let producer = thread::spawn(move || {
        let mut n = 0u32;
        while p.running() {
            if tx.try_push(n).is_ok() {
                n = n.wrapping_add(1);
            }
        }
    });

    let p = Arc::clone(progress);
    let consumer = thread::spawn(move || {
        while p.running() {
            if let Some(v) = rx.try_pop() {
                p.record(v, rx.len());
            }
        }
    });

    report(progress, start, deadline);
    producer.join().unwrap();
    consumer.join().unwrap();
}

fn run_mpsc(progress: &Arc<Progress>, strategy: LockStrategy, producers: usize, start: Instant, deadline: Duration) {
    let config = Config::new(CAPACITY).with_lock(strategy).with_metrics(true);
    let (tx, mut rx) = mpsc::channel::<u32>(config).unwrap();
    println!("producer lock: {:?}", tx.queue().lock_strategy());

    let producer_handles: Vec<_> = (0..producers)
        .map(|_| {
            let tx = tx.clone();
            let p = Arc::clone(progress);
            thread::spawn(move || {
                let mut n = 0u32;
                while p.running() {
                    if tx.try_push(n).is_ok() {
                        n = n.wrapping_add(1);
                    }
                }
            })
        })
        .collect();

    let p = Arc::clone(progress);
    let consumer = thread::spawn(move || {
        while p.running() {
            if let Some(v) = rx.try_pop() {
                p.record(v, rx.len());
            }
        }
    });

    report(progress, start, deadline);
    for handle in producer_handles {
        handle.join().unwrap();
    }
    consumer.join().unwrap();

    if let Some(stats) = tx.queue().lock_stats() {
        println!(
            "hybrid lock: {} transactional, {} fallback, {} lock-held aborts",
            stats.transactional, stats.fallback, stats.lock_held_aborts
        );
    }
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let mode = match parse_mode(args.first().map_or("spsc", String::as_str)) {
        Some(mode) => mode,
        None => {
            eprintln!("usage: throughput_monitor [spsc|flag|spin|hybrid|auto] [producers] [seconds]");
            process::exit(2);
        }
    };
    let producers: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(1).max(1);
    let seconds: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10);

    println!("RTM available: {}", has_htm());

    let progress = Arc::new(Progress::default());
    let start = Instant::now();
    let deadline = Duration::from_secs(seconds);

    match mode {
        None => run_spsc(&progress, start, deadline),
        Some(strategy) => run_mpsc(&progress, strategy, producers, start, deadline),
    }

    println!(
        "total: {} values in {:.1}s",
        progress.received.load(Ordering::Relaxed),
        start.elapsed().as_secs_f64()
    );
}
