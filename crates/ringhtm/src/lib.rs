//! ringhtm-rs - Bounded SPSC/MPSC ring buffers with spin and HTM producer locks
//!
//! Fixed-capacity queues for handing values between threads with minimal
//! latency. Every wait is a busy-wait: `push` spins while the ring is full,
//! `pop` spins while it is empty, and nothing can time out or be cancelled.
//!
//! # Key Features
//!
//! - SPSC queue synchronized only through an atomic occupancy counter
//! - MPSC queue whose producers serialize on a bare flag, a [`SpinLock`], or a
//!   [`HybridLock`] (Intel RTM lock elision with spinlock fallback)
//! - One-time CPU probe ([`has_htm`]) picks the hybrid lock when available
//! - Optional spin-then-yield waiting for oversubscribed hosts
//!
//! # Example
//!
//! ```
//! use ringhtm_rs::{mpsc, Config};
//!
//! let (tx, mut rx) = mpsc::channel::<u64>(Config::new(1024)).unwrap();
//!
//! let tx2 = tx.clone();
//! let worker = std::thread::spawn(move || tx2.push(7));
//! tx.push(6);
//!
//! let mut got = [rx.pop(), rx.pop()];
//! got.sort_unstable();
//! assert_eq!(got, [6, 7]);
//! worker.join().unwrap();
//! ```

mod backend;
mod backoff;
mod capability;
mod config;
mod error;
pub mod htm;
mod hybrid_lock;
mod invariants;
mod metrics;
pub mod mpsc;
mod ring;
mod spin_lock;
pub mod spsc;
mod sync;

pub use backend::RawLock;
pub use capability::has_htm;
pub use config::{Config, LockStrategy, WaitStrategy, COOPERATIVE_CONFIG, LOW_LATENCY_CONFIG};
pub use error::{ConfigError, TryPushError};
pub use hybrid_lock::{HybridGuard, HybridLock, LockMode};
pub use metrics::{LockStats, MetricsSnapshot};
pub use mpsc::MpscQueue;
pub use spin_lock::{SpinGuard, SpinLock};
pub use spsc::SpscQueue;
