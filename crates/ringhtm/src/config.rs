use crate::ConfigError;

/// How producers of an MPSC queue serialize their critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockStrategy {
    /// `Hybrid` when the CPU reports hardware transactional memory, `Spin` otherwise.
    #[default]
    Auto,
    /// Bare test-and-set flag; every retry is a write.
    Flag,
    /// [`SpinLock`](crate::SpinLock): test-and-test-and-set with a scoped guard.
    Spin,
    /// [`HybridLock`](crate::HybridLock): lock elision with spin fallback.
    Hybrid,
}

/// How `push`/`pop` wait on a full or empty ring.
///
/// Neither strategy ever gives up: waits have no timeout and cannot be
/// cancelled. They only differ in how much CPU a stalled side burns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitStrategy {
    /// Unconditional spin with a PAUSE hint.
    #[default]
    Spin,
    /// Exponential spin, then `yield_now` on every further poll.
    SpinThenYield,
}

/// Configuration for SPSC and MPSC queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of slots. Fixed for the lifetime of the queue, must be non-zero.
    pub capacity: usize,
    /// Producer lock for MPSC queues (ignored by SPSC queues).
    pub lock: LockStrategy,
    /// Full/empty wait behavior.
    pub wait: WaitStrategy,
    /// Transaction attempts before a hybrid lock falls back to its flag.
    pub max_tx_retries: u32,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl Config {
    /// Default number of transactional attempts per hybrid acquisition.
    pub const DEFAULT_TX_RETRIES: u32 = 6;

    /// Creates a configuration with the given capacity and default settings.
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lock: LockStrategy::Auto,
            wait: WaitStrategy::Spin,
            max_tx_retries: Self::DEFAULT_TX_RETRIES,
            enable_metrics: false,
        }
    }

    /// Sets the producer lock strategy.
    pub const fn with_lock(mut self, lock: LockStrategy) -> Self {
        self.lock = lock;
        self
    }

    /// Sets the wait strategy.
    pub const fn with_wait(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }

    /// Sets the transactional retry budget.
    pub const fn with_max_tx_retries(mut self, retries: u32) -> Self {
        self.max_tx_retries = retries;
        self
    }

    /// Enables or disables metrics collection.
    pub const fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Checks the configuration for values that cannot build a queue.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(4096)
    }
}

/// Low latency configuration (4K slots, pure spin)
pub const LOW_LATENCY_CONFIG: Config = Config::new(4096);

/// Configuration for oversubscribed hosts (64K slots, spin then yield)
pub const COOPERATIVE_CONFIG: Config = Config::new(1 << 16).with_wait(WaitStrategy::SpinThenYield);
