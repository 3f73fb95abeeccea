//! Coordinator configuration, validation, and error types.

use std::error::Error;
use std::fmt;

// ── OverflowPolicy ─────────────────────────────────────────────────

/// What happens when a cell's waiter queue is at capacity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// The new waiter's callback receives
    /// [`LockError::WaitQueueFull`](gridlock_core::LockError::WaitQueueFull)
    /// and the queue is left untouched.
    #[default]
    Reject,
    /// The queue grows past its capacity; capacity only sizes the first
    /// allocation.
    Grow,
}

// ── CoordinatorConfig ──────────────────────────────────────────────

/// Configuration for [`LockCoordinator`](crate::LockCoordinator).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Maximum number of parked waiters per cell. Default: 100.
    pub wait_queue_capacity: usize,
    /// Behavior once a queue holds `wait_queue_capacity` waiters.
    /// Default: [`OverflowPolicy::Reject`].
    pub overflow: OverflowPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            wait_queue_capacity: 100,
            overflow: OverflowPolicy::Reject,
        }
    }
}

impl CoordinatorConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wait_queue_capacity == 0 && self.overflow == OverflowPolicy::Reject {
            return Err(ConfigError::WaitQueueZero);
        }
        Ok(())
    }
}

// ── ThreadPoolConfig ───────────────────────────────────────────────

/// Configuration for [`ThreadPoolExecutor`](crate::ThreadPoolExecutor).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThreadPoolConfig {
    /// Number of completion threads. `None` = auto-detect
    /// (`available_parallelism / 2`, clamped to `[2, 16]`).
    pub worker_count: Option<usize>,
}

impl ThreadPoolConfig {
    /// Resolve the actual worker count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to `[1, 64]`.
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n.clamp(1, 64),
            None => {
                let cpus = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4);
                (cpus / 2).clamp(2, 16)
            }
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while building a coordinator or executor.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `wait_queue_capacity` is zero under [`OverflowPolicy::Reject`], so
    /// every contended request would be rejected.
    WaitQueueZero,
    /// A background thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitQueueZero => {
                write!(f, "wait_queue_capacity must be at least 1 when overflow is rejected")
            }
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ConfigError {}
