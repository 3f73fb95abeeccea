//! Execution contexts for completion callbacks.
//!
//! The serialized worker never runs a caller's code while deciding lock
//! state; it hands each completion to an [`Executor`] as a [`Job`]. Which
//! thread the job runs on is the executor's business:
//!
//! - [`InlineExecutor`]: the worker thread itself, right after the
//!   request that produced it.
//! - [`ThreadPoolExecutor`]: a pool of named threads fed by a channel.
//! - [`ChannelExecutor`]: a queue the caller drains from a thread of its
//!   choosing, typically a UI or main loop.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::config::{ConfigError, ThreadPoolConfig};

/// A completion ready to run.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Somewhere to run completion callbacks.
pub trait Executor: Send + Sync {
    /// Run `job`, now or later, on a thread of the executor's choosing.
    fn execute(&self, job: Job);
}

/// Run `job`, containing a panic to the job that raised it.
fn run_job(job: Job) {
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
        tracing::error!("completion callback panicked");
    }
}

// ── InlineExecutor ─────────────────────────────────────────────────

/// Runs every job immediately on the calling thread.
///
/// Used as the coordinator's executor, completions run on the serialized
/// worker between requests. Requests they issue are queued, not nested.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) {
        run_job(job);
    }
}

// ── ThreadPoolExecutor ─────────────────────────────────────────────

/// Fixed pool of completion threads pulling jobs from a shared channel.
///
/// Dropping the pool closes the channel; threads finish the jobs already
/// queued and are then joined.
#[derive(Debug)]
pub struct ThreadPoolExecutor {
    job_tx: Option<Sender<Job>>,
    threads: Vec<JoinHandle<()>>,
}

impl ThreadPoolExecutor {
    /// Spawn the pool described by `config`.
    pub fn new(config: &ThreadPoolConfig) -> Result<Self, ConfigError> {
        let count = config.resolved_worker_count();
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();
        let mut threads = Vec::with_capacity(count);
        for i in 0..count {
            let rx = job_rx.clone();
            let handle = thread::Builder::new()
                .name(format!("gridlock-notify-{i}"))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        run_job(job);
                    }
                })
                .map_err(|e| ConfigError::ThreadSpawnFailed {
                    reason: format!("completion thread {i}: {e}"),
                })?;
            threads.push(handle);
        }
        tracing::debug!(threads = count, "completion pool started");
        Ok(Self {
            job_tx: Some(job_tx),
            threads,
        })
    }

    /// Number of pool threads.
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }
}

impl Executor for ThreadPoolExecutor {
    fn execute(&self, job: Job) {
        let sent = self.job_tx.as_ref().map(|tx| tx.send(job).is_ok());
        if sent != Some(true) {
            tracing::warn!("completion pool closed; job dropped");
        }
    }
}

impl Drop for ThreadPoolExecutor {
    fn drop(&mut self) {
        self.job_tx.take();
        let me = thread::current().id();
        for handle in self.threads.drain(..) {
            // A pool thread cannot join itself.
            if handle.thread().id() != me {
                let _ = handle.join();
            }
        }
    }
}

// ── ChannelExecutor ────────────────────────────────────────────────

/// Queues jobs for a [`JobReceiver`] that the caller drains.
#[derive(Clone, Debug)]
pub struct ChannelExecutor {
    job_tx: Sender<Job>,
}

/// The draining end of a [`ChannelExecutor`].
#[derive(Debug)]
pub struct JobReceiver {
    job_rx: Receiver<Job>,
}

impl ChannelExecutor {
    /// Create the executor and its receiver.
    ///
    /// ```
    /// use gridlock_sync::{ChannelExecutor, Executor};
    ///
    /// let (exec, jobs) = ChannelExecutor::new();
    /// exec.execute(Box::new(|| println!("ran")));
    /// assert_eq!(jobs.pending(), 1);
    /// assert_eq!(jobs.run_pending(), 1);
    /// ```
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Self, JobReceiver) {
        let (job_tx, job_rx) = crossbeam_channel::unbounded();
        (Self { job_tx }, JobReceiver { job_rx })
    }
}

impl Executor for ChannelExecutor {
    fn execute(&self, job: Job) {
        if self.job_tx.send(job).is_err() {
            tracing::warn!("job receiver dropped; job discarded");
        }
    }
}

impl JobReceiver {
    /// Number of queued jobs.
    pub fn pending(&self) -> usize {
        self.job_rx.len()
    }

    /// Run every job queued right now. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.job_rx.try_recv() {
            run_job(job);
            ran += 1;
        }
        ran
    }

    /// Wait up to `timeout` for one job and run it.
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.job_rx.recv_timeout(timeout) {
            Ok(job) => {
                run_job(job);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Run jobs as they arrive until `done()` holds or `timeout` elapses.
    /// Returns whether `done()` held.
    pub fn run_until(&self, timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while !done() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !self.run_next(remaining) {
                return done();
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn inline_runs_immediately() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        InlineExecutor.execute(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn inline_survives_a_panicking_job() {
        InlineExecutor.execute(Box::new(|| panic!("boom")));
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        InlineExecutor.execute(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn pool_runs_everything_before_drop_returns() {
        let pool = ThreadPoolExecutor::new(&ThreadPoolConfig {
            worker_count: Some(3),
        })
        .unwrap();
        assert_eq!(pool.thread_count(), 3);
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..100 {
            let h = Arc::clone(&hits);
            pool.execute(Box::new(move || {
                h.fetch_add(1, Ordering::SeqCst);
            }));
        }
        drop(pool);
        assert_eq!(hits.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn channel_jobs_wait_for_the_pump() {
        let (exec, jobs) = ChannelExecutor::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let h = Arc::clone(&hits);
            exec.execute(Box::new(move || {
                h.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(jobs.pending(), 3);
        assert!(jobs.run_next(Duration::from_millis(10)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(jobs.run_pending(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert!(!jobs.run_next(Duration::from_millis(10)));
    }

    #[test]
    fn run_until_times_out_when_nothing_arrives() {
        let (_exec, jobs) = ChannelExecutor::new();
        assert!(!jobs.run_until(Duration::from_millis(20), || false));
        assert!(jobs.run_until(Duration::from_millis(20), || true));
    }
}
