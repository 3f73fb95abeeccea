//! The lock coordinator and its submission handle.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use gridlock_core::{Coordinate, LockError};
use gridlock_space::Lattice;

use crate::config::{ConfigError, CoordinatorConfig, ThreadPoolConfig};
use crate::executor::{Executor, Job, ThreadPoolExecutor};
use crate::metrics::{LockCounters, LockMetrics};
use crate::table::{LockMap, LockTable};
use crate::worker::{Request, SyncWorker};

// ── LockHandle ─────────────────────────────────────────────────────

/// Cloneable submission side of a [`LockCoordinator`].
///
/// Every method validates its arguments on the calling thread and returns
/// `Err` without enqueueing anything if they are out of range. Completions
/// capture handles freely, so a callback can issue follow-up requests,
/// including re-locking the cell it was just granted.
#[derive(Clone)]
pub struct LockHandle {
    tx: Sender<Request>,
    lattice: Arc<Lattice>,
}

impl LockHandle {
    fn submit(&self, request: Request) -> Result<(), LockError> {
        self.tx.send(request).map_err(|_| LockError::Shutdown)
    }

    /// The lattice the coordinator locks.
    pub fn lattice(&self) -> &Arc<Lattice> {
        &self.lattice
    }

    /// Lock the cell at `coord`.
    ///
    /// `on_acquired` runs on the executor once the lock is held, with
    /// `Ok(())`. If the cell is locked the request is parked in the cell's
    /// FIFO queue; under [`OverflowPolicy::Reject`] a full queue answers
    /// with [`LockError::WaitQueueFull`] instead. The callback is never
    /// invoked if the coordinator shuts down first.
    ///
    /// [`OverflowPolicy::Reject`]: crate::OverflowPolicy::Reject
    pub fn lock_cell<F>(&self, coord: Coordinate, on_acquired: F) -> Result<(), LockError>
    where
        F: FnOnce(Result<(), LockError>) + Send + 'static,
    {
        let index = self.lattice.checked_index_of(coord)?;
        self.submit(Request::Lock {
            index,
            on_acquired: Box::new(on_acquired),
        })
    }

    /// Release the cell at `coord`, handing it to the oldest waiter if any.
    pub fn release_lock(&self, coord: Coordinate) -> Result<(), LockError> {
        let index = self.lattice.checked_index_of(coord)?;
        self.submit(Request::Release { index })
    }

    /// Try once to lock every cell within `radius` rings of `center`,
    /// excluding `center` itself.
    ///
    /// Never parks: cells already locked are skipped and recorded `false`
    /// in the [`LockMap`] handed to `on_complete`. Release the result with
    /// [`release_locks`](Self::release_locks).
    pub fn lock_area<F>(&self, center: Coordinate, radius: u32, on_complete: F) -> Result<(), LockError>
    where
        F: FnOnce(LockMap) + Send + 'static,
    {
        self.lattice.checked_index_of(center)?;
        self.lattice.check_rings(radius)?;
        self.submit(Request::LockArea {
            center,
            radius,
            on_complete: Box::new(on_complete),
        })
    }

    /// Release every cell `map` records as acquired around `center`.
    pub fn release_locks(&self, center: Coordinate, map: LockMap) -> Result<(), LockError> {
        self.lattice.checked_index_of(center)?;
        self.lattice.check_rings(map.radius())?;
        self.submit(Request::ReleaseArea { center, map })
    }

    /// Run `work` on the serialized worker with exclusive access to the
    /// lock table, then deliver its result to `on_complete` on the
    /// executor.
    ///
    /// `work` runs between two requests, so it sees a consistent table.
    /// It must not block: the worker processes nothing else meanwhile.
    pub fn with_serialized<R, W, F>(&self, work: W, on_complete: F) -> Result<(), LockError>
    where
        R: Send + 'static,
        W: FnOnce(&mut LockTable) -> R + Send + 'static,
        F: FnOnce(R) + Send + 'static,
    {
        self.submit(Request::Serialized(Box::new(move |table: &mut LockTable| {
            let result = work(table);
            Box::new(move || on_complete(result)) as Job
        })))
    }
}

impl fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockHandle")
            .field("size", &self.lattice.size())
            .field("queued", &self.tx.len())
            .finish()
    }
}

// ── LockCoordinator ────────────────────────────────────────────────

/// Owns the serialized lock worker for one lattice.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use gridlock_core::{Coordinate, GridSize};
/// use gridlock_space::{Lattice, LatticeConfig};
/// use gridlock_sync::{ChannelExecutor, CoordinatorConfig, LockCoordinator};
///
/// let lattice = Arc::new(Lattice::new(LatticeConfig::new(GridSize::new(9, 9))).unwrap());
/// let (exec, jobs) = ChannelExecutor::new();
/// let coord = LockCoordinator::new(lattice, CoordinatorConfig::default(), Arc::new(exec)).unwrap();
///
/// let (tx, rx) = std::sync::mpsc::channel();
/// coord.lock_cell(Coordinate::new(1, 2), move |r| tx.send(r).unwrap()).unwrap();
/// assert!(jobs.run_next(Duration::from_secs(5)));
/// assert_eq!(rx.recv().unwrap(), Ok(()));
/// coord.release_lock(Coordinate::new(1, 2)).unwrap();
/// ```
pub struct LockCoordinator {
    handle: LockHandle,
    worker: Option<JoinHandle<()>>,
    counters: Arc<LockCounters>,
    // Outlives the worker, so the last reference never drops on the worker
    // thread while a completion thread is joining it.
    executor: Arc<dyn Executor>,
}

impl LockCoordinator {
    /// Validate `config` and spawn the worker thread.
    pub fn new(
        lattice: Arc<Lattice>,
        config: CoordinatorConfig,
        executor: Arc<dyn Executor>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let counters = Arc::new(LockCounters::default());
        let table = LockTable::new(
            Arc::clone(&lattice),
            &config,
            Arc::clone(&executor),
            Arc::clone(&counters),
        );
        let (tx, rx) = crossbeam_channel::unbounded();
        let worker = SyncWorker::new(table, rx, Arc::clone(&counters));
        let join = thread::Builder::new()
            .name("gridlock-sync".into())
            .spawn(move || worker.run())
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("lock worker: {e}"),
            })?;
        tracing::debug!(
            size = %lattice.size(),
            capacity = config.wait_queue_capacity,
            overflow = ?config.overflow,
            "lock coordinator started"
        );
        Ok(Self {
            handle: LockHandle { tx, lattice },
            worker: Some(join),
            counters,
            executor,
        })
    }

    /// Default configuration with completions on a [`ThreadPoolExecutor`].
    pub fn with_defaults(lattice: Arc<Lattice>) -> Result<Self, ConfigError> {
        let pool = ThreadPoolExecutor::new(&ThreadPoolConfig::default())?;
        Self::new(lattice, CoordinatorConfig::default(), Arc::new(pool))
    }

    /// A new submission handle.
    pub fn handle(&self) -> LockHandle {
        self.handle.clone()
    }

    /// The lattice being locked.
    pub fn lattice(&self) -> &Arc<Lattice> {
        self.handle.lattice()
    }

    /// Where completions run.
    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    /// Counter snapshot.
    pub fn metrics(&self) -> LockMetrics {
        self.counters.snapshot()
    }

    /// Whether the worker is still accepting requests.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// See [`LockHandle::lock_cell`].
    pub fn lock_cell<F>(&self, coord: Coordinate, on_acquired: F) -> Result<(), LockError>
    where
        F: FnOnce(Result<(), LockError>) + Send + 'static,
    {
        self.handle.lock_cell(coord, on_acquired)
    }

    /// See [`LockHandle::release_lock`].
    pub fn release_lock(&self, coord: Coordinate) -> Result<(), LockError> {
        self.handle.release_lock(coord)
    }

    /// See [`LockHandle::lock_area`].
    pub fn lock_area<F>(&self, center: Coordinate, radius: u32, on_complete: F) -> Result<(), LockError>
    where
        F: FnOnce(LockMap) + Send + 'static,
    {
        self.handle.lock_area(center, radius, on_complete)
    }

    /// See [`LockHandle::release_locks`].
    pub fn release_locks(&self, center: Coordinate, map: LockMap) -> Result<(), LockError> {
        self.handle.release_locks(center, map)
    }

    /// See [`LockHandle::with_serialized`].
    pub fn with_serialized<R, W, F>(&self, work: W, on_complete: F) -> Result<(), LockError>
    where
        R: Send + 'static,
        W: FnOnce(&mut LockTable) -> R + Send + 'static,
        F: FnOnce(R) + Send + 'static,
    {
        self.handle.with_serialized(work, on_complete)
    }

    /// Stop the worker after the requests already queued and join it.
    ///
    /// Parked waiters are dropped without being called. Idempotent.
    pub fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        // Fails only if the worker already exited.
        let _ = self.handle.tx.send(Request::Shutdown);
        // Dropped from a completion running on the worker: it exits on its own.
        if worker.thread().id() == thread::current().id() {
            return;
        }
        if worker.join().is_err() {
            tracing::error!("lock worker panicked");
        }
    }
}

impl Drop for LockCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for LockCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockCoordinator")
            .field("handle", &self.handle)
            .field("running", &self.is_running())
            .finish()
    }
}
