//! The serialized worker loop.
//!
//! The worker owns the [`LockTable`] exclusively (moved in at spawn). All
//! lock-state mutation happens here, one request at a time, in channel
//! order. Callers' code only runs through the executor.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use gridlock_core::Coordinate;

use crate::executor::Job;
use crate::metrics::LockCounters;
use crate::table::{LockMap, LockTable, Waiter};

/// Closure run against the table; returns the completion to dispatch.
pub(crate) type SerializedWork = Box<dyn FnOnce(&mut LockTable) -> Job + Send + 'static>;

/// Area completion.
pub(crate) type AreaDone = Box<dyn FnOnce(LockMap) + Send + 'static>;

/// One unit of work for the worker. Coordinates are validated on the
/// submitting side, so indices here are always in range.
pub(crate) enum Request {
    Lock {
        index: usize,
        on_acquired: Waiter,
    },
    Release {
        index: usize,
    },
    LockArea {
        center: Coordinate,
        radius: u32,
        on_complete: AreaDone,
    },
    ReleaseArea {
        center: Coordinate,
        map: LockMap,
    },
    Serialized(SerializedWork),
    Shutdown,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lock { index, .. } => write!(f, "Lock({index})"),
            Self::Release { index } => write!(f, "Release({index})"),
            Self::LockArea { center, radius, .. } => write!(f, "LockArea({center}, r={radius})"),
            Self::ReleaseArea { center, map } => {
                write!(f, "ReleaseArea({center}, r={})", map.radius())
            }
            Self::Serialized(_) => f.write_str("Serialized"),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

pub(crate) struct SyncWorker {
    table: LockTable,
    rx: Receiver<Request>,
    counters: Arc<LockCounters>,
}

impl SyncWorker {
    pub fn new(table: LockTable, rx: Receiver<Request>, counters: Arc<LockCounters>) -> Self {
        Self {
            table,
            rx,
            counters,
        }
    }

    /// Process requests until `Shutdown` arrives or every sender is gone.
    pub fn run(mut self) {
        tracing::debug!(size = %self.table.lattice().size(), "lock worker started");
        while let Ok(request) = self.rx.recv() {
            tracing::trace!(?request, "lock request");
            if !self.handle(request) {
                break;
            }
        }
        let dropped = self.table.pending_waiters();
        if dropped > 0 {
            tracing::debug!(dropped, "lock worker stopping with parked waiters");
        }
        tracing::debug!("lock worker stopped");
    }

    /// Apply one request. Returns `false` on shutdown.
    fn handle(&mut self, request: Request) -> bool {
        match request {
            Request::Lock { index, on_acquired } => self.table.lock(index, on_acquired),
            Request::Release { index } => self.table.release_index(index),
            Request::LockArea {
                center,
                radius,
                on_complete,
            } => {
                let map = self.table.lock_area(center, radius);
                self.table.dispatch(Box::new(move || on_complete(map)));
            }
            Request::ReleaseArea { center, map } => self.table.release_area(center, &map),
            Request::Serialized(work) => {
                LockCounters::bump(&self.counters.serialized_runs);
                let table = &mut self.table;
                match panic::catch_unwind(AssertUnwindSafe(|| work(table))) {
                    Ok(done) => self.table.dispatch(done),
                    Err(_) => tracing::error!("serialized work panicked; completion skipped"),
                }
            }
            Request::Shutdown => return false,
        }
        true
    }
}
