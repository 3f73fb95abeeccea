//! Per-cell lock state owned by the serialized worker.
//!
//! [`LockTable`] holds one lock bit and one FIFO waiter queue per cell. It
//! is only ever touched from the worker thread: requests reach it through
//! the coordinator's channel, and [`with_serialized`] closures borrow it
//! mutably between requests.
//!
//! [`with_serialized`]: crate::LockHandle::with_serialized

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use gridlock_core::{Coordinate, LockError, SpaceError};
use gridlock_space::Lattice;
use smallvec::SmallVec;

use crate::config::{CoordinatorConfig, OverflowPolicy};
use crate::executor::{Executor, Job};
use crate::metrics::LockCounters;

/// A parked single-cell request.
pub(crate) type Waiter = Box<dyn FnOnce(Result<(), LockError>) + Send + 'static>;

// ── LockMap ────────────────────────────────────────────────────────

/// Result of an area lock: which ring indices this request acquired.
///
/// Entry `i` corresponds to ring index `i` around the area's center. Entry
/// 0 (the center) is always `false`: area locks never touch the center.
/// Hand the map back to
/// [`release_locks`](crate::LockHandle::release_locks) to release exactly
/// the acquired cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockMap {
    radius: u32,
    acquired: SmallVec<[bool; 25]>,
}

impl LockMap {
    pub(crate) fn new(radius: u32) -> Self {
        Self {
            radius,
            acquired: SmallVec::from_elem(false, Lattice::cells_for_rings(radius)),
        }
    }

    /// Ring radius the map covers.
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Number of ring indices, center included: `(2 * radius + 1)²`.
    pub fn len(&self) -> usize {
        self.acquired.len()
    }

    /// Always `false`: every map has at least the center entry.
    pub fn is_empty(&self) -> bool {
        self.acquired.is_empty()
    }

    /// Whether ring index `ring_index` was acquired. `false` out of range.
    pub fn is_acquired(&self, ring_index: usize) -> bool {
        self.acquired.get(ring_index).copied().unwrap_or(false)
    }

    /// Number of cells acquired.
    pub fn acquired_count(&self) -> usize {
        self.acquired.iter().filter(|&&a| a).count()
    }

    /// Whether every non-center ring index was acquired.
    pub fn all_acquired(&self) -> bool {
        self.acquired.iter().skip(1).all(|&a| a)
    }

    /// Entries in ring-index order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.acquired.iter().copied()
    }

    /// Ring indices that were acquired.
    pub fn acquired_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.acquired
            .iter()
            .enumerate()
            .filter_map(|(i, &a)| a.then_some(i))
    }

    pub(crate) fn set(&mut self, ring_index: usize, acquired: bool) {
        self.acquired[ring_index] = acquired;
    }
}

// ── LockTable ──────────────────────────────────────────────────────

#[derive(Default)]
struct CellLock {
    locked: bool,
    waiters: VecDeque<Waiter>,
}

/// Lock bits and waiter queues for every cell of a lattice.
///
/// Obtained only inside
/// [`with_serialized`](crate::LockHandle::with_serialized). Every method
/// applies the same rules as the coordinator's requests: releasing a cell
/// with waiters hands it to the oldest one instead of freeing it.
pub struct LockTable {
    lattice: Arc<Lattice>,
    cells: Vec<CellLock>,
    capacity: usize,
    overflow: OverflowPolicy,
    executor: Arc<dyn Executor>,
    counters: Arc<LockCounters>,
}

impl LockTable {
    pub(crate) fn new(
        lattice: Arc<Lattice>,
        config: &CoordinatorConfig,
        executor: Arc<dyn Executor>,
        counters: Arc<LockCounters>,
    ) -> Self {
        let cells = (0..lattice.cell_count()).map(|_| CellLock::default()).collect();
        Self {
            lattice,
            cells,
            capacity: config.wait_queue_capacity,
            overflow: config.overflow,
            executor,
            counters,
        }
    }

    /// The lattice the table covers.
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Whether the cell at `coord` is locked.
    pub fn is_locked(&self, coord: Coordinate) -> Result<bool, SpaceError> {
        let index = self.lattice.checked_index_of(coord)?;
        Ok(self.cells[index].locked)
    }

    /// Lock the cell at `coord` if it is free. Never parks.
    pub fn try_lock(&mut self, coord: Coordinate) -> Result<bool, SpaceError> {
        let index = self.lattice.checked_index_of(coord)?;
        Ok(self.try_lock_index(index))
    }

    /// Release the cell at `coord`, handing it to its oldest waiter if any.
    pub fn release(&mut self, coord: Coordinate) -> Result<(), SpaceError> {
        let index = self.lattice.checked_index_of(coord)?;
        self.release_index(index);
        Ok(())
    }

    /// Number of parked waiters for the cell at `coord`.
    pub fn waiter_count(&self, coord: Coordinate) -> Result<usize, SpaceError> {
        let index = self.lattice.checked_index_of(coord)?;
        Ok(self.cells[index].waiters.len())
    }

    /// Number of locked cells.
    pub fn locked_count(&self) -> usize {
        self.cells.iter().filter(|c| c.locked).count()
    }

    /// Total parked waiters across all cells.
    pub fn pending_waiters(&self) -> usize {
        self.cells.iter().map(|c| c.waiters.len()).sum()
    }

    pub(crate) fn dispatch(&self, job: Job) {
        self.executor.execute(job);
    }

    fn try_lock_index(&mut self, index: usize) -> bool {
        let cell = &mut self.cells[index];
        if cell.locked {
            false
        } else {
            cell.locked = true;
            true
        }
    }

    /// Grant the lock now, or park `waiter` behind the holder.
    pub(crate) fn lock(&mut self, index: usize, waiter: Waiter) {
        if self.try_lock_index(index) {
            LockCounters::bump(&self.counters.immediate_grants);
            self.dispatch(Box::new(move || waiter(Ok(()))));
            return;
        }

        let queued = self.cells[index].waiters.len();
        if queued >= self.capacity && self.overflow == OverflowPolicy::Reject {
            let coord = self.lattice.coordinate_of(index);
            let capacity = self.capacity;
            tracing::warn!(%coord, capacity, "wait queue full; rejecting waiter");
            LockCounters::bump(&self.counters.overflow_rejections);
            self.dispatch(Box::new(move || {
                waiter(Err(LockError::WaitQueueFull { coord, capacity }))
            }));
            return;
        }

        let waiters = &mut self.cells[index].waiters;
        if waiters.capacity() == 0 {
            waiters.reserve(self.capacity.min(16));
        }
        waiters.push_back(waiter);
        LockCounters::bump(&self.counters.deferrals);
    }

    /// Hand the cell to its oldest waiter, or free it.
    pub(crate) fn release_index(&mut self, index: usize) {
        let cell = &mut self.cells[index];
        if !cell.locked {
            let coord = self.lattice.coordinate_of(index);
            tracing::warn!(%coord, "release of a cell that is not locked");
            LockCounters::bump(&self.counters.invalid_releases);
            return;
        }
        match cell.waiters.pop_front() {
            Some(waiter) => {
                // Stays locked: ownership moves to the waiter.
                let coord = self.lattice.coordinate_of(index);
                tracing::debug!(%coord, waiting = cell.waiters.len(), "lock handed to next waiter");
                LockCounters::bump(&self.counters.handoffs);
                self.dispatch(Box::new(move || waiter(Ok(()))));
            }
            None => {
                cell.locked = false;
                LockCounters::bump(&self.counters.releases);
            }
        }
    }

    /// Try every ring cell `1..(2r+1)²` around `center` once.
    ///
    /// The center is never taken, even when a ring wraps back onto it.
    pub(crate) fn lock_area(&mut self, center: Coordinate, radius: u32) -> LockMap {
        let mut map = LockMap::new(radius);
        let center_index = self.lattice.index_of(center);
        let mut taken = 0u64;
        for ring_index in 1..map.len() {
            let Ok(Some(coord)) = self.lattice.ring_cell(ring_index, center) else {
                continue;
            };
            let index = self.lattice.index_of(coord);
            if index != center_index && self.try_lock_index(index) {
                map.set(ring_index, true);
                taken += 1;
            }
        }
        LockCounters::bump(&self.counters.area_requests);
        LockCounters::add(&self.counters.area_cells_locked, taken);
        LockCounters::add(
            &self.counters.area_cells_contended,
            (map.len() - 1) as u64 - taken,
        );
        map
    }

    /// Release every ring cell the map records as acquired.
    pub(crate) fn release_area(&mut self, center: Coordinate, map: &LockMap) {
        let center_index = self.lattice.index_of(center);
        for ring_index in map.acquired_indices() {
            match self.lattice.ring_cell(ring_index, center) {
                Ok(Some(coord)) if self.lattice.index_of(coord) == center_index => {
                    tracing::warn!(%center, ring_index, "lock map entry wraps onto the center");
                }
                Ok(Some(coord)) => {
                    let index = self.lattice.index_of(coord);
                    self.release_index(index);
                }
                _ => {
                    tracing::warn!(%center, ring_index, "lock map entry does not resolve to a cell");
                }
            }
        }
    }
}

impl fmt::Debug for LockTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockTable")
            .field("size", &self.lattice.size())
            .field("locked", &self.locked_count())
            .field("pending_waiters", &self.pending_waiters())
            .field("capacity", &self.capacity)
            .field("overflow", &self.overflow)
            .finish()
    }
}
