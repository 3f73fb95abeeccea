//! Lock coordinator counters.
//!
//! The worker bumps relaxed atomics as it processes requests;
//! [`LockMetrics`] is a point-in-time copy for telemetry and tests.

use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative counts since the coordinator started.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LockMetrics {
    /// Single-cell locks granted on a free cell.
    pub immediate_grants: u64,
    /// Single-cell requests parked behind a held lock.
    pub deferrals: u64,
    /// Releases that passed the lock straight to a parked waiter.
    pub handoffs: u64,
    /// Releases that left the cell free.
    pub releases: u64,
    /// Waiters rejected because the cell's queue was full.
    pub overflow_rejections: u64,
    /// Releases of a cell that was not locked.
    pub invalid_releases: u64,
    /// `lock_area` requests processed.
    pub area_requests: u64,
    /// Cells taken by area requests.
    pub area_cells_locked: u64,
    /// Ring positions an area request could not take.
    pub area_cells_contended: u64,
    /// `with_serialized` closures run.
    pub serialized_runs: u64,
}

/// Shared atomic backing for [`LockMetrics`].
#[derive(Debug, Default)]
pub(crate) struct LockCounters {
    pub immediate_grants: AtomicU64,
    pub deferrals: AtomicU64,
    pub handoffs: AtomicU64,
    pub releases: AtomicU64,
    pub overflow_rejections: AtomicU64,
    pub invalid_releases: AtomicU64,
    pub area_requests: AtomicU64,
    pub area_cells_locked: AtomicU64,
    pub area_cells_contended: AtomicU64,
    pub serialized_runs: AtomicU64,
}

impl LockCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LockMetrics {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        LockMetrics {
            immediate_grants: get(&self.immediate_grants),
            deferrals: get(&self.deferrals),
            handoffs: get(&self.handoffs),
            releases: get(&self.releases),
            overflow_rejections: get(&self.overflow_rejections),
            invalid_releases: get(&self.invalid_releases),
            area_requests: get(&self.area_requests),
            area_cells_locked: get(&self.area_cells_locked),
            area_cells_contended: get(&self.area_cells_contended),
            serialized_runs: get(&self.serialized_runs),
        }
    }
}
