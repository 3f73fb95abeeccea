//! End-to-end behavior of the lock coordinator through its public API.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use gridlock_core::{Coordinate, LockError};
use gridlock_space::Lattice;
use gridlock_sync::{
    ChannelExecutor, CoordinatorConfig, InlineExecutor, JobReceiver, LockCoordinator, LockHandle,
    LockMap, OverflowPolicy,
};
use gridlock_test_utils::{fixtures, Recorder, WAIT};
use proptest::prelude::*;

fn pumped(lattice: Arc<Lattice>, config: CoordinatorConfig) -> (LockCoordinator, JobReceiver) {
    let (exec, jobs) = ChannelExecutor::new();
    let coord = LockCoordinator::new(lattice, config, Arc::new(exec)).unwrap();
    (coord, jobs)
}

/// Run every completion produced by requests submitted so far.
fn settle(coord: &LockCoordinator, jobs: &JobReceiver) {
    let done = Arc::new(AtomicBool::new(false));
    let d = Arc::clone(&done);
    coord
        .with_serialized(|_| (), move |()| d.store(true, Ordering::SeqCst))
        .unwrap();
    assert!(jobs.run_until(WAIT, || done.load(Ordering::SeqCst)));
}

fn table_state(coord: &LockCoordinator, jobs: &JobReceiver, cell: Coordinate) -> (bool, usize) {
    let rec = Recorder::new();
    coord
        .with_serialized(
            move |t| (t.is_locked(cell).unwrap(), t.waiter_count(cell).unwrap()),
            rec.sink(0),
        )
        .unwrap();
    settle(coord, jobs);
    rec.take(1)[0].1
}

// ── Single-cell hand-off ───────────────────────────────────────────

#[test]
fn waiters_are_granted_in_fifo_order() {
    let (coord, jobs) = pumped(fixtures::lattice(9), CoordinatorConfig::default());
    let cell = Coordinate::new(2, -3);
    let rec = Recorder::new();
    for label in 1..=3 {
        coord.lock_cell(cell, rec.sink(label)).unwrap();
    }
    settle(&coord, &jobs);
    assert_eq!(rec.drain().len(), 1);
    assert_eq!(table_state(&coord, &jobs, cell), (true, 2));

    coord.release_lock(cell).unwrap();
    settle(&coord, &jobs);
    let granted = rec.drain();
    assert_eq!(granted.len(), 1);
    assert_eq!(granted[0], (2, Ok(())));
    // Handed off, never freed in between.
    assert_eq!(table_state(&coord, &jobs, cell), (true, 1));

    coord.release_lock(cell).unwrap();
    settle(&coord, &jobs);
    assert_eq!(rec.drain(), vec![(3, Ok(()))]);

    coord.release_lock(cell).unwrap();
    assert_eq!(table_state(&coord, &jobs, cell), (false, 0));

    let m = coord.metrics();
    assert_eq!(m.immediate_grants, 1);
    assert_eq!(m.deferrals, 2);
    assert_eq!(m.handoffs, 2);
    assert_eq!(m.releases, 1);
}

#[test]
fn independent_cells_do_not_block_each_other() {
    let (coord, jobs) = pumped(fixtures::lattice(5), CoordinatorConfig::default());
    let rec = Recorder::new();
    coord.lock_cell(Coordinate::new(0, 0), rec.sink(0)).unwrap();
    coord.lock_cell(Coordinate::new(1, 0), rec.sink(1)).unwrap();
    coord.lock_cell(Coordinate::new(-2, 2), rec.sink(2)).unwrap();
    settle(&coord, &jobs);
    assert_eq!(rec.labels(3), vec![0, 1, 2]);
    assert!(rec.drain().is_empty());
}

// ── Nested requests from completions ───────────────────────────────

#[test]
fn callback_can_relock_the_cell_it_holds() {
    let coord = LockCoordinator::new(
        fixtures::lattice(5),
        CoordinatorConfig::default(),
        Arc::new(InlineExecutor),
    )
    .unwrap();
    let handle = coord.handle();
    let cell = Coordinate::new(1, 1);
    let rec = Recorder::new();
    let second = rec.sink(2);
    let first = rec.sink(1);

    coord
        .lock_cell(cell, move |r| {
            first(r);
            // Parks behind ourselves, then our release hands it over.
            handle.lock_cell(cell, second).unwrap();
            handle.release_lock(cell).unwrap();
        })
        .unwrap();

    assert_eq!(rec.take(2), vec![(1, Ok(())), (2, Ok(()))]);
    let m = coord.metrics();
    assert_eq!(m.handoffs, 1);
    assert_eq!(m.deferrals, 1);
}

fn relock_chain(handle: LockHandle, cell: Coordinate, remaining: u32, hops: Arc<AtomicU32>, done: Sender<u32>) {
    let next = handle.clone();
    handle
        .lock_cell(cell, move |r| {
            assert_eq!(r, Ok(()));
            hops.fetch_add(1, Ordering::SeqCst);
            next.release_lock(cell).unwrap();
            if remaining == 0 {
                done.send(hops.load(Ordering::SeqCst)).unwrap();
            } else {
                relock_chain(next, cell, remaining - 1, hops, done);
            }
        })
        .unwrap();
}

#[test]
fn long_relock_chains_do_not_nest_on_the_worker() {
    let coord = LockCoordinator::new(
        fixtures::lattice(3),
        CoordinatorConfig::default(),
        Arc::new(InlineExecutor),
    )
    .unwrap();
    let (tx, rx) = crossbeam_channel::bounded(1);
    relock_chain(coord.handle(), Coordinate::ORIGIN, 10_000, Arc::new(AtomicU32::new(0)), tx);
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), 10_001);
}

// ── Overflow ───────────────────────────────────────────────────────

#[test]
fn full_queue_rejects_the_newest_waiter() {
    let config = CoordinatorConfig {
        wait_queue_capacity: 2,
        overflow: OverflowPolicy::Reject,
    };
    let (coord, jobs) = pumped(fixtures::lattice(5), config);
    let cell = Coordinate::new(-1, 2);
    let rec = Recorder::new();
    for label in 0..5 {
        coord.lock_cell(cell, rec.sink(label)).unwrap();
    }
    settle(&coord, &jobs);
    let err = Err(LockError::WaitQueueFull { coord: cell, capacity: 2 });
    assert_eq!(rec.drain(), vec![(0, Ok(())), (3, err.clone()), (4, err)]);
    assert_eq!(table_state(&coord, &jobs, cell), (true, 2));
    assert_eq!(coord.metrics().overflow_rejections, 2);

    // The parked waiters are still served in order.
    coord.release_lock(cell).unwrap();
    coord.release_lock(cell).unwrap();
    settle(&coord, &jobs);
    assert_eq!(rec.drain(), vec![(1, Ok(())), (2, Ok(()))]);
}

#[test]
fn grow_policy_parks_past_capacity() {
    let config = CoordinatorConfig {
        wait_queue_capacity: 1,
        overflow: OverflowPolicy::Grow,
    };
    let (coord, jobs) = pumped(fixtures::lattice(3), config);
    let rec = Recorder::new();
    for label in 0..4 {
        coord.lock_cell(Coordinate::ORIGIN, rec.sink(label)).unwrap();
    }
    assert_eq!(table_state(&coord, &jobs, Coordinate::ORIGIN), (true, 3));
    assert_eq!(rec.drain(), vec![(0, Ok(()))]);
}

// ── Area locks ─────────────────────────────────────────────────────

#[test]
fn area_lock_reports_a_snapshot_of_free_cells() {
    let lattice = fixtures::lattice(11);
    let (coord, jobs) = pumped(Arc::clone(&lattice), CoordinatorConfig::default());
    let center = Coordinate::new(1, -1);
    let held = [1usize, 3, 5, 7, 9, 12, 15, 18, 21, 24];
    for &i in &held {
        let cell = lattice.ring_cell(i, center).unwrap().unwrap();
        coord.lock_cell(cell, |_| {}).unwrap();
    }

    let rec = Recorder::new();
    coord.lock_area(center, 2, rec.sink(0)).unwrap();
    settle(&coord, &jobs);
    let (_, map): (usize, LockMap) = rec.take(1).remove(0);

    assert_eq!(map.len(), 25);
    assert_eq!(map.radius(), 2);
    assert!(!map.is_acquired(0));
    for i in 1..25 {
        assert_eq!(map.is_acquired(i), !held.contains(&i), "ring index {i}");
    }
    assert_eq!(map.acquired_count(), 14);
    assert!(!map.all_acquired());
    // The center is never touched.
    assert_eq!(table_state(&coord, &jobs, center), (false, 0));

    coord.release_locks(center, map).unwrap();
    for &i in &held {
        coord.release_lock(lattice.ring_cell(i, center).unwrap().unwrap()).unwrap();
    }
    coord.lock_area(center, 2, rec.sink(1)).unwrap();
    settle(&coord, &jobs);
    let (_, map) = rec.take(1).remove(0);
    assert!(map.all_acquired());
    assert_eq!(coord.metrics().area_cells_contended, 10);
}

#[test]
fn area_lock_never_parks_behind_a_holder() {
    let lattice = fixtures::lattice(7);
    let (coord, jobs) = pumped(Arc::clone(&lattice), CoordinatorConfig::default());
    let neighbour = lattice.ring_cell(1, Coordinate::ORIGIN).unwrap().unwrap();
    coord.lock_cell(neighbour, |_| {}).unwrap();

    let rec = Recorder::new();
    coord.lock_area(Coordinate::ORIGIN, 1, rec.sink(0)).unwrap();
    settle(&coord, &jobs);
    let (_, map) = rec.take(1).remove(0);
    assert!(!map.is_acquired(1));
    assert_eq!(table_state(&coord, &jobs, neighbour), (true, 0));
}

#[test]
fn area_lock_wraps_across_the_corner() {
    let lattice = fixtures::reference_lattice();
    let (coord, jobs) = pumped(Arc::clone(&lattice), CoordinatorConfig::default());
    let corner = Coordinate::new(-49, 49);
    let rec = Recorder::new();
    coord.lock_area(corner, 1, rec.sink(0)).unwrap();
    settle(&coord, &jobs);
    let (_, map) = rec.take(1).remove(0);
    assert!(map.all_acquired());
    // (49, 48) is the wrapped lower-left neighbour.
    assert_eq!(table_state(&coord, &jobs, Coordinate::new(49, 48)), (true, 0));
    coord.release_locks(corner, map).unwrap();
    assert_eq!(table_state(&coord, &jobs, Coordinate::new(49, 48)), (false, 0));
}

#[test]
fn ring_wider_than_the_grid_never_takes_the_center() {
    let lattice = fixtures::lattice_with_rings(3, 3);
    let (coord, jobs) = pumped(lattice, CoordinatorConfig::default());
    let rec = Recorder::new();
    coord.lock_area(Coordinate::ORIGIN, 3, rec.sink(0)).unwrap();
    settle(&coord, &jobs);
    let (_, map) = rec.take(1).remove(0);
    assert_eq!(map.acquired_count(), 8);
    assert_eq!(table_state(&coord, &jobs, Coordinate::ORIGIN), (false, 0));

    // The center can still be locked and survives the area release.
    let held = Recorder::new();
    coord.lock_cell(Coordinate::ORIGIN, held.sink(1)).unwrap();
    coord.release_locks(Coordinate::ORIGIN, map).unwrap();
    settle(&coord, &jobs);
    assert_eq!(held.take(1), vec![(1, Ok(()))]);
    assert_eq!(table_state(&coord, &jobs, Coordinate::ORIGIN), (true, 0));
}

#[test]
fn absorbing_lattice_skips_off_grid_ring_cells() {
    let lattice = fixtures::absorbing_lattice(5);
    let (coord, jobs) = pumped(lattice, CoordinatorConfig::default());
    let rec = Recorder::new();
    coord.lock_area(Coordinate::new(-2, -2), 2, rec.sink(0)).unwrap();
    settle(&coord, &jobs);
    let (_, map) = rec.take(1).remove(0);
    // Only the 3x3 block up and to the right exists, minus the center.
    assert_eq!(map.acquired_count(), 8);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn area_map_is_the_complement_of_held_cells(held in proptest::collection::btree_set(1usize..25, 0..24)) {
        let lattice = fixtures::lattice(9);
        let (coord, jobs) = pumped(Arc::clone(&lattice), CoordinatorConfig::default());
        for &i in &held {
            coord.lock_cell(lattice.ring_cell(i, Coordinate::ORIGIN).unwrap().unwrap(), |_| {}).unwrap();
        }
        let rec = Recorder::new();
        coord.lock_area(Coordinate::ORIGIN, 2, rec.sink(0)).unwrap();
        settle(&coord, &jobs);
        let (_, map) = rec.take(1).remove(0);
        for i in 1..25 {
            prop_assert_eq!(map.is_acquired(i), !held.contains(&i));
        }
        prop_assert_eq!(map.acquired_count(), 24 - held.len());
    }
}

// ── Shutdown ───────────────────────────────────────────────────────

#[test]
fn shutdown_drops_parked_waiters_and_refuses_new_work() {
    let (mut coord, jobs) = pumped(fixtures::lattice(3), CoordinatorConfig::default());
    let rec = Recorder::new();
    coord.lock_cell(Coordinate::ORIGIN, rec.sink(0)).unwrap();
    coord.lock_cell(Coordinate::ORIGIN, rec.sink(1)).unwrap();
    let handle = coord.handle();
    coord.shutdown();

    jobs.run_pending();
    assert_eq!(rec.drain(), vec![(0, Ok(()))]);
    assert!(rec.is_quiet());
    assert_eq!(handle.release_lock(Coordinate::ORIGIN), Err(LockError::Shutdown));
    assert_eq!(
        handle.lock_area(Coordinate::ORIGIN, 1, |_| {}),
        Err(LockError::Shutdown)
    );
}

#[test]
fn dropping_the_coordinator_from_its_own_callback_does_not_hang() {
    let coord = LockCoordinator::new(
        fixtures::lattice(3),
        CoordinatorConfig::default(),
        Arc::new(InlineExecutor),
    )
    .unwrap();
    let slot = Arc::new(std::sync::Mutex::new(Some(coord)));
    let inner = Arc::clone(&slot);
    let rec = Recorder::new();
    let sink = rec.sink(0);
    let guard = slot.lock().unwrap();
    guard
        .as_ref()
        .unwrap()
        .lock_cell(Coordinate::ORIGIN, move |r| {
            drop(inner.lock().unwrap().take());
            sink(r);
        })
        .unwrap();
    drop(guard);
    assert_eq!(rec.take(1), vec![(0, Ok(()))]);
}

#[test]
fn dropping_the_coordinator_from_a_pool_callback_does_not_hang() {
    let coord = LockCoordinator::with_defaults(fixtures::lattice(3)).unwrap();
    let slot = Arc::new(std::sync::Mutex::new(Some(coord)));
    let inner = Arc::clone(&slot);
    let rec = Recorder::new();
    let sink = rec.sink(0);
    let guard = slot.lock().unwrap();
    guard
        .as_ref()
        .unwrap()
        .lock_cell(Coordinate::ORIGIN, move |r| {
            // Joins the worker from a completion thread, then releases the
            // last reference to the pool that thread belongs to.
            drop(inner.lock().unwrap().take());
            sink(r);
        })
        .unwrap();
    drop(guard);
    assert_eq!(rec.take(1), vec![(0, Ok(()))]);
    assert!(slot.lock().unwrap().is_none());
}
