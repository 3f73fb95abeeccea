//! Gridlock: toroidal lattice addressing with per-cell locking.
//!
//! This is the facade crate re-exporting the public API of the Gridlock
//! sub-crates. Most users only need this one dependency.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use gridlock::prelude::*;
//!
//! struct Agent;
//!
//! // A 100x100 request is adjusted to 99x99 so the origin is a real cell.
//! let grid: Grid<Agent> = Grid::new(LatticeConfig::new(GridSize::new(100, 100))).unwrap();
//! assert_eq!(grid.size(), GridSize::new(99, 99));
//!
//! let agent = Arc::new(Agent);
//! let home = grid.cell_at(Coordinate::new(-49, 49)).unwrap();
//! home.set_payload(&agent);
//!
//! // Nearest empty neighbour, wrapping across the corner if needed.
//! let free = grid
//!     .first(home, 9, |p| !p.real_cell.has_payload())
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(free.real_cell.coordinate(), Coordinate::new(-48, 49));
//!
//! // Lock it before moving in. Completions are pumped on this thread.
//! let (exec, jobs) = ChannelExecutor::new();
//! let locks = LockCoordinator::new(
//!     Arc::clone(grid.lattice()),
//!     CoordinatorConfig::default(),
//!     Arc::new(exec),
//! )
//! .unwrap();
//! let target = free.real_cell.coordinate();
//! let (tx, rx) = std::sync::mpsc::channel();
//! locks.lock_cell(target, move |granted| tx.send(granted).unwrap()).unwrap();
//! assert!(jobs.run_next(Duration::from_secs(5)));
//! assert_eq!(rx.recv().unwrap(), Ok(()));
//!
//! grid.cell_at(target).unwrap().set_payload(&agent);
//! home.clear_payload();
//! locks.release_lock(target).unwrap();
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `gridlock-core` | `Coordinate`, `GridSize`, error enums |
//! | [`space`] | `gridlock-space` | Layout, ring indexing, toroidal wrap, `Lattice`, `Grid` |
//! | [`sync`] | `gridlock-sync` | `LockCoordinator`, executors, lock maps, metrics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Coordinates, sizes and errors (`gridlock-core`).
pub use gridlock_core as types;

/// Spatial addressing (`gridlock-space`).
///
/// [`space::Lattice`] is the shared read-only addressing engine;
/// [`space::Grid`] adds one [`space::Cell`] per address.
pub use gridlock_space as space;

/// Lock coordination (`gridlock-sync`).
///
/// [`sync::LockCoordinator`] owns the serialized worker; completions run on
/// an [`sync::Executor`].
pub use gridlock_sync as sync;

/// Common imports for typical Gridlock usage.
///
/// ```rust
/// use gridlock::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use gridlock_core::{Coordinate, GridSize, LockError, SpaceError};

    // Space
    pub use gridlock_space::{AsteroidPoint, Cell, EdgeBehavior, Grid, Lattice, LatticeConfig};

    // Locking
    pub use gridlock_sync::{
        ChannelExecutor, CoordinatorConfig, Executor, InlineExecutor, LockCoordinator, LockHandle,
        LockMap, LockMetrics, OverflowPolicy, ThreadPoolConfig, ThreadPoolExecutor,
    };
}
