//! Spatial addressing for Gridlock lattices.
//!
//! This crate converts between absolute grid coordinates, linear storage
//! indices, and "ring indices" that enumerate cells in concentric squares
//! around an arbitrary center. Off-grid positions are wrapped to the far
//! edge like a torus.
//!
//! # Layers
//!
//! - [`CenteredLayout`]: storage index <-> coordinate, origin at the center
//! - [`RingIndexer`]: ring index <-> offset from a center
//! - [`ToroidalResolver`]: virtual (possibly off-grid) -> real coordinate
//! - [`Lattice`]: the three composed, shared read-only via `Arc`
//! - [`Grid`]: a [`Lattice`] plus one [`Cell`] per address
//!
//! Nothing here knows about locking; the coordinator in `gridlock-sync`
//! consumes [`Lattice`] for coordinate resolution.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cell;
pub mod edge;
pub mod grid;
pub mod lattice;
pub mod layout;
pub mod ring;
pub mod torus;

pub use cell::Cell;
pub use edge::EdgeBehavior;
pub use grid::{AsteroidPoint, Grid};
pub use lattice::{Lattice, LatticeConfig};
pub use layout::{CenteredLayout, GridLayout};
pub use ring::RingIndexer;
pub use torus::{Resolved, ToroidalResolver};

pub use gridlock_core::SpaceError;
