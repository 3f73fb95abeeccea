//! Core types for the Gridlock lattice library.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! value types shared by the addressing engine and the lock coordinator:
//! [`Coordinate`], [`GridSize`], and the error enums for each subsystem.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod coord;
pub mod error;

pub use coord::{Coordinate, GridSize};
pub use error::{LockError, SpaceError};
