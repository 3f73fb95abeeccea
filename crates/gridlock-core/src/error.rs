//! Error types for the Gridlock lattice library.
//!
//! Organized by subsystem: addressing (space construction, coordinate and
//! ring-index lookups) and locking (the coordinator's request pipeline).

use std::error::Error;
use std::fmt;

use crate::coord::{Coordinate, GridSize};

/// Errors from lattice construction or spatial lookups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpaceError {
    /// A grid dimension is zero (after odd adjustment).
    EmptySpace {
        /// The size that was requested.
        requested: GridSize,
    },
    /// A dimension exceeds what `i32` coordinates can address.
    DimensionTooLarge {
        /// Which dimension.
        name: &'static str,
        /// The requested value.
        value: u32,
        /// The largest accepted value.
        max: u32,
    },
    /// A coordinate lies outside the grid.
    CoordOutOfBounds {
        /// The offending coordinate.
        coord: Coordinate,
        /// The grid it was checked against.
        size: GridSize,
    },
    /// A ring index lies past the end of the precomputed offset table.
    RingIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of entries in the table.
        capacity: usize,
    },
    /// An offset or radius reaches beyond the rings the indexer was built for.
    RingTooLarge {
        /// The requested ring.
        ring: u32,
        /// The configured maximum ring.
        max_rings: u32,
    },
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySpace { requested } => {
                write!(f, "grid {requested} has no cells after odd adjustment")
            }
            Self::DimensionTooLarge { name, value, max } => {
                write!(f, "{name} {value} exceeds maximum {max}")
            }
            Self::CoordOutOfBounds { coord, size } => {
                let (hw, hh) = (size.half_width(), size.half_height());
                write!(
                    f,
                    "coordinate {coord} out of bounds: [{}, {hw}] x [{}, {hh}]",
                    -hw, -hh
                )
            }
            Self::RingIndexOutOfRange { index, capacity } => {
                write!(f, "ring index {index} out of range (table holds {capacity})")
            }
            Self::RingTooLarge { ring, max_rings } => {
                write!(f, "ring {ring} exceeds configured maximum of {max_rings}")
            }
        }
    }
}

impl Error for SpaceError {}

/// Errors from the lock coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LockError {
    /// The cell's waiter queue is at capacity and the coordinator rejects
    /// new waiters.
    WaitQueueFull {
        /// The contended cell.
        coord: Coordinate,
        /// The configured per-cell capacity.
        capacity: usize,
    },
    /// The request addressed a cell or ring the lattice cannot resolve.
    Space(SpaceError),
    /// The coordinator's worker has stopped.
    Shutdown,
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitQueueFull { coord, capacity } => {
                write!(f, "wait queue for cell {coord} is full ({capacity} waiters)")
            }
            Self::Space(e) => write!(f, "addressing: {e}"),
            Self::Shutdown => write!(f, "lock coordinator has shut down"),
        }
    }
}

impl Error for LockError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Space(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SpaceError> for LockError {
    fn from(e: SpaceError) -> Self {
        Self::Space(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_message_names_the_rectangle() {
        let e = SpaceError::CoordOutOfBounds {
            coord: Coordinate::new(5, 0),
            size: GridSize::new(9, 5),
        };
        assert_eq!(
            e.to_string(),
            "coordinate (5, 0) out of bounds: [-4, 4] x [-2, 2]"
        );
    }

    #[test]
    fn lock_error_wraps_space_error_as_source() {
        let inner = SpaceError::RingTooLarge {
            ring: 9,
            max_rings: 4,
        };
        let e: LockError = inner.clone().into();
        assert_eq!(e, LockError::Space(inner));
        assert!(e.source().is_some());
        assert!(LockError::Shutdown.source().is_none());
    }
}
