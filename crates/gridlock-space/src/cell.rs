//! Grid cells and their non-owning payload slot.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use gridlock_core::Coordinate;

/// One addressable slot of a [`Grid`](crate::Grid).
///
/// A cell knows its coordinate and storage index (both fixed at grid
/// construction) and may point at a caller-owned payload. The pointer is a
/// [`Weak`]: dropping the caller's last `Arc` empties the slot, and the
/// grid never keeps a payload alive.
///
/// ```
/// use std::sync::Arc;
/// use gridlock_core::{Coordinate, GridSize};
/// use gridlock_space::{Grid, LatticeConfig};
///
/// let grid: Grid<String> = Grid::new(LatticeConfig::new(GridSize::new(3, 3))).unwrap();
/// let cell = grid.cell_at(Coordinate::ORIGIN).unwrap();
///
/// let gremlin = Arc::new("gremlin".to_string());
/// cell.set_payload(&gremlin);
/// assert_eq!(cell.payload().as_deref().map(String::as_str), Some("gremlin"));
///
/// drop(gremlin);
/// assert!(cell.payload().is_none());
/// ```
pub struct Cell<P> {
    index: usize,
    coordinate: Coordinate,
    payload: RwLock<Weak<P>>,
}

impl<P> Cell<P> {
    pub(crate) fn new(index: usize, coordinate: Coordinate) -> Self {
        Self {
            index,
            coordinate,
            payload: RwLock::new(Weak::new()),
        }
    }

    /// Storage index (row-major from the top-left corner).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Position on the grid.
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// The payload, if one is set and its owner still holds it.
    pub fn payload(&self) -> Option<Arc<P>> {
        self.payload
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade()
    }

    /// Point this cell at `payload` without taking ownership.
    pub fn set_payload(&self, payload: &Arc<P>) {
        *self.payload.write().unwrap_or_else(PoisonError::into_inner) = Arc::downgrade(payload);
    }

    /// Empty the slot.
    pub fn clear_payload(&self) {
        *self.payload.write().unwrap_or_else(PoisonError::into_inner) = Weak::new();
    }

    /// Whether a live payload is attached.
    pub fn has_payload(&self) -> bool {
        self.payload
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .strong_count()
            > 0
    }
}

impl<P> PartialEq for Cell<P> {
    fn eq(&self, other: &Self) -> bool {
        self.coordinate == other.coordinate
    }
}

impl<P> Eq for Cell<P> {}

impl<P> fmt::Debug for Cell<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cell {:04}:{}", self.index, self.coordinate)
    }
}
