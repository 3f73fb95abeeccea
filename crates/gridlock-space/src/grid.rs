//! Cell store over a [`Lattice`].

use std::fmt;
use std::sync::Arc;

use gridlock_core::{Coordinate, GridSize, SpaceError};
use rand_chacha::rand_core::RngCore;

use crate::cell::Cell;
use crate::lattice::{Lattice, LatticeConfig};

/// A real (on-grid) cell together with the virtual position that led to it.
///
/// When a ring lookup runs off an edge, `real_cell` is the wrapped cell on
/// the far side and `virtual_position` is where the cell would have been
/// had the grid extended far enough.
pub struct AsteroidPoint<'g, P> {
    /// The on-grid cell.
    pub real_cell: &'g Cell<P>,
    /// The requested position, possibly off-grid.
    pub virtual_position: Coordinate,
}

impl<P> AsteroidPoint<'_, P> {
    /// True iff the lookup did not wrap.
    pub fn is_on_grid(&self) -> bool {
        self.real_cell.coordinate() == self.virtual_position
    }
}

impl<P> Clone for AsteroidPoint<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for AsteroidPoint<'_, P> {}

impl<P> fmt::Debug for AsteroidPoint<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsteroidPoint")
            .field("real_cell", self.real_cell)
            .field("virtual_position", &self.virtual_position)
            .finish()
    }
}

/// A 2D grid of [`Cell`]s with the origin at its center.
///
/// Cells are created once, for every address, and live as long as the
/// grid. The grid is read-only after construction apart from each cell's
/// payload slot, so it can be shared across threads behind an `Arc`.
///
/// # Examples
///
/// ```
/// use gridlock_core::{Coordinate, GridSize};
/// use gridlock_space::{Grid, LatticeConfig};
///
/// let grid: Grid<()> = Grid::new(LatticeConfig::new(GridSize::new(7, 7))).unwrap();
/// let center = grid.cell_at(Coordinate::ORIGIN).unwrap();
///
/// // First cell in ring order, skipping the center, with y < 0.
/// let hit = grid
///     .first(center, 9, |ap| ap.real_cell.coordinate().y < 0)
///     .unwrap()
///     .unwrap();
/// assert_eq!(hit.real_cell.coordinate(), Coordinate::new(1, -1));
/// ```
pub struct Grid<P> {
    lattice: Arc<Lattice>,
    cells: Vec<Cell<P>>,
}

impl<P> Grid<P> {
    /// Build the lattice described by `config` and one cell per address.
    pub fn new(config: LatticeConfig) -> Result<Self, SpaceError> {
        Ok(Self::with_lattice(Arc::new(Lattice::new(config)?)))
    }

    /// Build cells over an existing lattice.
    pub fn with_lattice(lattice: Arc<Lattice>) -> Self {
        let cells = (0..lattice.cell_count())
            .map(|i| Cell::new(i, lattice.coordinate_of(i)))
            .collect();
        Self { lattice, cells }
    }

    /// The shared addressing engine.
    pub fn lattice(&self) -> &Arc<Lattice> {
        &self.lattice
    }

    /// Adjusted (odd) dimensions.
    pub fn size(&self) -> GridSize {
        self.lattice.size()
    }

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.size().width
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.size().height
    }

    /// Number of cells.
    pub fn area(&self) -> usize {
        self.cells.len()
    }

    /// Whether `coord` is on the grid.
    pub fn contains(&self, coord: Coordinate) -> bool {
        self.lattice.contains(coord)
    }

    /// The cell at `coord`.
    pub fn cell_at(&self, coord: Coordinate) -> Result<&Cell<P>, SpaceError> {
        let index = self.lattice.checked_index_of(coord)?;
        Ok(&self.cells[index])
    }

    /// The cell with storage index `index`.
    pub fn cell_at_index(&self, index: usize) -> Option<&Cell<P>> {
        self.cells.get(index)
    }

    /// The cell at ring index `ring_index` around `center`.
    ///
    /// `Ok(None)` when the position falls off the grid and the lattice
    /// absorbs edges; a wrapping lattice always yields a cell.
    pub fn cell_at_ring(
        &self,
        ring_index: usize,
        center: &Cell<P>,
    ) -> Result<Option<&Cell<P>>, SpaceError> {
        let coord = self.lattice.ring_cell(ring_index, center.coordinate())?;
        Ok(coord.map(|c| &self.cells[self.lattice.index_of(c)]))
    }

    /// Ring lookup that always wraps and reports the virtual position.
    pub fn asteroid_point(
        &self,
        ring_index: usize,
        center: &Cell<P>,
    ) -> Result<AsteroidPoint<'_, P>, SpaceError> {
        let resolved = self.lattice.resolve(ring_index, center.coordinate())?;
        Ok(AsteroidPoint {
            real_cell: &self.cells[self.lattice.index_of(resolved.real)],
            virtual_position: resolved.virtual_position,
        })
    }

    /// All cells in storage order.
    pub fn cells(&self) -> std::slice::Iter<'_, Cell<P>> {
        self.cells.iter()
    }

    /// A uniformly chosen cell.
    pub fn random_cell<R: RngCore + ?Sized>(&self, rng: &mut R) -> &Cell<P> {
        &self.cells[uniform_below(rng, self.cells.len() as u64) as usize]
    }

    /// Scan ring indices `1..max_cells` around `center` and return the
    /// first point whose predicate holds.
    ///
    /// The center itself (index 0) is skipped. Candidates are produced one
    /// at a time and the scan stops at the first match. Asking for more
    /// cells than the ring table holds is an error, reported before any
    /// candidate is examined.
    pub fn first<F>(
        &self,
        center: &Cell<P>,
        max_cells: usize,
        mut predicate: F,
    ) -> Result<Option<AsteroidPoint<'_, P>>, SpaceError>
    where
        F: FnMut(&AsteroidPoint<'_, P>) -> bool,
    {
        let capacity = self.lattice.indexer().capacity();
        if max_cells > capacity {
            return Err(SpaceError::RingIndexOutOfRange {
                index: max_cells - 1,
                capacity,
            });
        }
        for ring_index in 1..max_cells {
            let point = self.asteroid_point(ring_index, center)?;
            if predicate(&point) {
                return Ok(Some(point));
            }
        }
        Ok(None)
    }

    /// Empty every cell's payload slot.
    pub fn reset_all_payloads(&self) {
        for cell in &self.cells {
            cell.clear_payload();
        }
    }
}

impl<'g, P> IntoIterator for &'g Grid<P> {
    type Item = &'g Cell<P>;
    type IntoIter = std::slice::Iter<'g, Cell<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

impl<P> fmt::Debug for Grid<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("size", &self.size())
            .field("max_rings", &self.lattice.max_rings())
            .field("edge", &self.lattice.edge_behavior())
            .finish()
    }
}

/// Unbiased draw from `[0, n)` by rejecting the ragged top of the u64 range.
fn uniform_below<R: RngCore + ?Sized>(rng: &mut R, n: u64) -> u64 {
    debug_assert!(n > 0);
    let zone = u64::MAX - (u64::MAX % n);
    loop {
        let v = rng.next_u64();
        if v < zone {
            return v % n;
        }
    }
}
