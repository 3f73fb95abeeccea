//! Storage-index <-> coordinate mapping.

use gridlock_core::{Coordinate, GridSize, SpaceError};

/// Maps a linear storage index to a 2D coordinate and back.
///
/// Implementations must be a bijection between `[0, cell_count())` and the
/// set of coordinates for which [`contains`](GridLayout::contains) is true.
/// [`index_of`](GridLayout::index_of) is only defined for in-bounds
/// coordinates; callers check first or use
/// [`checked_index_of`](GridLayout::checked_index_of).
pub trait GridLayout: Send + Sync {
    /// The (odd) grid dimensions.
    fn size(&self) -> GridSize;

    /// Whether `coord` addresses a cell on the grid.
    fn contains(&self, coord: Coordinate) -> bool;

    /// Storage index of an in-bounds coordinate.
    fn index_of(&self, coord: Coordinate) -> usize;

    /// Coordinate of a storage index in `[0, cell_count())`.
    fn coordinate_of(&self, index: usize) -> Coordinate;

    /// Number of cells.
    fn cell_count(&self) -> usize {
        self.size().area()
    }

    /// [`index_of`](GridLayout::index_of) with the bounds check applied.
    fn checked_index_of(&self, coord: Coordinate) -> Result<usize, SpaceError> {
        if self.contains(coord) {
            Ok(self.index_of(coord))
        } else {
            Err(SpaceError::CoordOutOfBounds {
                coord,
                size: self.size(),
            })
        }
    }
}

/// Row-major layout with the origin at the geometric center.
///
/// Index 0 is the top-left cell `(-w/2, h/2)`; increasing the index moves
/// right along a row, then down to the next row. The center `(0, 0)` sits
/// at index `(h/2) * w + w/2`.
///
/// ```
/// use gridlock_core::{Coordinate, GridSize};
/// use gridlock_space::{CenteredLayout, GridLayout};
///
/// let layout = CenteredLayout::new(GridSize::new(99, 99));
/// assert_eq!(layout.coordinate_of(0), Coordinate::new(-49, 49));
/// assert_eq!(layout.index_of(Coordinate::ORIGIN), 49 * 99 + 49);
/// assert_eq!(layout.coordinate_of(99 * 99 - 1), Coordinate::new(49, -49));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CenteredLayout {
    size: GridSize,
    half_width: i32,
    half_height: i32,
}

impl CenteredLayout {
    /// Create a layout for `size`. Both extents must already be odd.
    pub fn new(size: GridSize) -> Self {
        debug_assert!(size.is_odd(), "centered layout needs odd extents, got {size}");
        Self {
            size,
            half_width: size.half_width(),
            half_height: size.half_height(),
        }
    }
}

impl GridLayout for CenteredLayout {
    fn size(&self) -> GridSize {
        self.size
    }

    fn contains(&self, coord: Coordinate) -> bool {
        (-self.half_width..=self.half_width).contains(&coord.x)
            && (-self.half_height..=self.half_height).contains(&coord.y)
    }

    fn index_of(&self, coord: Coordinate) -> usize {
        debug_assert!(self.contains(coord), "index_of({coord}) off a {} grid", self.size);
        let row = (self.half_height - coord.y) as usize;
        let col = (self.half_width + coord.x) as usize;
        row * self.size.width as usize + col
    }

    fn coordinate_of(&self, index: usize) -> Coordinate {
        debug_assert!(index < self.cell_count(), "storage index {index} out of range");
        let width = self.size.width as usize;
        let x = (index % width) as i32 - self.half_width;
        let y = self.half_height - (index / width) as i32;
        Coordinate::new(x, y)
    }
}
