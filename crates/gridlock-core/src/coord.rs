//! Lattice coordinates and grid dimensions.

use std::fmt;
use std::ops::{Add, Neg, Sub};

/// An integer `(x, y)` address on the lattice.
///
/// For the centered layout the origin `(0, 0)` is the geometric center of
/// the grid, `x` grows to the right and `y` grows upward. The same type is
/// used for absolute positions and for offsets from a center cell.
///
/// # Examples
///
/// ```
/// use gridlock_core::Coordinate;
///
/// let c = Coordinate::new(3, -1) + Coordinate::new(-1, 4);
/// assert_eq!(c, Coordinate::new(2, 3));
/// assert_eq!(Coordinate::new(-2, 5).chebyshev(), 5);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    /// Horizontal component.
    pub x: i32,
    /// Vertical component (up is positive).
    pub y: i32,
}

impl Coordinate {
    /// The grid center, and the zero offset.
    pub const ORIGIN: Coordinate = Coordinate { x: 0, y: 0 };

    /// Create a coordinate from its components.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (L-inf) length of this coordinate taken as an offset.
    ///
    /// This is the ring number the offset belongs to.
    pub fn chebyshev(self) -> u32 {
        self.x.unsigned_abs().max(self.y.unsigned_abs())
    }
}

impl Add for Coordinate {
    type Output = Coordinate;

    fn add(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Coordinate {
    type Output = Coordinate;

    fn sub(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Coordinate {
    type Output = Coordinate;

    fn neg(self) -> Coordinate {
        Coordinate::new(-self.x, -self.y)
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height of a grid, in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridSize {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl GridSize {
    /// Create a size from its extents.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of cells.
    pub fn area(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Cells to the right (or left) of the center column.
    pub fn half_width(self) -> i32 {
        (self.width / 2) as i32
    }

    /// Cells above (or below) the center row.
    pub fn half_height(self) -> i32 {
        (self.height / 2) as i32
    }

    /// Reduce each even extent by one so that `(0, 0)` has the same number
    /// of cells on either side of it.
    ///
    /// ```
    /// use gridlock_core::GridSize;
    ///
    /// assert_eq!(GridSize::new(100, 100).to_odd(), GridSize::new(99, 99));
    /// assert_eq!(GridSize::new(15, 8).to_odd(), GridSize::new(15, 7));
    /// ```
    pub fn to_odd(self) -> Self {
        Self {
            width: self.width - u32::from(self.width % 2 == 0 && self.width > 0),
            height: self.height - u32::from(self.height % 2 == 0 && self.height > 0),
        }
    }

    /// Whether both extents are odd.
    pub fn is_odd(self) -> bool {
        self.width % 2 == 1 && self.height % 2 == 1
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
