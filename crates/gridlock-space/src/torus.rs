//! Toroidal resolution of off-grid coordinates.

use gridlock_core::{Coordinate, GridSize};

/// A virtual coordinate paired with the on-grid coordinate it wraps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Resolved {
    /// The in-bounds coordinate.
    pub real: Coordinate,
    /// The coordinate as requested, possibly off the grid.
    pub virtual_position: Coordinate,
}

impl Resolved {
    /// True iff no wrapping was needed.
    pub fn is_on_grid(&self) -> bool {
        self.real == self.virtual_position
    }
}

/// Wraps coordinates that overflow one edge onto the opposite edge.
///
/// Each axis is handled independently. A value `a` on an axis of extent
/// `d` is left alone when `|a| <= d/2`; otherwise it is shifted by whole
/// multiples of `d` back into `[-d/2, d/2]`. For the neighborhoods of an
/// on-grid center this is a single shift of `-sign(a) * d`.
///
/// ```
/// use gridlock_core::{Coordinate, GridSize};
/// use gridlock_space::ToroidalResolver;
///
/// let t = ToroidalResolver::new(GridSize::new(99, 99));
/// let r = t.resolve(Coordinate::new(-50, 50));
/// assert_eq!(r.real, Coordinate::new(49, -49));
/// assert_eq!(r.virtual_position, Coordinate::new(-50, 50));
/// assert!(!r.is_on_grid());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToroidalResolver {
    width: i64,
    height: i64,
}

impl ToroidalResolver {
    /// Create a resolver for an odd-sized grid.
    pub fn new(size: GridSize) -> Self {
        debug_assert!(size.is_odd(), "toroidal wrap needs odd extents, got {size}");
        Self {
            width: size.width as i64,
            height: size.height as i64,
        }
    }

    /// Resolve `virtual_position` to its in-bounds counterpart.
    pub fn resolve(&self, virtual_position: Coordinate) -> Resolved {
        Resolved {
            real: self.wrap(virtual_position),
            virtual_position,
        }
    }

    /// Just the in-bounds coordinate.
    pub fn wrap(&self, c: Coordinate) -> Coordinate {
        Coordinate::new(
            wrap_axis(c.x, self.width),
            wrap_axis(c.y, self.height),
        )
    }
}

/// Fold `a` into `[-d/2, d/2]` for odd `d`.
fn wrap_axis(a: i32, d: i64) -> i32 {
    let half = d / 2;
    let a = a as i64;
    if a.abs() <= half {
        return a as i32;
    }
    ((a + half).rem_euclid(d) - half) as i32
}
