//! Spatial edge (boundary) behavior for ring lookups.

/// How ring lookups treat positions that fall off the grid.
///
/// Only ring-relative lookups are affected. Absolute lookups always reject
/// out-of-bounds coordinates, and [`Lattice::resolve`](crate::Lattice::resolve)
/// always wraps so that callers can see both the real and the virtual
/// position.
///
/// # Examples
///
/// ```
/// use gridlock_core::{Coordinate, GridSize};
/// use gridlock_space::{EdgeBehavior, Lattice, LatticeConfig};
///
/// let corner = Coordinate::new(-2, 2);
///
/// // Wrap: ring index 5 (one step left) reappears on the right edge.
/// let wrap = Lattice::new(LatticeConfig::new(GridSize::new(5, 5))).unwrap();
/// assert_eq!(wrap.ring_cell(5, corner).unwrap(), Some(Coordinate::new(2, 2)));
///
/// // Absorb: the same lookup finds no cell.
/// let absorb = Lattice::new(
///     LatticeConfig::new(GridSize::new(5, 5)).with_edge(EdgeBehavior::Absorb),
/// )
/// .unwrap();
/// assert_eq!(absorb.ring_cell(5, corner).unwrap(), None);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EdgeBehavior {
    /// Off-grid positions wrap to the opposite edge (torus topology).
    #[default]
    Wrap,
    /// Off-grid positions have no cell.
    Absorb,
}
