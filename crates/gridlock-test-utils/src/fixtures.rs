//! Stock lattices shared by integration tests and benches.

use std::sync::Arc;

use gridlock_core::GridSize;
use gridlock_space::{EdgeBehavior, Lattice, LatticeConfig};

/// Square wrapping lattice of side `side` (rounded down to odd).
pub fn lattice(side: u32) -> Arc<Lattice> {
    build(LatticeConfig::new(GridSize::new(side, side)))
}

/// Square lattice whose ring lookups stop at the border.
pub fn absorbing_lattice(side: u32) -> Arc<Lattice> {
    build(LatticeConfig::new(GridSize::new(side, side)).with_edge(EdgeBehavior::Absorb))
}

/// Square wrapping lattice with an explicit ring table size, for rings
/// wider than the grid.
pub fn lattice_with_rings(side: u32, max_rings: u32) -> Arc<Lattice> {
    build(LatticeConfig::new(GridSize::new(side, side)).with_max_rings(max_rings))
}

/// The 99x99 lattice used throughout the corner-wrap tests.
pub fn reference_lattice() -> Arc<Lattice> {
    lattice(99)
}

fn build(config: LatticeConfig) -> Arc<Lattice> {
    match Lattice::new(config) {
        Ok(l) => Arc::new(l),
        Err(e) => panic!("fixture lattice rejected: {e}"),
    }
}
