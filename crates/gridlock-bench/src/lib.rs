//! Benchmark workloads for Gridlock.
//!
//! - [`seeded_coordinates`]: deterministic on-grid coordinates
//! - [`seeded_ring_indices`]: deterministic ring indices below a radius

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use gridlock_core::Coordinate;
use gridlock_space::Lattice;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// `count` coordinates drawn uniformly from `lattice`, reproducible from
/// `seed`.
pub fn seeded_coordinates(lattice: &Lattice, count: usize, seed: u64) -> Vec<Coordinate> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let cells = lattice.cell_count() as u64;
    (0..count)
        .map(|_| lattice.coordinate_of((rng.next_u64() % cells) as usize))
        .collect()
}

/// `count` ring indices in `0..(2 * radius + 1)²`, reproducible from `seed`.
pub fn seeded_ring_indices(radius: u32, count: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let span = Lattice::cells_for_rings(radius) as u64;
    (0..count)
        .map(|_| (rng.next_u64() % span) as usize)
        .collect()
}
