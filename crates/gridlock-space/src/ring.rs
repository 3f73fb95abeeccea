//! Ring-index enumeration of offsets around a center.
//!
//! Ring `r` is the set of offsets at Chebyshev distance exactly `r`: one
//! cell for `r = 0`, `8r` cells otherwise. Ring indices number every
//! offset, ring by ring, so that ring `r` occupies `[(2r-1)², (2r+1)²)`
//! and the first `(2r+1)²` indices cover the full square of radius `r`.
//!
//! Within ring `r` the walk starts at `(r, 0)` and goes clockwise:
//!
//! ```text
//!   r = 1              r = 2
//!
//!   6  7  8        19 20 21 22 23
//!   5  0  1        18  .  .  . 24
//!   4  3  2        17  .  .  .  9
//!                  16  .  .  . 10
//!                  15 14 13 12 11
//! ```
//!
//! Down the right edge, left along the bottom, up the left edge, right
//! along the top to the corner `(r, r)`, then down again until `(r, 1)`.

use gridlock_core::{Coordinate, SpaceError};

/// Precomputed ring-index -> offset table plus its closed-form inverse.
///
/// # Examples
///
/// ```
/// use gridlock_core::Coordinate;
/// use gridlock_space::RingIndexer;
///
/// let ri = RingIndexer::new(2);
/// assert_eq!(ri.capacity(), 25);
/// assert_eq!(ri.offset_at(0).unwrap(), Coordinate::ORIGIN);
/// assert_eq!(ri.offset_at(1).unwrap(), Coordinate::new(1, 0));
/// assert_eq!(ri.offset_at(8).unwrap(), Coordinate::new(1, 1));
/// assert_eq!(ri.index_of(Coordinate::new(2, 1)).unwrap(), 24);
/// ```
#[derive(Clone, Debug)]
pub struct RingIndexer {
    max_rings: u32,
    offsets: Vec<Coordinate>,
}

impl RingIndexer {
    /// Largest ring count whose table size still fits the index arithmetic.
    pub const MAX_RINGS: u32 = 1 << 14;

    /// Build the table for rings `0..=max_rings`.
    ///
    /// # Panics
    ///
    /// Panics if `max_rings > MAX_RINGS`; [`Lattice`](crate::Lattice)
    /// validates this before constructing an indexer.
    pub fn new(max_rings: u32) -> Self {
        assert!(
            max_rings <= Self::MAX_RINGS,
            "max_rings {max_rings} exceeds {}",
            Self::MAX_RINGS
        );
        let mut offsets = Vec::with_capacity(Self::cells_for_rings(max_rings));
        offsets.push(Coordinate::ORIGIN);
        for r in 1..=max_rings as i32 {
            push_ring(&mut offsets, r);
        }
        debug_assert_eq!(offsets.len(), Self::cells_for_rings(max_rings));
        Self { max_rings, offsets }
    }

    /// Number of offsets within `rings` rings of the center, center included.
    pub const fn cells_for_rings(rings: u32) -> usize {
        let side = 2 * rings as usize + 1;
        side * side
    }

    /// The ring that `index` belongs to. Defined for every index.
    pub fn ring_of(index: usize) -> u32 {
        // Smallest r with (2r+1)^2 > index.
        let mut r = ((index as f64).sqrt() as usize).saturating_sub(1) / 2;
        while Self::cells_for_rings(r as u32) <= index {
            r += 1;
        }
        while r > 0 && Self::cells_for_rings(r as u32 - 1) > index {
            r -= 1;
        }
        r as u32
    }

    /// Highest ring in the table.
    pub fn max_rings(&self) -> u32 {
        self.max_rings
    }

    /// Number of entries in the table.
    pub fn capacity(&self) -> usize {
        self.offsets.len()
    }

    /// The whole table, in ring-index order.
    pub fn offsets(&self) -> &[Coordinate] {
        &self.offsets
    }

    /// Offset of ring index `index` from the center.
    pub fn offset_at(&self, index: usize) -> Result<Coordinate, SpaceError> {
        self.offsets
            .get(index)
            .copied()
            .ok_or(SpaceError::RingIndexOutOfRange {
                index,
                capacity: self.offsets.len(),
            })
    }

    /// Ring index of `offset`; the inverse of [`offset_at`](Self::offset_at).
    pub fn index_of(&self, offset: Coordinate) -> Result<usize, SpaceError> {
        let ring = offset.chebyshev();
        if ring > self.max_rings {
            return Err(SpaceError::RingTooLarge {
                ring,
                max_rings: self.max_rings,
            });
        }
        Ok(Self::index_of_unchecked(offset))
    }

    /// Closed-form inverse, independent of table size.
    ///
    /// Valid for offsets whose Chebyshev distance is below `2^30`, the
    /// largest rings whose indices fit in `i64` and a 64-bit `usize`.
    ///
    /// Edges are tested top, right, bottom, left, so each corner belongs to
    /// the first edge that claims it.
    pub fn index_of_unchecked(offset: Coordinate) -> usize {
        let r = offset.chebyshev() as i64;
        if r == 0 {
            return 0;
        }
        let (x, y) = (offset.x as i64, offset.y as i64);
        let sq = |v: i64| v * v;
        let index = if y == r {
            sq(2 * r + 1) - (2 * r - x)
        } else if x == r {
            let d = if y > 0 { 1 } else { -1 };
            sq(2 * r + d) - y
        } else if y == -r {
            sq(2 * r - 1) + (2 * r - x)
        } else {
            // x == -r
            sq(2 * r) + y + 1
        };
        index as usize
    }
}

/// Append ring `r` (r >= 1) in walk order.
fn push_ring(out: &mut Vec<Coordinate>, r: i32) {
    // Right edge, from the middle down to the bottom-right corner.
    out.extend((-r..=0).rev().map(|y| Coordinate::new(r, y)));
    // Bottom edge, leftward.
    out.extend((-r..r).rev().map(|x| Coordinate::new(x, -r)));
    // Left edge, upward.
    out.extend((-r + 1..=r).map(|y| Coordinate::new(-r, y)));
    // Top edge, rightward to the top-right corner.
    out.extend((-r + 1..=r).map(|x| Coordinate::new(x, r)));
    // Right edge again, from under the corner down to just above the middle.
    out.extend((1..r).rev().map(|y| Coordinate::new(r, y)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexSet;
    use proptest::prelude::*;

    fn c(x: i32, y: i32) -> Coordinate {
        Coordinate::new(x, y)
    }

    #[test]
    fn first_ring_walks_clockwise() {
        let ri = RingIndexer::new(1);
        assert_eq!(
            ri.offsets(),
            &[
                c(0, 0),
                c(1, 0),
                c(1, -1),
                c(0, -1),
                c(-1, -1),
                c(-1, 0),
                c(-1, 1),
                c(0, 1),
                c(1, 1),
            ]
        );
    }

    #[test]
    fn second_ring_starts_mid_right_and_ends_under_corner() {
        let ri = RingIndexer::new(2);
        assert_eq!(ri.offset_at(9).unwrap(), c(2, 0));
        assert_eq!(ri.offset_at(11).unwrap(), c(2, -2));
        assert_eq!(ri.offset_at(15).unwrap(), c(-2, -2));
        assert_eq!(ri.offset_at(19).unwrap(), c(-2, 2));
        assert_eq!(ri.offset_at(23).unwrap(), c(2, 2));
        assert_eq!(ri.offset_at(24).unwrap(), c(2, 1));
    }

    #[test]
    fn ring_cardinality() {
        let ri = RingIndexer::new(12);
        for r in 0..=12u32 {
            let n = ri.offsets().iter().filter(|o| o.chebyshev() == r).count();
            let expected = if r == 0 { 1 } else { 8 * r as usize };
            assert_eq!(n, expected, "ring {r}");
        }
    }

    #[test]
    fn every_offset_in_the_square_appears_once() {
        let ri = RingIndexer::new(6);
        let seen: IndexSet<Coordinate> = ri.offsets().iter().copied().collect();
        assert_eq!(seen.len(), ri.capacity());
        for x in -6..=6 {
            for y in -6..=6 {
                assert!(seen.contains(&c(x, y)), "missing ({x}, {y})");
            }
        }
    }

    #[test]
    fn bijection_over_full_table() {
        let ri = RingIndexer::new(30);
        for i in 0..ri.capacity() {
            let o = ri.offset_at(i).unwrap();
            assert_eq!(ri.index_of(o).unwrap(), i, "offset {o}");
            assert_eq!(ri.offset_at(ri.index_of(o).unwrap()).unwrap(), o);
        }
    }

    #[test]
    fn closed_form_holds_at_the_largest_supported_ring() {
        let r: i64 = (1 << 30) - 1;
        let edge = r as i32;
        let first = (2 * r - 1) * (2 * r - 1);
        let next = (2 * r + 1) * (2 * r + 1);
        assert_eq!(RingIndexer::index_of_unchecked(c(edge, 0)) as i64, first);
        assert_eq!(RingIndexer::index_of_unchecked(c(edge, 1)) as i64, next - 1);
        assert_eq!(RingIndexer::index_of_unchecked(c(edge, edge)) as i64, next - r);
        assert_eq!(RingIndexer::ring_of(first as usize), r as u32);
    }

    #[test]
    fn ring_occupies_expected_index_band() {
        let ri = RingIndexer::new(5);
        for i in 0..ri.capacity() {
            let r = ri.offset_at(i).unwrap().chebyshev();
            assert_eq!(RingIndexer::ring_of(i), r, "index {i}");
        }
    }

    #[test]
    fn out_of_range_is_reported() {
        let ri = RingIndexer::new(2);
        assert_eq!(
            ri.offset_at(25),
            Err(SpaceError::RingIndexOutOfRange {
                index: 25,
                capacity: 25
            })
        );
        assert_eq!(
            ri.index_of(c(0, -3)),
            Err(SpaceError::RingTooLarge {
                ring: 3,
                max_rings: 2
            })
        );
    }

    #[test]
    fn zero_rings_holds_only_the_center() {
        let ri = RingIndexer::new(0);
        assert_eq!(ri.capacity(), 1);
        assert_eq!(ri.offset_at(0).unwrap(), Coordinate::ORIGIN);
        assert!(ri.offset_at(1).is_err());
    }

    proptest! {
        #[test]
        fn closed_form_inverts_any_offset(x in -120i32..120, y in -120i32..120) {
            let ri = RingIndexer::new(120);
            let o = c(x, y);
            let i = RingIndexer::index_of_unchecked(o);
            prop_assert!(i < RingIndexer::cells_for_rings(o.chebyshev()));
            prop_assert_eq!(ri.offset_at(i).unwrap(), o);
        }

        #[test]
        fn ring_of_matches_band(i in 0usize..2_000_000) {
            let r = RingIndexer::ring_of(i);
            prop_assert!(RingIndexer::cells_for_rings(r) > i);
            if r > 0 {
                prop_assert!(RingIndexer::cells_for_rings(r - 1) <= i);
            }
        }
    }
}
