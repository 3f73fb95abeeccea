//! The composed addressing engine: layout, ring indexer and wrap.

use gridlock_core::{Coordinate, GridSize, SpaceError};

use crate::edge::EdgeBehavior;
use crate::layout::{CenteredLayout, GridLayout};
use crate::ring::RingIndexer;
use crate::torus::{Resolved, ToroidalResolver};

/// Construction parameters for a [`Lattice`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LatticeConfig {
    /// Requested dimensions. Even extents are reduced by one.
    pub size: GridSize,
    /// Rings to precompute for ring lookups. `None` = `(width - 1) / 2`
    /// of the adjusted width.
    pub max_rings: Option<u32>,
    /// How ring lookups treat off-grid positions.
    pub edge: EdgeBehavior,
}

impl LatticeConfig {
    /// Config for `size` with default rings and wrap-around edges.
    pub fn new(size: GridSize) -> Self {
        Self {
            size,
            max_rings: None,
            edge: EdgeBehavior::Wrap,
        }
    }

    /// Override the number of precomputed rings.
    pub fn with_max_rings(mut self, max_rings: u32) -> Self {
        self.max_rings = Some(max_rings);
        self
    }

    /// Override the edge behavior.
    pub fn with_edge(mut self, edge: EdgeBehavior) -> Self {
        self.edge = edge;
        self
    }

    /// The size after odd adjustment.
    pub fn adjusted_size(&self) -> GridSize {
        self.size.to_odd()
    }

    /// The ring count after applying the default.
    pub fn resolved_max_rings(&self) -> u32 {
        self.max_rings
            .unwrap_or_else(|| self.adjusted_size().width.saturating_sub(1) / 2)
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), SpaceError> {
        let size = self.adjusted_size();
        if size.width == 0 || size.height == 0 {
            return Err(SpaceError::EmptySpace {
                requested: self.size,
            });
        }
        if size.width > Lattice::MAX_DIM {
            return Err(SpaceError::DimensionTooLarge {
                name: "width",
                value: size.width,
                max: Lattice::MAX_DIM,
            });
        }
        if size.height > Lattice::MAX_DIM {
            return Err(SpaceError::DimensionTooLarge {
                name: "height",
                value: size.height,
                max: Lattice::MAX_DIM,
            });
        }
        let rings = self.resolved_max_rings();
        if rings > RingIndexer::MAX_RINGS {
            return Err(SpaceError::DimensionTooLarge {
                name: "max_rings",
                value: rings,
                max: RingIndexer::MAX_RINGS,
            });
        }
        Ok(())
    }
}

/// Read-only addressing engine for one grid.
///
/// Holds no per-cell state, so it is cheap to share between a
/// [`Grid`](crate::Grid) and a lock coordinator via `Arc`.
///
/// # Examples
///
/// ```
/// use gridlock_core::{Coordinate, GridSize};
/// use gridlock_space::{Lattice, LatticeConfig};
///
/// let lattice = Lattice::new(LatticeConfig::new(GridSize::new(100, 100))).unwrap();
/// assert_eq!(lattice.size(), GridSize::new(99, 99));
///
/// // Ring index 4 is the lower-left neighbour; from the top-left corner
/// // it wraps to the right edge.
/// let r = lattice.resolve(4, Coordinate::new(-49, 49)).unwrap();
/// assert_eq!(r.real, Coordinate::new(49, 48));
/// assert_eq!(r.virtual_position, Coordinate::new(-50, 48));
/// ```
#[derive(Debug)]
pub struct Lattice {
    layout: CenteredLayout,
    indexer: RingIndexer,
    resolver: ToroidalResolver,
    edge: EdgeBehavior,
}

impl Lattice {
    /// Largest accepted extent: coordinates use `i32`.
    pub const MAX_DIM: u32 = i32::MAX as u32;

    /// Validate `config` and precompute the ring table.
    pub fn new(config: LatticeConfig) -> Result<Self, SpaceError> {
        config.validate()?;
        let size = config.adjusted_size();
        Ok(Self {
            layout: CenteredLayout::new(size),
            indexer: RingIndexer::new(config.resolved_max_rings()),
            resolver: ToroidalResolver::new(size),
            edge: config.edge,
        })
    }

    /// Adjusted (odd) dimensions.
    pub fn size(&self) -> GridSize {
        self.layout.size()
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.layout.cell_count()
    }

    /// Edge behavior for ring lookups.
    pub fn edge_behavior(&self) -> EdgeBehavior {
        self.edge
    }

    /// The storage layout.
    pub fn layout(&self) -> &CenteredLayout {
        &self.layout
    }

    /// The ring table.
    pub fn indexer(&self) -> &RingIndexer {
        &self.indexer
    }

    /// The wrap resolver.
    pub fn resolver(&self) -> &ToroidalResolver {
        &self.resolver
    }

    /// Rings available for ring lookups.
    pub fn max_rings(&self) -> u32 {
        self.indexer.max_rings()
    }

    /// Whether `coord` is on the grid.
    pub fn contains(&self, coord: Coordinate) -> bool {
        self.layout.contains(coord)
    }

    /// Storage index of an in-bounds coordinate. See [`GridLayout::index_of`].
    pub fn index_of(&self, coord: Coordinate) -> usize {
        self.layout.index_of(coord)
    }

    /// Storage index, or `CoordOutOfBounds`.
    pub fn checked_index_of(&self, coord: Coordinate) -> Result<usize, SpaceError> {
        self.layout.checked_index_of(coord)
    }

    /// Coordinate of a storage index.
    pub fn coordinate_of(&self, index: usize) -> Coordinate {
        self.layout.coordinate_of(index)
    }

    /// `center` plus the offset of `ring_index`, without wrapping.
    pub fn virtual_position(
        &self,
        ring_index: usize,
        center: Coordinate,
    ) -> Result<Coordinate, SpaceError> {
        Ok(center + self.indexer.offset_at(ring_index)?)
    }

    /// Resolve `ring_index` around `center`, always wrapping onto the grid.
    pub fn resolve(&self, ring_index: usize, center: Coordinate) -> Result<Resolved, SpaceError> {
        let virtual_position = self.virtual_position(ring_index, center)?;
        Ok(self.resolver.resolve(virtual_position))
    }

    /// The cell coordinate at `ring_index` around `center`, honoring the
    /// edge behavior: `None` when the position is off-grid under
    /// [`EdgeBehavior::Absorb`].
    pub fn ring_cell(
        &self,
        ring_index: usize,
        center: Coordinate,
    ) -> Result<Option<Coordinate>, SpaceError> {
        let resolved = self.resolve(ring_index, center)?;
        Ok(match self.edge {
            EdgeBehavior::Wrap => Some(resolved.real),
            EdgeBehavior::Absorb => resolved.is_on_grid().then_some(resolved.real),
        })
    }

    /// Number of ring indices covering `rings` rings, center included.
    pub fn cells_for_rings(rings: u32) -> usize {
        RingIndexer::cells_for_rings(rings)
    }

    /// Fail with `RingTooLarge` if `rings` exceeds the precomputed table.
    pub fn check_rings(&self, rings: u32) -> Result<(), SpaceError> {
        if rings > self.indexer.max_rings() {
            return Err(SpaceError::RingTooLarge {
                ring: rings,
                max_rings: self.indexer.max_rings(),
            });
        }
        Ok(())
    }
}
