//! Spatial search over the two host populations.
//!
//! The host keeps free-standing objects and network elements in separate
//! search structures. [`SpatialIndex`] is the seam the delete pipeline
//! queries; [`GridIndex`] is a uniform XZ grid implementation of it.

pub mod cell;
pub mod grid;

use radius_world::{Aabb, Entity, Rect};

pub use cell::{CellCoord, CellRange};
pub use grid::GridIndex;

/// Which search population an entity lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Population {
    /// Buildings, trees, plants, props, surfaces.
    Objects,
    /// Network nodes and edges.
    Network,
}

impl Population {
    pub const ALL: [Self; 2] = [Self::Objects, Self::Network];

    const fn index(self) -> usize {
        match self {
            Self::Objects => 0,
            Self::Network => 1,
        }
    }
}

/// An indexed entity together with the bounds it was indexed under.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub bounds: Aabb,
}

/// Read-only, reentrant bounding-region search.
pub trait SpatialIndex: Sync {
    /// Every entry of `population` whose footprint intersects `region`.
    fn query(&self, population: Population, region: &Rect) -> Vec<SpatialEntry>;
}
