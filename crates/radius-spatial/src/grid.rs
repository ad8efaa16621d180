//! Uniform grid over the XZ plane.

use hashbrown::{HashMap, HashSet};
use radius_world::{Aabb, Entity, EntityGraph, Rect, World};
use smallvec::SmallVec;
use tracing::debug;

use crate::{CellCoord, CellRange, Population, SpatialEntry, SpatialIndex};

/// Entities stored per cell before spilling to the heap.
type CellBucket = SmallVec<[Entity; 8]>;

#[derive(Debug, Default)]
struct PopulationGrid {
    cells: HashMap<CellCoord, CellBucket>,
    bounds: HashMap<Entity, Aabb>,
}

/// Uniform grid spatial index with one grid per [`Population`].
///
/// An entity is registered in every cell its footprint overlaps, so large
/// volumes are found from any cell they touch.
#[derive(Debug)]
pub struct GridIndex {
    /// Cell edge length in world units.
    cell_size: f32,
    grids: [PopulationGrid; 2],
}

impl GridIndex {
    /// Default cell edge length in world units.
    pub const DEFAULT_CELL_SIZE: f32 = 64.0;

    /// Create an empty index.
    ///
    /// Non-positive or non-finite cell sizes fall back to
    /// [`Self::DEFAULT_CELL_SIZE`].
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            Self::DEFAULT_CELL_SIZE
        };
        Self {
            cell_size,
            grids: [PopulationGrid::default(), PopulationGrid::default()],
        }
    }

    /// Index every placed entity of `world`.
    ///
    /// Nodes and edges go to [`Population::Network`]; anything else with a
    /// point position and bounds goes to [`Population::Objects`]. Prototypes
    /// and lanes have no position and are not indexed.
    #[must_use]
    pub fn from_world(world: &World, cell_size: f32) -> Self {
        let mut index = Self::new(cell_size);

        for entity in world.entities() {
            let Some(bounds) = world.bounds(entity) else {
                continue;
            };
            if world.is_node(entity) || world.is_edge(entity) {
                index.insert(Population::Network, entity, bounds);
            } else if world.position(entity).is_some() {
                index.insert(Population::Objects, entity, bounds);
            }
        }

        debug!(
            objects = index.len(Population::Objects),
            network = index.len(Population::Network),
            cell_size = index.cell_size,
            "built grid index"
        );
        index
    }

    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Insert or move an entity.
    pub fn insert(&mut self, population: Population, entity: Entity, bounds: Aabb) {
        self.remove(population, entity);

        let cell_size = self.cell_size;
        let grid = &mut self.grids[population.index()];
        for cell in CellRange::covering(&bounds.footprint(), cell_size).iter() {
            grid.cells.entry(cell).or_default().push(entity);
        }
        grid.bounds.insert(entity, bounds);
    }

    /// Returns `true` if the entity was indexed.
    pub fn remove(&mut self, population: Population, entity: Entity) -> bool {
        let cell_size = self.cell_size;
        let grid = &mut self.grids[population.index()];
        let Some(bounds) = grid.bounds.remove(&entity) else {
            return false;
        };

        for cell in CellRange::covering(&bounds.footprint(), cell_size).iter() {
            if let Some(bucket) = grid.cells.get_mut(&cell) {
                bucket.retain(|e| *e != entity);
                if bucket.is_empty() {
                    grid.cells.remove(&cell);
                }
            }
        }
        true
    }

    #[must_use]
    pub fn contains(&self, population: Population, entity: Entity) -> bool {
        self.grids[population.index()].bounds.contains_key(&entity)
    }

    #[must_use]
    pub fn len(&self, population: Population) -> usize {
        self.grids[population.index()].bounds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grids.iter().all(|grid| grid.bounds.is_empty())
    }
}

impl Default for GridIndex {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CELL_SIZE)
    }
}

impl SpatialIndex for GridIndex {
    fn query(&self, population: Population, region: &Rect) -> Vec<SpatialEntry> {
        let grid = &self.grids[population.index()];
        let mut seen = HashSet::new();
        let mut hits = Vec::new();

        for cell in CellRange::covering(region, self.cell_size).iter() {
            let Some(bucket) = grid.cells.get(&cell) else {
                continue;
            };
            for &entity in bucket {
                if !seen.insert(entity) {
                    continue;
                }
                let Some(&bounds) = grid.bounds.get(&entity) else {
                    continue;
                };
                if region.intersects(&bounds.footprint()) {
                    hits.push(SpatialEntry { entity, bounds });
                }
            }
        }

        // Hash iteration order is not stable; callers get slot order.
        hits.sort_unstable_by_key(|entry| entry.entity);
        hits
    }
}

#[cfg(test)]
mod tests {
    use radius_world::{PrefabKind, Vec3};

    use super::*;

    #[test]
    fn test_query_finds_only_overlapping() {
        let mut world = World::new();
        let tree = world.spawn_prefab(PrefabKind::Tree);
        let near = world.spawn_object(tree, Vec3::new(3.0, 0.0, 3.0));
        let far = world.spawn_object(tree, Vec3::new(300.0, 0.0, 3.0));

        let index = GridIndex::from_world(&world, 16.0);
        let hits = index.query(Population::Objects, &Rect::around(Vec3::ZERO, 10.0));

        let found: Vec<_> = hits.iter().map(|h| h.entity).collect();
        assert_eq!(found, vec![near]);
        assert!(index.contains(Population::Objects, far));
    }

    #[test]
    fn test_large_volume_reported_once() {
        let mut index = GridIndex::new(4.0);
        let mut world = World::new();
        let building = world.spawn_prefab(PrefabKind::Building);
        let hall = world.spawn_object(building, Vec3::ZERO);

        let bounds = Aabb::from_corners(Vec3::new(-20.0, 0.0, -20.0), Vec3::new(20.0, 10.0, 20.0));
        index.insert(Population::Objects, hall, bounds);

        let hits = index.query(Population::Objects, &Rect::around(Vec3::ZERO, 30.0));
        assert_eq!(hits, vec![SpatialEntry { entity: hall, bounds }]);
    }

    #[test]
    fn test_populations_are_separate() {
        let mut world = World::new();
        let prop = world.spawn_prefab(PrefabKind::Prop);
        let bench = world.spawn_object(prop, Vec3::ZERO);
        let a = world.spawn_node(Vec3::new(1.0, 0.0, 0.0));
        let b = world.spawn_node(Vec3::new(5.0, 0.0, 0.0));
        let edge = world.spawn_edge(a, b).unwrap();
        let lane = world.add_sub_lane(edge).unwrap();

        let index = GridIndex::from_world(&world, 16.0);
        let region = Rect::around(Vec3::ZERO, 10.0);

        let objects: Vec<_> = index.query(Population::Objects, &region).iter().map(|h| h.entity).collect();
        let network: Vec<_> = index.query(Population::Network, &region).iter().map(|h| h.entity).collect();

        assert_eq!(objects, vec![bench]);
        assert_eq!(network, vec![a, b, edge]);
        assert!(!index.contains(Population::Network, lane));
        assert!(!index.contains(Population::Objects, prop));
    }

    #[test]
    fn test_remove_and_reinsert() {
        let mut world = World::new();
        let a = world.spawn_node(Vec3::ZERO);
        let mut index = GridIndex::from_world(&world, 16.0);

        assert!(index.remove(Population::Network, a));
        assert!(!index.remove(Population::Network, a));
        assert!(index.is_empty());

        index.insert(Population::Network, a, Aabb::from_point(Vec3::new(100.0, 0.0, 100.0)));
        index.insert(Population::Network, a, Aabb::from_point(Vec3::new(-100.0, 0.0, -100.0)));
        assert_eq!(index.len(Population::Network), 1);
        assert!(index.query(Population::Network, &Rect::around(Vec3::new(100.0, 0.0, 100.0), 1.0)).is_empty());
        assert_eq!(
            index.query(Population::Network, &Rect::around(Vec3::new(-100.0, 0.0, -100.0), 1.0)).len(),
            1
        );
    }

    #[test]
    fn test_invalid_cell_size_falls_back() {
        assert_eq!(GridIndex::new(0.0).cell_size(), GridIndex::DEFAULT_CELL_SIZE);
        assert_eq!(GridIndex::new(f32::NAN).cell_size(), GridIndex::DEFAULT_CELL_SIZE);
    }
}
