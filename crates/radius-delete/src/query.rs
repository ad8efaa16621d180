//! Radius query against the spatial index.

use radius_spatial::{Population, SpatialEntry, SpatialIndex};
use radius_world::{Aabb, Entity, Rect, Vec3};
use tracing::{trace, warn};

/// Circle on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiusQuery {
    pub center: Vec3,
    pub radius: f32,
}

/// An entity found by a [`RadiusQuery`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub entity: Entity,
    pub population: Population,
    pub bounds: Aabb,
}

impl Candidate {
    /// Stand-in position for entities without a point position: the middle
    /// of the bounding volume.
    #[must_use]
    pub fn midpoint(&self) -> Vec3 {
        self.bounds.center()
    }
}

impl RadiusQuery {
    #[must_use]
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Square circumscribing the circle; what the index is asked for.
    #[must_use]
    pub fn region(&self) -> Rect {
        Rect::around(self.center, self.radius)
    }

    /// Whether the closest point of `bounds` lies inside the circle.
    ///
    /// Testing the closest point rather than the center keeps long or large
    /// volumes whose middle is outside the circle but whose body reaches in.
    #[must_use]
    pub fn reaches(&self, bounds: &Aabb) -> bool {
        bounds.closest_distance_sq_xz(self.center) <= self.radius * self.radius
    }

    /// Query both populations and keep entries inside the true circle.
    ///
    /// The two populations are searched concurrently; the index is only
    /// read. Objects come before network elements, each in index order.
    /// Entries with non-finite or inverted bounds are skipped.
    pub fn collect<S>(&self, index: &S) -> Vec<Candidate>
    where
        S: SpatialIndex + ?Sized,
    {
        let region = self.region();
        let (objects, network) = rayon::join(
            || index.query(Population::Objects, &region),
            || index.query(Population::Network, &region),
        );

        let mut candidates = Vec::with_capacity(objects.len() + network.len());
        for (population, entries) in [(Population::Objects, objects), (Population::Network, network)] {
            candidates.extend(
                entries
                    .into_iter()
                    .filter(|entry| {
                        if !entry.bounds.is_valid() {
                            warn!(entity = %entry.entity, bounds = ?entry.bounds, "skipping malformed bounds");
                            return false;
                        }
                        self.reaches(&entry.bounds)
                    })
                    .map(|SpatialEntry { entity, bounds }| Candidate {
                        entity,
                        population,
                        bounds,
                    }),
            );
        }

        trace!(count = candidates.len(), "radius query candidates");
        candidates
    }
}

#[cfg(test)]
mod tests {
    use radius_spatial::GridIndex;
    use radius_world::{PrefabKind, World};

    use super::*;

    #[test]
    fn test_square_corner_is_outside_circle() {
        let mut world = World::new();
        let tree = world.spawn_prefab(PrefabKind::Tree);
        // Inside the 20x20 square around the origin but ~14.1 from the center.
        let corner = world.spawn_object(tree, Vec3::new(9.9, 0.0, 9.9));
        let inside = world.spawn_object(tree, Vec3::new(6.0, 0.0, 6.0));

        let index = GridIndex::from_world(&world, 8.0);
        let found: Vec<_> = RadiusQuery::new(Vec3::ZERO, 10.0)
            .collect(&index)
            .into_iter()
            .map(|c| c.entity)
            .collect();

        assert_eq!(found, vec![inside]);
        assert!(!found.contains(&corner));
    }

    #[test]
    fn test_large_volume_reaching_in_is_kept() {
        let mut world = World::new();
        let building = world.spawn_prefab(PrefabKind::Building);
        // Center is 40 away, but the footprint reaches to 5 from the query point.
        let hall = world.spawn_object_with_bounds(
            building,
            Vec3::new(40.0, 0.0, 0.0),
            Aabb::from_corners(Vec3::new(5.0, 0.0, -5.0), Vec3::new(75.0, 10.0, 5.0)),
        );

        let index = GridIndex::from_world(&world, 16.0);
        let candidates = RadiusQuery::new(Vec3::ZERO, 10.0).collect(&index);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].entity, hall);
        assert_eq!(candidates[0].population, Population::Objects);
    }

    /// Index returning fixed entries regardless of region.
    struct FixedIndex(Vec<SpatialEntry>);

    impl SpatialIndex for FixedIndex {
        fn query(&self, population: Population, _region: &Rect) -> Vec<SpatialEntry> {
            match population {
                Population::Objects => self.0.clone(),
                Population::Network => Vec::new(),
            }
        }
    }

    #[test]
    fn test_malformed_bounds_are_skipped() {
        let mut world = World::new();
        let tree = world.spawn_prefab(PrefabKind::Tree);
        let good = world.spawn_object(tree, Vec3::new(1.0, 0.0, 0.0));
        let bad = world.spawn_object(tree, Vec3::new(2.0, 0.0, 0.0));

        let index = FixedIndex(vec![
            SpatialEntry {
                entity: bad,
                bounds: Aabb {
                    min: Vec3::new(f32::NAN, 0.0, 0.0),
                    max: Vec3::new(3.0, 0.0, 3.0),
                },
            },
            SpatialEntry {
                entity: good,
                bounds: Aabb::from_point(Vec3::new(1.0, 0.0, 0.0)),
            },
        ]);

        let found: Vec<_> = RadiusQuery::new(Vec3::ZERO, 10.0)
            .collect(&index)
            .into_iter()
            .map(|c| c.entity)
            .collect();
        assert_eq!(found, vec![good]);
    }

    #[test]
    fn test_network_edge_found_by_its_body() {
        let mut world = World::new();
        let a = world.spawn_node(Vec3::new(-50.0, 0.0, 2.0));
        let b = world.spawn_node(Vec3::new(50.0, 0.0, 2.0));
        let edge = world.spawn_edge(a, b).unwrap();

        let index = GridIndex::from_world(&world, 16.0);
        let candidates = RadiusQuery::new(Vec3::ZERO, 5.0).collect(&index);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].entity, edge);
        assert_eq!(candidates[0].population, Population::Network);
        assert_eq!(candidates[0].midpoint(), Vec3::new(0.0, 0.0, 2.0));
    }
}
