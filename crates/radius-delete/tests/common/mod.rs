//! Shared fixtures for radius delete integration tests.

#![allow(dead_code)]

use radius_delete::{DeleteConfig, DeleteFilters, DeleteRequest, RadiusDeletePipeline};
use radius_spatial::GridIndex;
use radius_world::{Entity, Vec3, World};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn index(world: &World) -> GridIndex {
    GridIndex::from_world(world, 16.0)
}

pub fn pipeline() -> RadiusDeletePipeline {
    RadiusDeletePipeline::new(DeleteConfig::default())
}

pub fn at_origin(radius: f32, filters: DeleteFilters) -> DeleteRequest {
    DeleteRequest::new(Vec3::ZERO, radius, filters)
}

pub fn sorted(entities: impl IntoIterator<Item = Entity>) -> Vec<Entity> {
    let mut entities: Vec<Entity> = entities.into_iter().collect();
    entities.sort_unstable();
    entities
}

/// Square lattice of `size × size` nodes spaced `spacing` apart, starting at
/// the origin, with edges between horizontal and vertical neighbours.
pub struct Lattice {
    pub nodes: Vec<Entity>,
    pub edges: Vec<Entity>,
}

impl Lattice {
    pub fn build(world: &mut World, size: usize, spacing: f32) -> Self {
        let mut nodes = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                #[allow(clippy::cast_precision_loss)]
                let position = Vec3::new(col as f32 * spacing, 0.0, row as f32 * spacing);
                nodes.push(world.spawn_node(position));
            }
        }

        let mut edges = Vec::new();
        for row in 0..size {
            for col in 0..size {
                let here = nodes[row * size + col];
                if col + 1 < size {
                    edges.push(world.spawn_edge(here, nodes[row * size + col + 1]).unwrap());
                }
                if row + 1 < size {
                    edges.push(world.spawn_edge(here, nodes[(row + 1) * size + col]).unwrap());
                }
            }
        }

        Self { nodes, edges }
    }
}
