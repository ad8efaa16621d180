//! Host world model for radius deletion.
//!
//! # Key Concepts
//!
//! - **Entity**: generational handle into host storage; stale handles read as absent
//! - **Ownership**: `child → owner` forest (upgrades, sub-objects, lanes)
//! - **Network graph**: nodes and edges, each edge listed by both endpoints
//! - **Classification**: prototype kind or network component → [`Category`]
//! - **Deferred mutation**: readers record [`Command`]s; the world applies them
//!   as one batch through [`CommandSink`]
//!
//! # Access Pattern
//!
//! ```ignore
//! // Read phase: any number of shared borrows
//! let graph: &dyn EntityGraph = &world;
//! let mut batch = CommandBuffer::new();
//! if graph.is_edge(e) {
//!     batch.mark_deleted(e);
//! }
//!
//! // Commit phase: one exclusive borrow, one batch
//! let report = world.apply(batch);
//! ```

mod command;
mod component;
mod entity;
mod geometry;
mod graph;
mod world;

pub use command::{ApplyReport, Command, CommandBuffer};
pub use component::{Category, EntityFlags, EntityList, NetEdge, NetNode, PrefabKind};
pub use entity::{Entity, EntityAllocator, EntityId, Generation};
pub use geometry::{Aabb, Rect, Vec3};
pub use graph::{CommandSink, EntityGraph};
pub use world::{World, WorldError, WorldResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Aabb, Category, CommandBuffer, CommandSink, Entity, EntityFlags, EntityGraph, PrefabKind,
        Vec3, World,
    };
}
