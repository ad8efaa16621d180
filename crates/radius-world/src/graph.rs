//! Read and write seams between the host world and its consumers.

use crate::{
    command::{ApplyReport, CommandBuffer},
    component::{Category, EntityFlags, NetEdge},
    entity::Entity,
    geometry::{Aabb, Vec3},
};

/// Read-only point lookups into host entity storage.
///
/// Every accessor answers "absent" for a stale or unknown entity rather than
/// failing, so callers can treat staleness as a skip.
pub trait EntityGraph {
    fn exists(&self, entity: Entity) -> bool;

    /// Point position, if the entity has one. Network edges do not.
    fn position(&self, entity: Entity) -> Option<Vec3>;

    fn bounds(&self, entity: Entity) -> Option<Aabb>;

    /// Direct ownership parent.
    fn owner(&self, entity: Entity) -> Option<Entity>;

    /// Classification through the entity's prototype or network component.
    fn category(&self, entity: Entity) -> Category;

    fn flags(&self, entity: Entity) -> EntityFlags;

    fn edge(&self, entity: Entity) -> Option<NetEdge>;

    /// Incident edges of a node; `None` if `entity` is not a node.
    fn connected_edges(&self, entity: Entity) -> Option<&[Entity]>;

    fn sub_objects(&self, entity: Entity) -> &[Entity];

    /// Installed upgrades and extensions.
    fn upgrades(&self, entity: Entity) -> &[Entity];

    fn sub_lanes(&self, entity: Entity) -> &[Entity];

    fn is_node(&self, entity: Entity) -> bool {
        self.connected_edges(entity).is_some()
    }

    fn is_edge(&self, entity: Entity) -> bool {
        self.edge(entity).is_some()
    }

    fn has_flag(&self, entity: Entity, flag: EntityFlags) -> bool {
        self.flags(entity).contains(flag)
    }

    /// Position used for elevation tests: the point position, or the middle
    /// of the bounding volume for entities without one.
    fn anchor(&self, entity: Entity) -> Option<Vec3> {
        self.position(entity)
            .or_else(|| self.bounds(entity).map(|bounds| bounds.center()))
    }
}

/// Host deferred-mutation channel.
pub trait CommandSink {
    /// Apply a whole batch. Stale targets are skipped and re-marking is a
    /// no-op; neither is an error.
    fn apply(&mut self, commands: CommandBuffer) -> ApplyReport;
}
