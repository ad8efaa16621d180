//! In-memory host world.
//!
//! Stores one record per live entity slot and keeps the network graph
//! bidirectionally consistent: every edge is listed by both of its endpoint
//! nodes. Mutation by consumers goes through [`CommandSink::apply`]; the
//! builder methods here stand in for the host's own placement tools.

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    command::{ApplyReport, Command, CommandBuffer},
    component::{Category, EntityFlags, EntityList, NetEdge, NetNode, PrefabKind},
    entity::{Entity, EntityAllocator},
    geometry::{Aabb, Vec3},
    graph::{CommandSink, EntityGraph},
};

/// Errors from world construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("entity not found: {0:?}")]
    MissingEntity(Entity),

    #[error("entity is not a network node: {0:?}")]
    NotANode(Entity),

    #[error("entity is not a network edge: {0:?}")]
    NotAnEdge(Entity),

    #[error("edge would connect node {0:?} to itself")]
    DegenerateEdge(Entity),
}

pub type WorldResult<T> = Result<T, WorldError>;

#[derive(Debug, Default, Clone)]
struct EntityRecord {
    position: Option<Vec3>,
    bounds: Option<Aabb>,
    prefab: Option<Entity>,
    prefab_kind: Option<PrefabKind>,
    owner: Option<Entity>,
    edge: Option<NetEdge>,
    node: Option<NetNode>,
    sub_objects: EntityList,
    upgrades: EntityList,
    sub_lanes: EntityList,
    flags: EntityFlags,
}

/// The host world: entities, ownership forest and network graph.
#[derive(Debug, Default)]
pub struct World {
    entities: EntityAllocator,
    records: Vec<Option<EntityRecord>>,
    /// Live handle per slot, kept in step with `records`.
    live: Vec<Option<Entity>>,
}

impl World {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities, prototypes included.
    #[must_use]
    pub const fn entity_count(&self) -> u32 {
        self.entities.alive_count()
    }

    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Every live entity in slot order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.live.iter().filter_map(|slot| *slot)
    }

    fn record(&self, entity: Entity) -> Option<&EntityRecord> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.records.get(entity.id() as usize)?.as_ref()
    }

    fn record_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.records.get_mut(entity.id() as usize)?.as_mut()
    }

    fn spawn_record(&mut self, record: EntityRecord) -> Entity {
        let entity = self.entities.allocate();
        let slot = entity.id() as usize;

        if slot >= self.records.len() {
            self.records.resize(slot + 1, None);
            self.live.resize(slot + 1, None);
        }

        self.records[slot] = Some(record);
        self.live[slot] = Some(entity);
        entity
    }

    // ==================== Builders ====================

    /// Register a prototype that placed objects refer to.
    pub fn spawn_prefab(&mut self, kind: PrefabKind) -> Entity {
        self.spawn_record(EntityRecord {
            prefab_kind: Some(kind),
            ..EntityRecord::default()
        })
    }

    /// Place a free-standing object with point bounds.
    pub fn spawn_object(&mut self, prefab: Entity, position: Vec3) -> Entity {
        self.spawn_object_with_bounds(prefab, position, Aabb::from_point(position))
    }

    /// Place a free-standing object with an explicit bounding volume.
    pub fn spawn_object_with_bounds(&mut self, prefab: Entity, position: Vec3, bounds: Aabb) -> Entity {
        self.spawn_record(EntityRecord {
            position: Some(position),
            bounds: Some(bounds),
            prefab: Some(prefab),
            ..EntityRecord::default()
        })
    }

    pub fn spawn_node(&mut self, position: Vec3) -> Entity {
        self.spawn_record(EntityRecord {
            bounds: Some(Aabb::from_point(position)),
            node: Some(NetNode::new(position)),
            ..EntityRecord::default()
        })
    }

    /// Connect two nodes. Both nodes list the new edge afterwards.
    pub fn spawn_edge(&mut self, start: Entity, end: Entity) -> WorldResult<Entity> {
        if start == end {
            return Err(WorldError::DegenerateEdge(start));
        }
        let start_pos = self.node_position(start)?;
        let end_pos = self.node_position(end)?;

        let edge = self.spawn_record(EntityRecord {
            bounds: Some(Aabb::from_corners(start_pos, end_pos)),
            edge: Some(NetEdge { start, end }),
            ..EntityRecord::default()
        });

        for node in [start, end] {
            if let Some(net) = self.record_mut(node).and_then(|r| r.node.as_mut()) {
                net.connected_edges.push(edge);
            }
        }

        trace!(%edge, %start, %end, "spawned edge");
        Ok(edge)
    }

    fn node_position(&self, node: Entity) -> WorldResult<Vec3> {
        let record = self.record(node).ok_or(WorldError::MissingEntity(node))?;
        record
            .node
            .as_ref()
            .map(|net| net.position)
            .ok_or(WorldError::NotANode(node))
    }

    /// Place an object owned by `parent` and listed among its sub-objects.
    pub fn add_sub_object(&mut self, parent: Entity, prefab: Entity, position: Vec3) -> WorldResult<Entity> {
        if !self.is_alive(parent) {
            return Err(WorldError::MissingEntity(parent));
        }
        let child = self.spawn_object(prefab, position);
        self.link_owner(child, parent)?;
        if let Some(record) = self.record_mut(parent) {
            record.sub_objects.push(child);
        }
        Ok(child)
    }

    /// Install an upgrade on `parent`. Upgrades carry the `EXTENSION` flag.
    pub fn add_upgrade(&mut self, parent: Entity, prefab: Entity, position: Vec3) -> WorldResult<Entity> {
        if !self.is_alive(parent) {
            return Err(WorldError::MissingEntity(parent));
        }
        let upgrade = self.spawn_object(prefab, position);
        self.link_owner(upgrade, parent)?;
        self.insert_flags(upgrade, EntityFlags::EXTENSION);
        if let Some(record) = self.record_mut(parent) {
            record.upgrades.push(upgrade);
        }
        Ok(upgrade)
    }

    /// Add a lane owned by `edge`. Lanes share their edge's bounds and are
    /// not placed in any search population of their own.
    pub fn add_sub_lane(&mut self, edge: Entity) -> WorldResult<Entity> {
        let record = self.record(edge).ok_or(WorldError::MissingEntity(edge))?;
        if record.edge.is_none() {
            return Err(WorldError::NotAnEdge(edge));
        }
        let bounds = record.bounds;

        let lane = self.spawn_record(EntityRecord {
            bounds,
            owner: Some(edge),
            ..EntityRecord::default()
        });
        if let Some(record) = self.record_mut(edge) {
            record.sub_lanes.push(lane);
        }
        Ok(lane)
    }

    /// Set the ownership parent without listing the child anywhere.
    ///
    /// The host never creates ownership cycles; this does not check either.
    pub fn link_owner(&mut self, child: Entity, owner: Entity) -> WorldResult<()> {
        if !self.is_alive(owner) {
            return Err(WorldError::MissingEntity(owner));
        }
        let record = self.record_mut(child).ok_or(WorldError::MissingEntity(child))?;
        record.owner = Some(owner);
        Ok(())
    }

    pub fn insert_flags(&mut self, entity: Entity, flags: EntityFlags) -> bool {
        match self.record_mut(entity) {
            Some(record) => {
                record.flags.insert(flags);
                true
            }
            None => false,
        }
    }

    // ==================== Host frame processing ====================

    /// Consume every `UPDATED` tag, as the host's geometry and pathing
    /// systems do once per frame.
    pub fn drain_updated(&mut self) -> Vec<Entity> {
        let updated: Vec<Entity> = self
            .entities()
            .filter(|&e| self.has_flag(e, EntityFlags::UPDATED))
            .collect();

        for &entity in &updated {
            if let Some(record) = self.record_mut(entity) {
                record.flags.remove(EntityFlags::UPDATED);
            }
        }
        updated
    }

    /// Remove every `DELETED` entity, detaching deleted edges from the nodes
    /// that survive them. Returns the number of entities removed.
    pub fn despawn_deleted(&mut self) -> usize {
        let doomed: Vec<Entity> = self
            .entities()
            .filter(|&e| self.has_flag(e, EntityFlags::DELETED))
            .collect();

        for &entity in &doomed {
            self.detach(entity);
        }
        for &entity in &doomed {
            self.despawn(entity);
        }

        debug!(count = doomed.len(), "despawned deleted entities");
        doomed.len()
    }

    fn detach(&mut self, entity: Entity) {
        let Some(record) = self.record(entity) else {
            return;
        };
        let edge = record.edge;
        let owner = record.owner;

        if let Some(edge) = edge {
            for node in [edge.start, edge.end] {
                if let Some(net) = self.record_mut(node).and_then(|r| r.node.as_mut()) {
                    net.connected_edges.retain(|e| *e != entity);
                }
            }
        }
        if let Some(owner) = owner {
            if let Some(parent) = self.record_mut(owner) {
                parent.sub_objects.retain(|e| *e != entity);
                parent.upgrades.retain(|e| *e != entity);
                parent.sub_lanes.retain(|e| *e != entity);
            }
        }
    }

    /// Free an entity slot immediately, without touching anything that
    /// refers to it. References to it become stale.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.deallocate(entity) {
            return false;
        }
        let slot = entity.id() as usize;
        self.records[slot] = None;
        self.live[slot] = None;
        true
    }
}

impl EntityGraph for World {
    fn exists(&self, entity: Entity) -> bool {
        self.record(entity).is_some()
    }

    fn position(&self, entity: Entity) -> Option<Vec3> {
        let record = self.record(entity)?;
        record
            .position
            .or_else(|| record.node.as_ref().map(|net| net.position))
    }

    fn bounds(&self, entity: Entity) -> Option<Aabb> {
        self.record(entity)?.bounds
    }

    fn owner(&self, entity: Entity) -> Option<Entity> {
        self.record(entity)?.owner
    }

    fn category(&self, entity: Entity) -> Category {
        let Some(record) = self.record(entity) else {
            return Category::Unknown;
        };
        if record.edge.is_some() || record.node.is_some() {
            return Category::Network;
        }
        record
            .prefab
            .and_then(|prefab| self.record(prefab))
            .and_then(|prefab| prefab.prefab_kind)
            .map_or(Category::Unknown, Category::from)
    }

    fn flags(&self, entity: Entity) -> EntityFlags {
        self.record(entity).map(|r| r.flags).unwrap_or_default()
    }

    fn edge(&self, entity: Entity) -> Option<NetEdge> {
        self.record(entity)?.edge
    }

    fn connected_edges(&self, entity: Entity) -> Option<&[Entity]> {
        self.record(entity)?
            .node
            .as_ref()
            .map(|net| net.connected_edges.as_slice())
    }

    fn sub_objects(&self, entity: Entity) -> &[Entity] {
        self.record(entity).map_or(&[], |r| r.sub_objects.as_slice())
    }

    fn upgrades(&self, entity: Entity) -> &[Entity] {
        self.record(entity).map_or(&[], |r| r.upgrades.as_slice())
    }

    fn sub_lanes(&self, entity: Entity) -> &[Entity] {
        self.record(entity).map_or(&[], |r| r.sub_lanes.as_slice())
    }
}

impl CommandSink for World {
    fn apply(&mut self, commands: CommandBuffer) -> ApplyReport {
        let mut report = ApplyReport::default();

        for command in commands {
            let (entity, flag) = match command {
                Command::MarkDeleted(entity) => (entity, EntityFlags::DELETED),
                Command::MarkUpdated(entity) => (entity, EntityFlags::UPDATED),
            };
            let Some(record) = self.record_mut(entity) else {
                report.stale += 1;
                continue;
            };
            if record.flags.contains(flag) {
                report.already_marked += 1;
                continue;
            }
            record.flags.insert(flag);
            match command {
                Command::MarkDeleted(_) => report.deleted += 1,
                Command::MarkUpdated(_) => report.updated += 1,
            }
        }

        report
    }
}
