//! Component data attached to world entities.

use std::fmt;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::{entity::Entity, geometry::Vec3};

/// Short inline list of related entities (sub-objects, lanes, incident edges).
pub type EntityList = SmallVec<[Entity; 4]>;

/// Kind carried by a prototype (prefab) entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrefabKind {
    Building,
    Tree,
    Plant,
    Prop,
    /// Ground surface such as pavement or a decal area.
    Surface,
    /// A prototype with no deletable category.
    Other,
}

/// Category an entity is classified into for filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Network,
    Building,
    Tree,
    Plant,
    Prop,
    Surface,
    Unknown,
}

impl Category {
    pub const ALL: [Self; 7] = [
        Self::Network,
        Self::Building,
        Self::Tree,
        Self::Plant,
        Self::Prop,
        Self::Surface,
        Self::Unknown,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Building => "building",
            Self::Tree => "tree",
            Self::Plant => "plant",
            Self::Prop => "prop",
            Self::Surface => "surface",
            Self::Unknown => "unknown",
        }
    }
}

impl From<PrefabKind> for Category {
    fn from(kind: PrefabKind) -> Self {
        match kind {
            PrefabKind::Building => Self::Building,
            PrefabKind::Tree => Self::Tree,
            PrefabKind::Plant => Self::Plant,
            PrefabKind::Prop => Self::Prop,
            PrefabKind::Surface => Self::Surface,
            PrefabKind::Other => Self::Unknown,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Tag components. `DELETED` and `UPDATED` are only ever set through a
    /// [`CommandBuffer`](crate::CommandBuffer).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct EntityFlags: u8 {
        /// Non-deletable marker or ghost object.
        const MARKER = 1 << 0;
        /// Owned sub-structure that may be removed on its own (upgrade, extension).
        const EXTENSION = 1 << 1;
        /// Scheduled for removal at the end of the frame.
        const DELETED = 1 << 2;
        /// Geometry or pathing must be recomputed by downstream systems.
        const UPDATED = 1 << 3;
    }
}

/// Network edge (road/track segment) between two nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetEdge {
    pub start: Entity,
    pub end: Entity,
}

impl NetEdge {
    /// The endpoint opposite `node`, if `node` is one of the endpoints.
    #[must_use]
    pub fn other(&self, node: Entity) -> Option<Entity> {
        if node == self.start {
            Some(self.end)
        } else if node == self.end {
            Some(self.start)
        } else {
            None
        }
    }
}

/// Network node with its incident edges.
#[derive(Clone, Debug, PartialEq)]
pub struct NetNode {
    pub position: Vec3,
    pub connected_edges: EntityList,
}

impl NetNode {
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            connected_edges: EntityList::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Generation;

    #[test]
    fn test_edge_other_endpoint() {
        let a = Entity::new(1, Generation::new());
        let b = Entity::new(2, Generation::new());
        let c = Entity::new(3, Generation::new());
        let edge = NetEdge { start: a, end: b };

        assert_eq!(edge.other(a), Some(b));
        assert_eq!(edge.other(b), Some(a));
        assert_eq!(edge.other(c), None);
    }

    #[test]
    fn test_prefab_kind_maps_to_category() {
        assert_eq!(Category::from(PrefabKind::Tree), Category::Tree);
        assert_eq!(Category::from(PrefabKind::Surface), Category::Surface);
        assert_eq!(Category::from(PrefabKind::Other), Category::Unknown);
    }
}
