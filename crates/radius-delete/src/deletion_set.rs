//! Per-invocation working set.

use hashbrown::HashSet;
use radius_world::Entity;

/// Deduplicated entities slated for removal, plus survivors flagged for a
/// refresh.
///
/// Owned by exactly one invocation: created empty, filled by the planning
/// stages, consumed by the commit. Insertion order is kept so logs and
/// commits are deterministic.
#[derive(Debug, Default, Clone)]
pub struct DeletionSet {
    order: Vec<Entity>,
    members: HashSet<Entity>,
    update_order: Vec<Entity>,
    updates: HashSet<Entity>,
}

impl DeletionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            order: Vec::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Add an entity. Returns `false` if it was already present.
    pub fn insert(&mut self, entity: Entity) -> bool {
        if self.members.insert(entity) {
            self.order.push(entity);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.members.contains(&entity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.order.iter().copied()
    }

    /// Flag a survivor for a geometry/pathing refresh. Members of the set are
    /// never flagged; returns `false` if nothing changed.
    pub fn mark_update(&mut self, entity: Entity) -> bool {
        if self.members.contains(&entity) || !self.updates.insert(entity) {
            return false;
        }
        self.update_order.push(entity);
        true
    }

    /// Flagged survivors in flag order.
    ///
    /// An entity flagged before it was added to the set is not reported.
    pub fn updates(&self) -> impl Iterator<Item = Entity> + '_ {
        self.update_order
            .iter()
            .copied()
            .filter(|e| !self.members.contains(e))
    }

    #[must_use]
    pub fn update_count(&self) -> usize {
        self.updates().count()
    }
}
