//! Generational entity handles.
//!
//! The host recycles entity slots. A handle remembers the generation of the
//! slot it was issued for, so a handle held across a despawn is detected as
//! stale instead of silently aliasing whatever reuses the slot.
//!
//! Freed slots are reused oldest first, so a slot sits idle as long as
//! possible before a new handle can share its index. A slot whose generation
//! counter is exhausted is retired instead of reused.

use std::{collections::VecDeque, fmt};

/// Generation counter of an entity slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Generation(u32);

impl Generation {
    /// First generation of a fresh slot.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// The generation a slot moves to once it is freed, or `None` when the
    /// counter is exhausted.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0)
    }
}

/// Raw slot index.
pub type EntityId = u32;

/// Opaque, stable identifier into the host's entity storage.
///
/// Carries no behavior; every attribute lookup goes through the world.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    id: EntityId,
    generation: Generation,
}

impl Entity {
    #[must_use]
    pub const fn new(id: EntityId, generation: Generation) -> Self {
        Self { id, generation }
    }

    /// Slot index.
    #[must_use]
    pub const fn id(self) -> EntityId {
        self.id
    }

    #[must_use]
    pub const fn generation(self) -> Generation {
        self.generation
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.id, self.generation.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.id, self.generation.0)
    }
}

/// Hands out entity slots and tracks which handles are still live.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// `None` marks a retired slot.
    generations: Vec<Option<Generation>>,
    free_list: VecDeque<EntityId>,
    alive_count: u32,
    retired: u32,
}

impl EntityAllocator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            generations: Vec::new(),
            free_list: VecDeque::new(),
            alive_count: 0,
            retired: 0,
        }
    }

    /// Allocate a handle, reusing the longest-freed slot when one is
    /// available.
    pub fn allocate(&mut self) -> Entity {
        self.alive_count += 1;

        if let Some((id, generation)) = self
            .free_list
            .pop_front()
            .and_then(|id| Some((id, self.generations[id as usize]?)))
        {
            Entity::new(id, generation)
        } else {
            let id = self.generations.len() as EntityId;
            self.generations.push(Some(Generation::new()));
            Entity::new(id, Generation::new())
        }
    }

    /// Free the slot behind `entity`.
    ///
    /// Returns `false` for a handle that is already stale.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        let id = entity.id() as usize;
        self.alive_count -= 1;
        self.generations[id] = entity.generation().next();
        if self.generations[id].is_some() {
            self.free_list.push_back(entity.id());
        } else {
            self.retired += 1;
        }
        true
    }

    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.generations
            .get(entity.id() as usize)
            .is_some_and(|generation| *generation == Some(entity.generation()))
    }

    #[must_use]
    pub const fn alive_count(&self) -> u32 {
        self.alive_count
    }

    /// Number of slots ever handed out, live or free.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }

    /// Slots permanently withdrawn after exhausting their generations.
    #[must_use]
    pub const fn retired(&self) -> u32 {
        self.retired
    }
}
