//! Deferred mutation commands.
//!
//! Readers inspect the world through [`EntityGraph`](crate::EntityGraph)
//! without touching it. Everything they decide to change is recorded here and
//! handed to [`CommandSink::apply`](crate::CommandSink::apply) as one batch
//! once no reader is iterating the graph any more.

use crate::entity::Entity;

/// A single deferred mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Tag the entity for removal at the end of the frame.
    MarkDeleted(Entity),
    /// Tag a surviving entity for a geometry/pathing refresh.
    MarkUpdated(Entity),
}

impl Command {
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> Entity {
        match self {
            Self::MarkDeleted(entity) | Self::MarkUpdated(entity) => *entity,
        }
    }
}

/// Ordered batch of commands, applied all at once.
#[derive(Debug, Default, Clone)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    #[inline]
    pub fn mark_deleted(&mut self, entity: Entity) {
        self.push(Command::MarkDeleted(entity));
    }

    #[inline]
    pub fn mark_updated(&mut self, entity: Entity) {
        self.push(Command::MarkUpdated(entity));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

}

impl IntoIterator for CommandBuffer {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

/// What a batch actually changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Entities newly tagged deleted.
    pub deleted: usize,
    /// Entities newly tagged updated.
    pub updated: usize,
    /// Commands whose target was already tagged; these are no-ops.
    pub already_marked: usize,
    /// Commands whose target no longer exists.
    pub stale: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Generation;

    #[test]
    fn test_buffer_preserves_order() {
        let a = Entity::new(1, Generation::new());
        let b = Entity::new(2, Generation::new());

        let mut buffer = CommandBuffer::new();
        buffer.mark_deleted(a);
        buffer.mark_updated(b);

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.iter().next(), Some(&Command::MarkDeleted(a)));
        let commands: Vec<_> = buffer.into_iter().collect();
        assert_eq!(commands, vec![Command::MarkDeleted(a), Command::MarkUpdated(b)]);
    }

    #[test]
    fn test_command_entity() {
        let e = Entity::new(9, Generation::new());
        assert_eq!(Command::MarkDeleted(e).entity(), e);
        assert_eq!(Command::MarkUpdated(e).entity(), e);
    }
}
