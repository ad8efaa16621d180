//! Batch commit of a finished deletion set.

use radius_world::{ApplyReport, CommandBuffer, CommandSink, EntityGraph};
use tracing::info;

use crate::deletion_set::DeletionSet;

/// Commands for one invocation plus the category breakdown observed while
/// building them.
#[derive(Debug, Default, Clone)]
pub struct PendingCommit {
    commands: CommandBuffer,
    pub edges: usize,
    pub nodes: usize,
    pub other: usize,
    pub updates: usize,
}

impl PendingCommit {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of entities slated for deletion.
    #[must_use]
    pub const fn planned_deletions(&self) -> usize {
        self.edges + self.nodes + self.other
    }

    #[must_use]
    pub const fn commands(&self) -> &CommandBuffer {
        &self.commands
    }
}

/// Observable result of a commit. Nothing downstream depends on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Entities newly marked deleted.
    pub deleted: usize,
    pub edges: usize,
    pub nodes: usize,
    pub other: usize,
    /// Survivors newly marked for refresh.
    pub updated: usize,
    /// Planned entities the host had already removed by commit time.
    pub stale: usize,
    /// Planned entities that were already marked.
    pub already_marked: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeletionCommitter;

impl DeletionCommitter {
    /// Turn the set into one command batch. Read-only.
    pub fn prepare<G>(&self, graph: &G, set: &DeletionSet) -> PendingCommit
    where
        G: EntityGraph + ?Sized,
    {
        let mut pending = PendingCommit {
            commands: CommandBuffer::with_capacity(set.len() + set.update_count()),
            ..PendingCommit::default()
        };

        for entity in set.iter() {
            if graph.is_edge(entity) {
                pending.edges += 1;
            } else if graph.is_node(entity) {
                pending.nodes += 1;
            } else {
                pending.other += 1;
            }
            pending.commands.mark_deleted(entity);
        }
        for entity in set.updates() {
            pending.updates += 1;
            pending.commands.mark_updated(entity);
        }

        pending
    }

    /// Hand the whole batch to the host in one call.
    pub fn commit<S>(&self, sink: &mut S, pending: PendingCommit) -> CommitReport
    where
        S: CommandSink + ?Sized,
    {
        let PendingCommit {
            commands,
            edges,
            nodes,
            other,
            ..
        } = pending;

        if commands.is_empty() {
            return CommitReport::default();
        }

        let ApplyReport {
            deleted,
            updated,
            already_marked,
            stale,
        } = sink.apply(commands);

        let report = CommitReport {
            deleted,
            edges,
            nodes,
            other,
            updated,
            stale,
            already_marked,
        };
        info!(
            deleted,
            edges, nodes, other, updated, stale, "committed radius delete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use radius_world::{Entity, EntityFlags, PrefabKind, Vec3, World};

    use super::*;

    fn sample() -> (World, DeletionSet, [Entity; 4]) {
        let mut world = World::new();
        let tree = world.spawn_prefab(PrefabKind::Tree);
        let a = world.spawn_node(Vec3::ZERO);
        let b = world.spawn_node(Vec3::new(10.0, 0.0, 0.0));
        let ab = world.spawn_edge(a, b).unwrap();
        let oak = world.spawn_object(tree, Vec3::ZERO);

        let mut set = DeletionSet::new();
        set.insert(ab);
        set.insert(a);
        set.insert(oak);
        set.mark_update(b);
        (world, set, [a, b, ab, oak])
    }

    #[test]
    fn test_breakdown_and_marks() {
        let (mut world, set, [a, b, ab, oak]) = sample();

        let pending = DeletionCommitter.prepare(&world, &set);
        assert_eq!((pending.edges, pending.nodes, pending.other, pending.updates), (1, 1, 1, 1));
        assert_eq!(pending.planned_deletions(), 3);

        let report = DeletionCommitter.commit(&mut world, pending);
        assert_eq!(report.deleted, 3);
        assert_eq!(report.updated, 1);
        for entity in [a, ab, oak] {
            assert!(world.has_flag(entity, EntityFlags::DELETED));
        }
        assert!(world.has_flag(b, EntityFlags::UPDATED));
        assert!(!world.has_flag(b, EntityFlags::DELETED));
    }

    #[test]
    fn test_recommit_is_noop() {
        let (mut world, set, _) = sample();

        let pending = DeletionCommitter.prepare(&world, &set);
        let first = DeletionCommitter.commit(&mut world, pending);
        let pending = DeletionCommitter.prepare(&world, &set);
        let second = DeletionCommitter.commit(&mut world, pending);

        assert_eq!(first.deleted, 3);
        assert_eq!(second.deleted, 0);
        assert_eq!(second.already_marked, 4);
    }

    #[test]
    fn test_stale_entities_are_counted_not_fatal() {
        let (mut world, set, [_, _, _, oak]) = sample();
        let pending = DeletionCommitter.prepare(&world, &set);
        world.despawn(oak);

        let report = DeletionCommitter.commit(&mut world, pending);
        assert_eq!(report.deleted, 2);
        assert_eq!(report.stale, 1);
    }

    #[test]
    fn test_empty_commit() {
        let mut world = World::new();
        let pending = DeletionCommitter.prepare(&world, &DeletionSet::new());
        assert!(pending.is_empty());
        assert_eq!(DeletionCommitter.commit(&mut world, pending), CommitReport::default());
    }
}
