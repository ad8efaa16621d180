//! Ownership root resolution.

use hashbrown::HashSet;
use radius_world::{Entity, EntityGraph};
use smallvec::SmallVec;
use tracing::warn;

use crate::error::{DeleteError, DeleteResult};

/// A candidate together with the top of its ownership chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub candidate: Entity,
    pub root: Entity,
    /// `false` if an earlier candidate of this invocation already resolved
    /// to the same root.
    pub first_visit: bool,
}

impl Resolved {
    /// Whether the candidate sits below some other entity.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.candidate != self.root
    }
}

/// Walks `child → owner` links to the top-level entity, once per root.
#[derive(Debug)]
pub struct RootResolver {
    max_hops: usize,
    seen: HashSet<Entity>,
}

impl RootResolver {
    #[must_use]
    pub fn new(max_hops: usize) -> Self {
        Self {
            max_hops,
            seen: HashSet::new(),
        }
    }

    /// Follow owners from `entity` until one has none.
    ///
    /// Fails on a revisited entity, a missing owner, or more than
    /// `max_hops` links.
    pub fn root_of<G>(&self, graph: &G, entity: Entity) -> DeleteResult<Entity>
    where
        G: EntityGraph + ?Sized,
    {
        let mut visited: SmallVec<[Entity; 8]> = SmallVec::new();
        visited.push(entity);
        let mut current = entity;

        for _ in 0..self.max_hops {
            let Some(owner) = graph.owner(current) else {
                return Ok(current);
            };
            if !graph.exists(owner) {
                return Err(DeleteError::StaleEntity(owner));
            }
            if visited.contains(&owner) {
                return Err(DeleteError::OwnerCycle(owner));
            }
            visited.push(owner);
            current = owner;
        }

        if graph.owner(current).is_none() {
            Ok(current)
        } else {
            Err(DeleteError::OwnerChainTooDeep {
                entity,
                hops: self.max_hops,
            })
        }
    }

    /// Resolve `candidate` and record its root as visited.
    ///
    /// A malformed chain makes the candidate its own root.
    pub fn resolve<G>(&mut self, graph: &G, candidate: Entity) -> Resolved
    where
        G: EntityGraph + ?Sized,
    {
        let root = self.root_of(graph, candidate).unwrap_or_else(|err| {
            warn!(%candidate, %err, "malformed ownership chain, treating candidate as root");
            candidate
        });

        Resolved {
            candidate,
            root,
            first_visit: self.seen.insert(root),
        }
    }

    /// Number of distinct roots handed out.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.seen.len()
    }
}
