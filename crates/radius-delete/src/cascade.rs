//! Dependent expansion.
//!
//! Removing an entity must take along everything that would otherwise point
//! at it: sub-objects, installed upgrades, sub-lanes, and for a node every
//! incident edge.

use radius_world::{Entity, EntityFlags, EntityGraph};
use tracing::{debug, trace};

use crate::deletion_set::DeletionSet;

/// Expands accepted roots to the set that must be removed with them.
#[derive(Clone, Copy, Debug, Default)]
pub struct CascadeExpander;

impl CascadeExpander {
    /// Add `roots` and their dependents to `set`.
    ///
    /// Idempotent: entities already present are skipped. Returns how many
    /// entities were added beyond the roots themselves.
    pub fn expand<G>(&self, graph: &G, roots: &[Entity], set: &mut DeletionSet) -> usize
    where
        G: EntityGraph + ?Sized,
    {
        let mut added = 0;
        for &root in roots {
            set.insert(root);
            added += self.expand_root(graph, root, set);
        }
        added
    }

    /// Dependents of one accepted root, including the incident edges of a
    /// node and those edges' own dependents.
    pub fn expand_root<G>(&self, graph: &G, root: Entity, set: &mut DeletionSet) -> usize
    where
        G: EntityGraph + ?Sized,
    {
        let mut added = self.add_dependents(graph, root, set);

        if let Some(edges) = graph.connected_edges(root) {
            for &edge in edges {
                if !Self::eligible(graph, edge) {
                    continue;
                }
                if set.insert(edge) {
                    debug!(%edge, node = %root, "node removal takes incident edge");
                    added += 1;
                }
                added += self.add_dependents(graph, edge, set);
            }
        }

        added
    }

    /// Sub-objects, upgrades and sub-lanes of `owner`, one level deep.
    pub fn add_dependents<G>(&self, graph: &G, owner: Entity, set: &mut DeletionSet) -> usize
    where
        G: EntityGraph + ?Sized,
    {
        let children = graph
            .sub_objects(owner)
            .iter()
            .chain(graph.upgrades(owner))
            .chain(graph.sub_lanes(owner));

        let mut added = 0;
        for &child in children {
            if Self::eligible(graph, child) && set.insert(child) {
                trace!(%child, %owner, "cascade");
                added += 1;
            }
        }
        added
    }

    fn eligible<G>(graph: &G, entity: Entity) -> bool
    where
        G: EntityGraph + ?Sized,
    {
        if !graph.exists(entity) {
            trace!(%entity, "skipping stale dependent");
            return false;
        }
        !graph.has_flag(entity, EntityFlags::DELETED)
    }
}
