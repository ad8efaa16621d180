//! Topology safety after expansion.
//!
//! Every edge in the deletion set is checked at both endpoints. A node left
//! with no surviving edge is removed as well; a node that keeps edges is
//! flagged for refresh together with its surviving edges and their far
//! endpoints.
//!
//! Degrees are computed against the deletion set as it stands, subtracting
//! doomed edges from the live connection list. Nodes are the only thing this
//! stage adds, and adding a node never changes another node's surviving
//! edge count, so a single pass over the edges reaches the fixed point.

use radius_world::{Entity, EntityFlags, EntityGraph, NetEdge};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::{cascade::CascadeExpander, deletion_set::DeletionSet, error::DeleteError};

/// What [`TopologySafetyResolver::resolve`] changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TopologyReport {
    /// Nodes added because their last edge is going away.
    pub orphaned_nodes: usize,
    /// Survivors newly flagged for refresh.
    pub refreshed: usize,
    /// Endpoints that were missing or not nodes.
    pub malformed: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TopologySafetyResolver;

impl TopologySafetyResolver {
    pub fn resolve<G>(&self, graph: &G, set: &mut DeletionSet) -> TopologyReport
    where
        G: EntityGraph + ?Sized,
    {
        let mut report = TopologyReport::default();
        let edges: Vec<(Entity, NetEdge)> = set
            .iter()
            .filter_map(|entity| graph.edge(entity).map(|edge| (entity, edge)))
            .collect();

        for (edge, NetEdge { start, end }) in edges {
            for node in [start, end] {
                self.check_endpoint(graph, edge, node, set, &mut report);
            }
        }

        debug!(
            orphaned = report.orphaned_nodes,
            refreshed = report.refreshed,
            malformed = report.malformed,
            "topology resolved"
        );
        report
    }

    fn check_endpoint<G>(
        &self,
        graph: &G,
        edge: Entity,
        node: Entity,
        set: &mut DeletionSet,
        report: &mut TopologyReport,
    ) where
        G: EntityGraph + ?Sized,
    {
        if set.contains(node) {
            return;
        }
        let Some(connections) = graph.connected_edges(node) else {
            let err = DeleteError::MissingEndpoint { edge, node };
            warn!(%err, "skipping endpoint");
            report.malformed += 1;
            return;
        };

        let surviving: SmallVec<[Entity; 4]> = connections
            .iter()
            .copied()
            .filter(|&other| other != edge && Self::survives(graph, other, set))
            .collect();

        if surviving.is_empty() {
            if set.insert(node) {
                debug!(%node, %edge, "removing orphaned node");
                report.orphaned_nodes += 1;
                CascadeExpander.add_dependents(graph, node, set);
            }
            return;
        }

        report.refreshed += usize::from(set.mark_update(node));
        for other in surviving {
            report.refreshed += usize::from(set.mark_update(other));
            let far = graph.edge(other).and_then(|e| e.other(node));
            if let Some(far) = far.filter(|&far| Self::survives(graph, far, set)) {
                report.refreshed += usize::from(set.mark_update(far));
            }
        }
    }

    fn survives<G>(graph: &G, entity: Entity, set: &DeletionSet) -> bool
    where
        G: EntityGraph + ?Sized,
    {
        graph.exists(entity) && !set.contains(entity) && !graph.has_flag(entity, EntityFlags::DELETED)
    }
}
