//! One radius delete, end to end.
//!
//! Planning is read-only and produces a [`DeletePlan`]; committing hands the
//! plan to the host as a single command batch. The stage is tracked so a
//! second invocation cannot start while one is in flight.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::atomic::{AtomicU8, Ordering},
};

use parking_lot::RwLock;
use radius_spatial::SpatialIndex;
use radius_world::{CommandSink, EntityGraph, Vec3};
use tracing::{debug, error, info, info_span, trace};

use crate::{
    cascade::CascadeExpander,
    commit::{CommitReport, DeletionCommitter},
    config::DeleteConfig,
    deletion_set::DeletionSet,
    error::{DeleteError, DeleteResult},
    filter::{TypeFilter, Verdict},
    filters::DeleteFilters,
    query::RadiusQuery,
    root::RootResolver,
    topology::{TopologyReport, TopologySafetyResolver},
};

/// Where an invocation currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PipelineStage {
    #[default]
    Idle = 0,
    Querying = 1,
    Filtering = 2,
    Expanding = 3,
    TopologyResolving = 4,
    Committing = 5,
}

impl PipelineStage {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Querying,
            2 => Self::Filtering,
            3 => Self::Expanding,
            4 => Self::TopologyResolving,
            5 => Self::Committing,
            _ => Self::Idle,
        }
    }
}

/// Input of one invocation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeleteRequest {
    /// Query point. Its `y` is the surface height for depth exclusion.
    pub center: Vec3,
    pub radius: f32,
    pub filters: DeleteFilters,
}

impl DeleteRequest {
    #[must_use]
    pub const fn new(center: Vec3, radius: f32, filters: DeleteFilters) -> Self {
        Self {
            center,
            radius,
            filters,
        }
    }
}

/// Counters gathered while planning.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlanStats {
    /// Entities inside the circle.
    pub candidates: usize,
    /// Entities accepted by the filter.
    pub accepted: usize,
    pub excluded: usize,
    /// Entities added by cascade beyond the accepted ones.
    pub cascaded: usize,
    pub topology: TopologyReport,
}

/// Everything one invocation will do, computed without mutating anything.
#[derive(Clone, Debug, Default)]
pub struct DeletePlan {
    pub set: DeletionSet,
    pub stats: PlanStats,
}

/// Result of a committed invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub stats: PlanStats,
    pub commit: CommitReport,
}

impl DeleteOutcome {
    /// Entities newly marked deleted.
    #[must_use]
    pub const fn deleted(&self) -> usize {
        self.commit.deleted
    }
}

/// Resets the stage to idle however the invocation ends.
struct StageGuard<'a> {
    stage: &'a AtomicU8,
}

impl StageGuard<'_> {
    fn enter(&self, stage: PipelineStage) {
        trace!(?stage, "stage");
        self.stage.store(stage as u8, Ordering::Release);
    }
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        self.stage.store(PipelineStage::Idle as u8, Ordering::Release);
    }
}

/// Runs radius deletes against a host world.
#[derive(Debug, Default)]
pub struct RadiusDeletePipeline {
    config: DeleteConfig,
    stage: AtomicU8,
}

impl RadiusDeletePipeline {
    #[must_use]
    pub fn new(config: DeleteConfig) -> Self {
        Self {
            config: config.normalized(),
            stage: AtomicU8::new(PipelineStage::Idle as u8),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &DeleteConfig {
        &self.config
    }

    #[must_use]
    pub fn stage(&self) -> PipelineStage {
        PipelineStage::from_u8(self.stage.load(Ordering::Acquire))
    }

    fn begin(&self) -> DeleteResult<StageGuard<'_>> {
        self.stage
            .compare_exchange(
                PipelineStage::Idle as u8,
                PipelineStage::Querying as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|current| DeleteError::Busy {
                stage: PipelineStage::from_u8(current),
            })?;
        Ok(StageGuard { stage: &self.stage })
    }

    /// Compute what a request would delete without touching the world.
    pub fn plan<G, S>(&self, graph: &G, index: &S, request: DeleteRequest) -> DeleteResult<DeletePlan>
    where
        G: EntityGraph + ?Sized,
        S: SpatialIndex + ?Sized,
    {
        let guard = self.begin()?;
        self.plan_guarded(&guard, graph, index, request)
    }

    /// Plan and commit one request.
    ///
    /// The world is only borrowed mutably for the final batch. A panic while
    /// planning commits nothing and is reported as
    /// [`DeleteError::Internal`].
    pub fn run<G, S>(&self, world: &mut G, index: &S, request: DeleteRequest) -> DeleteResult<DeleteOutcome>
    where
        G: EntityGraph + CommandSink + ?Sized,
        S: SpatialIndex + ?Sized,
    {
        let _span = Self::span(request).entered();
        let guard = self.begin()?;

        let plan = self.plan_guarded(&guard, &*world, index, request)?;

        guard.enter(PipelineStage::Committing);
        let pending = DeletionCommitter.prepare(&*world, &plan.set);
        let commit = DeletionCommitter.commit(world, pending);

        Ok(DeleteOutcome {
            stats: plan.stats,
            commit,
        })
    }

    /// [`run`](Self::run) against lock-guarded state.
    ///
    /// Read guards are held while planning, then dropped before a single
    /// write guard on the world applies the batch. Entities the host removes
    /// in between are skipped when the batch is applied.
    ///
    /// Locks are taken world first, then index. Host code that holds both
    /// for writing must acquire them in the same order.
    pub fn run_shared<G, S>(
        &self,
        world: &RwLock<G>,
        index: &RwLock<S>,
        request: DeleteRequest,
    ) -> DeleteResult<DeleteOutcome>
    where
        G: EntityGraph + CommandSink,
        S: SpatialIndex,
    {
        let _span = Self::span(request).entered();
        let guard = self.begin()?;

        let (plan, pending) = {
            let world = world.read();
            let index = index.read();
            let plan = self.plan_guarded(&guard, &*world, &*index, request)?;
            let pending = DeletionCommitter.prepare(&*world, &plan.set);
            (plan, pending)
        };

        guard.enter(PipelineStage::Committing);
        let commit = DeletionCommitter.commit(&mut *world.write(), pending);

        Ok(DeleteOutcome {
            stats: plan.stats,
            commit,
        })
    }

    fn span(request: DeleteRequest) -> tracing::Span {
        info_span!(
            "radius_delete",
            center = %request.center,
            radius = request.radius,
            filters = request.filters.bits()
        )
    }

    fn plan_guarded<G, S>(
        &self,
        guard: &StageGuard<'_>,
        graph: &G,
        index: &S,
        request: DeleteRequest,
    ) -> DeleteResult<DeletePlan>
    where
        G: EntityGraph + ?Sized,
        S: SpatialIndex + ?Sized,
    {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            self.build_plan(guard, graph, index, request)
        }));

        attempt.map_err(|payload| {
            let message = panic_message(payload.as_ref());
            error!(
                center = %request.center,
                radius = request.radius,
                filters = request.filters.bits(),
                %message,
                "radius delete aborted, nothing committed"
            );
            DeleteError::Internal { message }
        })
    }

    fn build_plan<G, S>(
        &self,
        guard: &StageGuard<'_>,
        graph: &G,
        index: &S,
        request: DeleteRequest,
    ) -> DeletePlan
    where
        G: EntityGraph + ?Sized,
        S: SpatialIndex + ?Sized,
    {
        let radius = self.config.clamp_radius(request.radius);
        if !request.center.is_finite() {
            debug!(center = %request.center, "non-finite query point");
            return DeletePlan::default();
        }
        info!(center = %request.center, radius, filters = request.filters.bits(), "radius delete");

        guard.enter(PipelineStage::Querying);
        let candidates = RadiusQuery::new(request.center, radius).collect(index);

        guard.enter(PipelineStage::Filtering);
        let mut stats = PlanStats {
            candidates: candidates.len(),
            ..PlanStats::default()
        };
        let mut set = DeletionSet::with_capacity(candidates.len());
        let mut resolver = RootResolver::new(self.config.max_owner_hops);
        let filter = TypeFilter::new(request.filters, request.center.y, self.config.depth_offset);
        let mut accepted = Vec::new();

        for candidate in &candidates {
            let resolved = resolver.resolve(graph, candidate.entity);
            if set.contains(resolved.root) {
                continue;
            }
            let fallback = candidate.midpoint();

            let mut verdict = None;
            if resolved.first_visit {
                let root_verdict = filter.evaluate(graph, resolved.root, fallback, &set);
                if root_verdict.is_included() {
                    set.insert(resolved.root);
                    accepted.push(resolved.root);
                    continue;
                }
                verdict = Some((resolved.root, root_verdict));
            }

            // The root is out; an extension below it may still qualify alone.
            if resolved.is_owned() {
                let own = filter.evaluate(graph, candidate.entity, fallback, &set);
                if own.is_included() {
                    set.insert(candidate.entity);
                    accepted.push(candidate.entity);
                    continue;
                }
                verdict = Some((candidate.entity, own));
            }

            if let Some((entity, Verdict::Excluded(reason))) = verdict {
                debug!(%entity, %reason, "excluded");
                stats.excluded += 1;
            }
        }
        stats.accepted = accepted.len();

        guard.enter(PipelineStage::Expanding);
        stats.cascaded = CascadeExpander.expand(graph, &accepted, &mut set);

        guard.enter(PipelineStage::TopologyResolving);
        stats.topology = TopologySafetyResolver.resolve(graph, &mut set);

        debug!(
            planned = set.len(),
            updates = set.update_count(),
            accepted = stats.accepted,
            excluded = stats.excluded,
            "plan ready"
        );
        DeletePlan { set, stats }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

#[cfg(test)]
mod tests {
    use radius_spatial::GridIndex;
    use radius_world::{EntityFlags, PrefabKind, World};

    use super::*;

    fn request(filters: DeleteFilters) -> DeleteRequest {
        DeleteRequest::new(Vec3::ZERO, 20.0, filters)
    }

    #[test]
    fn test_busy_while_in_flight() {
        let pipeline = RadiusDeletePipeline::default();
        let mut world = World::new();
        let index = GridIndex::from_world(&world, 16.0);

        let guard = pipeline.begin().unwrap();
        guard.enter(PipelineStage::Expanding);
        assert_eq!(
            pipeline.run(&mut world, &index, request(DeleteFilters::all())),
            Err(DeleteError::Busy {
                stage: PipelineStage::Expanding
            })
        );
        drop(guard);

        assert_eq!(pipeline.stage(), PipelineStage::Idle);
        assert!(pipeline.run(&mut world, &index, request(DeleteFilters::all())).is_ok());
        assert_eq!(pipeline.stage(), PipelineStage::Idle);
    }

    #[test]
    fn test_plan_does_not_mutate() {
        let mut world = World::new();
        let tree = world.spawn_prefab(PrefabKind::Tree);
        let oak = world.spawn_object(tree, Vec3::new(3.0, 0.0, 0.0));
        let index = GridIndex::from_world(&world, 16.0);

        let plan = RadiusDeletePipeline::default()
            .plan(&world, &index, request(DeleteFilters::TREES))
            .unwrap();

        assert!(plan.set.contains(oak));
        assert_eq!(plan.stats.accepted, 1);
        assert!(!world.has_flag(oak, EntityFlags::DELETED));
    }

    #[test]
    fn test_owned_extension_survives_excluded_root() {
        let mut world = World::new();
        let building = world.spawn_prefab(PrefabKind::Building);
        let surface = world.spawn_prefab(PrefabKind::Surface);
        let plaza = world.spawn_object(surface, Vec3::new(50.0, 0.0, 0.0));
        // An upgrade sitting on a surface root; only the upgrade is in range.
        let kiosk = world.add_upgrade(plaza, building, Vec3::new(2.0, 0.0, 0.0)).unwrap();
        let index = GridIndex::from_world(&world, 16.0);

        let plan = RadiusDeletePipeline::default()
            .plan(&world, &index, request(DeleteFilters::BUILDINGS))
            .unwrap();

        assert_eq!(plan.set.iter().collect::<Vec<_>>(), vec![kiosk]);
    }

    #[test]
    fn test_radius_is_clamped() {
        let mut world = World::new();
        let tree = world.spawn_prefab(PrefabKind::Tree);
        let near = world.spawn_object(tree, Vec3::new(4.0, 0.0, 0.0));
        let index = GridIndex::from_world(&world, 16.0);

        let plan = RadiusDeletePipeline::default()
            .plan(&world, &index, DeleteRequest::new(Vec3::ZERO, 0.5, DeleteFilters::all()))
            .unwrap();

        assert!(plan.set.contains(near));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
