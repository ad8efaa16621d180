//! User-facing tool state: brush radius, filter mask and activation.
//!
//! Values arriving from the UI are coerced here so the pipeline only ever
//! sees a valid radius and a known set of filter bits.

use radius_spatial::SpatialIndex;
use radius_world::{CommandSink, EntityGraph, Vec3};
use tracing::{debug, info};

use crate::{
    config::DeleteConfig,
    error::DeleteResult,
    filters::DeleteFilters,
    pipeline::{DeleteOutcome, DeleteRequest, RadiusDeletePipeline},
};

/// Activation state as shown to the UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ToolState {
    #[default]
    Inactive = 0,
    /// The host bulldozer is selected; one toggle activates radius mode.
    Armed = 1,
    Active = 2,
}

/// Tool the host reports as selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostTool {
    RadiusDelete,
    Bulldoze,
    Other,
}

#[derive(Debug)]
pub struct RadiusDeleteTool {
    pipeline: RadiusDeletePipeline,
    state: ToolState,
    radius: f32,
    filters: DeleteFilters,
}

impl Default for RadiusDeleteTool {
    fn default() -> Self {
        Self::new(DeleteConfig::default())
    }
}

impl RadiusDeleteTool {
    #[must_use]
    pub fn new(config: DeleteConfig) -> Self {
        let pipeline = RadiusDeletePipeline::new(config);
        let config = pipeline.config();
        let radius = config.default_radius;
        let filters = config.default_filters;
        Self {
            pipeline,
            state: ToolState::Inactive,
            radius,
            filters,
        }
    }

    #[must_use]
    pub const fn pipeline(&self) -> &RadiusDeletePipeline {
        &self.pipeline
    }

    #[must_use]
    pub const fn state(&self) -> ToolState {
        self.state
    }

    #[must_use]
    pub const fn state_code(&self) -> u8 {
        self.state as u8
    }

    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    #[must_use]
    pub const fn filters(&self) -> DeleteFilters {
        self.filters
    }

    #[must_use]
    pub const fn filters_bits(&self) -> u32 {
        self.filters.bits()
    }

    /// Flip between radius mode and handing back to the bulldozer.
    pub fn toggle(&mut self) -> ToolState {
        self.state = match self.state {
            ToolState::Active => ToolState::Armed,
            ToolState::Inactive | ToolState::Armed => ToolState::Active,
        };
        debug!(state = ?self.state, "tool toggled");
        self.state
    }

    /// Follow the host's tool selection.
    pub fn on_host_tool_changed(&mut self, tool: HostTool) -> ToolState {
        self.state = match tool {
            HostTool::RadiusDelete => ToolState::Active,
            HostTool::Bulldoze => ToolState::Armed,
            HostTool::Other => ToolState::Inactive,
        };
        self.state
    }

    /// Store a radius, clamped to the configured range. Returns the value kept.
    pub fn set_radius(&mut self, radius: f32) -> f32 {
        self.radius = self.pipeline.config().clamp_radius(radius);
        self.radius
    }

    /// Toggle the given filter bits. Unknown bits are dropped.
    pub fn set_filter(&mut self, bits: u32) -> u32 {
        let bits = DeleteFilters::from_bits_truncate(bits);
        if bits.is_empty() {
            return self.filters_bits();
        }
        self.filters = self.filters.toggled(bits);
        debug!(filters = self.filters.bits(), "filters changed");
        self.filters_bits()
    }

    /// Run one radius delete at the raycast hit, if the tool is active.
    ///
    /// A hit at exactly the origin is the host's "nothing hit" value and is
    /// ignored. Returns `None` when nothing ran.
    pub fn apply<G, S>(&self, hit: Option<Vec3>, world: &mut G, index: &S) -> DeleteResult<Option<DeleteOutcome>>
    where
        G: EntityGraph + CommandSink + ?Sized,
        S: SpatialIndex + ?Sized,
    {
        if self.state != ToolState::Active {
            return Ok(None);
        }
        let Some(center) = hit.filter(|&point| point != Vec3::ZERO) else {
            return Ok(None);
        };

        let outcome = self
            .pipeline
            .run(world, index, DeleteRequest::new(center, self.radius, self.filters))?;
        info!(deleted = outcome.deleted(), "radius delete applied");
        Ok(Some(outcome))
    }
}

#[cfg(test)]
mod tests {
    use radius_spatial::GridIndex;
    use radius_world::{PrefabKind, World};

    use super::*;

    #[test]
    fn test_toggle_cycle() {
        let mut tool = RadiusDeleteTool::default();
        assert_eq!(tool.state_code(), 0);

        assert_eq!(tool.toggle(), ToolState::Active);
        assert_eq!(tool.toggle(), ToolState::Armed);
        assert_eq!(tool.toggle(), ToolState::Active);
        assert_eq!(tool.state_code(), 2);
    }

    #[test]
    fn test_host_tool_changes() {
        let mut tool = RadiusDeleteTool::default();
        assert_eq!(tool.on_host_tool_changed(HostTool::Bulldoze), ToolState::Armed);
        assert_eq!(tool.on_host_tool_changed(HostTool::RadiusDelete), ToolState::Active);
        assert_eq!(tool.on_host_tool_changed(HostTool::Other), ToolState::Inactive);
    }

    #[test]
    fn test_radius_coercion() {
        let mut tool = RadiusDeleteTool::default();
        assert_eq!(tool.radius(), 20.0);
        assert_eq!(tool.set_radius(0.0), 5.0);
        assert_eq!(tool.set_radius(-3.0), 5.0);
        assert_eq!(tool.set_radius(75.0), 75.0);
        assert_eq!(tool.set_radius(1e9), 500.0);
        assert_eq!(tool.set_radius(f32::NAN), 20.0);
    }

    #[test]
    fn test_filter_toggling() {
        let mut tool = RadiusDeleteTool::default();
        assert_eq!(tool.filters_bits(), 63);

        assert_eq!(tool.set_filter(DeleteFilters::TREES.bits()), 59);
        assert_eq!(tool.set_filter(DeleteFilters::TREES.bits()), 63);
        // Partially set group gets fully set.
        tool.set_filter(DeleteFilters::PLANTS.bits());
        assert_eq!(
            tool.set_filter((DeleteFilters::PLANTS | DeleteFilters::PROPS).bits()),
            63
        );
        // Unknown bits are ignored.
        assert_eq!(tool.set_filter(1 << 12), 63);
    }

    #[test]
    fn test_apply_requires_active_and_hit() {
        let mut world = World::new();
        let tree = world.spawn_prefab(PrefabKind::Tree);
        world.spawn_object(tree, Vec3::new(1.0, 0.0, 0.0));
        let index = GridIndex::from_world(&world, 16.0);
        let hit = Some(Vec3::new(2.0, 0.0, 0.0));

        let mut tool = RadiusDeleteTool::default();
        assert_eq!(tool.apply(hit, &mut world, &index), Ok(None));

        tool.toggle();
        assert_eq!(tool.apply(None, &mut world, &index), Ok(None));
        assert_eq!(tool.apply(Some(Vec3::ZERO), &mut world, &index), Ok(None));

        let outcome = tool.apply(hit, &mut world, &index).unwrap().unwrap();
        assert_eq!(outcome.deleted(), 1);
    }
}
