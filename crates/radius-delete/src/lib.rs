//! Radius-based bulk deletion.
//!
//! One invocation removes everything of the selected categories inside a
//! circle while keeping the rest of the world consistent:
//!
//! ```text
//! RadiusQuery → RootResolver → TypeFilter → CascadeExpander
//!             → TopologySafetyResolver → DeletionCommitter
//! ```
//!
//! # Guarantees
//!
//! - No surviving edge references a deleted node
//! - A node whose last edge is deleted is deleted with it
//! - Owned leaves are only removed together with their root
//! - Entities far enough below the query surface are never touched
//! - Nothing is committed unless planning finished
//!
//! # Example
//!
//! ```ignore
//! let mut tool = RadiusDeleteTool::new(DeleteConfig::from_env());
//! tool.on_host_tool_changed(HostTool::RadiusDelete);
//! tool.set_radius(40.0);
//! tool.set_filter(DeleteFilters::TREES.bits());
//!
//! let index = GridIndex::from_world(&world, GridIndex::DEFAULT_CELL_SIZE);
//! if let Some(outcome) = tool.apply(Some(hit), &mut world, &index)? {
//!     println!("removed {}", outcome.deleted());
//! }
//! ```

pub mod cascade;
pub mod commit;
pub mod config;
pub mod deletion_set;
pub mod error;
pub mod filter;
pub mod filters;
pub mod pipeline;
pub mod query;
pub mod root;
pub mod tool;
pub mod topology;

pub use cascade::CascadeExpander;
pub use commit::{CommitReport, DeletionCommitter, PendingCommit};
pub use config::DeleteConfig;
pub use deletion_set::DeletionSet;
pub use error::{DeleteError, DeleteResult};
pub use filter::{Exclusion, TypeFilter, Verdict};
pub use filters::DeleteFilters;
pub use pipeline::{DeleteOutcome, DeletePlan, DeleteRequest, PipelineStage, PlanStats, RadiusDeletePipeline};
pub use query::{Candidate, RadiusQuery};
pub use root::{Resolved, RootResolver};
pub use tool::{HostTool, RadiusDeleteTool, ToolState};
pub use topology::{TopologyReport, TopologySafetyResolver};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        DeleteConfig, DeleteError, DeleteFilters, DeleteOutcome, DeleteRequest, HostTool,
        PipelineStage, RadiusDeletePipeline, RadiusDeleteTool, ToolState,
    };
}
