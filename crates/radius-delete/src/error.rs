//! Pipeline error types.

use radius_world::Entity;
use thiserror::Error;

use crate::pipeline::PipelineStage;

/// Errors raised while planning or committing a radius delete.
///
/// Only [`DeleteError::Busy`] and [`DeleteError::Internal`] ever leave the
/// pipeline. The rest describe a single bad entity and are handled by
/// skipping it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeleteError {
    /// A previous invocation has not returned to idle.
    #[error("pipeline busy in stage {stage:?}")]
    Busy { stage: PipelineStage },

    /// The entity was removed by the host after it was found.
    #[error("stale entity reference: {0:?}")]
    StaleEntity(Entity),

    /// An edge points at a node that does not exist.
    #[error("edge {edge:?} references missing endpoint {node:?}")]
    MissingEndpoint { edge: Entity, node: Entity },

    /// The ownership walk hit its hop bound.
    #[error("ownership chain of {entity:?} exceeds {hops} hops")]
    OwnerChainTooDeep { entity: Entity, hops: usize },

    /// The ownership walk revisited an entity.
    #[error("ownership cycle through {0:?}")]
    OwnerCycle(Entity),

    /// Planning aborted unexpectedly; nothing was committed.
    #[error("internal failure: {message}")]
    Internal { message: String },
}

/// Result type for pipeline operations.
pub type DeleteResult<T> = Result<T, DeleteError>;
