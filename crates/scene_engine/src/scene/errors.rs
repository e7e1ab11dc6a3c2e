//! Scene error types

use thiserror::Error;

use crate::ecs::Entity;

/// Errors raised by scene hierarchy operations
///
/// Degenerate geometry and octree depth overflow are deliberately absent:
/// both are tolerated and never fail an operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// A structural change was rejected before any link was modified
    #[error("Invalid hierarchy operation on {entity:?}: {reason}")]
    InvalidHierarchyOperation {
        /// Entity the operation was applied to
        entity: Entity,
        /// Why it was rejected
        reason: String,
    },

    /// An operation named an entity that is dead or has no hierarchy links
    #[error("{entity:?} references invalid entity {target:?}")]
    DanglingReference {
        /// Entity holding or passing the reference
        entity: Entity,
        /// Entity that could not be resolved
        target: Entity,
    },

    /// A required component is missing
    #[error("{entity:?} has no {component} component")]
    MissingComponent {
        /// Entity lacking the component
        entity: Entity,
        /// Component name
        component: &'static str,
    },

    /// Link invariants do not hold
    #[error("Corrupt hierarchy at {entity:?}: {reason}")]
    CorruptHierarchy {
        /// First entity found violating an invariant
        entity: Entity,
        /// Violated invariant
        reason: String,
    },

    /// Snapshot encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SceneError {
    pub(crate) fn invalid(entity: Entity, reason: impl Into<String>) -> Self {
        Self::InvalidHierarchyOperation {
            entity,
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(entity: Entity, reason: impl Into<String>) -> Self {
        Self::CorruptHierarchy {
            entity,
            reason: reason.into(),
        }
    }
}
