//! Storage-level error types.

use crate::entity::Entity;

/// Errors raised by direct registry, pool, and tag operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The operation addressed an identifier that is not currently valid.
    #[error("invalid entity: {0}")]
    InvalidEntity(Entity),

    /// The entity already holds a component of this type.
    #[error("component '{component}' already present on {entity}")]
    AlreadyPresent {
        /// Component type name.
        component: &'static str,
        /// The entity addressed.
        entity: Entity,
    },

    /// The entity does not hold a component of this type.
    #[error("component '{component}' not found on {entity}")]
    NotFound {
        /// Component type name.
        component: &'static str,
        /// The entity addressed.
        entity: Entity,
    },

    /// The tag slot of this type is empty.
    #[error("tag '{component}' is not attached")]
    TagNotFound {
        /// Component type name.
        component: &'static str,
    },

    /// A restore collided with state already present in the destination.
    #[error("identifier conflict at index {index}")]
    IdentifierConflict {
        /// The contested slot index.
        index: u32,
    },
}
