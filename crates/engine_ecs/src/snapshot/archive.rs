//! The sink/source contract between the snapshot core and physical formats.
//!
//! Every stage starts with a [`StageHeader`], so a loader replaying the wrong
//! stage or type list fails with [`SnapshotError::StageMismatch`] instead of
//! reinterpreting foreign values. Everything after the header is a plain
//! sequence of counts, flags, identifiers and component values; how those are
//! laid out in bytes or text is up to the archive.

use engine_component::{Component, ComponentTypeId, Entity};
use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;

/// The data category a stage carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKind {
    /// Live identifiers.
    Entities,
    /// Destroyed-identifier tombstones.
    Destroyed,
    /// One component pool.
    Component,
    /// One tag slot.
    Tag,
}

/// Framing emitted at the start of every stage and, within component and tag
/// stages, before every type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageHeader {
    /// The stage category.
    pub kind: StageKind,
    /// The component type for component and tag stages.
    pub component: Option<ComponentTypeId>,
}

impl StageHeader {
    /// Header of the entities stage.
    #[must_use]
    pub const fn entities() -> Self {
        Self {
            kind: StageKind::Entities,
            component: None,
        }
    }

    /// Header of the destroyed stage.
    #[must_use]
    pub const fn destroyed() -> Self {
        Self {
            kind: StageKind::Destroyed,
            component: None,
        }
    }

    /// Header of the pool of `T` within a component stage.
    #[must_use]
    pub fn component<T: Component>() -> Self {
        Self {
            kind: StageKind::Component,
            component: Some(T::component_type_id()),
        }
    }

    /// Header of the slot of `T` within a tag stage.
    #[must_use]
    pub fn tag<T: Component>() -> Self {
        Self {
            kind: StageKind::Tag,
            component: Some(T::component_type_id()),
        }
    }
}

impl std::fmt::Display for StageHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.component {
            Some(id) => write!(f, "{:?}({id})", self.kind),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

/// Receives snapshot values in emission order.
pub trait SnapshotSink {
    /// Write a stage header.
    ///
    /// # Errors
    ///
    /// Archive-specific encoding failures.
    fn header(&mut self, header: &StageHeader) -> Result<(), SnapshotError>;

    /// Write an element count.
    ///
    /// # Errors
    ///
    /// Archive-specific encoding failures.
    fn count(&mut self, count: u64) -> Result<(), SnapshotError>;

    /// Write a presence flag.
    ///
    /// # Errors
    ///
    /// Archive-specific encoding failures.
    fn flag(&mut self, present: bool) -> Result<(), SnapshotError>;

    /// Write an identifier.
    ///
    /// # Errors
    ///
    /// Archive-specific encoding failures.
    fn entity(&mut self, entity: Entity) -> Result<(), SnapshotError>;

    /// Write a component value.
    ///
    /// # Errors
    ///
    /// Archive-specific encoding failures.
    fn component<T: Component>(&mut self, value: &T) -> Result<(), SnapshotError>;
}

/// Produces snapshot values in the order a [`SnapshotSink`] received them.
pub trait SnapshotSource {
    /// Read a stage header.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Exhausted`] at end of stream, or decoding failures.
    fn header(&mut self) -> Result<StageHeader, SnapshotError>;

    /// Read an element count.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Exhausted`] at end of stream, or decoding failures.
    fn count(&mut self) -> Result<u64, SnapshotError>;

    /// Read a presence flag.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Exhausted`] at end of stream, or decoding failures.
    fn flag(&mut self) -> Result<bool, SnapshotError>;

    /// Read an identifier.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Exhausted`] at end of stream, or decoding failures.
    fn entity(&mut self) -> Result<Entity, SnapshotError>;

    /// Read a component value of type `T`.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Exhausted`] at end of stream, or decoding failures.
    fn component<T: Component>(&mut self) -> Result<T, SnapshotError>;
}
