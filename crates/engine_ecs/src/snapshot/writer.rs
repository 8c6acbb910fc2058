//! Emits registry state to a [`SnapshotSink`], one stage at a time.

use engine_component::{Component, ComponentSet, TypeVisitor};
use tracing::debug;

use super::archive::{SnapshotSink, StageHeader};
use crate::error::SnapshotError;
use crate::registry::EntityRegistry;

/// Read-only view of a registry that serializes it in caller-chosen stages.
///
/// Stages may be invoked in any subset and order; the loader must replay
/// the same sequence.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotWriter<'a> {
    registry: &'a EntityRegistry,
}

impl<'a> SnapshotWriter<'a> {
    pub(crate) fn new(registry: &'a EntityRegistry) -> Self {
        Self { registry }
    }

    /// Emit every live identifier in ascending index order.
    ///
    /// # Errors
    ///
    /// Propagates sink failures.
    pub fn entities(&self, sink: &mut impl SnapshotSink) -> Result<&Self, SnapshotError> {
        let count = self.registry.size();
        sink.header(&StageHeader::entities())?;
        sink.count(count as u64)?;
        for entity in self.registry.entities() {
            sink.entity(entity)?;
        }
        debug!(count, "wrote entities stage");
        Ok(self)
    }

    /// Emit every tombstone in ascending index order.
    ///
    /// # Errors
    ///
    /// Propagates sink failures.
    pub fn destroyed(&self, sink: &mut impl SnapshotSink) -> Result<&Self, SnapshotError> {
        let count = self.registry.capacity() - self.registry.size();
        sink.header(&StageHeader::destroyed())?;
        sink.count(count as u64)?;
        for tombstone in self.registry.destroyed() {
            sink.entity(tombstone)?;
        }
        debug!(count, "wrote destroyed stage");
        Ok(self)
    }

    /// Emit the pool of each type of `C`, in order, as a count followed by
    /// `(entity, value)` pairs in dense order.
    ///
    /// # Errors
    ///
    /// Propagates sink failures.
    pub fn component<C: ComponentSet>(
        &self,
        sink: &mut impl SnapshotSink,
    ) -> Result<&Self, SnapshotError> {
        C::visit_types(&mut PoolWriter {
            registry: self.registry,
            sink,
        })?;
        Ok(self)
    }

    /// Emit the slot of each type of `C`, in order, as a presence flag
    /// followed by the `(owner, value)` pair when present.
    ///
    /// # Errors
    ///
    /// Propagates sink failures.
    pub fn tag<C: ComponentSet>(&self, sink: &mut impl SnapshotSink) -> Result<&Self, SnapshotError> {
        C::visit_types(&mut TagWriter {
            registry: self.registry,
            sink,
        })?;
        Ok(self)
    }
}

struct PoolWriter<'a, S> {
    registry: &'a EntityRegistry,
    sink: &'a mut S,
}

impl<S: SnapshotSink> TypeVisitor for PoolWriter<'_, S> {
    type Error = SnapshotError;

    fn visit<T: Component>(&mut self) -> Result<(), SnapshotError> {
        self.sink.header(&StageHeader::component::<T>())?;
        let Some(pool) = self.registry.pool::<T>() else {
            self.sink.count(0)?;
            return Ok(());
        };
        self.sink.count(pool.len() as u64)?;
        for (entity, value) in pool.iter() {
            self.sink.entity(entity)?;
            self.sink.component(value)?;
        }
        debug!(component = T::type_name(), count = pool.len(), "wrote component stage");
        Ok(())
    }
}

struct TagWriter<'a, S> {
    registry: &'a EntityRegistry,
    sink: &'a mut S,
}

impl<S: SnapshotSink> TypeVisitor for TagWriter<'_, S> {
    type Error = SnapshotError;

    fn visit<T: Component>(&mut self) -> Result<(), SnapshotError> {
        self.sink.header(&StageHeader::tag::<T>())?;
        match self.registry.tag_slot::<T>().and_then(|slot| slot.iter().next()) {
            Some((owner, value)) => {
                self.sink.flag(true)?;
                self.sink.entity(owner)?;
                self.sink.component(value)?;
            }
            None => self.sink.flag(false)?,
        }
        debug!(component = T::type_name(), present = self.registry.has_tag::<T>(), "wrote tag stage");
        Ok(())
    }
}
