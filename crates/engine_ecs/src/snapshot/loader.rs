//! Rebuilds registry state from a [`SnapshotSource`], one stage at a time.

use std::collections::HashSet;

use engine_component::{Component, ComponentSet, EcsError, Entity, TypeVisitor};
use tracing::debug;

use super::archive::{SnapshotSource, StageHeader};
use crate::error::SnapshotError;
use crate::registry::EntityRegistry;

/// Restores stages into an empty registry.
///
/// Obtained from [`EntityRegistry::restore`]. Stages must be called in the
/// order the writer used. After every stage, successful or not, the free
/// list is rethreaded so the registry stays usable; a stage that fails
/// midway leaves the values read so far in place.
#[derive(Debug)]
pub struct SnapshotLoader<'a> {
    registry: &'a mut EntityRegistry,
    /// Indices restored as tombstones by this loader.
    tombstones: HashSet<u32>,
    /// Upper bound on the identifier table this loader may grow to.
    capacity_limit: usize,
}

impl<'a> SnapshotLoader<'a> {
    pub(crate) fn new(registry: &'a mut EntityRegistry) -> Self {
        Self {
            registry,
            tombstones: HashSet::new(),
            capacity_limit: Entity::NULL_INDEX as usize,
        }
    }

    /// Refuse identifiers whose index would grow the table beyond `limit`
    /// slots. Without a limit every index below [`Entity::NULL_INDEX`] is
    /// accepted.
    #[must_use]
    pub fn with_capacity_limit(mut self, limit: usize) -> Self {
        self.capacity_limit = limit;
        self
    }

    /// Restore live identifiers with their exact index and version.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::StageMismatch`] if the stream is not at an entities
    /// stage, [`EcsError::IdentifierConflict`] if an identifier collides with
    /// one already restored, or source failures.
    pub fn entities(&mut self, source: &mut impl SnapshotSource) -> Result<&mut Self, SnapshotError> {
        let result = self.read_entities(source);
        self.registry.relink_free_list();
        let count = result?;
        debug!(count, "restored entities stage");
        Ok(self)
    }

    /// Restore tombstones so that future identifiers never repeat old ones.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::StageMismatch`] if the stream is not at a destroyed
    /// stage, [`EcsError::IdentifierConflict`] if a tombstone lands on a live
    /// index, or source failures.
    pub fn destroyed(&mut self, source: &mut impl SnapshotSource) -> Result<&mut Self, SnapshotError> {
        let result = self.read_destroyed(source);
        self.registry.relink_free_list();
        let count = result?;
        debug!(count, "restored destroyed stage");
        Ok(self)
    }

    /// Restore the pool of each type of `C`, in order.
    ///
    /// Identifiers not yet known become valid placeholders.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::StageMismatch`] on a header for another type,
    /// [`EcsError::IdentifierConflict`] on identifier collisions,
    /// [`EcsError::AlreadyPresent`] on duplicate pairs, or source failures.
    pub fn component<C: ComponentSet>(
        &mut self,
        source: &mut impl SnapshotSource,
    ) -> Result<&mut Self, SnapshotError> {
        let result = C::visit_types(&mut PoolReader { loader: &mut *self, source });
        self.registry.relink_free_list();
        result?;
        Ok(self)
    }

    /// Restore the slot of each type of `C`, in order.
    ///
    /// # Errors
    ///
    /// Same as [`SnapshotLoader::component`].
    pub fn tag<C: ComponentSet>(&mut self, source: &mut impl SnapshotSource) -> Result<&mut Self, SnapshotError> {
        let result = C::visit_types(&mut TagReader { loader: &mut *self, source });
        self.registry.relink_free_list();
        result?;
        Ok(self)
    }

    /// Destroy every restored entity that ended up with no component and no
    /// tag.
    pub fn orphans(&mut self) -> &mut Self {
        let pruned = self.registry.prune_orphans();
        debug!(pruned, "swept orphans after restore");
        self
    }

    fn read_entities(&mut self, source: &mut impl SnapshotSource) -> Result<u64, SnapshotError> {
        expect_header(&mut *source, StageHeader::entities())?;
        let count = source.count()?;
        for _ in 0..count {
            let entity = source.entity()?;
            self.restore_alive(entity)?;
        }
        Ok(count)
    }

    fn read_destroyed(&mut self, source: &mut impl SnapshotSource) -> Result<u64, SnapshotError> {
        expect_header(&mut *source, StageHeader::destroyed())?;
        let count = source.count()?;
        for _ in 0..count {
            let tombstone = source.entity()?;
            self.restore_tombstone(tombstone)?;
        }
        Ok(count)
    }

    /// Make `entity` valid, accepting an identical identifier restored
    /// earlier by another stage.
    fn restore_alive(&mut self, entity: Entity) -> Result<(), SnapshotError> {
        let index = entity.index();
        let conflict = EcsError::IdentifierConflict { index };
        if index == Entity::NULL_INDEX || self.tombstones.contains(&index) {
            return Err(conflict.into());
        }
        self.accommodate(index)?;
        match self.registry.slot(index) {
            Some(current) if current == entity => Ok(()),
            Some(current) if current.index() == index => Err(conflict.into()),
            _ => {
                self.registry.revive(entity);
                Ok(())
            }
        }
    }

    fn restore_tombstone(&mut self, tombstone: Entity) -> Result<(), SnapshotError> {
        let index = tombstone.index();
        let conflict = EcsError::IdentifierConflict { index };
        if index == Entity::NULL_INDEX {
            return Err(conflict.into());
        }
        self.accommodate(index)?;
        let Some(current) = self.registry.slot(index) else {
            return Err(conflict.into());
        };
        if current.index() == index {
            return Err(conflict.into());
        }
        if self.tombstones.contains(&index) {
            return if current.version() == tombstone.version() {
                Ok(())
            } else {
                Err(conflict.into())
            };
        }
        self.registry.bury(tombstone);
        self.tombstones.insert(index);
        Ok(())
    }

    /// Grow the table so `index` exists, within the configured limit.
    fn accommodate(&mut self, index: u32) -> Result<(), SnapshotError> {
        if index as usize >= self.capacity_limit {
            return Err(SnapshotError::CapacityExceeded {
                index,
                limit: self.capacity_limit,
            });
        }
        self.registry
            .accommodate(index)
            .map_err(|source| SnapshotError::Allocation { index, source })
    }
}

fn expect_header(source: &mut impl SnapshotSource, expected: StageHeader) -> Result<(), SnapshotError> {
    let found = source.header()?;
    if found == expected {
        Ok(())
    } else {
        Err(SnapshotError::StageMismatch { expected, found })
    }
}

struct PoolReader<'l, 'a, R> {
    loader: &'l mut SnapshotLoader<'a>,
    source: &'l mut R,
}

impl<R: SnapshotSource> TypeVisitor for PoolReader<'_, '_, R> {
    type Error = SnapshotError;

    fn visit<T: Component>(&mut self) -> Result<(), SnapshotError> {
        expect_header(&mut *self.source, StageHeader::component::<T>())?;
        let count = self.source.count()?;
        for _ in 0..count {
            let entity = self.source.entity()?;
            let value = self.source.component::<T>()?;
            self.loader.restore_alive(entity)?;
            self.loader.registry.assign(entity, value)?;
        }
        debug!(component = T::type_name(), count, "restored component stage");
        Ok(())
    }
}

struct TagReader<'l, 'a, R> {
    loader: &'l mut SnapshotLoader<'a>,
    source: &'l mut R,
}

impl<R: SnapshotSource> TypeVisitor for TagReader<'_, '_, R> {
    type Error = SnapshotError;

    fn visit<T: Component>(&mut self) -> Result<(), SnapshotError> {
        expect_header(&mut *self.source, StageHeader::tag::<T>())?;
        let present = self.source.flag()?;
        if present {
            let owner = self.source.entity()?;
            let value = self.source.component::<T>()?;
            self.loader.restore_alive(owner)?;
            self.loader.registry.attach(owner, value)?;
        }
        debug!(component = T::type_name(), present, "restored tag stage");
        Ok(())
    }
}
