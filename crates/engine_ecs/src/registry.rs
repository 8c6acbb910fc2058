//! The entity registry: identifier table, free list, pools and tag slots.
//!
//! Identifiers live in a dense table indexed by entity index. An alive slot
//! stores the entity itself. A destroyed slot stores the *next* free index
//! together with the already-bumped version, so the free list is threaded
//! through the table and a slot is alive iff its stored index is its own.

use std::any::TypeId;
use std::collections::{HashMap, TryReserveError};

use engine_component::{Component, ComponentPool, EcsError, Entity, TagSlot, Version};
use tracing::{debug, trace};

use crate::snapshot::{SnapshotLoader, SnapshotWriter};
use crate::storage::{ErasedPool, ErasedTag};

/// In-memory entity-component store.
pub struct EntityRegistry {
    identifiers: Vec<Entity>,
    free_head: u32,
    alive: usize,
    pools: HashMap<TypeId, Box<dyn ErasedPool>>,
    tags: HashMap<TypeId, Box<dyn ErasedTag>>,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("alive", &self.alive)
            .field("capacity", &self.identifiers.len())
            .field("pools", &self.pools.len())
            .field("components", &self.pools.values().map(|p| p.len()).sum::<usize>())
            .field("tags", &self.tags.values().filter(|t| t.owner().is_some()).count())
            .finish()
    }
}

impl EntityRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            identifiers: Vec::new(),
            free_head: Entity::NULL_INDEX,
            alive: 0,
            pools: HashMap::new(),
            tags: HashMap::new(),
        }
    }

    // -- Entity lifecycle --

    /// Number of live entities.
    #[must_use]
    pub fn size(&self) -> usize {
        self.alive
    }

    /// Number of indices ever issued, alive or destroyed.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.identifiers.len()
    }

    /// Returns `true` if no entity is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alive == 0
    }

    /// Drop every entity, component and tag, and forget all issued indices.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Issue a new identifier.
    ///
    /// Reuses the head of the free list at its current version, otherwise
    /// appends a fresh index at version 0.
    ///
    /// # Panics
    ///
    /// Panics if the `u32` index space is exhausted.
    pub fn create(&mut self) -> Entity {
        let entity = if self.free_head == Entity::NULL_INDEX {
            assert!(
                self.identifiers.len() < Entity::NULL_INDEX as usize,
                "entity index space exhausted"
            );
            let entity = Entity::new(self.identifiers.len() as u32, 0);
            self.identifiers.push(entity);
            entity
        } else {
            let index = self.free_head;
            let slot = self.identifiers[index as usize];
            self.free_head = slot.index();
            let entity = Entity::new(index, slot.version());
            self.identifiers[index as usize] = entity;
            entity
        };
        self.alive += 1;
        trace!(%entity, "created entity");
        entity
    }

    /// Destroy `entity`, detaching it from every pool and tag slot.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidEntity`] if `entity` is not valid.
    pub fn destroy(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.ensure_valid(entity)?;
        self.release(entity);
        Ok(())
    }

    /// Detach and free a valid `entity`.
    fn release(&mut self, entity: Entity) {
        debug_assert!(self.valid(entity));
        for pool in self.pools.values_mut() {
            pool.remove_entity(entity);
        }
        for tag in self.tags.values_mut() {
            tag.detach(entity);
        }
        self.identifiers[entity.slot()] =
            Entity::new(self.free_head, entity.version().wrapping_add(1));
        self.free_head = entity.index();
        self.alive -= 1;
        trace!(%entity, "destroyed entity");
    }

    /// Returns `true` if `entity` is alive with exactly this version.
    #[must_use]
    pub fn valid(&self, entity: Entity) -> bool {
        self.identifiers.get(entity.slot()) == Some(&entity)
    }

    /// Version currently stored for the index of `entity`, alive or not.
    ///
    /// Returns `None` if the index was never issued.
    #[must_use]
    pub fn current(&self, entity: Entity) -> Option<Version> {
        self.identifiers.get(entity.slot()).map(|slot| slot.version())
    }

    /// Returns `true` if `entity` is valid and holds no component and no tag.
    #[must_use]
    pub fn orphan(&self, entity: Entity) -> bool {
        self.valid(entity)
            && !self.pools.values().any(|pool| pool.contains(entity))
            && !self.tags.values().any(|tag| tag.owner() == Some(entity))
    }

    /// Destroy every orphan. Returns how many were destroyed.
    pub fn prune_orphans(&mut self) -> usize {
        let orphans: Vec<Entity> = self.entities().filter(|&e| self.orphan(e)).collect();
        for &entity in &orphans {
            self.release(entity);
        }
        if !orphans.is_empty() {
            debug!(count = orphans.len(), "pruned orphan entities");
        }
        orphans.len()
    }

    /// Live identifiers in ascending index order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.identifiers
            .iter()
            .enumerate()
            .filter(|(index, slot)| slot.slot() == *index)
            .map(|(_, slot)| *slot)
    }

    /// Tombstones in ascending index order: each destroyed index paired with
    /// the version its next occupant will receive.
    pub fn destroyed(&self) -> impl Iterator<Item = Entity> + '_ {
        self.identifiers
            .iter()
            .enumerate()
            .filter(|(index, slot)| slot.slot() != *index)
            .map(|(index, slot)| Entity::new(index as u32, slot.version()))
    }

    fn ensure_valid(&self, entity: Entity) -> Result<(), EcsError> {
        if self.valid(entity) {
            Ok(())
        } else {
            Err(EcsError::InvalidEntity(entity))
        }
    }

    // -- Components --

    /// The pool of `T`, if one has been created.
    #[must_use]
    pub fn pool<T: Component>(&self) -> Option<&ComponentPool<T>> {
        self.pools
            .get(&TypeId::of::<T>())
            .and_then(|pool| pool.as_any().downcast_ref())
    }

    fn pool_mut<T: Component>(&mut self) -> Option<&mut ComponentPool<T>> {
        self.pools
            .get_mut(&TypeId::of::<T>())
            .and_then(|pool| pool.as_any_mut().downcast_mut())
    }

    fn assure_pool<T: Component>(&mut self) -> &mut ComponentPool<T> {
        self.pools
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentPool::<T>::new()))
            .as_any_mut()
            .downcast_mut()
            .unwrap_or_else(|| unreachable!("pool keyed by TypeId holds its own type"))
    }

    /// Give `entity` a component of type `T`.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if `entity` is not valid,
    /// [`EcsError::AlreadyPresent`] if it already has a `T`.
    pub fn assign<T: Component>(&mut self, entity: Entity, value: T) -> Result<&mut T, EcsError> {
        self.ensure_valid(entity)?;
        self.assure_pool::<T>().assign(entity, value)
    }

    /// Assign `value`, overwriting any existing `T`. Returns the old value.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if `entity` is not valid.
    pub fn replace<T: Component>(&mut self, entity: Entity, value: T) -> Result<Option<T>, EcsError> {
        self.ensure_valid(entity)?;
        let pool = self.assure_pool::<T>();
        if pool.has(entity) {
            let slot = pool.get_mut(entity)?;
            Ok(Some(std::mem::replace(slot, value)))
        } else {
            pool.assign(entity, value)?;
            Ok(None)
        }
    }

    /// Take the `T` away from `entity`.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if `entity` is not valid,
    /// [`EcsError::NotFound`] if it has no `T`.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Result<T, EcsError> {
        self.ensure_valid(entity)?;
        match self.pool_mut::<T>() {
            Some(pool) => pool.remove(entity),
            None => Err(EcsError::NotFound {
                component: T::type_name(),
                entity,
            }),
        }
    }

    /// Borrow the `T` of `entity`.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if `entity` is not valid,
    /// [`EcsError::NotFound`] if it has no `T`.
    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.ensure_valid(entity)?;
        match self.pool::<T>() {
            Some(pool) => pool.get(entity),
            None => Err(EcsError::NotFound {
                component: T::type_name(),
                entity,
            }),
        }
    }

    /// Mutably borrow the `T` of `entity`.
    ///
    /// # Errors
    ///
    /// Same as [`EntityRegistry::get`].
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.ensure_valid(entity)?;
        match self.pool_mut::<T>() {
            Some(pool) => pool.get_mut(entity),
            None => Err(EcsError::NotFound {
                component: T::type_name(),
                entity,
            }),
        }
    }

    /// Returns `true` if `entity` is valid and has a `T`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.valid(entity) && self.pool::<T>().is_some_and(|pool| pool.has(entity))
    }

    /// Returns `true` if no entity has a `T`.
    #[must_use]
    pub fn is_pool_empty<T: Component>(&self) -> bool {
        self.pool::<T>().is_none_or(ComponentPool::is_empty)
    }

    // -- Tags --

    /// The tag slot of `T`, if one has been created.
    #[must_use]
    pub fn tag_slot<T: Component>(&self) -> Option<&TagSlot<T>> {
        self.tags
            .get(&TypeId::of::<T>())
            .and_then(|tag| tag.as_any().downcast_ref())
    }

    fn tag_slot_mut<T: Component>(&mut self) -> Option<&mut TagSlot<T>> {
        self.tags
            .get_mut(&TypeId::of::<T>())
            .and_then(|tag| tag.as_any_mut().downcast_mut())
    }

    /// Attach the `T` tag to `entity`, replacing any previous owner.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if `entity` is not valid.
    pub fn attach<T: Component>(&mut self, entity: Entity, value: T) -> Result<(), EcsError> {
        self.ensure_valid(entity)?;
        self.tags
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(TagSlot::<T>::new()))
            .as_any_mut()
            .downcast_mut::<TagSlot<T>>()
            .unwrap_or_else(|| unreachable!("tag keyed by TypeId holds its own type"))
            .attach(entity, value);
        Ok(())
    }

    /// Returns `true` if the `T` tag is attached to some entity.
    #[must_use]
    pub fn has_tag<T: Component>(&self) -> bool {
        self.tag_slot::<T>().is_some_and(TagSlot::has)
    }

    fn tag_not_found<T: Component>() -> EcsError {
        EcsError::TagNotFound {
            component: T::type_name(),
        }
    }

    /// Borrow the `T` tag value.
    ///
    /// # Errors
    ///
    /// [`EcsError::TagNotFound`] if the tag is not attached.
    pub fn tag<T: Component>(&self) -> Result<&T, EcsError> {
        self.tag_slot::<T>()
            .ok_or_else(Self::tag_not_found::<T>)?
            .get()
    }

    /// Mutably borrow the `T` tag value.
    ///
    /// # Errors
    ///
    /// [`EcsError::TagNotFound`] if the tag is not attached.
    pub fn tag_mut<T: Component>(&mut self) -> Result<&mut T, EcsError> {
        self.tag_slot_mut::<T>()
            .ok_or_else(Self::tag_not_found::<T>)?
            .get_mut()
    }

    /// The entity owning the `T` tag.
    ///
    /// # Errors
    ///
    /// [`EcsError::TagNotFound`] if the tag is not attached.
    pub fn attachee<T: Component>(&self) -> Result<Entity, EcsError> {
        self.tag_slot::<T>()
            .ok_or_else(Self::tag_not_found::<T>)?
            .attachee()
    }

    /// Detach the `T` tag. No-op if it is not attached.
    pub fn reset_tag<T: Component>(&mut self) -> Option<(Entity, T)> {
        self.tag_slot_mut::<T>().and_then(TagSlot::reset)
    }

    // -- Snapshots --

    /// Begin writing a snapshot of this registry.
    #[must_use]
    pub fn snapshot(&self) -> SnapshotWriter<'_> {
        SnapshotWriter::new(self)
    }

    /// Begin restoring a snapshot into this registry.
    ///
    /// # Errors
    ///
    /// [`EcsError::IdentifierConflict`] unless the registry has never issued
    /// an identifier (fresh or [`cleared`](EntityRegistry::clear)).
    pub fn restore(&mut self) -> Result<SnapshotLoader<'_>, EcsError> {
        if !self.identifiers.is_empty() {
            return Err(EcsError::IdentifierConflict { index: 0 });
        }
        Ok(SnapshotLoader::new(self))
    }

    // -- Restore support --

    /// Stored slot at `index`, if issued.
    pub(crate) fn slot(&self, index: u32) -> Option<Entity> {
        self.identifiers.get(index as usize).copied()
    }

    /// Extend the table so that `index` exists. New slots are free at
    /// version 0 and stay unlinked until [`Self::relink_free_list`].
    pub(crate) fn accommodate(&mut self, index: u32) -> Result<(), TryReserveError> {
        let needed = index as usize + 1;
        if self.identifiers.len() < needed {
            self.identifiers
                .try_reserve_exact(needed - self.identifiers.len())?;
            self.identifiers
                .resize(needed, Entity::new(Entity::NULL_INDEX, 0));
        }
        Ok(())
    }

    /// Mark a free slot alive as `entity`.
    pub(crate) fn revive(&mut self, entity: Entity) {
        debug_assert_ne!(self.slot(entity.index()), Some(entity));
        self.identifiers[entity.slot()] = entity;
        self.alive += 1;
    }

    /// Record the version a free slot hands out next.
    pub(crate) fn bury(&mut self, tombstone: Entity) {
        self.identifiers[tombstone.slot()] = Entity::new(Entity::NULL_INDEX, tombstone.version());
    }

    /// Rethread every free slot so that lower indices are reused first.
    pub(crate) fn relink_free_list(&mut self) {
        let mut head = Entity::NULL_INDEX;
        for index in (0..self.identifiers.len()).rev() {
            let slot = self.identifiers[index];
            if slot.slot() != index {
                self.identifiers[index] = Entity::new(head, slot.version());
                head = index as u32;
            }
        }
        self.free_head = head;
    }
}
