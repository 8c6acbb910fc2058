//! Type-erased views over pools and tag slots.
//!
//! The registry holds an open-ended set of component types. Cascading
//! destroy and orphan detection only need "does this entity appear here" and
//! "drop this entity", so those are all the erased traits expose; typed
//! access goes through [`std::any::Any`] downcasts.

use std::any::Any;

use engine_component::{Component, ComponentPool, Entity, TagSlot};

/// A component pool of unknown type.
pub(crate) trait ErasedPool: Send + Sync {
    /// Returns `true` if `entity` holds a component here.
    fn contains(&self, entity: Entity) -> bool;

    /// Drop the component of `entity`, if any. Returns `true` if one existed.
    fn remove_entity(&mut self, entity: Entity) -> bool;

    fn len(&self) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedPool for ComponentPool<T> {
    fn contains(&self, entity: Entity) -> bool {
        self.has(entity)
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_ok()
    }

    fn len(&self) -> usize {
        ComponentPool::<T>::len(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A tag slot of unknown type.
pub(crate) trait ErasedTag: Send + Sync {
    fn owner(&self) -> Option<Entity>;

    /// Clear the slot if `entity` owns it. Returns `true` if it did.
    fn detach(&mut self, entity: Entity) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedTag for TagSlot<T> {
    fn owner(&self) -> Option<Entity> {
        TagSlot::<T>::owner(self)
    }

    fn detach(&mut self, entity: Entity) -> bool {
        if self.is_owned_by(entity) {
            self.reset();
            true
        } else {
            false
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
