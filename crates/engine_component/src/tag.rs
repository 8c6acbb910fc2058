//! Singleton storage: at most one `(owner, value)` pair per type.

use crate::component::Component;
use crate::entity::Entity;
use crate::error::EcsError;

/// A tag slot for component type `T`.
#[derive(Debug, Clone)]
pub struct TagSlot<T> {
    slot: Option<(Entity, T)>,
}

impl<T> Default for TagSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TagSlot<T> {
    /// Create an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Returns `true` if the tag is attached to some entity.
    #[must_use]
    pub fn has(&self) -> bool {
        self.slot.is_some()
    }

    /// Returns the owner, if any, without failing.
    #[must_use]
    pub fn owner(&self) -> Option<Entity> {
        self.slot.as_ref().map(|(owner, _)| *owner)
    }

    /// Returns `true` if `entity` currently owns the tag.
    #[must_use]
    pub fn is_owned_by(&self, entity: Entity) -> bool {
        self.owner() == Some(entity)
    }

    /// Iterate the owner and value, at most once.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.slot.iter().map(|(owner, value)| (*owner, value))
    }

    /// Attach the tag to `entity`, replacing and returning any prior pair.
    pub fn attach(&mut self, entity: Entity, value: T) -> Option<(Entity, T)> {
        self.slot.replace((entity, value))
    }

    /// Clear the slot. No-op if already empty.
    pub fn reset(&mut self) -> Option<(Entity, T)> {
        self.slot.take()
    }
}

impl<T: Component> TagSlot<T> {
    fn not_found() -> EcsError {
        EcsError::TagNotFound {
            component: T::type_name(),
        }
    }

    /// Borrow the tag value.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TagNotFound`] if the slot is empty.
    pub fn get(&self) -> Result<&T, EcsError> {
        self.slot.as_ref().map(|(_, value)| value).ok_or_else(Self::not_found)
    }

    /// Mutably borrow the tag value.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TagNotFound`] if the slot is empty.
    pub fn get_mut(&mut self) -> Result<&mut T, EcsError> {
        self.slot.as_mut().map(|(_, value)| value).ok_or_else(Self::not_found)
    }

    /// The entity owning the tag.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TagNotFound`] if the slot is empty.
    pub fn attachee(&self) -> Result<Entity, EcsError> {
        self.owner().ok_or_else(Self::not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slot() {
        let slot: TagSlot<f32> = TagSlot::new();
        assert!(!slot.has());
        assert!(matches!(slot.get(), Err(EcsError::TagNotFound { component: "f32" })));
        assert!(slot.attachee().is_err());
        assert_eq!(slot.iter().count(), 0);
    }

    #[test]
    fn test_attach_replaces_owner() {
        let mut slot = TagSlot::new();
        let a = Entity::new(1, 0);
        let b = Entity::new(2, 5);
        assert!(slot.attach(a, 0.5f32).is_none());
        assert_eq!(slot.attach(b, 0.3), Some((a, 0.5)));
        assert_eq!(slot.attachee().unwrap(), b);
        assert_eq!(*slot.get().unwrap(), 0.3);
        assert!(slot.is_owned_by(b));
        assert!(!slot.is_owned_by(a));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut slot = TagSlot::new();
        slot.attach(Entity::new(0, 0), 'x');
        assert!(slot.reset().is_some());
        assert!(slot.reset().is_none());
        assert!(!slot.has());
    }

    #[test]
    fn test_get_mut() {
        let mut slot = TagSlot::new();
        slot.attach(Entity::new(0, 0), 1u32);
        *slot.get_mut().unwrap() += 1;
        assert_eq!(*slot.get().unwrap(), 2);
    }
}
