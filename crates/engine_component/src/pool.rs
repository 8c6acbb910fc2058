//! Sparse-set component storage.
//!
//! - `sparse[index]` → slot in the dense arrays, or [`ABSENT`]
//! - `entities` / `values` → parallel dense arrays, packed for iteration
//!
//! Removal swap-removes from the dense arrays, so iteration order changes on
//! every removal and is not part of the contract.

use crate::component::Component;
use crate::entity::Entity;
use crate::error::EcsError;

/// Sentinel: the index has no component in this pool.
const ABSENT: usize = usize::MAX;

/// Storage for one component type.
#[derive(Debug, Clone)]
pub struct ComponentPool<T> {
    sparse: Vec<usize>,
    entities: Vec<Entity>,
    values: Vec<T>,
}

impl<T> Default for ComponentPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ComponentPool<T> {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            entities: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Dense slot of `entity`, if this exact identifier is present.
    fn slot_of(&self, entity: Entity) -> Option<usize> {
        let slot = *self.sparse.get(entity.slot())?;
        (slot != ABSENT && self.entities[slot] == entity).then_some(slot)
    }

    /// Returns `true` if `entity` holds a component in this pool.
    #[must_use]
    pub fn has(&self, entity: Entity) -> bool {
        self.slot_of(entity).is_some()
    }

    /// Returns `true` if any identifier with this index holds a component.
    #[must_use]
    pub fn contains_index(&self, index: u32) -> bool {
        self.sparse
            .get(index as usize)
            .is_some_and(|&slot| slot != ABSENT)
    }

    /// Number of components stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the pool holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(entity, &value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        debug_assert_eq!(self.entities.len(), self.values.len());
        self.entities.iter().copied().zip(self.values.iter())
    }

    /// Identifiers in dense order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Drop every component.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.entities.clear();
        self.values.clear();
    }
}

impl<T: Component> ComponentPool<T> {
    /// Add a component for `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::AlreadyPresent`] if the index already holds one.
    pub fn assign(&mut self, entity: Entity, value: T) -> Result<&mut T, EcsError> {
        if self.contains_index(entity.index()) {
            return Err(EcsError::AlreadyPresent {
                component: T::type_name(),
                entity,
            });
        }
        if entity.slot() >= self.sparse.len() {
            self.sparse.resize(entity.slot() + 1, ABSENT);
        }
        let slot = self.values.len();
        self.sparse[entity.slot()] = slot;
        self.entities.push(entity);
        self.values.push(value);
        Ok(&mut self.values[slot])
    }

    /// Remove and return the component of `entity`.
    ///
    /// The last dense element moves into the freed slot.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::NotFound`] if `entity` has no component here.
    pub fn remove(&mut self, entity: Entity) -> Result<T, EcsError> {
        let slot = self.slot_of(entity).ok_or(EcsError::NotFound {
            component: T::type_name(),
            entity,
        })?;
        self.entities.swap_remove(slot);
        let value = self.values.swap_remove(slot);
        if let Some(moved) = self.entities.get(slot) {
            self.sparse[moved.slot()] = slot;
        }
        self.sparse[entity.slot()] = ABSENT;
        Ok(value)
    }

    /// Borrow the component of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::NotFound`] if absent.
    pub fn get(&self, entity: Entity) -> Result<&T, EcsError> {
        match self.slot_of(entity) {
            Some(slot) => Ok(&self.values[slot]),
            None => Err(EcsError::NotFound {
                component: T::type_name(),
                entity,
            }),
        }
    }

    /// Mutably borrow the component of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::NotFound`] if absent.
    pub fn get_mut(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        match self.slot_of(entity) {
            Some(slot) => Ok(&mut self.values[slot]),
            None => Err(EcsError::NotFound {
                component: T::type_name(),
                entity,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(index: u32) -> Entity {
        Entity::new(index, 0)
    }

    /// Every present entity maps to a dense slot that maps back to it.
    fn assert_bijection<T>(pool: &ComponentPool<T>) {
        for (slot, entity) in pool.entities.iter().enumerate() {
            assert_eq!(pool.sparse[entity.slot()], slot);
        }
        let mapped = pool.sparse.iter().filter(|&&s| s != ABSENT).count();
        assert_eq!(mapped, pool.len());
    }

    #[test]
    fn test_assign_and_get() {
        let mut pool = ComponentPool::new();
        pool.assign(e(3), 30i32).unwrap();
        pool.assign(e(0), 0i32).unwrap();
        assert_eq!(*pool.get(e(3)).unwrap(), 30);
        assert_eq!(*pool.get(e(0)).unwrap(), 0);
        assert!(pool.has(e(3)));
        assert!(!pool.has(e(1)));
        assert_eq!(pool.len(), 2);
        assert_bijection(&pool);
    }

    #[test]
    fn test_assign_duplicate_fails() {
        let mut pool = ComponentPool::new();
        pool.assign(e(1), 'a').unwrap();
        let err = pool.assign(e(1), 'b').unwrap_err();
        assert!(matches!(err, EcsError::AlreadyPresent { component: "char", .. }));
        assert_eq!(*pool.get(e(1)).unwrap(), 'a');
    }

    #[test]
    fn test_remove_swaps_last_into_hole() {
        let mut pool = ComponentPool::new();
        for i in 0..4u32 {
            pool.assign(e(i), i as i64 * 10).unwrap();
        }
        assert_eq!(pool.remove(e(1)).unwrap(), 10);
        assert_eq!(pool.entities(), &[e(0), e(3), e(2)]);
        assert_eq!(*pool.get(e(3)).unwrap(), 30);
        assert!(!pool.has(e(1)));
        assert_bijection(&pool);

        assert_eq!(pool.remove(e(2)).unwrap(), 20);
        assert_eq!(pool.entities(), &[e(0), e(3)]);
        assert_bijection(&pool);
    }

    #[test]
    fn test_remove_missing_fails() {
        let mut pool: ComponentPool<f32> = ComponentPool::new();
        assert!(matches!(pool.remove(e(9)), Err(EcsError::NotFound { .. })));
        pool.assign(e(2), 1.0).unwrap();
        assert!(matches!(pool.remove(e(5)), Err(EcsError::NotFound { .. })));
    }

    #[test]
    fn test_stale_identifier_does_not_see_value() {
        let mut pool = ComponentPool::new();
        pool.assign(Entity::new(4, 2), 7u8).unwrap();
        assert!(pool.get(Entity::new(4, 1)).is_err());
        assert!(!pool.has(Entity::new(4, 1)));
        assert!(pool.contains_index(4));
    }

    #[test]
    fn test_get_mut_updates_value() {
        let mut pool = ComponentPool::new();
        pool.assign(e(0), String::from("a")).unwrap();
        pool.get_mut(e(0)).unwrap().push('b');
        assert_eq!(pool.get(e(0)).unwrap(), "ab");
    }

    #[test]
    fn test_clear() {
        let mut pool = ComponentPool::new();
        pool.assign(e(0), true).unwrap();
        pool.clear();
        assert!(pool.is_empty());
        assert!(!pool.contains_index(0));
        pool.assign(e(0), false).unwrap();
        assert_bijection(&pool);
    }
}
