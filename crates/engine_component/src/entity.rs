//! Entity identifiers.
//!
//! An [`Entity`] is an `(index, version)` pair packed into a single `u64`.
//! The index names a slot in the registry's identifier table; the version
//! disambiguates successive occupants of that slot so that a stale handle to
//! a destroyed entity never validates again.

use serde::{Deserialize, Serialize};

/// A versioned entity identifier.
///
/// Lower 32 bits hold the index, upper 32 bits the version. Two identifiers
/// are equal iff both halves match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(u64);

/// Version counter type. Wraps on overflow.
pub type Version = u32;

impl Entity {
    /// Index value reserved as the free-list terminator. Never issued.
    pub const NULL_INDEX: u32 = u32::MAX;

    /// Build an identifier from its index and version.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, version: Version) -> Self {
        Self(((version as u64) << 32) | index as u64)
    }

    /// Rebuild an identifier from its packed `u64` form.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the packed `u64` form.
    #[inline]
    #[must_use]
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the version.
    #[inline]
    #[must_use]
    pub const fn version(self) -> Version {
        (self.0 >> 32) as u32
    }

    /// Slot index as a `usize`, for addressing dense tables.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> usize {
        self.index() as usize
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}v{})", self.index(), self.version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_packing() {
        let e = Entity::new(12345, 67890);
        assert_eq!(e.index(), 12345);
        assert_eq!(e.version(), 67890);
        assert_eq!(e.slot(), 12345);
    }

    #[test]
    fn test_entity_equality_needs_both_halves() {
        assert_eq!(Entity::new(3, 1), Entity::new(3, 1));
        assert_ne!(Entity::new(3, 1), Entity::new(3, 2));
        assert_ne!(Entity::new(3, 1), Entity::new(4, 1));
    }

    #[test]
    fn test_entity_raw_roundtrip() {
        let e = Entity::new(Entity::NULL_INDEX, u32::MAX);
        assert_eq!(Entity::from_raw(e.to_raw()), e);
    }

    #[test]
    fn test_entity_display() {
        assert_eq!(Entity::new(7, 2).to_string(), "Entity(7v2)");
    }

    #[test]
    fn test_entity_serializes_as_packed_u64() {
        let entity = Entity::new(9, 4);
        let bytes = rmp_serde::to_vec(&entity).unwrap();
        let raw: u64 = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(raw, entity.to_raw());
        let restored: Entity = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(entity, restored);
    }
}
