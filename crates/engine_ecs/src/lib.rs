//! # engine_ecs
//!
//! The entity registry and its snapshot subsystem.
//!
//! This crate provides:
//!
//! - [`EntityRegistry`] — identifier table with a version-bumping free list,
//!   plus an open-ended set of component pools and tag slots.
//! - [`SnapshotWriter`] / [`SnapshotLoader`] — staged serialization of a
//!   registry into a [`SnapshotSink`] and reconstruction from a
//!   [`SnapshotSource`].
//! - [`SnapshotPlan`] — one stage list driving both sides.
//! - [`QueueArchive`] — an in-memory sink/source.
//! - [`SnapshotError`] — snapshot-layer errors.
//!
//! ## Usage
//!
//! ```rust
//! use engine_ecs::{EntityRegistry, QueueArchive};
//!
//! let mut registry = EntityRegistry::new();
//! let e = registry.create();
//! registry.assign(e, 'c').unwrap();
//! registry.attach(e, 0.5f32).unwrap();
//!
//! let mut archive = QueueArchive::new();
//! registry
//!     .snapshot()
//!     .entities(&mut archive).unwrap()
//!     .component::<char>(&mut archive).unwrap()
//!     .tag::<f32>(&mut archive).unwrap();
//!
//! let mut restored = EntityRegistry::new();
//! restored
//!     .restore().unwrap()
//!     .entities(&mut archive).unwrap()
//!     .component::<char>(&mut archive).unwrap()
//!     .tag::<f32>(&mut archive).unwrap()
//!     .orphans();
//! assert_eq!(restored.attachee::<f32>().unwrap(), e);
//! ```

pub mod error;
pub mod registry;
pub mod snapshot;
mod storage;

pub use engine_component::{
    Component, ComponentPool, ComponentSet, ComponentTypeId, EcsError, Entity, TagSlot, Version,
};
pub use error::SnapshotError;
pub use registry::EntityRegistry;
pub use snapshot::{
    ArchiveValue, QueueArchive, SnapshotLoader, SnapshotPlan, SnapshotSink, SnapshotSource,
    SnapshotWriter, StageDescriptor, StageHeader, StageKind,
};
