//! # engine_component
//!
//! The "C" in ECS: what a component is, how an entity is named, and how
//! components of one type are stored.
//!
//! This crate provides:
//!
//! - [`Entity`] — packed `(index, version)` identifiers.
//! - [`Component`] trait and [`ComponentTypeId`] — the contract all stored data
//!   must satisfy, plus its stable type identity.
//! - [`ComponentSet`] — ordered type lists used by snapshot stages.
//! - [`ComponentPool`] — sparse-set storage for one component type.
//! - [`TagSlot`] — singleton storage for one component type.
//! - [`EcsError`] — errors of direct storage operations.

pub mod component;
pub mod entity;
pub mod error;
pub mod pool;
pub mod tag;

pub use component::{Component, ComponentSet, ComponentTypeId, TypeVisitor};
pub use entity::{Entity, Version};
pub use error::EcsError;
pub use pool::ComponentPool;
pub use tag::TagSlot;
