//! In-memory archive: a FIFO of tagged values.
//!
//! Component values are kept as boxed `Any` copies, so nothing is encoded.
//! Reading a value of the wrong kind or component type is reported instead
//! of reinterpreted.

use std::any::Any;
use std::collections::VecDeque;

use engine_component::{Component, Entity};

use super::archive::{SnapshotSink, SnapshotSource, StageHeader};
use crate::error::SnapshotError;

/// One value held by a [`QueueArchive`].
pub enum ArchiveValue {
    /// A stage header.
    Header(StageHeader),
    /// An element count.
    Count(u64),
    /// A presence flag.
    Flag(bool),
    /// An identifier.
    Entity(Entity),
    /// A component value and the name of its type.
    Component {
        /// [`Component::type_name`] of the boxed value.
        type_name: &'static str,
        /// The value itself.
        value: Box<dyn Any + Send>,
    },
}

impl ArchiveValue {
    /// Short description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Header(header) => format!("header {header}"),
            Self::Count(count) => format!("count {count}"),
            Self::Flag(flag) => format!("flag {flag}"),
            Self::Entity(entity) => entity.to_string(),
            Self::Component { type_name, .. } => format!("component '{type_name}'"),
        }
    }
}

impl std::fmt::Debug for ArchiveValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// A queue that is both a [`SnapshotSink`] and a [`SnapshotSource`].
#[derive(Debug, Default)]
pub struct QueueArchive {
    queue: VecDeque<ArchiveValue>,
}

impl QueueArchive {
    /// Create an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of values not yet read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if every written value has been read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn pop(&mut self) -> Result<ArchiveValue, SnapshotError> {
        self.queue.pop_front().ok_or(SnapshotError::Exhausted)
    }
}

fn unexpected(expected: &'static str, found: &ArchiveValue) -> SnapshotError {
    SnapshotError::UnexpectedValue {
        expected,
        found: found.describe(),
    }
}

impl SnapshotSink for QueueArchive {
    fn header(&mut self, header: &StageHeader) -> Result<(), SnapshotError> {
        self.queue.push_back(ArchiveValue::Header(*header));
        Ok(())
    }

    fn count(&mut self, count: u64) -> Result<(), SnapshotError> {
        self.queue.push_back(ArchiveValue::Count(count));
        Ok(())
    }

    fn flag(&mut self, present: bool) -> Result<(), SnapshotError> {
        self.queue.push_back(ArchiveValue::Flag(present));
        Ok(())
    }

    fn entity(&mut self, entity: Entity) -> Result<(), SnapshotError> {
        self.queue.push_back(ArchiveValue::Entity(entity));
        Ok(())
    }

    fn component<T: Component>(&mut self, value: &T) -> Result<(), SnapshotError> {
        self.queue.push_back(ArchiveValue::Component {
            type_name: T::type_name(),
            value: Box::new(value.clone()),
        });
        Ok(())
    }
}

impl SnapshotSource for QueueArchive {
    fn header(&mut self) -> Result<StageHeader, SnapshotError> {
        match self.pop()? {
            ArchiveValue::Header(header) => Ok(header),
            other => Err(unexpected("header", &other)),
        }
    }

    fn count(&mut self) -> Result<u64, SnapshotError> {
        match self.pop()? {
            ArchiveValue::Count(count) => Ok(count),
            other => Err(unexpected("count", &other)),
        }
    }

    fn flag(&mut self) -> Result<bool, SnapshotError> {
        match self.pop()? {
            ArchiveValue::Flag(flag) => Ok(flag),
            other => Err(unexpected("flag", &other)),
        }
    }

    fn entity(&mut self) -> Result<Entity, SnapshotError> {
        match self.pop()? {
            ArchiveValue::Entity(entity) => Ok(entity),
            other => Err(unexpected("entity", &other)),
        }
    }

    fn component<T: Component>(&mut self) -> Result<T, SnapshotError> {
        match self.pop()? {
            ArchiveValue::Component { type_name, value } => value
                .downcast::<T>()
                .map(|boxed| *boxed)
                .map_err(|_| SnapshotError::UnexpectedValue {
                    expected: T::type_name(),
                    found: format!("component '{type_name}'"),
                }),
            other => Err(unexpected(T::type_name(), &other)),
        }
    }
}
