//! MessagePack archive.
//!
//! Every value is encoded as one self-contained MessagePack item appended to
//! a byte buffer. Identifiers are written as their packed `u64`, component
//! values through their serde implementation.

use engine_component::{Component, Entity};
use engine_ecs::{SnapshotError, SnapshotSink, SnapshotSource, StageHeader};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::{decode_prefix, encode_into};

/// A MessagePack byte buffer with a read cursor.
#[derive(Debug, Clone, Default)]
pub struct BinaryArchive {
    bytes: Vec<u8>,
    cursor: usize,
}

impl BinaryArchive {
    /// Create an empty archive for writing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap previously written bytes for reading.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes, cursor: 0 }
    }

    /// Consume the archive, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of bytes not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.cursor
    }

    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SnapshotError> {
        encode_into(&mut self.bytes, value)?;
        Ok(())
    }

    fn pull<T: DeserializeOwned>(&mut self) -> Result<T, SnapshotError> {
        let (value, used) = decode_prefix(&self.bytes[self.cursor..])?;
        self.cursor += used;
        Ok(value)
    }
}

impl SnapshotSink for BinaryArchive {
    fn header(&mut self, header: &StageHeader) -> Result<(), SnapshotError> {
        self.push(header)
    }

    fn count(&mut self, count: u64) -> Result<(), SnapshotError> {
        self.push(&count)
    }

    fn flag(&mut self, present: bool) -> Result<(), SnapshotError> {
        self.push(&present)
    }

    fn entity(&mut self, entity: Entity) -> Result<(), SnapshotError> {
        self.push(&entity)
    }

    fn component<T: Component>(&mut self, value: &T) -> Result<(), SnapshotError> {
        self.push(value)
    }
}

impl SnapshotSource for BinaryArchive {
    fn header(&mut self) -> Result<StageHeader, SnapshotError> {
        self.pull()
    }

    fn count(&mut self) -> Result<u64, SnapshotError> {
        self.pull()
    }

    fn flag(&mut self) -> Result<bool, SnapshotError> {
        self.pull()
    }

    fn entity(&mut self) -> Result<Entity, SnapshotError> {
        self.pull()
    }

    fn component<T: Component>(&mut self) -> Result<T, SnapshotError> {
        self.pull()
    }
}
