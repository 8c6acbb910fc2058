//! Line-delimited JSON archive.
//!
//! One JSON document per value, one value per line. Human readable, which
//! makes it the format of choice for inspecting a snapshot by eye.

use engine_component::{Component, Entity};
use engine_ecs::{SnapshotError, SnapshotSink, SnapshotSource, StageHeader};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ArchiveError;

/// JSON lines with a read cursor.
#[derive(Debug, Clone, Default)]
pub struct JsonArchive {
    lines: Vec<String>,
    cursor: usize,
}

impl JsonArchive {
    /// Create an empty archive for writing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse previously written text for reading. Blank lines are skipped.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_owned)
                .collect(),
            cursor: 0,
        }
    }

    /// Render every written value, newline terminated.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    /// Number of values written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, ArchiveError> {
        serde_json::to_string(value).map_err(|source| ArchiveError::Json {
            line: self.lines.len() + 1,
            source,
        })
    }

    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SnapshotError> {
        let line = self.encode(value)?;
        self.lines.push(line);
        Ok(())
    }

    fn pull<T: DeserializeOwned>(&mut self) -> Result<T, SnapshotError> {
        let line = self.lines.get(self.cursor).ok_or(ArchiveError::Exhausted)?;
        let value = serde_json::from_str(line).map_err(|source| ArchiveError::Json {
            line: self.cursor + 1,
            source,
        })?;
        self.cursor += 1;
        Ok(value)
    }
}

impl SnapshotSink for JsonArchive {
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

    /// Components are read back before being kept: serde_json writes
    /// non-finite floats as `null`, which would only fail at load time.
    fn component<T: Component>(&mut self, value: &T) -> Result<(), SnapshotError> {
        let line = self.encode(value)?;
        if let Err(source) = serde_json::from_str::<T>(&line) {
            return Err(ArchiveError::Unrepresentable {
                component: T::type_name(),
                line: self.lines.len() + 1,
                source,
            }
            .into());
        }
        self.lines.push(line);
        Ok(())
    }
}

impl SnapshotSource for JsonArchive {
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
