//! Snapshot-layer error types.

use engine_component::EcsError;

use crate::snapshot::StageHeader;

/// Errors that can occur while writing or restoring a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// A registry operation performed by the loader failed.
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// The stage read from the source is not the stage being restored.
    #[error("stage mismatch: expected {expected}, found {found}")]
    StageMismatch {
        /// The stage the loader is executing.
        expected: StageHeader,
        /// The stage header found in the stream.
        found: StageHeader,
    },

    /// The source produced a value of the wrong kind or type.
    #[error("unexpected value: expected {expected}, found {found}")]
    UnexpectedValue {
        /// The kind of value requested.
        expected: &'static str,
        /// A description of what was found instead.
        found: String,
    },

    /// An identifier index lies beyond the loader's capacity limit.
    #[error("identifier index {index} exceeds capacity limit {limit}")]
    CapacityExceeded {
        /// The offending index.
        index: u32,
        /// The configured limit on identifier slots.
        limit: usize,
    },

    /// Growing the identifier table to hold `index` failed.
    #[error("cannot grow identifier table to index {index}: {source}")]
    Allocation {
        /// The index that required growth.
        index: u32,
        /// The allocator failure.
        #[source]
        source: std::collections::TryReserveError,
    },

    /// The source ran out of values mid-stage.
    #[error("snapshot source exhausted")]
    Exhausted,

    /// The archive failed to encode or decode a value.
    #[error("archive error: {0}")]
    Archive(#[source] Box<dyn std::error::Error + Send + Sync>),
}
