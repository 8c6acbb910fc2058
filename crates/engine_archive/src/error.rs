//! Archive-layer error types.

use engine_ecs::SnapshotError;

/// Errors that can occur while encoding or decoding archive values.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Failed to encode a value to MessagePack.
    #[error("failed to encode value: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a value from MessagePack.
    #[error("failed to decode value: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// Failed to encode or decode a JSON line.
    #[error("JSON error at line {line}: {source}")]
    Json {
        /// One-based line number within the archive.
        line: usize,
        /// The underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// A component encodes to JSON that does not decode back into it,
    /// such as a NaN or infinite float written as `null`.
    #[error("{component} at line {line} does not survive JSON: {source}")]
    Unrepresentable {
        /// Type name of the component.
        component: &'static str,
        /// One-based line the value would have occupied.
        line: usize,
        /// The error raised when reading the encoded value back.
        #[source]
        source: serde_json::Error,
    },

    /// No values remain.
    #[error("archive exhausted")]
    Exhausted,
}

impl From<ArchiveError> for SnapshotError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Exhausted => SnapshotError::Exhausted,
            other => SnapshotError::Archive(Box::new(other)),
        }
    }
}
