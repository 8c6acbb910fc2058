//! # engine_archive
//!
//! Physical encodings for registry snapshots.
//!
//! The snapshot core only fixes the logical order of values; this crate
//! decides how they look on disk or on the wire:
//!
//! - [`BinaryArchive`] — compact MessagePack via `rmp-serde`.
//! - [`JsonArchive`] — line-delimited JSON via `serde_json`.
//! - [`codec`] — MessagePack helpers shared by the binary archive.
//! - [`ArchiveError`] — encoding errors, convertible into
//!   [`engine_ecs::SnapshotError`].

pub mod binary;
pub mod codec;
pub mod error;
pub mod json;

pub use binary::BinaryArchive;
pub use error::ArchiveError;
pub use json::JsonArchive;
