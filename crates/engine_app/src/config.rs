//! Application configuration.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, bail};

/// Default snapshot file.
pub const DEFAULT_SNAPSHOT_PATH: &str = "snapshot.bin";

/// The environment variable used to override the snapshot path.
pub const SNAPSHOT_PATH_ENV: &str = "ENGINE_SNAPSHOT_PATH";

/// The environment variable used to choose the archive format.
pub const SNAPSHOT_FORMAT_ENV: &str = "ENGINE_SNAPSHOT_FORMAT";

/// Physical encoding of the snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveFormat {
    /// MessagePack.
    #[default]
    Binary,
    /// Line-delimited JSON.
    Json,
}

impl FromStr for ArchiveFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" | "msgpack" => Ok(Self::Binary),
            "json" => Ok(Self::Json),
            other => bail!("unknown snapshot format '{other}' (expected 'binary' or 'json')"),
        }
    }
}

/// Configuration for one dump-and-restore run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Where the snapshot is written and read back from.
    pub path: PathBuf,
    /// Encoding of the snapshot file.
    pub format: ArchiveFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_PATH)
    }
}

impl AppConfig {
    /// Create a config writing binary snapshots to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: ArchiveFormat::default(),
        }
    }

    /// Override the archive format.
    #[must_use]
    pub fn with_format(mut self, format: ArchiveFormat) -> Self {
        self.format = format;
        self
    }

    /// Build the config from [`SNAPSHOT_PATH_ENV`] and [`SNAPSHOT_FORMAT_ENV`],
    /// falling back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the format variable names an unknown format.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = lookup(SNAPSHOT_PATH_ENV).unwrap_or_else(|| DEFAULT_SNAPSHOT_PATH.to_string());
        let format = match lookup(SNAPSHOT_FORMAT_ENV) {
            Some(value) => value.parse()?,
            None => ArchiveFormat::default(),
        };
        Ok(Self::new(path).with_format(format))
    }
}
