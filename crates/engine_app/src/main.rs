//! # engine_app
//!
//! Writes a sample registry snapshot to disk, restores it into an empty
//! registry and verifies the result.
//!
//! Configuration comes from the environment:
//!
//! - `ENGINE_SNAPSHOT_PATH` — snapshot file (default `snapshot.bin`).
//! - `ENGINE_SNAPSHOT_FORMAT` — `binary` or `json` (default `binary`).

mod config;
mod scene;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let config = AppConfig::from_env()?;
    info!(path = %config.path.display(), format = ?config.format, "Starting snapshot run");

    let report = scene::run(&config)?;
    info!(
        bytes = report.bytes,
        alive = report.alive,
        capacity = report.capacity,
        "Done"
    );
    Ok(())
}
