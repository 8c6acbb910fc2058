//! Sample scene used to exercise a full dump and restore.

use std::fs;

use anyhow::{Context, Result, ensure};
use engine_archive::{BinaryArchive, JsonArchive};
use engine_component::{Component, Entity};
use engine_ecs::{EntityRegistry, SnapshotPlan, SnapshotSink, SnapshotSource};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{AppConfig, ArchiveFormat};

/// World-space position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

/// Linear velocity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

/// An entity following another one. Holds an identifier so restores must keep
/// references intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Follow {
    pub target: Entity,
}

impl Component for Follow {
    fn type_name() -> &'static str {
        "Follow"
    }
}

/// The active camera, attached to at most one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveCamera {
    pub zoom: f32,
}

impl Component for ActiveCamera {
    fn type_name() -> &'static str {
        "ActiveCamera"
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Bytes written to the snapshot file.
    pub bytes: usize,
    /// Live entities after restoring.
    pub alive: usize,
    /// Identifier slots after restoring.
    pub capacity: usize,
}

/// Populate a registry with a handful of entities, one destroyed, one tagged.
///
/// # Errors
///
/// Returns an error if any registry operation is rejected.
pub fn build_scene() -> Result<EntityRegistry> {
    let mut registry = EntityRegistry::new();
    let mut previous = None;
    for i in 0..6u8 {
        let entity = registry.create();
        let offset = f32::from(i);
        registry.assign(entity, Position { x: offset, y: -offset })?;
        if i % 2 == 0 {
            registry.assign(entity, Velocity { dx: 1.0, dy: 0.5 })?;
        }
        if let Some(target) = previous {
            registry.assign(entity, Follow { target })?;
        }
        previous = Some(entity);
    }
    let first = registry.entities().next();
    if let Some(first) = first {
        registry.destroy(first)?;
    }
    if let Some(last) = previous {
        registry.attach(last, ActiveCamera { zoom: 2.0 })?;
    }
    Ok(registry)
}

fn scene_plan<S: SnapshotSink, R: SnapshotSource>() -> SnapshotPlan<S, R> {
    SnapshotPlan::new()
        .entities()
        .destroyed()
        .component::<(Position, Velocity, Follow)>()
        .tag::<ActiveCamera>()
        .orphans()
}

fn encode(registry: &EntityRegistry, format: ArchiveFormat) -> Result<Vec<u8>> {
    match format {
        ArchiveFormat::Binary => {
            let plan = scene_plan::<BinaryArchive, BinaryArchive>();
            debug!(stages = ?plan.stages(), "Writing snapshot");
            let mut archive = BinaryArchive::new();
            plan.write(registry, &mut archive)?;
            Ok(archive.into_bytes())
        }
        ArchiveFormat::Json => {
            let plan = scene_plan::<JsonArchive, JsonArchive>();
            debug!(stages = ?plan.stages(), "Writing snapshot");
            let mut archive = JsonArchive::new();
            plan.write(registry, &mut archive)?;
            Ok(archive.to_text().into_bytes())
        }
    }
}

fn decode(bytes: Vec<u8>, format: ArchiveFormat) -> Result<EntityRegistry> {
    let mut registry = EntityRegistry::new();
    match format {
        ArchiveFormat::Binary => {
            let mut archive = BinaryArchive::from_bytes(bytes);
            scene_plan::<BinaryArchive, BinaryArchive>().load(&mut registry, &mut archive)?;
        }
        ArchiveFormat::Json => {
            let text = String::from_utf8(bytes).context("snapshot is not valid UTF-8")?;
            let mut archive = JsonArchive::from_text(&text);
            scene_plan::<JsonArchive, JsonArchive>().load(&mut registry, &mut archive)?;
        }
    }
    Ok(registry)
}

fn verify(source: &EntityRegistry, restored: &EntityRegistry) -> Result<()> {
    ensure!(source.size() == restored.size(), "live entity count differs");
    ensure!(
        source.capacity() == restored.capacity(),
        "identifier capacity differs"
    );
    for entity in source.entities() {
        ensure!(restored.valid(entity), "{entity} missing after restore");
        ensure!(
            source.get::<Position>(entity).ok() == restored.get::<Position>(entity).ok(),
            "{entity} position differs"
        );
        ensure!(
            source.get::<Velocity>(entity).ok() == restored.get::<Velocity>(entity).ok(),
            "{entity} velocity differs"
        );
        ensure!(
            source.get::<Follow>(entity).ok() == restored.get::<Follow>(entity).ok(),
            "{entity} follow target differs"
        );
    }
    for entity in source.destroyed() {
        ensure!(!restored.valid(entity), "{entity} came back to life");
    }
    ensure!(
        source.attachee::<ActiveCamera>().ok() == restored.attachee::<ActiveCamera>().ok(),
        "camera owner differs"
    );
    Ok(())
}

/// Write the sample scene to `config.path`, read it back into an empty
/// registry and check both agree.
///
/// # Errors
///
/// Returns an error if the file cannot be written or read, if the archive
/// fails to encode or decode, or if the restored registry differs.
pub fn run(config: &AppConfig) -> Result<RunReport> {
    let registry = build_scene()?;
    info!(
        alive = registry.size(),
        capacity = registry.capacity(),
        "Built sample scene"
    );

    let bytes = encode(&registry, config.format)?;
    fs::write(&config.path, &bytes)
        .with_context(|| format!("failed to write {}", config.path.display()))?;
    info!(path = %config.path.display(), bytes = bytes.len(), format = ?config.format, "Snapshot written");

    let read = fs::read(&config.path)
        .with_context(|| format!("failed to read {}", config.path.display()))?;
    let restored = decode(read, config.format)?;
    debug!(?restored, "Restored registry");

    verify(&registry, &restored)?;
    info!(alive = restored.size(), "Snapshot restored and verified");

    Ok(RunReport {
        bytes: bytes.len(),
        alive: restored.size(),
        capacity: restored.capacity(),
    })
}
