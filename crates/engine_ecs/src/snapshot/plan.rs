//! An explicit, reusable list of snapshot stages.
//!
//! The fluent writer and loader APIs require the caller to repeat the same
//! stage sequence twice. A [`SnapshotPlan`] records that sequence once and
//! drives both sides from it.
//!
//! ```rust
//! use engine_ecs::{EntityRegistry, QueueArchive, SnapshotPlan};
//!
//! let mut source = EntityRegistry::new();
//! let e = source.create();
//! source.assign(e, 42i32).unwrap();
//!
//! let plan = SnapshotPlan::<QueueArchive>::new()
//!     .entities()
//!     .destroyed()
//!     .component::<(i32, char)>()
//!     .orphans();
//!
//! let mut archive = QueueArchive::new();
//! plan.write(&source, &mut archive).unwrap();
//!
//! let mut restored = EntityRegistry::new();
//! plan.load(&mut restored, &mut archive).unwrap();
//! assert_eq!(*restored.get::<i32>(e).unwrap(), 42);
//! ```

use engine_component::{Component, ComponentSet, TypeVisitor};
use tracing::debug;

use super::archive::{SnapshotSink, SnapshotSource, StageKind};
use super::loader::SnapshotLoader;
use super::writer::SnapshotWriter;
use crate::error::SnapshotError;
use crate::registry::EntityRegistry;

type WriteFn<S> = fn(&SnapshotWriter<'_>, &mut S) -> Result<(), SnapshotError>;
type LoadFn<R> = fn(&mut SnapshotLoader<'_>, &mut R) -> Result<(), SnapshotError>;

/// One step of a [`SnapshotPlan`].
pub struct StageDescriptor<S, R> {
    kind: Option<StageKind>,
    types: Vec<&'static str>,
    write: Option<WriteFn<S>>,
    load: LoadFn<R>,
}

impl<S, R> StageDescriptor<S, R> {
    /// The data category, or `None` for the loader-only orphan sweep.
    #[must_use]
    pub fn kind(&self) -> Option<StageKind> {
        self.kind
    }

    /// Component type names covered by this step, in order.
    #[must_use]
    pub fn types(&self) -> &[&'static str] {
        &self.types
    }
}

impl<S, R> std::fmt::Display for StageDescriptor<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            None => f.write_str("orphans"),
            Some(kind) if self.types.is_empty() => write!(f, "{kind:?}"),
            Some(kind) => write!(f, "{kind:?}<{}>", self.types.join(", ")),
        }
    }
}

impl<S, R> std::fmt::Debug for StageDescriptor<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

/// An ordered stage list shared by the writer (sink `S`) and the loader
/// (source `R`).
pub struct SnapshotPlan<S, R = S> {
    stages: Vec<StageDescriptor<S, R>>,
}

impl<S, R> std::fmt::Debug for SnapshotPlan<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.stages).finish()
    }
}

impl<S: SnapshotSink, R: SnapshotSource> Default for SnapshotPlan<S, R> {
    fn default() -> Self {
        Self::new()
    }
}

struct TypeNames(Vec<&'static str>);

impl TypeVisitor for TypeNames {
    type Error = std::convert::Infallible;

    fn visit<T: Component>(&mut self) -> Result<(), Self::Error> {
        self.0.push(T::type_name());
        Ok(())
    }
}

fn type_names<C: ComponentSet>() -> Vec<&'static str> {
    let mut names = TypeNames(Vec::new());
    match C::visit_types(&mut names) {
        Ok(()) => names.0,
        Err(never) => match never {},
    }
}

fn write_entities<S: SnapshotSink>(writer: &SnapshotWriter<'_>, sink: &mut S) -> Result<(), SnapshotError> {
    writer.entities(sink).map(|_| ())
}

fn write_destroyed<S: SnapshotSink>(writer: &SnapshotWriter<'_>, sink: &mut S) -> Result<(), SnapshotError> {
    writer.destroyed(sink).map(|_| ())
}

fn write_components<C: ComponentSet, S: SnapshotSink>(
    writer: &SnapshotWriter<'_>,
    sink: &mut S,
) -> Result<(), SnapshotError> {
    writer.component::<C>(sink).map(|_| ())
}

fn write_tags<C: ComponentSet, S: SnapshotSink>(
    writer: &SnapshotWriter<'_>,
    sink: &mut S,
) -> Result<(), SnapshotError> {
    writer.tag::<C>(sink).map(|_| ())
}

fn load_entities<R: SnapshotSource>(loader: &mut SnapshotLoader<'_>, source: &mut R) -> Result<(), SnapshotError> {
    loader.entities(source).map(|_| ())
}

fn load_destroyed<R: SnapshotSource>(loader: &mut SnapshotLoader<'_>, source: &mut R) -> Result<(), SnapshotError> {
    loader.destroyed(source).map(|_| ())
}

fn load_components<C: ComponentSet, R: SnapshotSource>(
    loader: &mut SnapshotLoader<'_>,
    source: &mut R,
) -> Result<(), SnapshotError> {
    loader.component::<C>(source).map(|_| ())
}

fn load_tags<C: ComponentSet, R: SnapshotSource>(
    loader: &mut SnapshotLoader<'_>,
    source: &mut R,
) -> Result<(), SnapshotError> {
    loader.tag::<C>(source).map(|_| ())
}

fn load_orphans<R>(loader: &mut SnapshotLoader<'_>, _source: &mut R) -> Result<(), SnapshotError> {
    loader.orphans();
    Ok(())
}

impl<S: SnapshotSink, R: SnapshotSource> SnapshotPlan<S, R> {
    /// Create an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    fn push(mut self, stage: StageDescriptor<S, R>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append the entities stage.
    #[must_use]
    pub fn entities(self) -> Self {
        self.push(StageDescriptor {
            kind: Some(StageKind::Entities),
            types: Vec::new(),
            write: Some(write_entities::<S>),
            load: load_entities::<R>,
        })
    }

    /// Append the destroyed stage.
    #[must_use]
    pub fn destroyed(self) -> Self {
        self.push(StageDescriptor {
            kind: Some(StageKind::Destroyed),
            types: Vec::new(),
            write: Some(write_destroyed::<S>),
            load: load_destroyed::<R>,
        })
    }

    /// Append a component stage over the types of `C`.
    #[must_use]
    pub fn component<C: ComponentSet>(self) -> Self {
        self.push(StageDescriptor {
            kind: Some(StageKind::Component),
            types: type_names::<C>(),
            write: Some(write_components::<C, S>),
            load: load_components::<C, R>,
        })
    }

    /// Append a tag stage over the types of `C`.
    #[must_use]
    pub fn tag<C: ComponentSet>(self) -> Self {
        self.push(StageDescriptor {
            kind: Some(StageKind::Tag),
            types: type_names::<C>(),
            write: Some(write_tags::<C, S>),
            load: load_tags::<C, R>,
        })
    }

    /// Append the orphan sweep. Ignored when writing.
    #[must_use]
    pub fn orphans(self) -> Self {
        self.push(StageDescriptor {
            kind: None,
            types: Vec::new(),
            write: None,
            load: load_orphans::<R>,
        })
    }

    /// The stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[StageDescriptor<S, R>] {
        &self.stages
    }

    /// Run every writing stage against `registry`.
    ///
    /// # Errors
    ///
    /// Stops at the first sink failure.
    pub fn write(&self, registry: &EntityRegistry, sink: &mut S) -> Result<(), SnapshotError> {
        let writer = registry.snapshot();
        for stage in &self.stages {
            if let Some(write) = stage.write {
                debug!(%stage, "writing snapshot stage");
                write(&writer, sink)?;
            }
        }
        debug!(stages = self.stages.len(), "snapshot written");
        Ok(())
    }

    /// Restore every stage into the empty `registry`.
    ///
    /// # Errors
    ///
    /// [`engine_component::EcsError::IdentifierConflict`] if `registry` is not
    /// empty, otherwise the first stage failure. Stages completed before a
    /// failure stay applied.
    pub fn load(&self, registry: &mut EntityRegistry, source: &mut R) -> Result<(), SnapshotError> {
        let mut loader = registry.restore()?;
        for stage in &self.stages {
            debug!(%stage, "restoring snapshot stage");
            (stage.load)(&mut loader, source)?;
        }
        debug!(stages = self.stages.len(), "snapshot restored");
        Ok(())
    }
}
