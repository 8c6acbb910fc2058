//! Staged snapshot and restore of an [`EntityRegistry`](crate::EntityRegistry).
//!
//! A snapshot is a sequence of independent stages (`entities`, `destroyed`,
//! `component`, `tag`) chosen by the caller. Restoring replays the same
//! sequence against an empty registry, optionally followed by an orphan
//! sweep. The stream layout per stage:
//!
//! ```text
//! entities   header, count, entity*           (ascending index)
//! destroyed  header, count, tombstone*        (ascending index)
//! component  per type: header, count, (entity, value)*   (dense order)
//! tag        per type: header, flag, [entity, value]
//! ```

mod archive;
mod loader;
mod plan;
mod queue;
mod writer;

pub use archive::{SnapshotSink, SnapshotSource, StageHeader, StageKind};
pub use loader::SnapshotLoader;
pub use plan::{SnapshotPlan, StageDescriptor};
pub use queue::{ArchiveValue, QueueArchive};
pub use writer::SnapshotWriter;

#[cfg(test)]
mod tests {
    use engine_component::{Component, EcsError, Entity};
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::error::SnapshotError;
    use crate::registry::EntityRegistry;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct AComponent;

    impl Component for AComponent {
        fn type_name() -> &'static str {
            "AComponent"
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct AnotherComponent;

    impl Component for AnotherComponent {
        fn type_name() -> &'static str {
            "AnotherComponent"
        }
    }

    /// A component that refers to other entities.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Foo {
        bar: Entity,
        quux: Vec<Entity>,
    }

    impl Component for Foo {
        fn type_name() -> &'static str {
            "Foo"
        }
    }

    struct Scenario {
        registry: EntityRegistry,
        e: [Entity; 5],
        v1: Option<u32>,
    }

    /// e0: i32, char, f64; e1: destroyed; e2: i32; e3: char + f32 tag;
    /// e4: AComponent tag.
    fn scenario() -> Scenario {
        let mut registry = EntityRegistry::new();
        let e0 = registry.create();
        registry.assign(e0, 42i32).unwrap();
        registry.assign(e0, 'c').unwrap();
        registry.assign(e0, 0.1f64).unwrap();

        let e1 = registry.create();

        let e2 = registry.create();
        registry.assign(e2, 3i32).unwrap();

        let e3 = registry.create();
        registry.assign(e3, '0').unwrap();
        registry.attach(e3, 0.3f32).unwrap();

        let e4 = registry.create();
        registry.attach(e4, AComponent).unwrap();

        registry.destroy(e1).unwrap();
        let v1 = registry.current(e1);

        Scenario {
            registry,
            e: [e0, e1, e2, e3, e4],
            v1,
        }
    }

    #[test]
    fn test_full_dump_and_restore() {
        let Scenario { mut registry, e, v1 } = scenario();
        let [e0, e1, e2, e3, e4] = e;
        let mut archive = QueueArchive::new();

        registry
            .snapshot()
            .entities(&mut archive)
            .unwrap()
            .destroyed(&mut archive)
            .unwrap()
            .component::<(i32, char, AnotherComponent, f64)>(&mut archive)
            .unwrap()
            .tag::<(f32, bool, AComponent)>(&mut archive)
            .unwrap();

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.capacity(), 0);
        assert!(e.iter().all(|&entity| !registry.valid(entity)));

        registry
            .restore()
            .unwrap()
            .entities(&mut archive)
            .unwrap()
            .destroyed(&mut archive)
            .unwrap()
            .component::<(i32, char, AnotherComponent, f64)>(&mut archive)
            .unwrap()
            .tag::<(f32, bool, AComponent)>(&mut archive)
            .unwrap()
            .orphans();
        assert!(archive.is_empty());

        assert!(registry.valid(e0));
        assert!(!registry.valid(e1));
        assert!(registry.valid(e2));
        assert!(registry.valid(e3));
        assert!(registry.valid(e4));

        assert!(!registry.orphan(e0));
        assert!(!registry.orphan(e2));
        assert!(!registry.orphan(e3));
        assert!(!registry.orphan(e4));

        assert_eq!(*registry.get::<i32>(e0).unwrap(), 42);
        assert_eq!(*registry.get::<char>(e0).unwrap(), 'c');
        assert_eq!(*registry.get::<f64>(e0).unwrap(), 0.1);
        assert_eq!(registry.current(e1), v1);
        assert_eq!(*registry.get::<i32>(e2).unwrap(), 3);
        assert_eq!(*registry.get::<char>(e3).unwrap(), '0');

        assert!(registry.has_tag::<f32>());
        assert_eq!(registry.attachee::<f32>().unwrap(), e3);
        assert_eq!(*registry.tag::<f32>().unwrap(), 0.3);

        assert!(registry.has_tag::<AComponent>());
        assert_eq!(registry.attachee::<AComponent>().unwrap(), e4);

        assert!(registry.is_pool_empty::<AnotherComponent>());
        assert!(!registry.has_tag::<i64>());
    }

    #[test]
    fn test_fresh_identifiers_are_disjoint_after_restore() {
        let Scenario { mut registry, e, .. } = scenario();
        let mut archive = QueueArchive::new();
        let plan = SnapshotPlan::<QueueArchive>::new()
            .entities()
            .destroyed()
            .component::<(i32, char, f64)>()
            .tag::<(f32, AComponent)>();
        plan.write(&registry, &mut archive).unwrap();

        let mut restored = EntityRegistry::new();
        plan.load(&mut restored, &mut archive).unwrap();

        for entity in e {
            assert_eq!(registry.valid(entity), restored.valid(entity));
            assert_eq!(registry.current(entity), restored.current(entity));
        }
        assert_eq!(restored.capacity(), registry.capacity());
        assert_eq!(restored.size(), registry.size());

        // Both registries hand out the same next identifier, never an old one.
        let fresh = restored.create();
        assert_eq!(fresh, registry.create());
        assert_eq!(fresh, Entity::new(1, 1));
        assert!(e.iter().all(|&old| old != fresh));
        let appended = restored.create();
        assert_eq!(appended, Entity::new(5, 0));
    }

    #[test]
    fn test_partial_restore() {
        let Scenario { mut registry, e, v1 } = scenario();
        let [e0, e1, e2, e3, e4] = e;
        let mut archive = QueueArchive::new();

        registry
            .snapshot()
            .entities(&mut archive)
            .unwrap()
            .destroyed(&mut archive)
            .unwrap()
            .component::<(char, i32)>(&mut archive)
            .unwrap()
            .tag::<(bool, f32)>(&mut archive)
            .unwrap();

        registry.clear();
        registry
            .restore()
            .unwrap()
            .entities(&mut archive)
            .unwrap()
            .destroyed(&mut archive)
            .unwrap()
            .component::<(char, i32)>(&mut archive)
            .unwrap()
            .tag::<(bool, f32)>(&mut archive)
            .unwrap();

        assert!(registry.valid(e0));
        assert!(!registry.valid(e1));
        assert!(registry.valid(e2));
        assert!(registry.valid(e3));
        assert!(registry.valid(e4));

        assert_eq!(*registry.get::<i32>(e0).unwrap(), 42);
        assert_eq!(*registry.get::<char>(e0).unwrap(), 'c');
        assert!(!registry.has::<f64>(e0));
        assert_eq!(registry.current(e1), v1);
        assert_eq!(*registry.get::<i32>(e2).unwrap(), 3);
        assert_eq!(*registry.get::<char>(e3).unwrap(), '0');
        assert!(registry.orphan(e4));

        assert!(registry.has_tag::<f32>());
        assert_eq!(registry.attachee::<f32>().unwrap(), e3);
        assert_eq!(*registry.tag::<f32>().unwrap(), 0.3);
        assert!(!registry.has_tag::<AComponent>());
        assert!(!registry.has_tag::<i64>());

        // Reordered stages: tag first, then tombstones, then identifiers.
        registry
            .snapshot()
            .tag::<f32>(&mut archive)
            .unwrap()
            .destroyed(&mut archive)
            .unwrap()
            .entities(&mut archive)
            .unwrap();

        registry.clear();
        assert!(e.iter().all(|&entity| !registry.valid(entity)));

        registry
            .restore()
            .unwrap()
            .tag::<f32>(&mut archive)
            .unwrap()
            .destroyed(&mut archive)
            .unwrap()
            .entities(&mut archive)
            .unwrap()
            .orphans();

        assert!(!registry.valid(e0));
        assert!(!registry.valid(e1));
        assert!(!registry.valid(e2));
        assert!(registry.valid(e3));
        assert!(!registry.valid(e4));
        assert_eq!(registry.attachee::<f32>().unwrap(), e3);
    }

    #[test]
    fn test_placeholders_from_component_stage_only() {
        let Scenario { registry, e, .. } = scenario();
        let [e0, _, e2, e3, e4] = e;
        let mut archive = QueueArchive::new();
        registry.snapshot().component::<i32>(&mut archive).unwrap();

        let mut restored = EntityRegistry::new();
        restored.restore().unwrap().component::<i32>(&mut archive).unwrap();

        assert!(restored.valid(e0));
        assert!(restored.valid(e2));
        assert!(!restored.valid(e3));
        assert!(!restored.valid(e4));
        // Index 1 was never mentioned: it is free and reused first.
        assert_eq!(restored.capacity(), 3);
        assert_eq!(restored.create(), Entity::new(1, 0));
    }

    #[test]
    fn test_orphans_only_prunes_bare_entities() {
        let Scenario { registry, e, .. } = scenario();
        let [e0, _, e2, e3, e4] = e;
        let mut archive = QueueArchive::new();
        let plan = SnapshotPlan::<QueueArchive>::new()
            .entities()
            .component::<char>()
            .orphans();
        plan.write(&registry, &mut archive).unwrap();

        let mut restored = EntityRegistry::new();
        plan.load(&mut restored, &mut archive).unwrap();

        assert!(restored.valid(e0));
        assert!(restored.valid(e3));
        assert!(!restored.valid(e2));
        assert!(!restored.valid(e4));
        assert_eq!(*restored.get::<char>(e0).unwrap(), 'c');
        assert_eq!(*restored.get::<char>(e3).unwrap(), '0');
        assert!(!restored.has::<i32>(e0));
    }

    #[test]
    fn test_component_dense_order_is_preserved() {
        let mut registry = EntityRegistry::new();
        let e: Vec<Entity> = (0..4).map(|_| registry.create()).collect();
        for (i, &entity) in e.iter().enumerate() {
            registry.assign(entity, i as u16).unwrap();
        }
        registry.remove::<u16>(e[0]).unwrap();

        let mut archive = QueueArchive::new();
        registry.snapshot().component::<u16>(&mut archive).unwrap();
        let mut restored = EntityRegistry::new();
        restored.restore().unwrap().component::<u16>(&mut archive).unwrap();

        let before: Vec<Entity> = registry.pool::<u16>().unwrap().entities().to_vec();
        let after: Vec<Entity> = restored.pool::<u16>().unwrap().entities().to_vec();
        assert_eq!(before, vec![e[3], e[1], e[2]]);
        assert_eq!(before, after);
    }

    #[test]
    fn test_entity_references_inside_components_survive() {
        let mut registry = EntityRegistry::new();
        let a = registry.create();
        let b = registry.create();
        let c = registry.create();
        registry
            .assign(a, Foo { bar: b, quux: vec![b, c] })
            .unwrap();

        let mut archive = QueueArchive::new();
        let plan = SnapshotPlan::<QueueArchive>::new().entities().component::<Foo>();
        plan.write(&registry, &mut archive).unwrap();
        let mut restored = EntityRegistry::new();
        plan.load(&mut restored, &mut archive).unwrap();

        let foo = restored.get::<Foo>(a).unwrap();
        assert!(restored.valid(foo.bar));
        assert!(foo.quux.iter().all(|&entity| restored.valid(entity)));
    }

    #[test]
    fn test_stage_mismatch_is_detected() {
        let Scenario { registry, .. } = scenario();
        let mut archive = QueueArchive::new();
        registry
            .snapshot()
            .component::<(i32, char)>(&mut archive)
            .unwrap();

        let mut restored = EntityRegistry::new();
        let err = restored
            .restore()
            .unwrap()
            .component::<(char, i32)>(&mut archive)
            .unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::StageMismatch { expected, found }
                if expected == StageHeader::component::<char>()
                    && found == StageHeader::component::<i32>()
        ));
    }

    #[test]
    fn test_wrong_stage_kind_is_detected() {
        let Scenario { registry, .. } = scenario();
        let mut archive = QueueArchive::new();
        registry.snapshot().destroyed(&mut archive).unwrap();

        let mut restored = EntityRegistry::new();
        let err = restored
            .restore()
            .unwrap()
            .entities(&mut archive)
            .unwrap_err();
        assert!(matches!(err, SnapshotError::StageMismatch { .. }));
    }

    #[test]
    fn test_truncated_stream_is_exhausted() {
        let Scenario { registry, .. } = scenario();
        let mut archive = QueueArchive::new();
        registry.snapshot().entities(&mut archive).unwrap();
        let mut restored = EntityRegistry::new();
        let mut loader = restored.restore().unwrap();
        loader.entities(&mut archive).unwrap();
        assert!(matches!(
            loader.entities(&mut archive),
            Err(SnapshotError::Exhausted)
        ));
    }

    #[test]
    fn test_restore_into_non_empty_registry_is_rejected() {
        let Scenario { registry, .. } = scenario();
        let mut archive = QueueArchive::new();
        let plan = SnapshotPlan::<QueueArchive>::new().entities();
        plan.write(&registry, &mut archive).unwrap();

        let mut busy = EntityRegistry::new();
        busy.create();
        assert!(matches!(
            plan.load(&mut busy, &mut archive),
            Err(SnapshotError::Ecs(EcsError::IdentifierConflict { .. }))
        ));
    }

    #[test]
    fn test_conflicting_identifiers_in_stream_are_rejected() {
        let mut archive = QueueArchive::new();
        SnapshotSink::header(&mut archive, &StageHeader::entities()).unwrap();
        SnapshotSink::count(&mut archive, 2).unwrap();
        SnapshotSink::entity(&mut archive, Entity::new(0, 0)).unwrap();
        SnapshotSink::entity(&mut archive, Entity::new(0, 1)).unwrap();

        let mut registry = EntityRegistry::new();
        let err = registry
            .restore()
            .unwrap()
            .entities(&mut archive)
            .unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::Ecs(EcsError::IdentifierConflict { index: 0 })
        ));
        // The free list was rethreaded even though the stage failed.
        assert!(registry.valid(Entity::new(0, 0)));
        assert_eq!(registry.create(), Entity::new(1, 0));
    }

    #[test]
    fn test_tombstone_over_live_index_is_rejected() {
        let mut archive = QueueArchive::new();
        SnapshotSink::header(&mut archive, &StageHeader::entities()).unwrap();
        SnapshotSink::count(&mut archive, 1).unwrap();
        SnapshotSink::entity(&mut archive, Entity::new(2, 0)).unwrap();
        SnapshotSink::header(&mut archive, &StageHeader::destroyed()).unwrap();
        SnapshotSink::count(&mut archive, 1).unwrap();
        SnapshotSink::entity(&mut archive, Entity::new(2, 1)).unwrap();

        let mut registry = EntityRegistry::new();
        let mut loader = registry.restore().unwrap();
        loader.entities(&mut archive).unwrap();
        assert!(matches!(
            loader.destroyed(&mut archive),
            Err(SnapshotError::Ecs(EcsError::IdentifierConflict { index: 2 }))
        ));
    }

    #[test]
    fn test_out_of_range_index_is_refused_without_growing() {
        let mut archive = QueueArchive::new();
        SnapshotSink::header(&mut archive, &StageHeader::component::<i32>()).unwrap();
        SnapshotSink::count(&mut archive, 2).unwrap();
        SnapshotSink::entity(&mut archive, Entity::new(1, 0)).unwrap();
        SnapshotSink::component(&mut archive, &10i32).unwrap();
        SnapshotSink::entity(&mut archive, Entity::new(0xFFFF_FFFE, 0)).unwrap();
        SnapshotSink::component(&mut archive, &20i32).unwrap();

        let mut registry = EntityRegistry::new();
        let err = registry
            .restore()
            .unwrap()
            .with_capacity_limit(16)
            .component::<i32>(&mut archive)
            .unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::CapacityExceeded {
                index: 0xFFFF_FFFE,
                limit: 16
            }
        ));
        assert_eq!(registry.capacity(), 2);
        assert_eq!(*registry.get::<i32>(Entity::new(1, 0)).unwrap(), 10);
        assert_eq!(registry.create(), Entity::new(0, 0));
    }

    #[test]
    fn test_capacity_limit_applies_to_tombstones() {
        let mut archive = QueueArchive::new();
        SnapshotSink::header(&mut archive, &StageHeader::destroyed()).unwrap();
        SnapshotSink::count(&mut archive, 1).unwrap();
        SnapshotSink::entity(&mut archive, Entity::new(8, 3)).unwrap();

        let mut registry = EntityRegistry::new();
        let err = registry
            .restore()
            .unwrap()
            .with_capacity_limit(8)
            .destroyed(&mut archive)
            .unwrap_err();
        assert!(matches!(err, SnapshotError::CapacityExceeded { index: 8, limit: 8 }));
        assert_eq!(registry.capacity(), 0);
    }

    #[test]
    fn test_plan_describes_its_stages() {
        let plan = SnapshotPlan::<QueueArchive>::new()
            .entities()
            .component::<(i32, char)>()
            .tag::<f32>()
            .orphans();
        let labels: Vec<String> = plan.stages().iter().map(ToString::to_string).collect();
        assert_eq!(
            labels,
            vec!["Entities", "Component<i32, char>", "Tag<f32>", "orphans"]
        );
        assert_eq!(plan.stages()[1].kind(), Some(StageKind::Component));
        assert_eq!(plan.stages()[1].types(), &["i32", "char"]);
        assert_eq!(plan.stages()[3].kind(), None);
    }

    #[test]
    fn test_destroy_cascade_survives_round_trip() {
        let mut registry = EntityRegistry::new();
        let e = registry.create();
        let keep = registry.create();
        registry.assign(e, 1i32).unwrap();
        registry.attach(e, 'u').unwrap();
        registry.assign(keep, 2i32).unwrap();
        registry.destroy(e).unwrap();

        let mut archive = QueueArchive::new();
        let plan = SnapshotPlan::<QueueArchive>::new()
            .entities()
            .destroyed()
            .component::<i32>()
            .tag::<char>();
        plan.write(&registry, &mut archive).unwrap();
        let mut restored = EntityRegistry::new();
        plan.load(&mut restored, &mut archive).unwrap();

        assert!(!restored.valid(e));
        assert!(!restored.has_tag::<char>());
        assert_eq!(restored.pool::<i32>().unwrap().len(), 1);
        assert_eq!(*restored.get::<i32>(keep).unwrap(), 2);
    }
}
