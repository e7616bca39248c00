//! End-to-end behaviour of the registry and the frame pipeline through the
//! public API only.

use std::cell::Cell;
use std::rc::Rc;

use affinity::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

struct Lifetime(u32);

#[test]
fn set_get_then_destroy() {
    let mut registry = Registry::new();
    registry.register::<Position>();

    let e1 = registry.allocate();
    registry.set(e1, Position { x: 1.0, y: 2.0 });
    assert_eq!(registry.get::<Position>(e1), Some(&Position { x: 1.0, y: 2.0 }));

    registry.destroy(e1);
    assert!(!registry.is_valid(e1));
    assert_eq!(registry.get::<Position>(e1), None);
}

#[test]
fn freed_slot_is_reused_with_current_generation() {
    let mut registry = Registry::new();
    let e1 = registry.allocate();
    let e2 = registry.allocate();
    let e3 = registry.allocate();
    assert_eq!((e1.index(), e2.index(), e3.index()), (0, 1, 2));

    registry.destroy(e2);
    let generation_after_destroy = registry.handle_at(1).generation();

    let e4 = registry.allocate();
    assert_eq!(e4.index(), 1);
    assert_eq!(e4.generation(), generation_after_destroy);
    assert!(!registry.is_valid(e2));
    assert!(registry.is_valid(e4));
    assert_eq!(registry.slot_count(), 3);
}

#[test]
fn entity_spawned_by_earlier_stage_is_visible_to_later_stage() {
    let count = Rc::new(Cell::new(0));
    let mut pipeline = Pipeline::new();
    pipeline.add_stage(|_: &FrameContext, registry: &mut Registry| {
        registry.spawn().set_tag("spawned");
    });
    let seen = Rc::clone(&count);
    pipeline.add_stage(move |_: &FrameContext, registry: &mut Registry| {
        seen.set(registry.entities_with_tag("spawned").len());
    });

    let mut registry = Registry::new();
    pipeline.run_frame(&FrameContext::default(), &mut registry);
    assert_eq!(count.get(), 1);
    pipeline.run_frame(&FrameContext::default(), &mut registry);
    assert_eq!(count.get(), 2);
}

#[test]
fn stale_handle_stays_invalid_across_many_cycles() {
    let mut registry = Registry::new();
    registry.register::<Position>();
    let first = registry.allocate();
    registry.destroy(first);

    for i in 0..50 {
        let e = registry.allocate();
        assert_eq!(e.index(), first.index());
        registry.set(e, Position { x: i as f32, y: 0.0 });
        assert!(!registry.is_valid(first));
        assert!(registry.get::<Position>(first).is_none());
        if i % 2 == 0 {
            registry.destroy(e);
        } else {
            registry.destroy(e);
            registry.allocate();
            registry.destroy(registry.handle_at(first.index()));
        }
    }
    assert!(!registry.is_valid(first));
}

#[test]
fn reused_slot_reads_empty_for_every_component() {
    let mut registry = Registry::new();
    registry.register::<Position>();
    registry.register::<Lifetime>();
    let e = registry.spawn().set(Position { x: 0.0, y: 0.0 }).set(Lifetime(3)).id();
    registry.destroy(e);

    let reused = registry.allocate();
    assert_eq!(reused.index(), e.index());
    assert!(!registry.has::<Position>(reused));
    assert!(!registry.has::<Lifetime>(reused));
    assert_eq!(registry.tag(reused), DEFAULT_TAG);
}

#[test]
fn destroy_twice_has_no_effect() {
    let mut registry = Registry::with_sink(Box::new(NullSink));
    let e = registry.allocate();
    let keep = registry.allocate();
    assert!(registry.destroy(e));
    let before = registry.stats();
    assert!(!registry.destroy(e));
    assert!(!registry.destroy(Entity::INVALID));
    assert_eq!(registry.stats(), before);
    assert!(registry.is_valid(keep));
}

#[test]
fn tag_scan_returns_exactly_matching_live_entities() {
    let mut registry = Registry::new();
    let mut expected = Vec::new();
    for i in 0..20 {
        let e = registry.allocate();
        if i % 3 == 0 {
            registry.set_tag(e, "enemy");
            expected.push(e);
        }
    }
    // Freed enemies drop out; the slot reused afterwards is untagged.
    let gone = expected.remove(1);
    registry.destroy(gone);
    registry.allocate();

    assert_eq!(registry.entities_with_tag("enemy"), expected);
    for e in registry.entities_with_tag("enemy") {
        assert!(registry.is_valid(e));
    }
}

#[test]
fn handle_at_out_of_range_is_invalid_sentinel() {
    let mut registry = Registry::new();
    registry.allocate();
    let h = registry.handle_at(10);
    assert_eq!(h, Entity::INVALID);
    assert!(!registry.is_valid(h));
    assert_eq!(registry.tag(h), "");
}

#[test]
fn unregistered_type_through_handle_is_reported_not_fatal() {
    struct Unregistered;

    let sink = RecordingSink::new();
    let mut registry = Registry::with_sink(Box::new(sink.clone()));
    let e = registry.allocate();
    registry.set(e, Unregistered);
    assert!(registry.get::<Unregistered>(e).is_none());

    let reports = sink.reports();
    assert_eq!(reports.len(), 2);
    assert!(matches!(
        reports[0],
        Diagnostic::UnregisteredComponent { operation: "set", .. }
    ));
}

#[test]
#[should_panic(expected = "Did you forget to call `register")]
fn unregistered_column_is_fatal() {
    struct Unregistered;
    let registry = Registry::new();
    let _ = registry.column::<Unregistered>();
}

#[test]
fn engine_runs_scripts_and_stages_until_limit() {
    let mut engine = Engine::new(EngineConfig {
        frame_limit: Some(10),
        ..EngineConfig::headless()
    });
    engine.registry_mut().register::<Lifetime>();

    let boat = engine
        .registry_mut()
        .spawn()
        .set(Transform::default())
        .set(Script::new(|frame, registry, me| {
            if let Some(t) = registry.get_mut::<Transform>(me) {
                t.position.x += frame.time.delta_frames();
            }
        }))
        .id();

    engine.add_stage(|frame: &FrameContext, registry: &mut Registry| {
        if frame.time.frame_count() == 1 {
            registry.spawn().set(Lifetime(3)).set_tag("puff");
        }
        registry.for_each_slot(|registry, index| {
            let e = registry.handle_at(index);
            let Some(life) = registry.get_mut::<Lifetime>(e) else {
                return;
            };
            life.0 -= 1;
            if life.0 == 0 {
                registry.destroy(e);
            }
        });
    });

    let report = engine.run().unwrap();
    assert_eq!(report.frame, 10);
    assert!(engine.registry().entities_with_tag("puff").is_empty());
    let x = engine.registry().get::<Transform>(boat).unwrap().position.x;
    assert!((x - 10.0).abs() < 1e-3);
}

#[test]
fn typed_query_through_public_api() {
    struct Velocity(f32, f32);

    let mut registry = Registry::new();
    registry.register::<Position>();
    registry.register::<Velocity>();
    let moving = registry
        .spawn()
        .set(Position { x: 0.0, y: 0.0 })
        .set(Velocity(1.0, 2.0))
        .id();
    let still = registry.spawn().set(Position { x: 5.0, y: 5.0 }).id();

    for _ in 0..3 {
        registry.query::<(&mut Position, &Velocity)>(|_, (p, v)| {
            p.x += v.0;
            p.y += v.1;
        });
    }

    assert_eq!(registry.get::<Position>(moving), Some(&Position { x: 3.0, y: 6.0 }));
    assert_eq!(registry.get::<Position>(still), Some(&Position { x: 5.0, y: 5.0 }));
    assert_eq!(registry.count::<&Position>(), 2);
    assert_eq!(registry.count::<(&Position, &Velocity)>(), 1);
}
