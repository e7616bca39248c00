//! Headless: boats patrol, fire cannonballs, and the cannonballs expire.
//!
//! Runs 180 fixed-step frames with no window and prints the last frame
//! report as JSON. Pass a config path to override the defaults:
//!
//! ```text
//! RUST_LOG=debug cargo run --example headless -- engine.json
//! ```

use affinity::diag::init_logger;
use affinity::prelude::*;

/// Seconds until a cannonball is removed.
struct Lifetime(f32);

/// Velocity in world units per second.
struct Velocity(Vec2);

fn main() {
    init_logger();

    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        },
        None => EngineConfig {
            frame_limit: Some(180),
            initial_slots: 64,
            ..EngineConfig::headless()
        },
    };

    let mut engine = Engine::new(config);
    setup(engine.registry_mut());
    engine
        .add_stage(fire_cannons)
        .add_stage(move_projectiles)
        .add_stage(expire_projectiles);

    match engine.run() {
        Some(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("could not serialize report: {e}"),
        },
        None => log::warn!("no frames ran"),
    }
}

fn setup(registry: &mut Registry) {
    registry.register::<Lifetime>();
    registry.register::<Velocity>();

    registry
        .spawn()
        .set(Transform::default())
        .set(Camera::default())
        .set_tag("camera");

    for i in 0..3 {
        let y = i as f32 * 120.0;
        registry
            .spawn()
            .set(Transform::from_xy(0.0, y))
            .set(Sprite::default().with_depth(1.0))
            .set(Script::new(patrol))
            .set_tag("boat");
    }
}

/// Turn slowly while sailing forward.
fn patrol(frame: &FrameContext, registry: &mut Registry, me: Entity) {
    if let Some(t) = registry.get_mut::<Transform>(me) {
        t.rotation += 0.01 * frame.time.delta_frames();
        t.advance(2.0 * frame.time.delta_frames());
    }
}

/// Every boat fires once per second.
fn fire_cannons(frame: &FrameContext, registry: &mut Registry) {
    if frame.time.frame_count() % 60 != 0 {
        return;
    }
    for boat in registry.entities_with_tag("boat") {
        let Some(&origin) = registry.get::<Transform>(boat) else {
            continue;
        };
        registry
            .spawn()
            .set(Transform::from_xy(origin.position.x, origin.position.y))
            .set(Velocity(origin.forward().perp() * 300.0))
            .set(Lifetime(1.5))
            .set_tag("cannonball");
    }
}

fn move_projectiles(frame: &FrameContext, registry: &mut Registry) {
    let dt = frame.delta_secs();
    registry.query::<(&mut Transform, &Velocity)>(|_, (t, v)| {
        t.position += v.0 * dt;
    });
}

fn expire_projectiles(frame: &FrameContext, registry: &mut Registry) {
    let dt = frame.delta_secs();
    registry.for_each_slot(|registry, index| {
        if !registry.is_live(index) {
            return;
        }
        let e = registry.handle_at(index);
        let Some(life) = registry.get_mut::<Lifetime>(e) else {
            return;
        };
        life.0 -= dt;
        if life.0 <= 0.0 {
            registry.destroy(e);
        }
    });
}
