//! Per-entity behaviour closures.
//!
//! A [`Script`] is a component holding a closure. The [`ScriptStage`] calls
//! every entity's script once per frame with that entity's handle:
//!
//! ```
//! use affinity::prelude::*;
//!
//! let mut registry = Registry::new();
//! register_builtin_components(&mut registry);
//! let e = registry.spawn().set(Transform::default()).id();
//! registry.set(e, Script::new(|_frame, registry, me| {
//!     if let Some(t) = registry.get_mut::<Transform>(me) {
//!         t.position.x += 1.0;
//!     }
//! }));
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.add_default_stage::<ScriptStage>();
//! pipeline.run_frame(&FrameContext::default(), &mut registry);
//! assert_eq!(registry.get::<Transform>(e).unwrap().position.x, 1.0);
//! ```
//!
//! A script gets the registry mutably and may do anything: spawn, destroy
//! (itself included), or replace or remove its own `Script`. Those changes
//! take effect immediately; the stage runs a shared handle to the closure, so
//! the closure outlives its slot until the call returns. A script that calls
//! itself again while running is skipped with a warning.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::context::FrameContext;
use crate::ecs::{Entity, Registry, Stage};

type ScriptFn = dyn FnMut(&FrameContext, &mut Registry, Entity);

/// A behaviour closure attached to an entity.
///
/// Clones share the same closure.
#[derive(Clone)]
pub struct Script(Rc<RefCell<Box<ScriptFn>>>);

impl Script {
    pub fn new(f: impl FnMut(&FrameContext, &mut Registry, Entity) + 'static) -> Self {
        Self(Rc::new(RefCell::new(Box::new(f))))
    }

    /// Invoke the closure directly. Returns `false` without calling it if the
    /// closure is already running further up the stack.
    pub fn call(&self, frame: &FrameContext, registry: &mut Registry, entity: Entity) -> bool {
        let Ok(mut guard) = self.0.try_borrow_mut() else {
            log::warn!("script for {entity:?} is already running; skipped re-entrant call");
            return false;
        };
        let f: &mut ScriptFn = &mut **guard;
        f(frame, registry, entity);
        true
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Script(..)")
    }
}

/// Runs every live entity's [`Script`], in ascending slot order.
///
/// Entities spawned by a script during the pass are visited in the same
/// pass.
///
/// # Panics
///
/// Panics if [`Script`] is not registered.
#[derive(Debug, Default)]
pub struct ScriptStage;

impl Stage for ScriptStage {
    fn process(&mut self, frame: &FrameContext, registry: &mut Registry) {
        registry.for_each_slot(|registry, index| {
            if !registry.is_live(index) {
                return;
            }
            let Some(script) = registry.column::<Script>().get(index).cloned() else {
                return;
            };
            let entity = registry.handle_at(index);
            script.call(frame, registry, entity);
        });
    }
}
