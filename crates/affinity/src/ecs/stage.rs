//! # Stage: Ordered Per-Frame Processing
//!
//! A stage is one unit of per-frame work: it gets the frame's
//! [`FrameContext`] and full mutable access to the [`Registry`]. That's it.
//!
//! ## Design Philosophy
//!
//! - A stage is anything implementing [`Stage`]; any
//!   `FnMut(&FrameContext, &mut Registry)` closure or function qualifies.
//! - Stages run in the order they're added. No de-duplication, no removal.
//! - There is no frame-local snapshot: an entity created by one stage is
//!   visible to every later stage in the same frame, and an entity destroyed
//!   by one stage reads as invalid to every later stage.
//! - Stages may keep private state between frames (they're `&mut self`).
//!
//! ## Failure
//!
//! Stages don't return errors. Missing data is represented by `None` and
//! simply skipped. The only fatal condition, reaching an unregistered
//! component type's column, panics and unwinds out of
//! [`Pipeline::run_frame`] without being caught per stage.

use super::registry::Registry;
use crate::context::FrameContext;

/// One ordered unit of per-frame processing.
///
/// Any `FnMut(&FrameContext, &mut Registry)` implements this trait, so you
/// can use closures or function pointers directly.
pub trait Stage {
    fn process(&mut self, frame: &FrameContext, registry: &mut Registry);
}

/// Blanket impl: any `FnMut(&FrameContext, &mut Registry)` is a `Stage`.
impl<F: FnMut(&FrameContext, &mut Registry)> Stage for F {
    fn process(&mut self, frame: &FrameContext, registry: &mut Registry) {
        (self)(frame, registry);
    }
}

/// A boxed [`Stage`] with a short name for logging and diagnostics.
struct NamedStage {
    name: String,
    stage: Box<dyn Stage>,
}

/// Per-stage timing recorded during a single frame.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StageTiming {
    pub name: String,
    pub duration_us: f64,
}

/// An ordered list of stages to run once per frame.
pub struct Pipeline {
    stages: Vec<NamedStage>,
    /// Per-stage timings from the most recent `run_frame()` call.
    #[cfg(feature = "diagnostics")]
    timings: Vec<StageTiming>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            #[cfg(feature = "diagnostics")]
            timings: Vec::new(),
        }
    }

    /// Append a stage. Execution order is registration order.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        let name = short_stage_name(std::any::type_name::<S>());
        log::debug!("added stage #{} `{name}`", self.stages.len());
        self.stages.push(NamedStage {
            name,
            stage: Box::new(stage),
        });
        self
    }

    /// Append a default-constructed `S`.
    pub fn add_default_stage<S: Stage + Default + 'static>(&mut self) -> &mut Self {
        self.add_stage(S::default())
    }

    /// Run every stage once, in order, against the same registry.
    pub fn run_frame(&mut self, frame: &FrameContext, registry: &mut Registry) {
        #[cfg(feature = "diagnostics")]
        {
            self.timings.clear();
            for ns in &mut self.stages {
                log::trace!("stage `{}`", ns.name);
                let start = std::time::Instant::now();
                ns.stage.process(frame, registry);
                let elapsed = start.elapsed();
                self.timings.push(StageTiming {
                    name: ns.name.clone(),
                    duration_us: elapsed.as_secs_f64() * 1_000_000.0,
                });
            }
        }
        #[cfg(not(feature = "diagnostics"))]
        {
            for ns in &mut self.stages {
                log::trace!("stage `{}`", ns.name);
                ns.stage.process(frame, registry);
            }
        }
    }

    /// Returns the number of stages in this pipeline.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Short stage names in execution order.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|ns| ns.name.as_str())
    }

    /// Timings from the most recent frame, in execution order.
    #[cfg(feature = "diagnostics")]
    pub fn timings(&self) -> &[StageTiming] {
        &self.timings
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip the module path (and generic arguments) from a fully-qualified type
/// name (e.g. `game::movement_stage` → `movement_stage`,
/// `{{closure}}` → `<closure>`).
fn short_stage_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    let name = base.rsplit("::").next().unwrap_or(base);
    if name.contains("closure") {
        "<closure>".to_string()
    } else {
        name.to_string()
    }
}
