//! The top-level owner of the registry and the frame loop.
//!
//! ```text
//! Engine::new(config)
//!   └─ register built-in components, reserve slots, add ScriptStage
//!
//! step()
//!   ├─ time.advance(fixed) / time.update()
//!   ├─ build FrameContext { time, input }
//!   ├─ pipeline.run_frame(&ctx, &mut registry)
//!   ├─ input.clear_just()
//!   └─ FrameReport { frame, delta, stats, timings }
//!
//! run()
//!   └─ step() until stop() / ctx.request_stop() / frame_limit
//! ```
//!
//! There is no window here. Whatever polls devices feeds
//! [`input_mut`](Engine::input_mut) between steps.

use std::time::Duration;

use serde::Serialize;

use crate::components::register_builtin_components;
use crate::config::{ConfigError, EngineConfig, MAX_INITIAL_SLOTS};
use crate::context::FrameContext;
use crate::diag::RegistryStats;
use crate::ecs::{Pipeline, Registry, Stage};
use crate::input::{Input, KeyCode};
use crate::script::ScriptStage;
use crate::time::Time;

#[cfg(feature = "diagnostics")]
use crate::ecs::StageTiming;

/// Summary of one [`Engine::step`].
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    /// 1-based frame number.
    pub frame: u64,
    pub delta_secs: f32,
    /// Registry statistics at the end of the frame. The per-frame counters
    /// cover this frame plus any changes made between steps.
    pub stats: RegistryStats,
    #[cfg(feature = "diagnostics")]
    pub timings: Vec<StageTiming>,
}

/// Owns the registry, the stage pipeline, time and input.
pub struct Engine {
    config: EngineConfig,
    fixed_delta: Option<Duration>,
    registry: Registry,
    pipeline: Pipeline,
    time: Time,
    input: Input<KeyCode>,
    running: bool,
}

impl Engine {
    /// Build an engine. Out-of-range config values are logged and replaced:
    /// an unusable `fixed_delta_ms` falls back to wall-clock timing and
    /// `initial_slots` is capped. Use [`try_new`](Self::try_new) to reject
    /// them instead.
    pub fn new(config: EngineConfig) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("{e}; using fallback values");
        }
        let fixed_delta = config.fixed_delta();

        let mut registry = Registry::new();
        register_builtin_components(&mut registry);
        registry.reserve(config.initial_slots.min(MAX_INITIAL_SLOTS) as usize);

        let mut pipeline = Pipeline::new();
        if config.script_stage {
            pipeline.add_default_stage::<ScriptStage>();
        }

        log::info!(
            "engine created ({} stage(s), {} reserved slots, {})",
            pipeline.len(),
            config.initial_slots,
            match fixed_delta {
                Some(_) => "fixed timestep",
                None => "wall clock",
            }
        );

        Self {
            config,
            fixed_delta,
            registry,
            pipeline,
            time: Time::new(),
            input: Input::new(),
            running: true,
        }
    }

    /// Build an engine, failing on an invalid config.
    pub fn try_new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    /// Shortcut for `pipeline_mut().add_stage(stage)`.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.pipeline.add_stage(stage);
        self
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn input(&self) -> &Input<KeyCode> {
        &self.input
    }

    /// Input state for the next frame. Press/release edges recorded here
    /// are visible to exactly one frame.
    pub fn input_mut(&mut self) -> &mut Input<KeyCode> {
        &mut self.input
    }

    /// Run one frame.
    pub fn step(&mut self) -> FrameReport {
        match self.fixed_delta {
            Some(delta) => self.time.advance(delta),
            None => self.time.update(),
        }

        let frame = FrameContext::new(self.time, self.input.clone());
        self.pipeline.run_frame(&frame, &mut self.registry);
        self.input.clear_just();

        if frame.stop_requested() {
            log::info!("stop requested during frame {}", self.time.frame_count());
            self.running = false;
        }

        FrameReport {
            frame: self.time.frame_count(),
            delta_secs: self.time.delta_secs(),
            stats: self.registry.take_frame_stats(),
            #[cfg(feature = "diagnostics")]
            timings: self.pipeline.timings().to_vec(),
        }
    }

    /// Step until stopped or until `frame_limit` frames have run in total.
    /// Returns the last frame's report, or `None` if no frame ran.
    pub fn run(&mut self) -> Option<FrameReport> {
        let mut last = None;
        while self.running && !self.frame_limit_reached() {
            last = Some(self.step());
        }
        log::info!(
            "engine stopped after {} frame(s), {} live entities",
            self.time.frame_count(),
            self.registry.live_count()
        );
        last
    }

    /// Stop after the current frame. `run` returns once it notices.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn frame_limit_reached(&self) -> bool {
        self.config
            .frame_limit
            .is_some_and(|limit| self.time.frame_count() >= limit)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Transform;
    use crate::script::Script;

    fn headless(limit: u64) -> Engine {
        Engine::new(EngineConfig {
            frame_limit: Some(limit),
            ..EngineConfig::headless()
        })
    }

    #[test]
    fn new_registers_builtins_and_script_stage() {
        let engine = Engine::new(EngineConfig::default());
        assert!(engine.registry().is_registered::<Transform>());
        assert!(engine.registry().is_registered::<Script>());
        assert_eq!(engine.pipeline().stage_names().collect::<Vec<_>>(), vec!["ScriptStage"]);
        assert!(engine.is_running());
    }

    #[test]
    fn script_stage_can_be_disabled() {
        let engine = Engine::new(EngineConfig {
            script_stage: false,
            ..EngineConfig::default()
        });
        assert!(engine.pipeline().is_empty());
    }

    #[test]
    fn run_honours_frame_limit() {
        let mut engine = headless(5);
        let report = engine.run().unwrap();
        assert_eq!(report.frame, 5);
        assert_eq!(engine.time().frame_count(), 5);
        assert!((engine.time().elapsed_secs() - 5.0 / 60.0).abs() < 1e-4);
        assert!(engine.run().is_none());
    }

    #[test]
    fn stage_can_request_stop() {
        let mut engine = headless(100);
        engine.add_stage(|frame: &FrameContext, _: &mut Registry| {
            if frame.time.frame_count() == 3 {
                frame.request_stop();
            }
        });
        engine.run();
        assert_eq!(engine.time().frame_count(), 3);
        assert!(!engine.is_running());
    }

    #[test]
    fn input_edges_last_one_frame() {
        let mut engine = headless(10);
        engine.add_stage(|frame: &FrameContext, registry: &mut Registry| {
            if frame.input.just_pressed(KeyCode::Space) {
                registry.spawn().set_tag("bullet");
            }
        });
        engine.input_mut().press(KeyCode::Space);
        engine.step();
        engine.step();
        assert_eq!(engine.registry().entities_with_tag("bullet").len(), 1);
        assert!(engine.input().pressed(KeyCode::Space));
    }

    #[test]
    fn unusable_fixed_delta_falls_back_to_wall_clock() {
        let config = EngineConfig {
            fixed_delta_ms: Some(1e300),
            initial_slots: u32::MAX,
            frame_limit: Some(1),
            ..EngineConfig::default()
        };
        assert!(matches!(
            Engine::try_new(config.clone()),
            Err(ConfigError::Invalid(_))
        ));

        let mut engine = Engine::new(config);
        let report = engine.step();
        assert_eq!(report.frame, 1);
        assert!(engine.time().delta() < Duration::from_secs(60));
    }

    #[test]
    fn report_carries_frame_stats() {
        let mut engine = headless(10);
        engine.add_stage(|_: &FrameContext, registry: &mut Registry| {
            registry.allocate();
        });
        let first = engine.step();
        let second = engine.step();
        assert_eq!(first.stats.allocated_this_frame, 1);
        assert_eq!(second.stats.allocated_this_frame, 1);
        assert_eq!(second.stats.live_slots, 2);

        let json = serde_json::to_value(&second).unwrap();
        assert_eq!(json["frame"], 2);
    }
}
