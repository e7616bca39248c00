//! Convenience re-exports: `use affinity::prelude::*` for the common items.

pub use crate::components::{Camera, Sprite, register_builtin_components};
pub use crate::config::{ConfigError, EngineConfig};
pub use crate::context::FrameContext;
pub use crate::diag::{Diagnostic, DiagnosticSink, LogSink, NullSink, RecordingSink, RegistryStats};
pub use crate::ecs::{Column, DEFAULT_TAG, Entity, EntityMut, Pipeline, QueryParam, Registry, Stage};
pub use crate::engine::{Engine, FrameReport};
pub use crate::input::{Input, KeyCode};
pub use crate::math::{Transform, Vec2, Vec3, Vec4};
pub use crate::script::{Script, ScriptStage};
pub use crate::time::Time;
#[cfg(feature = "diagnostics")]
pub use crate::ecs::StageTiming;
