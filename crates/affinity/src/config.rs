//! Engine configuration, loadable from JSON.
//!
//! Every field has a default, so `{}` is a valid config:
//!
//! ```json
//! {
//!     "fixed_delta_ms": 16.0,
//!     "frame_limit": 600,
//!     "initial_slots": 1024,
//!     "script_stage": true
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Largest accepted `fixed_delta_ms`: one second per frame.
pub const MAX_FIXED_DELTA_MS: f64 = 1_000.0;

/// Largest accepted `initial_slots`.
pub const MAX_INITIAL_SLOTS: u32 = 1 << 24;

/// Settings read by [`Engine::new`](crate::engine::Engine::new).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Advance time by this many milliseconds per frame instead of reading
    /// the wall clock. Makes runs deterministic.
    pub fixed_delta_ms: Option<f64>,
    /// Stop [`Engine::run`](crate::engine::Engine::run) after this many
    /// frames.
    pub frame_limit: Option<u64>,
    /// Slot capacity reserved up front. Does not create entities.
    pub initial_slots: u32,
    /// Append a [`ScriptStage`](crate::script::ScriptStage) as the first
    /// stage.
    pub script_stage: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_delta_ms: None,
            frame_limit: None,
            initial_slots: 0,
            script_stage: true,
        }
    }
}

impl EngineConfig {
    /// A config that steps at a fixed 60 Hz.
    pub fn headless() -> Self {
        Self {
            fixed_delta_ms: Some(1000.0 / 60.0),
            ..Self::default()
        }
    }

    /// Parse and [`validate`](Self::validate) a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ms) = self.fixed_delta_ms {
            if !(ms.is_finite() && (0.0..=MAX_FIXED_DELTA_MS).contains(&ms)) {
                return Err(ConfigError::Invalid(format!(
                    "fixed_delta_ms must be within 0..={MAX_FIXED_DELTA_MS}, got {ms}"
                )));
            }
        }
        if self.initial_slots > MAX_INITIAL_SLOTS {
            return Err(ConfigError::Invalid(format!(
                "initial_slots must be at most {MAX_INITIAL_SLOTS}, got {}",
                self.initial_slots
            )));
        }
        Ok(())
    }

    /// The fixed frame step, or `None` for wall-clock timing (also when
    /// `fixed_delta_ms` is out of range).
    pub fn fixed_delta(&self) -> Option<Duration> {
        let ms = self.fixed_delta_ms?;
        if ms.is_finite() && (0.0..=MAX_FIXED_DELTA_MS).contains(&ms) {
            Some(Duration::from_secs_f64(ms / 1000.0))
        } else {
            None
        }
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::info!("loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Errors from loading an [`EngineConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The contents are not a valid config.
    Parse(serde_json::Error),
    /// The config parsed but holds an unusable value.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config read failed: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse failed: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}
