//! Per-frame context shared by every stage.
//!
//! The engine builds one [`FrameContext`] per frame after advancing time,
//! and passes it by shared reference to each stage in order. Stages cannot
//! change time or input, but any stage may ask the engine to stop after
//! the current frame.

use std::cell::Cell;

use crate::input::{Input, KeyCode};
use crate::time::Time;

/// Read-only snapshot of timing and input for one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameContext {
    pub time: Time,
    pub input: Input<KeyCode>,
    stop_requested: Cell<bool>,
}

impl FrameContext {
    pub fn new(time: Time, input: Input<KeyCode>) -> Self {
        Self {
            time,
            input,
            stop_requested: Cell::new(false),
        }
    }

    /// Shortcut for `self.time.delta_secs()`.
    pub fn delta_secs(&self) -> f32 {
        self.time.delta_secs()
    }

    /// Ask the owning loop to stop once this frame has finished.
    /// Later stages of the frame still run.
    pub fn request_stop(&self) {
        self.stop_requested.set(true);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.get()
    }
}
