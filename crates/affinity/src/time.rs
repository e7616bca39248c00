//! Frame timing and delta time.
//!
//! [`Time`] is advanced by the [`Engine`](crate::engine::Engine) once per
//! frame, before any stage runs, and handed to stages through the
//! [`FrameContext`](crate::context::FrameContext). Stages read the frame
//! delta either in seconds or in *reference frames*: multiples of a 60 Hz
//! frame, so movement written as "pixels per frame" stays frame-rate
//! independent.

use std::time::{Duration, Instant};

/// Rate that [`Time::delta_frames`] is expressed against.
pub const REFERENCE_HZ: f32 = 60.0;

const UPS_WINDOW: Duration = Duration::from_secs(1);

/// Frame timing state.
#[derive(Debug, Clone, Copy)]
pub struct Time {
    /// When the current frame started (wall-clock mode only).
    frame_start: Instant,
    /// Duration of the previous frame.
    delta: Duration,
    /// Sum of all deltas so far.
    elapsed: Duration,
    frame_count: u64,
    /// Frames counted in the current one-second window.
    window_frames: u32,
    window_elapsed: Duration,
    /// Frames completed in the last full window.
    updates_per_second: u32,
}

impl Time {
    pub fn new() -> Self {
        Self {
            frame_start: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            window_frames: 0,
            window_elapsed: Duration::ZERO,
            updates_per_second: 0,
        }
    }

    /// Start a new frame, measuring the delta from the monotonic clock.
    pub fn update(&mut self) {
        let now = Instant::now();
        let delta = now - self.frame_start;
        self.frame_start = now;
        self.advance(delta);
    }

    /// Start a new frame with a fixed delta. Used for headless and
    /// deterministic runs.
    pub fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed = self.elapsed.saturating_add(delta);
        self.frame_count += 1;

        self.window_frames += 1;
        self.window_elapsed = self.window_elapsed.saturating_add(delta);
        if self.window_elapsed >= UPS_WINDOW {
            self.updates_per_second = self.window_frames;
            self.window_frames = 0;
            self.window_elapsed -= UPS_WINDOW;
        }
    }

    /// Duration of the previous frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Delta time in seconds (f32), the most common way to use it.
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Delta in units of one [`REFERENCE_HZ`] frame. `1.0` at exactly 60 FPS.
    pub fn delta_frames(&self) -> f32 {
        self.delta_secs() * REFERENCE_HZ
    }

    /// Total elapsed time since the first frame.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Number of frames started so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Estimated FPS based on the last frame's delta.
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }

    /// Frames completed during the last full one-second window. Zero until
    /// the first second has elapsed.
    pub fn updates_per_second(&self) -> u32 {
        self.updates_per_second
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
