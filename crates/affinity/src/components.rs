//! Engine-level components shared by every consumer.
//!
//! These are plain data. Rendering, physics and gameplay code read them
//! through the registry like any other component; nothing here draws or
//! simulates anything.

use serde::{Deserialize, Serialize};

use crate::ecs::Registry;
use crate::math::{Vec2, Vec4};
use crate::script::Script;

pub use crate::math::Transform;

/// A textured quad, drawn by an external renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sprite {
    /// Sub-rectangle of the atlas as `(min_u, min_v, max_u, max_v)`.
    pub uv: Vec4,
    /// RGBA tint.
    pub color: Vec4,
    /// Draw order; higher is drawn on top.
    pub depth: f32,
}

impl Sprite {
    pub fn new(uv: Vec4) -> Self {
        Self {
            uv,
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            uv: Vec4::new(0.0, 0.0, 1.0, 1.0),
            color: Vec4::ONE,
            depth: 0.0,
        }
    }
}

/// An orthographic camera. Its [`Transform`] positions the view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Visible extent in world units.
    pub ortho: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            ortho: Vec2::new(1280.0, 720.0),
        }
    }
}

/// Register [`Transform`], [`Sprite`], [`Camera`] and [`Script`].
pub fn register_builtin_components(registry: &mut Registry) {
    registry.register::<Transform>();
    registry.register::<Sprite>();
    registry.register::<Camera>();
    registry.register::<Script>();
}
