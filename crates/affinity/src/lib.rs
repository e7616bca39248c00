//! # Affinity: Entity Store and Frame Pipeline for 2D Games
//!
//! A small, single-threaded entity-component store with generational
//! handles, per-type component columns and free-form tags, driven by an
//! ordered list of stages once per frame. Rendering, physics and device
//! input are consumers that live outside this crate.
//!
//! Start with `use affinity::prelude::*` and build an
//! [`Engine`](engine::Engine), or drive a [`Registry`](ecs::Registry) and
//! [`Pipeline`](ecs::Pipeline) yourself.

pub mod components;
pub mod config;
pub mod context;
pub mod diag;
pub mod ecs;
pub mod engine;
pub mod input;
pub mod math;
pub mod prelude;
pub mod script;
pub mod time;
