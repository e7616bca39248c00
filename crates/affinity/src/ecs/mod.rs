//! # Slot-Indexed Entity Store
//!
//! A deliberately simple Entity Component System for a single update thread.
//! Entities are rows ("slots") shared by one nullable column per component
//! type; stages run in a fixed order once per frame over the same store.
//!
//! ## Module Overview
//!
//! - [`entity`]: Generational entity handles and slot bookkeeping
//! - [`component`]: Per-type nullable columns (`Vec<Option<T>>`)
//! - [`registry`]: Central container (slots + columns + tags)
//! - [`query`]: Slot loops, tag scans and typed AND-filters
//! - [`stage`]: Stage trait and ordered pipeline runner

pub mod component;
pub mod entity;
pub mod query;
pub mod registry;
pub mod stage;

pub use component::Column;
#[doc(hidden)]
pub use component::ErasedColumn;
pub use entity::Entity;
pub use query::QueryParam;
pub use registry::{DEFAULT_TAG, EntityMut, Registry};
pub use stage::{Pipeline, Stage};

#[cfg(feature = "diagnostics")]
pub use stage::StageTiming;
