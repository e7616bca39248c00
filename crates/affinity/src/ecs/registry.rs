//! # Registry: The Central Entity Store
//!
//! The [`Registry`] owns every component value and all slot bookkeeping.
//! Everything outside it addresses entities through [`Entity`] handles.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Registry                                                 │
//! │                                                          │
//! │  EntityAllocator: generations, live flags, free list     │
//! │                                                          │
//! │  columns: HashMap<TypeId, Box<dyn ErasedColumn>>         │
//! │    one Column<T> per registered type, len == slot count  │
//! │                                                          │
//! │  tags: Vec<String>   one per slot, default "entity"      │
//! │                                                          │
//! │  sink: Box<dyn DiagnosticSink>   soft-error reporting    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Kinds of Failure
//!
//! Reaching a component type that was never registered through the
//! column accessors ([`column`](Registry::column),
//! [`column_mut`](Registry::column_mut), queries) panics: it is a wiring bug
//! that fails the same way on every run. The per-entity accessors
//! ([`get`](Registry::get), [`set`](Registry::set), ...) treat the same
//! condition as soft, report a [`Diagnostic`] and return nothing.
//! Invalid handles are always soft.
//!
//! ## References and Structural Mutation
//!
//! A reference obtained from `get`, `get_mut` or `column` borrows the
//! registry. Allocation, destruction, registration and `set` all take
//! `&mut self`, so the compiler rejects any attempt to keep such a reference
//! across them; re-fetch after mutating instead:
//!
//! ```compile_fail
//! use affinity::ecs::Registry;
//!
//! let mut registry = Registry::new();
//! registry.register::<u32>();
//! let e = registry.allocate();
//! registry.set(e, 1u32);
//! let value = registry.get::<u32>(e).unwrap();
//! registry.allocate(); // may grow every column
//! println!("{value}");
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::ops::Range;

use super::component::{Column, ErasedColumn};
use super::entity::{Entity, EntityAllocator};
use crate::diag::{Diagnostic, DiagnosticSink, LogSink, RegistryStats};

/// Tag given to every slot on allocation and on destruction.
pub const DEFAULT_TAG: &str = "entity";

/// Owns all entities, their components and their tags.
pub struct Registry {
    allocator: EntityAllocator,
    columns: HashMap<TypeId, Box<dyn ErasedColumn>>,
    tags: Vec<String>,
    sink: Box<dyn DiagnosticSink>,
    allocated_this_frame: u32,
    destroyed_this_frame: u32,
}

impl Registry {
    /// An empty registry that reports soft diagnostics to the `log` facade.
    pub fn new() -> Self {
        Self::with_sink(Box::new(LogSink))
    }

    /// An empty registry that reports soft diagnostics to `sink`.
    pub fn with_sink(sink: Box<dyn DiagnosticSink>) -> Self {
        Self {
            allocator: EntityAllocator::new(),
            columns: HashMap::new(),
            tags: Vec::new(),
            sink,
            allocated_this_frame: 0,
            destroyed_this_frame: 0,
        }
    }

    /// Replace the diagnostic sink.
    pub fn set_sink(&mut self, sink: Box<dyn DiagnosticSink>) {
        self.sink = sink;
    }

    /// Reserve room for `additional` more slots in every column.
    pub fn reserve(&mut self, additional: usize) {
        self.allocator.reserve(additional);
        self.tags.reserve(additional);
        for column in self.columns.values_mut() {
            column.reserve(additional);
        }
    }

    // ── Component Types ──────────────────────────────────────────────

    /// Register component type `T`. Does nothing if already registered.
    ///
    /// The new column has one empty entry per existing slot.
    pub fn register<T: 'static>(&mut self) {
        let type_id = TypeId::of::<T>();
        if self.columns.contains_key(&type_id) {
            return;
        }
        let len = self.allocator.slot_count() as usize;
        self.columns
            .insert(type_id, Box::new(Column::<T>::with_len(len)));
        log::debug!("registered component `{}`", std::any::type_name::<T>());
    }

    pub fn is_registered<T: 'static>(&self) -> bool {
        self.columns.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered component types.
    pub fn component_type_count(&self) -> usize {
        self.columns.len()
    }

    /// The column storing every `T`, indexed by slot.
    ///
    /// # Panics
    ///
    /// Panics if `T` was never registered.
    pub fn column<T: 'static>(&self) -> &Column<T> {
        match self.columns.get(&TypeId::of::<T>()) {
            Some(column) => downcast_column(&**column),
            None => unregistered::<T>(),
        }
    }

    /// Mutable access to the column storing every `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` was never registered.
    pub fn column_mut<T: 'static>(&mut self) -> &mut Column<T> {
        match self.columns.get_mut(&TypeId::of::<T>()) {
            Some(column) => downcast_column_mut(&mut **column),
            None => unregistered::<T>(),
        }
    }

    /// Temporarily remove the column for `type_id`. Paired with
    /// [`restore_column`](Self::restore_column) by queries.
    pub(crate) fn extract_column(&mut self, type_id: TypeId) -> Option<Box<dyn ErasedColumn>> {
        self.columns.remove(&type_id)
    }

    pub(crate) fn restore_column(&mut self, type_id: TypeId, column: Box<dyn ErasedColumn>) {
        self.columns.insert(type_id, column);
    }

    // ── Slots ────────────────────────────────────────────────────────

    /// Total number of slots ever created. Never shrinks.
    pub fn slot_count(&self) -> u32 {
        self.allocator.slot_count()
    }

    /// Number of currently allocated slots.
    pub fn live_count(&self) -> u32 {
        self.allocator.live_count()
    }

    /// Whether slot `index` is currently allocated.
    pub fn is_live(&self, index: u32) -> bool {
        self.allocator.is_live_slot(index)
    }

    /// Every slot index, ascending, allocated or not.
    pub fn slots(&self) -> Range<u32> {
        0..self.slot_count()
    }

    /// Handles for every allocated slot, ascending.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots()
            .filter(|&index| self.allocator.is_live_slot(index))
            .filter_map(|index| self.allocator.current(index))
    }

    /// Handle for the slot's current generation, or [`Entity::INVALID`] if
    /// `index` is out of range.
    ///
    /// For a freed slot the handle reads as invalid until the slot is
    /// reallocated, after which it addresses the new occupant.
    pub fn handle_at(&self, index: u32) -> Entity {
        self.allocator.current(index).unwrap_or(Entity::INVALID)
    }

    // ── Entity Lifecycle ─────────────────────────────────────────────

    /// Create a new entity with no components and the default tag.
    ///
    /// Reuses the most recently freed slot if any, otherwise appends one.
    pub fn allocate(&mut self) -> Entity {
        let (entity, fresh) = self.allocator.allocate();
        if fresh {
            for column in self.columns.values_mut() {
                column.push_empty();
                debug_assert_eq!(column.len(), self.allocator.slot_count() as usize);
            }
            self.tags.push(DEFAULT_TAG.to_string());
        } else {
            for column in self.columns.values_mut() {
                column.clear_slot(entity.index);
            }
            self.tags[entity.index as usize] = DEFAULT_TAG.to_string();
        }
        self.allocated_this_frame += 1;
        entity
    }

    /// Allocate an entity and return a scoped view for configuring it.
    pub fn spawn(&mut self) -> EntityMut<'_> {
        let entity = self.allocate();
        EntityMut {
            registry: self,
            entity,
        }
    }

    /// Destroy an entity: drop its components, reset its tag, bump the
    /// slot's generation and return the slot to the free pool.
    ///
    /// Returns `false` (and changes nothing) if the handle was already
    /// invalid.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.allocator.is_alive(entity) {
            self.report(Diagnostic::StaleHandle {
                entity,
                operation: "destroy",
            });
            return false;
        }
        for column in self.columns.values_mut() {
            column.clear_slot(entity.index);
        }
        self.tags[entity.index as usize] = DEFAULT_TAG.to_string();
        self.allocator.deallocate(entity);
        self.destroyed_this_frame += 1;
        true
    }

    /// Whether `entity` still refers to the entity it was created for.
    pub fn is_valid(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Scoped view of one entity. The view is returned even for invalid
    /// handles; every operation on it re-checks validity.
    pub fn entity_mut(&mut self, entity: Entity) -> EntityMut<'_> {
        EntityMut {
            registry: self,
            entity,
        }
    }

    // ── Per-Entity Components ────────────────────────────────────────

    /// Component `T` of `entity`.
    ///
    /// `None` if the handle is invalid, `T` is not registered (reported as a
    /// warning), or the entity has no `T`.
    pub fn get<T: 'static>(&self, entity: Entity) -> Option<&T> {
        if !self.check_access::<T>(entity, "get") {
            return None;
        }
        self.column::<T>().get(entity.index)
    }

    /// Mutable access to component `T` of `entity`. Same rules as
    /// [`get`](Self::get).
    pub fn get_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.check_access::<T>(entity, "get_mut") {
            return None;
        }
        self.column_mut::<T>().get_mut(entity.index)
    }

    /// Whether `entity` is valid and has a `T`.
    pub fn has<T: 'static>(&self, entity: Entity) -> bool {
        self.get::<T>(entity).is_some()
    }

    /// Give `entity` the component `value`, replacing any existing `T`
    /// in place.
    ///
    /// No-op if the handle is invalid or `T` is not registered (reported as
    /// a warning).
    pub fn set<T: 'static>(&mut self, entity: Entity, value: T) {
        if !self.check_access::<T>(entity, "set") {
            return;
        }
        self.column_mut::<T>().set(entity.index, value);
    }

    /// Remove component `T` from `entity` and return it.
    ///
    /// `None` under the same conditions as [`get`](Self::get).
    pub fn remove<T: 'static>(&mut self, entity: Entity) -> Option<T> {
        if !self.check_access::<T>(entity, "remove") {
            return None;
        }
        self.column_mut::<T>().take(entity.index)
    }

    // ── Tags ─────────────────────────────────────────────────────────

    /// The entity's tag, or `""` if the handle is invalid.
    pub fn tag(&self, entity: Entity) -> &str {
        if !self.is_valid(entity) {
            return "";
        }
        &self.tags[entity.index as usize]
    }

    /// Set the entity's tag. Ignored if the handle is invalid.
    pub fn set_tag(&mut self, entity: Entity, tag: impl Into<String>) {
        if !self.is_valid(entity) {
            self.report(Diagnostic::StaleHandle {
                entity,
                operation: "set_tag",
            });
            return;
        }
        self.tags[entity.index as usize] = tag.into();
    }

    /// Tag of slot `index` regardless of liveness. Used by the tag scan.
    pub(crate) fn slot_tag(&self, index: u32) -> &str {
        &self.tags[index as usize]
    }

    // ── Statistics ───────────────────────────────────────────────────

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            total_slots: self.allocator.slot_count(),
            live_slots: self.allocator.live_count(),
            free_slots: self.allocator.free_count(),
            component_types: self.columns.len(),
            allocated_this_frame: self.allocated_this_frame,
            destroyed_this_frame: self.destroyed_this_frame,
        }
    }

    /// Return current statistics and reset the per-frame counters.
    pub fn take_frame_stats(&mut self) -> RegistryStats {
        let stats = self.stats();
        self.allocated_this_frame = 0;
        self.destroyed_this_frame = 0;
        stats
    }

    // ── Internals ────────────────────────────────────────────────────

    fn report(&self, diagnostic: Diagnostic) {
        self.sink.report(&diagnostic);
    }

    /// Soft validation shared by the per-entity accessors. Registration is
    /// checked first so a wiring mistake is reported even for stale handles.
    fn check_access<T: 'static>(&self, entity: Entity, operation: &'static str) -> bool {
        if !self.is_registered::<T>() {
            self.report(Diagnostic::UnregisteredComponent {
                component: std::any::type_name::<T>(),
                operation,
            });
            return false;
        }
        if !self.is_valid(entity) {
            self.report(Diagnostic::StaleHandle { entity, operation });
            return false;
        }
        true
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Fatal path for column access to an unregistered component type.
#[cold]
pub(crate) fn unregistered<T: 'static>() -> ! {
    let name = std::any::type_name::<T>();
    log::error!("`{name}` is not a registered component");
    panic!("Component `{name}` is not registered. Did you forget to call `register::<{name}>()`?")
}

pub(crate) fn downcast_column<T: 'static>(column: &dyn ErasedColumn) -> &Column<T> {
    column
        .as_any()
        .downcast_ref::<Column<T>>()
        .unwrap_or_else(|| column_type_mismatch::<T>(column.type_name()))
}

pub(crate) fn downcast_column_mut<T: 'static>(column: &mut dyn ErasedColumn) -> &mut Column<T> {
    let stored = column.type_name();
    column
        .as_any_mut()
        .downcast_mut::<Column<T>>()
        .unwrap_or_else(|| column_type_mismatch::<T>(stored))
}

#[cold]
fn column_type_mismatch<T: 'static>(stored: &str) -> ! {
    panic!(
        "Column type mismatch: expected `{}`, found `{stored}`",
        std::any::type_name::<T>()
    )
}

// ── EntityMut ────────────────────────────────────────────────────────────

/// A scoped, mutable view of one entity.
///
/// Holds the registry's mutable borrow for as long as it lives. Methods that
/// return `&mut Self` can be chained:
///
/// ```
/// use affinity::ecs::Registry;
///
/// #[derive(Debug, PartialEq)]
/// struct Health(u32);
///
/// let mut registry = Registry::new();
/// registry.register::<Health>();
/// let player = registry.spawn().set(Health(3)).set_tag("player").id();
/// assert_eq!(registry.get::<Health>(player), Some(&Health(3)));
/// assert_eq!(registry.tag(player), "player");
/// ```
pub struct EntityMut<'r> {
    registry: &'r mut Registry,
    entity: Entity,
}

impl<'r> EntityMut<'r> {
    /// The handle this view operates on.
    pub fn id(&self) -> Entity {
        self.entity
    }

    pub fn is_valid(&self) -> bool {
        self.registry.is_valid(self.entity)
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.registry.get::<T>(self.entity)
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.registry.get_mut::<T>(self.entity)
    }

    pub fn has<T: 'static>(&self) -> bool {
        self.registry.has::<T>(self.entity)
    }

    pub fn set<T: 'static>(&mut self, value: T) -> &mut Self {
        self.registry.set(self.entity, value);
        self
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.registry.remove::<T>(self.entity)
    }

    pub fn tag(&self) -> &str {
        self.registry.tag(self.entity)
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.registry.set_tag(self.entity, tag);
        self
    }

    /// Destroy the entity. Returns `false` if it was already invalid.
    pub fn destroy(self) -> bool {
        self.registry.destroy(self.entity)
    }

    /// Give back the underlying registry borrow.
    pub fn into_registry(self) -> &'r mut Registry {
        self.registry
    }
}
