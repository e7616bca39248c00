//! # Component: Per-Slot Nullable Columns
//!
//! A component is plain data: a `Transform`, a `Sprite`, a `Script`. The
//! registry stores each registered component type in its own [`Column`], a
//! dense `Vec<Option<T>>` with one entry per slot:
//!
//! ```text
//! slot:              0        1        2        3
//! Column<Transform>: [Some(t), None,    Some(t), None]
//! Column<Sprite>:    [Some(s), None,    None,    None]
//! ```
//!
//! An entity "has" a component when its slot's entry is `Some`. Every column
//! always has exactly `slot_count` entries: appending a slot appends `None`
//! to every column, and a column registered late starts out all-`None`.
//!
//! ## Type Erasure
//!
//! The registry does not know `T` when it grows or clears slots, so it holds
//! each column as `Box<dyn ErasedColumn>` keyed by `TypeId` and downcasts to
//! `Column<T>` on typed access. No `unsafe` is involved: a wrong downcast is
//! impossible by construction (the key *is* the type).
//!
//! ## Comparison
//!
//! - **hecs / bevy_ecs**: archetype tables, dense per archetype, entities
//!   move between tables when components are added or removed.
//! - **here**: one column per type, indexed directly by slot. Adding or
//!   removing a component never moves anything; the cost is sparse columns.

use std::any::Any;

/// Storage for one component type, indexed by slot.
pub struct Column<T> {
    slots: Vec<Option<T>>,
}

impl<T: 'static> Column<T> {
    pub(crate) fn with_len(len: usize) -> Self {
        let mut slots = Vec::with_capacity(len);
        slots.resize_with(len, || None);
        Self { slots }
    }

    /// Number of slots (present or empty). Equals the registry's slot count.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots holding a value.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn contains(&self, index: u32) -> bool {
        matches!(self.slots.get(index as usize), Some(Some(_)))
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.slots.get(index as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.slots.get_mut(index as usize)?.as_mut()
    }

    /// Present values in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|value| (i as u32, value)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|value| (i as u32, value)))
    }

    /// Store `value` at `index`. An existing value is overwritten in place.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range (a registry bug, never user input).
    pub(crate) fn set(&mut self, index: u32, value: T) {
        match &mut self.slots[index as usize] {
            Some(existing) => *existing = value,
            empty => *empty = Some(value),
        }
    }

    /// Remove and return the value at `index`, leaving the slot empty.
    pub(crate) fn take(&mut self, index: u32) -> Option<T> {
        self.slots.get_mut(index as usize)?.take()
    }
}

/// Type-erased view of a [`Column`], used by the registry for operations
/// that apply to every component type at once.
///
/// Public only because it appears in [`QueryParam::Column`](super::QueryParam::Column).
#[doc(hidden)]
pub trait ErasedColumn {
    /// Append an empty entry for a newly created slot.
    fn push_empty(&mut self);
    /// Drop the value at `index`, if any.
    fn clear_slot(&mut self, index: u32);
    fn len(&self) -> usize;
    fn reserve(&mut self, additional: usize);
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> ErasedColumn for Column<T> {
    fn push_empty(&mut self) {
        self.slots.push(None);
    }

    fn clear_slot(&mut self, index: u32) {
        if let Some(slot) = self.slots.get_mut(index as usize) {
            *slot = None;
        }
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn reserve(&mut self, additional: usize) {
        self.slots.reserve(additional);
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
