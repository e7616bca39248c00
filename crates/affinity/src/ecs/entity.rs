//! # Entity: Generational Handles Into the Registry
//!
//! An [`Entity`] carries no data. It names a *slot*: one row shared by every
//! component column in the [`Registry`](super::registry::Registry). The slot
//! index alone is not enough to identify an entity, because slots are reused
//! after destruction:
//!
//! ```text
//! 1. allocate()          → Entity { index: 3, generation: 0 }
//! 2. keep a copy:  saved = Entity(3v0)
//! 3. destroy(saved)      → generation[3] becomes 1, slot 3 is free
//! 4. allocate()          → Entity { index: 3, generation: 1 }
//! 5. use `saved`         → generation mismatch, reads as invalid
//! ```
//!
//! The generation is bumped on destroy, never on allocate. A reused slot
//! therefore hands out exactly the generation currently stored for it.
//!
//! ## Handles Are Plain Values
//!
//! A handle has no pointer back to the registry. Every operation goes through
//! the registry and re-validates the handle first, so a handle can be copied,
//! stored in components, or kept across frames without lifetime annotations.

use std::fmt;

/// A lightweight, copyable handle to an entity in a
/// [`Registry`](super::registry::Registry).
///
/// Valid only while `index < slot_count` and the registry's generation for
/// that slot still equals `generation`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Entity {
    /// A handle that never refers to a live entity.
    ///
    /// Returned by [`Registry::handle_at`](super::registry::Registry::handle_at)
    /// for out-of-range indices, and used as the default value for handle
    /// fields in components.
    pub const INVALID: Self = Self {
        index: u32::MAX,
        generation: u32::MAX,
    };

    /// Slot index shared by all component columns.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation captured when this handle was created.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Entity(invalid)")
        } else {
            write!(f, "Entity({}v{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Slot bookkeeping: generations, liveness and the free pool.
///
/// ```text
/// generations: [0, 1, 0, 2, 0]   ← one counter per slot ever allocated
/// live:        [T, F, T, F, T]   ← allocated right now?
/// free_list:   [1, 3]            ← reused LIFO
/// ```
///
/// The slot count only grows. The free list is the only reuse mechanism.
pub(crate) struct EntityAllocator {
    generations: Vec<u32>,
    live: Vec<bool>,
    free_list: Vec<u32>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            live: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Allocate a slot. Returns the handle and whether the slot is fresh
    /// (appended) rather than reused.
    pub fn allocate(&mut self) -> (Entity, bool) {
        if let Some(index) = self.free_list.pop() {
            self.live[index as usize] = true;
            let generation = self.generations[index as usize];
            (Entity { index, generation }, false)
        } else {
            let index = self.slot_count();
            assert!(index < u32::MAX, "entity slot space exhausted");
            self.generations.push(0);
            self.live.push(true);
            (
                Entity {
                    index,
                    generation: 0,
                },
                true,
            )
        }
    }

    /// Free the slot behind `entity`. Returns `false` for stale handles.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let idx = entity.index as usize;
        // Wraps after 2^32 destroys of one slot.
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.live[idx] = false;
        self.free_list.push(entity.index);
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        let idx = entity.index as usize;
        idx < self.generations.len()
            && self.live[idx]
            && self.generations[idx] == entity.generation
    }

    /// Whether the slot at `index` is currently allocated.
    pub fn is_live_slot(&self, index: u32) -> bool {
        self.live.get(index as usize).copied().unwrap_or(false)
    }

    /// Handle for the slot's current generation, if the slot exists.
    pub fn current(&self, index: u32) -> Option<Entity> {
        self.generations
            .get(index as usize)
            .map(|&generation| Entity { index, generation })
    }

    pub fn slot_count(&self) -> u32 {
        self.generations.len() as u32
    }

    pub fn live_count(&self) -> u32 {
        self.slot_count() - self.free_list.len() as u32
    }

    pub fn free_count(&self) -> u32 {
        self.free_list.len() as u32
    }

    pub fn reserve(&mut self, additional: usize) {
        self.generations.reserve(additional);
        self.live.reserve(additional);
    }
}
