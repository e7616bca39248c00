//! # Query: Enumerating Slots
//!
//! The registry keeps no index structures. Every lookup is a linear pass over
//! slot indices in ascending order, in one of these shapes:
//!
//! - [`Registry::for_each_slot`]: the raw loop primitive. The callback gets
//!   the registry mutably plus a slot index and does its own checks.
//! - [`Registry::entities_with_tag`]: snapshot of every live entity whose
//!   tag matches.
//! - [`Registry::query`]: typed AND-filter. Visits every live slot holding
//!   *all* requested components.
//!
//! ```text
//! registry.query::<(&mut Transform, &Velocity)>(|entity, (t, v)| {
//!     t.position += v.0;
//! });
//!
//! 1. Extract the Transform and Velocity columns out of the registry
//! 2. For each live slot: both present? → call the closure
//! 3. Put the columns back
//! ```
//!
//! Extracting the columns lets the borrow checker see that the `&mut` to one
//! column cannot alias the `&` to another, with no `unsafe`. While a query
//! runs the registry is borrowed, so the closure cannot allocate or destroy.
//! Stages that need to do that use `for_each_slot` instead.

use std::any::TypeId;

use super::component::{Column, ErasedColumn};
use super::entity::Entity;
use super::registry::{Registry, downcast_column, downcast_column_mut};

/// Something a query can fetch per slot.
///
/// Implemented for `&T` (shared read) and `&mut T` (exclusive write), and
/// for tuples of up to eight params.
pub trait QueryParam {
    /// The item handed to the closure per matching slot.
    type Item<'w>;

    /// Owned column data taken out of the registry for the query's duration.
    type Column;

    /// Take the needed column(s) out of the registry.
    ///
    /// # Panics
    ///
    /// Panics if a requested type is not registered, or is requested twice
    /// in one query.
    fn extract(registry: &mut Registry) -> Self::Column;

    /// Put the column(s) back.
    fn restore(col: Self::Column, registry: &mut Registry);

    /// The item for slot `index`, or `None` if any component is missing.
    fn fetch(col: &mut Self::Column, index: u32) -> Option<Self::Item<'_>>;
}

fn extract_erased<T: 'static>(registry: &mut Registry) -> (TypeId, Box<dyn ErasedColumn>) {
    let tid = TypeId::of::<T>();
    match registry.extract_column(tid) {
        Some(column) => (tid, column),
        None => {
            let name = std::any::type_name::<T>();
            log::error!("query on `{name}`, which is not registered");
            panic!(
                "Query extract: component `{name}` is not registered (or requested twice in one query)"
            )
        }
    }
}

/// Shared read access to a component.
impl<T: 'static> QueryParam for &T {
    type Item<'w> = &'w T;
    type Column = (TypeId, Box<dyn ErasedColumn>);

    fn extract(registry: &mut Registry) -> Self::Column {
        extract_erased::<T>(registry)
    }

    fn restore(col: Self::Column, registry: &mut Registry) {
        registry.restore_column(col.0, col.1);
    }

    fn fetch(col: &mut Self::Column, index: u32) -> Option<Self::Item<'_>> {
        let column: &Column<T> = downcast_column(&*col.1);
        column.get(index)
    }
}

/// Exclusive write access to a component.
impl<T: 'static> QueryParam for &mut T {
    type Item<'w> = &'w mut T;
    type Column = (TypeId, Box<dyn ErasedColumn>);

    fn extract(registry: &mut Registry) -> Self::Column {
        extract_erased::<T>(registry)
    }

    fn restore(col: Self::Column, registry: &mut Registry) {
        registry.restore_column(col.0, col.1);
    }

    fn fetch(col: &mut Self::Column, index: u32) -> Option<Self::Item<'_>> {
        let column: &mut Column<T> = downcast_column_mut(&mut *col.1);
        column.get_mut(index)
    }
}

/// Implement `QueryParam` for tuples of params.
///
/// A tuple matches a slot only if every element matches, so
/// `registry.query::<(&A, &mut B)>(..)` skips slots lacking either.
macro_rules! impl_query_param_tuple {
    ($($P:ident),+) => {
        impl<$($P: QueryParam),+> QueryParam for ($($P,)+) {
            type Item<'w> = ($($P::Item<'w>,)+);
            type Column = ($($P::Column,)+);

            #[allow(non_snake_case)]
            fn extract(registry: &mut Registry) -> Self::Column {
                ($($P::extract(registry),)+)
            }

            #[allow(non_snake_case)]
            fn restore(col: Self::Column, registry: &mut Registry) {
                let ($($P,)+) = col;
                $($P::restore($P, registry);)+
            }

            #[allow(non_snake_case)]
            fn fetch(col: &mut Self::Column, index: u32) -> Option<Self::Item<'_>> {
                let ($($P,)+) = col;
                Some(($($P::fetch($P, index)?,)+))
            }
        }
    };
}

impl_query_param_tuple!(A);
impl_query_param_tuple!(A, B);
impl_query_param_tuple!(A, B, C);
impl_query_param_tuple!(A, B, C, D);
impl_query_param_tuple!(A, B, C, D, E);
impl_query_param_tuple!(A, B, C, D, E, F);
impl_query_param_tuple!(A, B, C, D, E, F, G);
impl_query_param_tuple!(A, B, C, D, E, F, G, H);

impl Registry {
    /// Call `f` once per slot index, ascending, allocated or not.
    ///
    /// The slot count is re-read before every call, so slots appended by `f`
    /// are visited in the same pass. Freed slots are visited too; `f`
    /// checks what it needs (for example with
    /// [`handle_at`](Registry::handle_at) and [`get`](Registry::get), which
    /// read as empty for them).
    pub fn for_each_slot(&mut self, mut f: impl FnMut(&mut Registry, u32)) {
        let mut index = 0;
        while index < self.slot_count() {
            f(self, index);
            index += 1;
        }
    }

    /// Every live entity whose tag equals `tag`, in ascending slot order.
    ///
    /// The result is a snapshot: later changes do not affect it. Freed slots
    /// are never returned, so searching for [`DEFAULT_TAG`](super::DEFAULT_TAG)
    /// yields exactly the live untagged entities.
    pub fn entities_with_tag(&self, tag: &str) -> Vec<Entity> {
        self.slots()
            .filter(|&index| self.is_live(index) && self.slot_tag(index) == tag)
            .map(|index| self.handle_at(index))
            .collect()
    }

    /// Every live entity holding a `T`, in ascending slot order.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered.
    pub fn entities_with<T: 'static>(&self) -> Vec<Entity> {
        self.column::<T>()
            .iter()
            .filter(|&(index, _)| self.is_live(index))
            .map(|(index, _)| self.handle_at(index))
            .collect()
    }

    /// Run `f` for every live slot holding all components in `Q`.
    ///
    /// ```
    /// use affinity::ecs::Registry;
    ///
    /// struct Position(f32);
    /// struct Velocity(f32);
    ///
    /// let mut registry = Registry::new();
    /// registry.register::<Position>();
    /// registry.register::<Velocity>();
    /// let moving = registry.spawn().set(Position(0.0)).set(Velocity(2.0)).id();
    /// registry.spawn().set(Position(5.0));
    ///
    /// registry.query::<(&mut Position, &Velocity)>(|_, (p, v)| p.0 += v.0);
    /// assert_eq!(registry.get::<Position>(moving).unwrap().0, 2.0);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if any type in `Q` is not registered.
    pub fn query<Q: QueryParam>(&mut self, mut f: impl FnMut(Entity, Q::Item<'_>)) {
        let mut cols = Q::extract(self);
        for index in self.slots() {
            if !self.is_live(index) {
                continue;
            }
            if let Some(item) = Q::fetch(&mut cols, index) {
                f(self.handle_at(index), item);
            }
        }
        Q::restore(cols, self);
    }

    /// Number of live slots holding all components in `Q`.
    pub fn count<Q: QueryParam>(&mut self) -> usize {
        let mut n = 0;
        self.query::<Q>(|_, _| n += 1);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::DEFAULT_TAG;

    #[derive(Debug, PartialEq)]
    struct Pos(f32, f32);
    #[derive(Debug, PartialEq)]
    struct Vel(f32, f32);
    struct Health(u32);
    struct Unknown;

    fn setup() -> Registry {
        let mut registry = Registry::new();
        registry.register::<Pos>();
        registry.register::<Vel>();
        registry.register::<Health>();
        registry
    }

    #[test]
    fn query_single_component() {
        let mut registry = setup();
        registry.spawn().set(Pos(1.0, 2.0));
        registry.spawn().set(Pos(3.0, 4.0));
        registry.spawn().set(Vel(0.0, 0.0));

        let mut seen = Vec::new();
        registry.query::<&Pos>(|_, p| seen.push(p.0));
        assert_eq!(seen, vec![1.0, 3.0]);
    }

    #[test]
    fn query_is_an_and_filter() {
        let mut registry = setup();
        let both = registry.spawn().set(Pos(0.0, 0.0)).set(Vel(1.0, 1.0)).id();
        registry.spawn().set(Pos(5.0, 5.0));
        registry.spawn().set(Vel(9.0, 9.0));

        let mut hits = Vec::new();
        registry.query::<(&mut Pos, &Vel)>(|e, (p, v)| {
            p.0 += v.0;
            p.1 += v.1;
            hits.push(e);
        });
        assert_eq!(hits, vec![both]);
        assert_eq!(registry.get::<Pos>(both), Some(&Pos(1.0, 1.0)));
        assert_eq!(registry.count::<(&Pos, &Vel)>(), 1);
    }

    #[test]
    fn query_restores_columns() {
        let mut registry = setup();
        let e = registry.spawn().set(Pos(0.0, 0.0)).id();
        registry.query::<(&Pos, &Vel, &Health)>(|_, _| {});
        assert!(registry.is_registered::<Pos>());
        assert!(registry.is_registered::<Vel>());
        assert!(registry.is_registered::<Health>());
        assert_eq!(registry.get::<Pos>(e), Some(&Pos(0.0, 0.0)));
    }

    #[test]
    fn query_skips_destroyed_entities() {
        let mut registry = setup();
        let a = registry.spawn().set(Health(1)).id();
        let b = registry.spawn().set(Health(2)).id();
        registry.destroy(a);

        let mut seen = Vec::new();
        registry.query::<&Health>(|e, h| seen.push((e, h.0)));
        assert_eq!(seen, vec![(b, 2)]);
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn query_unregistered_panics() {
        let mut registry = setup();
        registry.allocate();
        registry.query::<&Unknown>(|_, _| {});
    }

    #[test]
    #[should_panic(expected = "requested twice")]
    fn query_same_type_twice_panics() {
        let mut registry = setup();
        registry.query::<(&Pos, &mut Pos)>(|_, _| {});
    }

    #[test]
    fn tag_scan() {
        let mut registry = setup();
        let a = registry.spawn().set_tag("boat").id();
        registry.allocate();
        let c = registry.spawn().set_tag("boat").id();

        assert_eq!(registry.entities_with_tag("boat"), vec![a, c]);
        assert!(registry.entities_with_tag("missile").is_empty());
    }

    #[test]
    fn tag_scan_excludes_freed_slots() {
        let mut registry = setup();
        let a = registry.allocate();
        let b = registry.allocate();
        registry.destroy(a);

        assert_eq!(registry.entities_with_tag(DEFAULT_TAG), vec![b]);
    }

    #[test]
    fn tag_scan_is_a_snapshot() {
        let mut registry = setup();
        let a = registry.spawn().set_tag("boat").id();
        let snapshot = registry.entities_with_tag("boat");
        registry.spawn().set_tag("boat");
        registry.set_tag(a, "wreck");
        assert_eq!(snapshot, vec![a]);
    }

    #[test]
    fn entities_with_component() {
        let mut registry = setup();
        let a = registry.spawn().set(Health(3)).id();
        registry.allocate();
        let c = registry.spawn().set(Health(1)).id();
        assert_eq!(registry.entities_with::<Health>(), vec![a, c]);
    }

    #[test]
    fn for_each_slot_visits_in_order() {
        let mut registry = setup();
        for _ in 0..4 {
            registry.allocate();
        }
        let mut visited = Vec::new();
        registry.for_each_slot(|_, index| visited.push(index));
        assert_eq!(visited, vec![0, 1, 2, 3]);
    }

    #[test]
    fn for_each_slot_sees_appended_slots() {
        let mut registry = setup();
        registry.allocate();
        let mut visited = Vec::new();
        registry.for_each_slot(|registry, index| {
            visited.push(index);
            if index == 0 {
                registry.allocate();
            }
        });
        assert_eq!(visited, vec![0, 1]);
    }

    #[test]
    fn for_each_slot_can_destroy_ahead() {
        let mut registry = setup();
        let _a = registry.spawn().set(Health(1)).id();
        let b = registry.spawn().set(Health(2)).id();

        let mut healths = Vec::new();
        registry.for_each_slot(|registry, index| {
            let e = registry.handle_at(index);
            if index == 0 {
                registry.destroy(b);
            }
            if let Some(h) = registry.get::<Health>(e) {
                healths.push(h.0);
            }
        });
        assert_eq!(healths, vec![1]);
    }
}
