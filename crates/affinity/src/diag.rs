//! Diagnostics: soft-error reporting, logger setup, and registry statistics.
//!
//! The registry never writes to a global console directly. Soft conditions
//! (an unregistered component type reached through an entity accessor, a
//! stale handle) are turned into a [`Diagnostic`] and handed to the
//! registry's [`DiagnosticSink`]. The default sink, [`LogSink`], forwards to
//! the `log` facade, which discards everything until a logger is installed
//! with [`init_logger`] (or any other `log` backend).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::ecs::Entity;

// ── Diagnostics ──────────────────────────────────────────────────────────

/// A soft condition observed by the registry. Always safe to ignore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A component type was used through an entity accessor before
    /// `register::<T>()` was called for it.
    UnregisteredComponent {
        component: &'static str,
        operation: &'static str,
    },
    /// An operation was attempted through a handle whose generation is
    /// stale (or which never referred to a slot).
    StaleHandle {
        entity: Entity,
        operation: &'static str,
    },
}

impl Diagnostic {
    /// Severity used when forwarding to the `log` facade.
    pub fn level(&self) -> log::Level {
        match self {
            Diagnostic::UnregisteredComponent { .. } => log::Level::Warn,
            Diagnostic::StaleHandle { .. } => log::Level::Debug,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnregisteredComponent {
                component,
                operation,
            } => write!(f, "{operation}: `{component}` is not a registered component"),
            Diagnostic::StaleHandle { entity, operation } => {
                write!(f, "{operation}: {entity:?} is not a valid entity")
            }
        }
    }
}

/// Receives soft diagnostics from a [`Registry`](crate::ecs::Registry).
pub trait DiagnosticSink {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to the `log` facade under the `affinity` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: &Diagnostic) {
        log::log!(target: "affinity", diagnostic.level(), "{diagnostic}");
    }
}

/// Discards every diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: &Diagnostic) {}
}

/// Keeps every diagnostic in memory. Clones share the same buffer, so one
/// clone can be handed to the registry and another kept for inspection.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    reports: Rc<RefCell<Vec<Diagnostic>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn reports(&self) -> Vec<Diagnostic> {
        self.reports.borrow().clone()
    }

    pub fn clear(&self) {
        self.reports.borrow_mut().clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        self.reports.borrow_mut().push(diagnostic.clone());
    }
}

// ── Logger ───────────────────────────────────────────────────────────────

/// Install `env_logger` as the `log` backend, honouring `RUST_LOG`.
///
/// Defaults to `info` when `RUST_LOG` is unset. Calling it twice (or after
/// another logger was installed) only prints a warning.
pub fn init_logger() {
    let result = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
    if result.is_err() {
        eprintln!("[affinity] Warning: a logger is already set.");
    }
}

// ── Statistics ───────────────────────────────────────────────────────────

/// Slot pool statistics, as returned by
/// [`Registry::stats`](crate::ecs::Registry::stats).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total_slots: u32,
    pub live_slots: u32,
    pub free_slots: u32,
    pub component_types: usize,
    /// Entities allocated since the last frame-stats reset.
    pub allocated_this_frame: u32,
    /// Entities destroyed since the last frame-stats reset.
    pub destroyed_this_frame: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_shares_buffer_between_clones() {
        let sink = RecordingSink::new();
        let handed_out = sink.clone();
        handed_out.report(&Diagnostic::UnregisteredComponent {
            component: "Boat",
            operation: "get",
        });
        assert_eq!(sink.reports().len(), 1);
        sink.clear();
        assert!(handed_out.reports().is_empty());
    }

    #[test]
    fn diagnostic_levels() {
        let unregistered = Diagnostic::UnregisteredComponent {
            component: "Boat",
            operation: "set",
        };
        let stale = Diagnostic::StaleHandle {
            entity: Entity::INVALID,
            operation: "set",
        };
        assert_eq!(unregistered.level(), log::Level::Warn);
        assert_eq!(stale.level(), log::Level::Debug);
        assert_eq!(
            unregistered.to_string(),
            "set: `Boat` is not a registered component"
        );
    }

    #[test]
    fn stats_serialize_to_json() {
        let stats = RegistryStats {
            total_slots: 3,
            live_slots: 2,
            free_slots: 1,
            ..Default::default()
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["live_slots"], 2);
        assert_eq!(json["free_slots"], 1);
    }
}
