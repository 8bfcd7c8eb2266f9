//! Domain event log
//!
//! Every occurrence worth recording (ignition, detection, border escalation,
//! coordinator wake-up, combat) is a [`FireEvent`]. Sinks implement
//! [`EventLog`]; the simulation never depends on where records end up.
//!
//! This log is the simulation's output, not its diagnostics: internal
//! lifecycle logging goes through `tracing`.

pub mod file_log;
pub mod memory;

pub use file_log::FileEventLog;
pub use memory::MemoryEventLog;

use crate::grid::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// One occurrence in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FireEvent {
    /// The ignition generator set a sensor cell on fire
    Ignition(Coord),
    /// A watcher found its own cell burning
    Detection(Coord),
    /// A border watcher found fire and signalled the coordinator
    BorderNotified(Coord),
    /// The coordinator woke up for a border notification
    CoordinatorNotified,
    /// A burning cell was extinguished
    Combat(Coord),
}

impl FireEvent {
    /// Cell the event refers to, if any
    pub fn coord(&self) -> Option<Coord> {
        match *self {
            FireEvent::Ignition(c)
            | FireEvent::Detection(c)
            | FireEvent::BorderNotified(c)
            | FireEvent::Combat(c) => Some(c),
            FireEvent::CoordinatorNotified => None,
        }
    }
}

impl fmt::Display for FireEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FireEvent::Ignition(c) => write!(f, "Fire randomly started at {c}"),
            FireEvent::Detection(c) => write!(f, "Sensor node at {c} detected fire!"),
            FireEvent::BorderNotified(c) => {
                write!(
                    f,
                    "Border node at {c} detected fire and notified the central coordinator."
                )
            }
            FireEvent::CoordinatorNotified => f.write_str(
                "Central coordinator received a border fire notification. Starting fire response...",
            ),
            FireEvent::Combat(c) => write!(f, "Fire fought at cell {c}"),
        }
    }
}

/// An immutable, timestamped log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Wall-clock time the event was emitted
    pub timestamp: SystemTime,
    /// What happened
    pub event: FireEvent,
}

impl EventRecord {
    /// Stamp `event` with the current time
    pub fn now(event: FireEvent) -> Self {
        Self {
            timestamp: SystemTime::now(),
            event,
        }
    }
}

/// `<timestamp> - <message>` with an RFC 3339 timestamp
impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            humantime::format_rfc3339_seconds(self.timestamp),
            self.event
        )
    }
}

/// Append-only sink for simulation events
///
/// Implementations are shared by every concurrent unit, so `emit` takes
/// `&self` and must be safe to call from many threads at once.
pub trait EventLog: Send + Sync {
    /// Record one event
    fn emit(&self, event: FireEvent);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventLog;

impl EventLog for NullEventLog {
    fn emit(&self, _event: FireEvent) {}
}
