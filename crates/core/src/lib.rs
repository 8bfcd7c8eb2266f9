//! Fire Watch Core Library
//!
//! A concurrent wildfire monitoring simulation. A square grid of sensor cells
//! is watched by one concurrent unit per cell; fire started by a random
//! ignition source spreads to orthogonal neighbors, and any fire reaching the
//! grid's edge wakes a central coordinator that logs the escalation and
//! renders the grid.
//!
//! ## Structure
//!
//! - [`grid`]: cells with their own guards and the monotonic
//!   `Sensor → OnFire → Burned` lifecycle
//! - [`sensor`]: per-cell watchers, propagation, and the pooled sweep
//! - [`coordinator`]: coalescing border notifications and the coordinator
//! - [`ignition`] and [`combat`]: the two other ways cells change state
//! - [`events`] and [`render`]: the event-log and renderer collaborators
//! - [`simulation`]: starts, observes and stops every unit

pub mod combat;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod grid;
pub mod ignition;
pub mod render;
pub mod sensor;
pub mod shutdown;
pub mod simulation;

pub use combat::CombatAction;
pub use config::{SchedulingModel, SimulationConfig};
pub use coordinator::{BorderNotifier, CentralCoordinator, CoordinatorPhase, CoordinatorStatus};
pub use error::SimulationError;
pub use events::{EventLog, EventRecord, FileEventLog, FireEvent, MemoryEventLog, NullEventLog};
pub use grid::{CellState, Coord, Grid, GridSnapshot};
pub use ignition::IgnitionGenerator;
pub use render::{RecordingRenderer, Renderer, TextRenderer};
pub use sensor::{PollOutcome, SensorWatcher, WatchContext};
pub use shutdown::ShutdownSignal;
pub use simulation::{RunSummary, Simulation};

#[cfg(test)]
#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
