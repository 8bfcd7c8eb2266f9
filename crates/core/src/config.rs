//! Simulation configuration
//!
//! Defaults reproduce the reference cadence: a 30×30 grid, each sensor
//! polling once per second, a random ignition every 3 seconds and a full
//! grid render every 5 seconds.

use crate::error::SimulationError;
use crate::events::file_log::DEFAULT_LOG_FILE;
use crate::grid::{cell_count, DEFAULT_GRID_SIZE, MAX_GRID_CELLS};
use crate::ignition::DEFAULT_IGNITION_INTERVAL;
use crate::sensor::DEFAULT_WATCH_INTERVAL;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default interval between two periodic renders
pub const DEFAULT_RENDER_INTERVAL: Duration = Duration::from_secs(5);

/// Largest grid run with one OS thread per cell; bigger grids need a pool
pub const MAX_THREADED_CELLS: usize = 128 * 128;

/// How sensor watchers are mapped onto threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulingModel {
    /// One named OS thread per cell
    ThreadPerCell,
    /// A rayon pool of `workers` threads sweeping all cells each interval
    PooledSweep {
        /// Worker thread count
        workers: usize,
    },
}

/// Everything needed to start a [`Simulation`](crate::Simulation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Edge length of the square grid
    pub grid_size: usize,
    /// Interval between two polls of the same sensor
    pub watch_interval: Duration,
    /// Interval between two random ignition attempts
    pub ignition_interval: Duration,
    /// Interval between two periodic grid renders
    pub render_interval: Duration,
    /// Event log file used by the headless runner
    pub log_file: PathBuf,
    /// Fixed RNG seed for the ignition generator
    pub seed: Option<u64>,
    /// Watcher scheduling
    pub scheduling: SchedulingModel,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            watch_interval: DEFAULT_WATCH_INTERVAL,
            ignition_interval: DEFAULT_IGNITION_INTERVAL,
            render_interval: DEFAULT_RENDER_INTERVAL,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            seed: None,
            scheduling: SchedulingModel::ThreadPerCell,
        }
    }
}

impl SimulationConfig {
    /// Set the grid edge length
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Set the sensor polling interval
    pub fn with_watch_interval(mut self, interval: Duration) -> Self {
        self.watch_interval = interval;
        self
    }

    /// Set the interval between ignition attempts
    pub fn with_ignition_interval(mut self, interval: Duration) -> Self {
        self.ignition_interval = interval;
        self
    }

    /// Set the periodic render interval
    pub fn with_render_interval(mut self, interval: Duration) -> Self {
        self.render_interval = interval;
        self
    }

    /// Set the event log file
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = path.into();
        self
    }

    /// Fix the ignition RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Choose how watchers are scheduled
    pub fn with_scheduling(mut self, scheduling: SchedulingModel) -> Self {
        self.scheduling = scheduling;
        self
    }

    /// Check every field can produce a working simulation
    ///
    /// # Errors
    /// Returns [`SimulationError::InvalidConfig`] naming the first bad field:
    /// a zero or oversized grid, a zero interval, or a pool with no workers.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.grid_size == 0 {
            return Err(SimulationError::invalid_config("grid_size", "must be positive"));
        }
        let Some(cells) = cell_count(self.grid_size) else {
            return Err(SimulationError::invalid_config(
                "grid_size",
                format!("grid would exceed {MAX_GRID_CELLS} cells"),
            ));
        };
        if self.scheduling == SchedulingModel::ThreadPerCell && cells > MAX_THREADED_CELLS {
            return Err(SimulationError::invalid_config(
                "grid_size",
                format!(
                    "{cells} cells exceed the {MAX_THREADED_CELLS} thread-per-cell limit; \
                     use a pooled sweep"
                ),
            ));
        }
        for (field, interval) in [
            ("watch_interval", self.watch_interval),
            ("ignition_interval", self.ignition_interval),
            ("render_interval", self.render_interval),
        ] {
            if interval.is_zero() {
                return Err(SimulationError::invalid_config(field, "must be non-zero"));
            }
        }
        if let SchedulingModel::PooledSweep { workers: 0 } = self.scheduling {
            return Err(SimulationError::invalid_config(
                "scheduling",
                "pooled sweep needs at least one worker",
            ));
        }
        Ok(())
    }
}
