//! End-of-run counts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Final counts reported by [`Simulation::shutdown`](super::Simulation::shutdown)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub grid_size: usize,
    /// Cells still unburned
    pub sensors: usize,
    /// Cells burning at shutdown
    pub on_fire: usize,
    /// Cells extinguished by combat
    pub burned: usize,
    /// Successful random ignitions
    pub ignitions: u64,
    /// Border notifications raised (before coalescing)
    pub border_signals: u64,
    /// Coordinator wake-ups (after coalescing)
    pub coordinator_activations: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Share of the grid that has caught fire at some point
    pub fn affected_fraction(&self) -> f32 {
        let total = self.grid_size * self.grid_size;
        if total == 0 {
            return 0.0;
        }
        (self.on_fire + self.burned) as f32 / total as f32
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} grid after {:.1}s: {} sensor, {} on fire, {} burned ({:.0}% affected); \
             {} ignitions, {} border signals, {} coordinator activations",
            self.grid_size,
            self.grid_size,
            self.elapsed.as_secs_f32(),
            self.sensors,
            self.on_fire,
            self.burned,
            self.affected_fraction() * 100.0,
            self.ignitions,
            self.border_signals,
            self.coordinator_activations
        )
    }
}
