//! Manual fire combat
//!
//! Nothing in the simulation invokes combat on its own; the coordinator only
//! logs and renders. Callers trigger it explicitly through
//! [`Simulation::combat`](crate::Simulation::combat) or a [`CombatAction`].

use crate::events::{EventLog, FireEvent};
use crate::grid::{CellState, Coord, Grid};
use std::sync::Arc;
use tracing::debug;

/// Extinguishes burning cells
#[derive(Clone)]
pub struct CombatAction {
    grid: Arc<Grid>,
    event_log: Arc<dyn EventLog>,
}

impl CombatAction {
    /// Combat action on `grid`, logging each extinguished cell
    pub fn new(grid: Arc<Grid>, event_log: Arc<dyn EventLog>) -> Self {
        Self { grid, event_log }
    }

    /// Move `coord` from `OnFire` to `Burned` and log it
    ///
    /// Any other state is left alone and nothing is logged, so repeated
    /// calls on the same cell are harmless. Returns whether the cell changed.
    ///
    /// # Panics
    /// Panics if `coord` lies outside the grid.
    pub fn apply(&self, coord: Coord) -> bool {
        if self.grid.transition(coord, CellState::OnFire, CellState::Burned) {
            self.event_log.emit(FireEvent::Combat(coord));
            true
        } else {
            debug!(%coord, state = %self.grid.state(coord), "Combat skipped: cell not burning");
            false
        }
    }
}
