//! Per-cell sensor state and its exclusion guard

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lifecycle state of a monitored cell
///
/// The only legal progression is `Sensor → OnFire → Burned`. A cell never
/// moves backward, so the derived ordering doubles as the lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Unburned ground with a live sensor node
    Sensor,
    /// Actively burning
    OnFire,
    /// Extinguished by combat; terminal
    Burned,
}

impl CellState {
    /// Every state, in lifecycle order
    pub const ALL: [CellState; 3] = [CellState::Sensor, CellState::OnFire, CellState::Burned];

    /// Glyph used by the text renderer
    pub fn glyph(self) -> char {
        match self {
            CellState::Sensor => '-',
            CellState::OnFire => '@',
            CellState::Burned => '/',
        }
    }

    /// Whether `self → next` is one step forward in the lifecycle
    pub fn can_transition_to(self, next: CellState) -> bool {
        matches!(
            (self, next),
            (CellState::Sensor, CellState::OnFire) | (CellState::OnFire, CellState::Burned)
        )
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellState::Sensor => "sensor",
            CellState::OnFire => "on fire",
            CellState::Burned => "burned",
        };
        f.write_str(name)
    }
}

/// One grid position: its state plus the guard that owns every access to it
#[derive(Debug)]
pub struct Cell {
    state: Mutex<CellState>,
}

impl Default for Cell {
    fn default() -> Self {
        Self::new()
    }
}

impl Cell {
    /// Create a cell in the `Sensor` state
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CellState::Sensor),
        }
    }

    // A poisoned guard still holds a whole `CellState` (it is `Copy` and
    // written in one store), so the value is always safe to keep using.
    fn guard(&self) -> MutexGuard<'_, CellState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the current state under the guard
    pub fn state(&self) -> CellState {
        *self.guard()
    }

    /// Atomically move `from → to` if the cell is currently in `from`
    ///
    /// Returns `true` when the transition happened. A stale `from` or a
    /// transition that would move the lifecycle backward leaves the cell
    /// untouched and returns `false`.
    pub fn transition(&self, from: CellState, to: CellState) -> bool {
        if !from.can_transition_to(to) {
            return false;
        }
        let mut state = self.guard();
        if *state == from {
            *state = to;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cell_is_sensor() {
        assert_eq!(Cell::new().state(), CellState::Sensor);
    }

    #[test]
    fn test_forward_transitions() {
        let cell = Cell::new();
        assert!(cell.transition(CellState::Sensor, CellState::OnFire));
        assert_eq!(cell.state(), CellState::OnFire);
        assert!(cell.transition(CellState::OnFire, CellState::Burned));
        assert_eq!(cell.state(), CellState::Burned);
    }

    #[test]
    fn test_backward_transitions_rejected() {
        let cell = Cell::new();
        cell.transition(CellState::Sensor, CellState::OnFire);
        assert!(!cell.transition(CellState::OnFire, CellState::Sensor));
        cell.transition(CellState::OnFire, CellState::Burned);
        assert!(!cell.transition(CellState::Burned, CellState::OnFire));
        assert!(!cell.transition(CellState::Burned, CellState::Sensor));
        assert_eq!(cell.state(), CellState::Burned);
    }

    #[test]
    fn test_stale_from_is_noop() {
        let cell = Cell::new();
        // Skipping a step is not allowed even when `from` matches
        assert!(!cell.transition(CellState::Sensor, CellState::Burned));
        assert!(!cell.transition(CellState::OnFire, CellState::Burned));
        assert_eq!(cell.state(), CellState::Sensor);
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(CellState::Sensor.glyph(), '-');
        assert_eq!(CellState::OnFire.glyph(), '@');
        assert_eq!(CellState::Burned.glyph(), '/');
    }

    #[test]
    fn test_lifecycle_ordering() {
        assert!(CellState::Sensor < CellState::OnFire);
        assert!(CellState::OnFire < CellState::Burned);
    }
}
