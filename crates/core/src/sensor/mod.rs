//! Per-cell sensor watchers and fire propagation
//!
//! A watcher polls one cell. When that cell is burning it reports the
//! detection, spreads fire to every orthogonal neighbor still in the
//! `Sensor` state, and, on the grid's edge, escalates to the central
//! coordinator.
//!
//! Propagation never holds two cell guards: the watcher's own cell is read
//! and released before any neighbor is touched, and each neighbor write is a
//! `Sensor → OnFire` compare-and-set under that neighbor's guard. Watchers
//! firing from several sides at once therefore cannot lose or corrupt an
//! update, and no lock ordering is needed.
//!
//! Fixed-interval polling is a deliberate simplification. It costs one wake
//! per cell per interval, which is fine at the default grid size; an
//! event-driven design (ignition directly waking the neighbors' tasks) would
//! replace it if grids grow much larger.

pub mod pool;

pub use pool::SweepPool;

use crate::coordinator::BorderNotifier;
use crate::events::{EventLog, FireEvent};
use crate::grid::{CellState, Coord, Grid};
use crate::shutdown::ShutdownSignal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Default interval between two polls of the same cell
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(1);

/// Result of one watcher pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The cell was not burning; carries the state observed
    Quiet(CellState),
    /// The cell was burning
    FireDetected {
        /// Neighbors this pass moved from `Sensor` to `OnFire`
        ignited: Vec<Coord>,
        /// Whether the coordinator was signalled
        border_notified: bool,
    },
}

impl PollOutcome {
    /// Whether the pass found the cell burning
    pub fn detected_fire(&self) -> bool {
        matches!(self, PollOutcome::FireDetected { .. })
    }
}

/// Everything a watcher shares with the rest of the simulation
pub struct WatchContext {
    grid: Arc<Grid>,
    notifier: Arc<BorderNotifier>,
    event_log: Arc<dyn EventLog>,
}

impl WatchContext {
    /// Context sharing `grid`, signalling `notifier` and logging to `event_log`
    pub fn new(
        grid: Arc<Grid>,
        notifier: Arc<BorderNotifier>,
        event_log: Arc<dyn EventLog>,
    ) -> Self {
        Self {
            grid,
            notifier,
            event_log,
        }
    }

    /// The watched grid
    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    /// One detection and propagation pass for the cell at `coord`
    ///
    /// # Panics
    /// Panics if `coord` lies outside the grid.
    pub fn poll(&self, coord: Coord) -> PollOutcome {
        let state = self.grid.state(coord);
        if state != CellState::OnFire {
            trace!(%coord, %state, "Sensor quiet");
            return PollOutcome::Quiet(state);
        }

        self.event_log.emit(FireEvent::Detection(coord));

        let ignited: Vec<Coord> = self
            .grid
            .neighbors(coord)
            .filter(|&n| self.grid.transition(n, CellState::Sensor, CellState::OnFire))
            .collect();
        if !ignited.is_empty() {
            debug!(%coord, spread = ignited.len(), "Fire spread to neighbors");
        }

        let border_notified = self.grid.is_border(coord);
        if border_notified {
            self.event_log.emit(FireEvent::BorderNotified(coord));
            self.notifier.notify();
        }

        PollOutcome::FireDetected {
            ignited,
            border_notified,
        }
    }
}

/// Concurrent unit watching a single cell
pub struct SensorWatcher {
    coord: Coord,
    context: Arc<WatchContext>,
    interval: Duration,
    shutdown: ShutdownSignal,
}

impl SensorWatcher {
    /// Watcher polling `coord` every `interval` until `shutdown` fires
    pub fn new(
        coord: Coord,
        context: Arc<WatchContext>,
        interval: Duration,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            coord,
            context,
            interval,
            shutdown,
        }
    }

    /// Cell this watcher owns
    pub fn coord(&self) -> Coord {
        self.coord
    }

    /// A single pass; see [`WatchContext::poll`]
    pub fn poll_once(&self) -> PollOutcome {
        self.context.poll(self.coord)
    }

    /// Poll, then sleep one interval, until shutdown
    pub fn run(&self) {
        loop {
            self.poll_once();
            if !self.shutdown.sleep(self.interval) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemoryEventLog;

    struct Fixture {
        grid: Arc<Grid>,
        notifier: Arc<BorderNotifier>,
        log: Arc<MemoryEventLog>,
        context: Arc<WatchContext>,
    }

    fn fixture(size: usize) -> Fixture {
        let grid = Arc::new(Grid::new(size));
        let notifier = Arc::new(BorderNotifier::new());
        let log = Arc::new(MemoryEventLog::new());
        let context = Arc::new(WatchContext::new(
            Arc::clone(&grid),
            Arc::clone(&notifier),
            log.clone(),
        ));
        Fixture {
            grid,
            notifier,
            log,
            context,
        }
    }

    fn ignite(grid: &Grid, row: usize, col: usize) {
        assert!(grid.transition(Coord::new(row, col), CellState::Sensor, CellState::OnFire));
    }

    #[test]
    fn test_quiet_cells_are_noops() {
        let f = fixture(3);
        assert_eq!(
            f.context.poll(Coord::new(1, 1)),
            PollOutcome::Quiet(CellState::Sensor)
        );

        ignite(&f.grid, 1, 1);
        f.grid.transition(Coord::new(1, 1), CellState::OnFire, CellState::Burned);
        assert_eq!(
            f.context.poll(Coord::new(1, 1)),
            PollOutcome::Quiet(CellState::Burned)
        );

        assert!(f.log.is_empty());
        assert_eq!(f.grid.count(CellState::Sensor), 8);
    }

    #[test]
    fn test_center_fire_spreads_orthogonally() {
        let f = fixture(3);
        ignite(&f.grid, 1, 1);

        let outcome = f.context.poll(Coord::new(1, 1));
        assert_eq!(
            outcome,
            PollOutcome::FireDetected {
                ignited: vec![
                    Coord::new(0, 1),
                    Coord::new(2, 1),
                    Coord::new(1, 0),
                    Coord::new(1, 2)
                ],
                border_notified: false,
            }
        );
        for corner in [(0, 0), (0, 2), (2, 0), (2, 2)] {
            assert_eq!(f.grid.state(Coord::new(corner.0, corner.1)), CellState::Sensor);
        }
        assert_eq!(f.grid.state(Coord::new(1, 1)), CellState::OnFire);
        assert_eq!(f.log.events(), vec![FireEvent::Detection(Coord::new(1, 1))]);
        assert!(!f.notifier.is_pending());
    }

    #[test]
    fn test_propagation_skips_burning_and_burned_neighbors() {
        let f = fixture(3);
        ignite(&f.grid, 1, 1);
        ignite(&f.grid, 0, 1);
        ignite(&f.grid, 1, 0);
        f.grid.transition(Coord::new(1, 0), CellState::OnFire, CellState::Burned);

        let outcome = f.context.poll(Coord::new(1, 1));
        let PollOutcome::FireDetected { ignited, .. } = outcome else {
            panic!("expected fire detection");
        };
        assert_eq!(ignited, vec![Coord::new(2, 1), Coord::new(1, 2)]);
        assert_eq!(f.grid.state(Coord::new(0, 1)), CellState::OnFire);
        assert_eq!(f.grid.state(Coord::new(1, 0)), CellState::Burned);
    }

    #[test]
    fn test_border_fire_notifies_coordinator() {
        let f = fixture(3);
        ignite(&f.grid, 0, 0);

        let outcome = f.context.poll(Coord::new(0, 0));
        assert!(matches!(
            outcome,
            PollOutcome::FireDetected {
                border_notified: true,
                ..
            }
        ));
        assert!(f.notifier.is_pending());
        assert_eq!(
            f.log.events(),
            vec![
                FireEvent::Detection(Coord::new(0, 0)),
                FireEvent::BorderNotified(Coord::new(0, 0))
            ]
        );
    }

    #[test]
    fn test_burning_cell_reports_every_pass() {
        let f = fixture(3);
        ignite(&f.grid, 1, 1);
        f.context.poll(Coord::new(1, 1));
        let second = f.context.poll(Coord::new(1, 1));

        assert_eq!(
            second,
            PollOutcome::FireDetected {
                ignited: vec![],
                border_notified: false
            }
        );
        assert_eq!(f.log.count_where(|e| matches!(e, FireEvent::Detection(_))), 2);
    }

    #[test]
    fn test_watcher_run_stops_on_shutdown() {
        let f = fixture(3);
        ignite(&f.grid, 1, 1);
        let shutdown = ShutdownSignal::new();
        let watcher = SensorWatcher::new(
            Coord::new(1, 1),
            Arc::clone(&f.context),
            Duration::from_millis(5),
            shutdown.clone(),
        );
        assert_eq!(watcher.coord(), Coord::new(1, 1));

        let handle = std::thread::spawn(move || watcher.run());
        std::thread::sleep(Duration::from_millis(30));
        shutdown.trigger();
        handle.join().unwrap();

        assert_eq!(f.grid.count(CellState::OnFire), 5);
    }
}
