//! Random ignition source

use crate::events::{EventLog, FireEvent};
use crate::grid::{CellState, Coord, Grid};
use crate::shutdown::ShutdownSignal;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default interval between two ignition attempts
pub const DEFAULT_IGNITION_INTERVAL: Duration = Duration::from_secs(3);

/// Periodically sets a uniformly random cell on fire
///
/// A tick that lands on a cell already burning or burned is skipped; there
/// is no retry within the same tick.
pub struct IgnitionGenerator {
    grid: Arc<Grid>,
    event_log: Arc<dyn EventLog>,
    rng: StdRng,
    interval: Duration,
    shutdown: ShutdownSignal,
    ignitions: u64,
}

impl IgnitionGenerator {
    /// `seed` fixes the target sequence; `None` seeds from OS entropy
    pub fn new(
        grid: Arc<Grid>,
        event_log: Arc<dyn EventLog>,
        seed: Option<u64>,
        interval: Duration,
        shutdown: ShutdownSignal,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            grid,
            event_log,
            rng,
            interval,
            shutdown,
            ignitions: 0,
        }
    }

    /// Pick a random cell and try to ignite it
    pub fn tick(&mut self) -> Option<Coord> {
        let size = self.grid.size();
        let coord = Coord::new(self.rng.random_range(0..size), self.rng.random_range(0..size));
        self.tick_at(coord).then_some(coord)
    }

    /// Ignite `coord` if it is still a sensor; returns whether it was
    pub fn tick_at(&mut self, coord: Coord) -> bool {
        if self.grid.transition(coord, CellState::Sensor, CellState::OnFire) {
            self.ignitions += 1;
            self.event_log.emit(FireEvent::Ignition(coord));
            true
        } else {
            debug!(%coord, "Ignition target not a sensor; tick skipped");
            false
        }
    }

    /// Successful ignitions so far
    pub fn ignitions(&self) -> u64 {
        self.ignitions
    }

    /// Sleep one interval, then tick, until shutdown; returns the ignition count
    pub fn run(mut self) -> u64 {
        info!(interval_ms = self.interval.as_millis() as u64, "Ignition generator started");
        while self.shutdown.sleep(self.interval) {
            self.tick();
        }
        self.ignitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemoryEventLog;

    fn generator(size: usize, seed: u64) -> (IgnitionGenerator, Arc<Grid>, Arc<MemoryEventLog>) {
        let grid = Arc::new(Grid::new(size));
        let log = Arc::new(MemoryEventLog::new());
        let generator = IgnitionGenerator::new(
            Arc::clone(&grid),
            log.clone(),
            Some(seed),
            Duration::from_millis(1),
            ShutdownSignal::new(),
        );
        (generator, grid, log)
    }

    #[test]
    fn test_tick_ignites_sensor() {
        let (mut generator, grid, log) = generator(4, 7);
        let coord = generator.tick().expect("fresh grid is all sensors");
        assert_eq!(grid.state(coord), CellState::OnFire);
        assert_eq!(log.events(), vec![FireEvent::Ignition(coord)]);
        assert_eq!(generator.ignitions(), 1);
    }

    #[test]
    fn test_burned_target_is_skipped() {
        let (mut generator, grid, log) = generator(3, 1);
        let target = Coord::new(2, 2);
        grid.transition(target, CellState::Sensor, CellState::OnFire);
        grid.transition(target, CellState::OnFire, CellState::Burned);

        assert!(!generator.tick_at(target));
        assert_eq!(grid.state(target), CellState::Burned);
        assert!(log.is_empty());
        assert_eq!(generator.ignitions(), 0);
    }

    #[test]
    fn test_same_seed_same_targets() {
        let (mut a, _, _) = generator(30, 42);
        let (mut b, _, _) = generator(30, 42);
        let first: Vec<_> = (0..10).map(|_| a.tick()).collect();
        let second: Vec<_> = (0..10).map(|_| b.tick()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_cell_grid_ignites_once() {
        let (mut generator, grid, log) = generator(1, 3);
        assert_eq!(generator.tick(), Some(Coord::new(0, 0)));
        assert_eq!(generator.tick(), None);
        assert_eq!(grid.state(Coord::new(0, 0)), CellState::OnFire);
        assert_eq!(log.len(), 1);
    }
}
