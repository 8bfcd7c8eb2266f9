//! Running simulation: owns the grid and every concurrent unit
//!
//! [`Simulation::start`] builds the grid, spawns the coordinator, the sensor
//! watchers (per the configured [`SchedulingModel`]), the ignition generator
//! and the periodic renderer. [`Simulation::shutdown`] cancels them all and
//! joins every thread.
//!
//! Units share state only through the `Arc<Grid>`, the border notifier and
//! the shutdown signal handed to them at construction; there is no global
//! state.

pub mod summary;

pub use summary::RunSummary;

use crate::combat::CombatAction;
use crate::config::{SchedulingModel, SimulationConfig};
use crate::coordinator::{BorderNotifier, CentralCoordinator, CoordinatorStatus};
use crate::error::SimulationError;
use crate::events::EventLog;
use crate::grid::{CellState, Coord, Grid};
use crate::ignition::IgnitionGenerator;
use crate::render::{PeriodicRenderer, Renderer};
use crate::sensor::{SensorWatcher, SweepPool, WatchContext};
use crate::shutdown::ShutdownSignal;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Stack size for sensor watcher threads; they only poll and format log lines
const WATCHER_STACK_SIZE: usize = 256 * 1024;

/// A started unit thread
struct Unit {
    name: String,
    handle: JoinHandle<()>,
}

/// Handle to a running simulation
pub struct Simulation {
    config: SimulationConfig,
    grid: Arc<Grid>,
    notifier: Arc<BorderNotifier>,
    shutdown: ShutdownSignal,
    combat: CombatAction,
    coordinator: Arc<CoordinatorStatus>,
    units: Vec<Unit>,
    ignition: Option<JoinHandle<u64>>,
    started: Instant,
    /// Units allowed to start before spawning fails (`None` = unlimited)
    spawn_limit: Option<usize>,
}

fn spawn_named<T, F>(
    name: String,
    stack_size: Option<usize>,
    body: F,
) -> Result<JoinHandle<T>, SimulationError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let mut builder = thread::Builder::new().name(name.clone());
    if let Some(size) = stack_size {
        builder = builder.stack_size(size);
    }
    builder.spawn(body).map_err(|e| SimulationError::Spawn {
        unit: name,
        reason: e.to_string(),
    })
}

impl Simulation {
    /// Validate `config` and start every unit
    ///
    /// # Errors
    /// Returns [`SimulationError::InvalidConfig`] for a bad configuration and
    /// [`SimulationError::Spawn`] if any unit fails to start. On a spawn
    /// failure the units already running are stopped and joined first.
    pub fn start(
        config: SimulationConfig,
        event_log: Arc<dyn EventLog>,
        renderer: Arc<dyn Renderer>,
    ) -> Result<Self, SimulationError> {
        Self::launch(config, event_log, renderer, None)
    }

    /// Like [`start`](Self::start), but the unit after the first `limit`
    /// fails to spawn
    #[cfg(test)]
    pub(crate) fn start_with_spawn_limit(
        config: SimulationConfig,
        event_log: Arc<dyn EventLog>,
        renderer: Arc<dyn Renderer>,
        limit: usize,
    ) -> Result<Self, SimulationError> {
        Self::launch(config, event_log, renderer, Some(limit))
    }

    fn launch(
        config: SimulationConfig,
        event_log: Arc<dyn EventLog>,
        renderer: Arc<dyn Renderer>,
        spawn_limit: Option<usize>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;

        let grid = Arc::new(Grid::new(config.grid_size));
        let notifier = Arc::new(BorderNotifier::new());
        let shutdown = ShutdownSignal::new();

        let coordinator = CentralCoordinator::new(
            Arc::clone(&grid),
            Arc::clone(&notifier),
            Arc::clone(&event_log),
            Arc::clone(&renderer),
        );

        let mut sim = Self {
            combat: CombatAction::new(Arc::clone(&grid), Arc::clone(&event_log)),
            coordinator: coordinator.status(),
            config,
            grid,
            notifier,
            shutdown,
            units: Vec::new(),
            ignition: None,
            started: Instant::now(),
            spawn_limit,
        };

        if let Err(e) = sim.spawn_units(coordinator, &event_log, &renderer) {
            error!("Simulation startup failed: {e}");
            // Best effort: the spawn error is the one worth reporting
            let _ = sim.stop_and_join();
            return Err(e);
        }

        info!(
            grid_size = sim.config.grid_size,
            units = sim.units.len() + 1,
            scheduling = ?sim.config.scheduling,
            "Simulation started"
        );
        Ok(sim)
    }

    fn spawn_units(
        &mut self,
        coordinator: CentralCoordinator,
        event_log: &Arc<dyn EventLog>,
        renderer: &Arc<dyn Renderer>,
    ) -> Result<(), SimulationError> {
        self.push_unit("central-coordinator".to_string(), None, move || {
            coordinator.run();
        })?;

        let context = Arc::new(WatchContext::new(
            Arc::clone(&self.grid),
            Arc::clone(&self.notifier),
            Arc::clone(event_log),
        ));
        match self.config.scheduling {
            SchedulingModel::ThreadPerCell => {
                let coords: Vec<Coord> = self.grid.coords().collect();
                for coord in coords {
                    let watcher = SensorWatcher::new(
                        coord,
                        Arc::clone(&context),
                        self.config.watch_interval,
                        self.shutdown.clone(),
                    );
                    self.push_unit(
                        format!("sensor-{}-{}", coord.row, coord.col),
                        Some(WATCHER_STACK_SIZE),
                        move || watcher.run(),
                    )?;
                }
            }
            SchedulingModel::PooledSweep { workers } => {
                let pool = SweepPool::new(
                    context,
                    workers,
                    self.config.watch_interval,
                    self.shutdown.clone(),
                )?;
                self.push_unit("sensor-sweep".to_string(), None, move || pool.run())?;
            }
        }

        let generator = IgnitionGenerator::new(
            Arc::clone(&self.grid),
            Arc::clone(event_log),
            self.config.seed,
            self.config.ignition_interval,
            self.shutdown.clone(),
        );
        self.ignition = Some(self.spawn_unit(
            "ignition-generator".to_string(),
            None,
            move || generator.run(),
        )?);

        let periodic = PeriodicRenderer::new(
            Arc::clone(&self.grid),
            Arc::clone(renderer),
            self.config.render_interval,
            self.shutdown.clone(),
        );
        self.push_unit("periodic-renderer".to_string(), None, move || periodic.run())?;
        Ok(())
    }

    fn push_unit<F>(
        &mut self,
        name: String,
        stack_size: Option<usize>,
        body: F,
    ) -> Result<(), SimulationError>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = self.spawn_unit(name.clone(), stack_size, body)?;
        self.units.push(Unit { name, handle });
        Ok(())
    }

    fn spawn_unit<T, F>(
        &self,
        name: String,
        stack_size: Option<usize>,
        body: F,
    ) -> Result<JoinHandle<T>, SimulationError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let started = self.units.len() + usize::from(self.ignition.is_some());
        if self.spawn_limit.is_some_and(|limit| started >= limit) {
            return Err(SimulationError::Spawn {
                unit: name,
                reason: format!("unit limit of {started} reached"),
            });
        }
        spawn_named(name, stack_size, body)
    }

    /// The shared grid
    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    /// Configuration the simulation was started with
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The coordinator's observable phase and activation count
    pub fn coordinator_status(&self) -> &Arc<CoordinatorStatus> {
        &self.coordinator
    }

    /// Extinguish the cell at `coord` if it is burning; see [`CombatAction::apply`]
    ///
    /// # Panics
    /// Panics if `coord` lies outside the grid.
    pub fn combat(&self, coord: Coord) -> bool {
        self.combat.apply(coord)
    }

    /// Clone of the cancellation signal, for callers that want to stop the
    /// simulation from another thread
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Time since start
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Block the calling thread until shutdown is triggered elsewhere
    pub fn wait(&self) {
        while self.shutdown.sleep(Duration::from_secs(3600)) {}
    }

    /// Block for `duration` or until shutdown is triggered elsewhere
    pub fn run_for(&self, duration: Duration) {
        self.shutdown.sleep(duration);
    }

    /// Cancel every unit, join them, and summarize the run
    ///
    /// # Errors
    /// Returns [`SimulationError::UnitPanicked`] naming the first unit that
    /// panicked. Every other unit is still joined.
    pub fn shutdown(mut self) -> Result<RunSummary, SimulationError> {
        let ignitions = self.stop_and_join()?;
        let summary = RunSummary {
            grid_size: self.grid.size(),
            sensors: self.grid.count(CellState::Sensor),
            on_fire: self.grid.count(CellState::OnFire),
            burned: self.grid.count(CellState::Burned),
            ignitions,
            border_signals: self.notifier.raised(),
            coordinator_activations: self.coordinator.activations(),
            elapsed: self.started.elapsed(),
        };
        info!("Simulation stopped: {summary}");
        Ok(summary)
    }

    /// Trigger cancellation and join everything started so far
    fn stop_and_join(&mut self) -> Result<u64, SimulationError> {
        self.shutdown.trigger();
        self.notifier.close();

        let mut first_panic = None;
        let mut ignitions = 0;
        if let Some(handle) = self.ignition.take() {
            match handle.join() {
                Ok(count) => ignitions = count,
                Err(_) => {
                    error!("ignition-generator panicked");
                    first_panic.get_or_insert_with(|| "ignition-generator".to_string());
                }
            }
        }
        for unit in self.units.drain(..) {
            if unit.handle.join().is_err() {
                error!("{} panicked", unit.name);
                first_panic.get_or_insert(unit.name);
            }
        }

        match first_panic {
            Some(unit) => Err(SimulationError::UnitPanicked { unit }),
            None => Ok(ignitions),
        }
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        if !self.units.is_empty() || self.ignition.is_some() {
            let _ = self.stop_and_join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{FireEvent, MemoryEventLog};
    use crate::render::RecordingRenderer;

    fn fast_config(size: usize) -> SimulationConfig {
        SimulationConfig::default()
            .with_grid_size(size)
            .with_watch_interval(Duration::from_millis(5))
            .with_ignition_interval(Duration::from_secs(3600))
            .with_render_interval(Duration::from_secs(3600))
            .with_seed(11)
    }

    #[test]
    fn test_start_rejects_invalid_config() {
        let result = Simulation::start(
            fast_config(0),
            Arc::new(MemoryEventLog::new()),
            Arc::new(RecordingRenderer::new()),
        );
        assert!(matches!(result, Err(SimulationError::InvalidConfig { .. })));
    }

    #[test]
    fn test_start_rejects_oversized_grid_before_allocating() {
        let result = Simulation::start(
            fast_config(100_000),
            Arc::new(MemoryEventLog::new()),
            Arc::new(RecordingRenderer::new()),
        );
        assert!(matches!(
            result,
            Err(SimulationError::InvalidConfig { field: "grid_size", .. })
        ));
    }

    #[test]
    fn test_spawn_failure_stops_and_joins_started_units() {
        let log = Arc::new(MemoryEventLog::new());
        let renderer = Arc::new(RecordingRenderer::new());
        // Coordinator plus 5 of the 9 sensor watchers start; the 6th unit fails
        let config = fast_config(3).with_watch_interval(Duration::from_secs(3600));

        let begin = Instant::now();
        let result = Simulation::start_with_spawn_limit(config, log.clone(), renderer.clone(), 6);

        match result {
            Err(SimulationError::Spawn { unit, .. }) => assert_eq!(unit, "sensor-1-2"),
            Err(other) => panic!("expected a spawn error, got {other}"),
            Ok(_) => panic!("start succeeded past the spawn limit"),
        }
        // Sleeping units were cancelled, not waited out
        assert!(begin.elapsed() < Duration::from_secs(5));
        // Every started thread was joined and dropped its handles
        assert_eq!(Arc::strong_count(&log), 1);
        assert_eq!(Arc::strong_count(&renderer), 1);
    }

    #[test]
    fn test_spawn_failure_late_in_startup_still_joins() {
        let log = Arc::new(MemoryEventLog::new());
        let renderer = Arc::new(RecordingRenderer::new());
        let config = fast_config(2).with_scheduling(SchedulingModel::PooledSweep { workers: 2 });

        // Coordinator, sweep and ignition start; the periodic renderer fails
        let result = Simulation::start_with_spawn_limit(config, log.clone(), renderer.clone(), 3);

        assert!(matches!(
            result,
            Err(SimulationError::Spawn { ref unit, .. }) if unit == "periodic-renderer"
        ));
        assert_eq!(Arc::strong_count(&log), 1);
        assert_eq!(Arc::strong_count(&renderer), 1);
    }

    #[test]
    fn test_forced_fire_spreads_and_reaches_coordinator() {
        let log = Arc::new(MemoryEventLog::new());
        let renderer = Arc::new(RecordingRenderer::new());
        let sim = Simulation::start(fast_config(5), log.clone(), renderer.clone()).unwrap();

        sim.grid().transition(Coord::new(2, 2), CellState::Sensor, CellState::OnFire);

        let deadline = Instant::now() + Duration::from_secs(10);
        while sim.grid().count(CellState::OnFire) < 25 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        while sim.coordinator_status().activations() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        assert!(sim.combat(Coord::new(2, 2)));
        assert!(!sim.combat(Coord::new(2, 2)));

        let summary = sim.shutdown().unwrap();
        assert_eq!(summary.on_fire, 24);
        assert_eq!(summary.burned, 1);
        assert_eq!(summary.sensors, 0);
        assert!(summary.coordinator_activations >= 1);
        assert!(summary.border_signals >= summary.coordinator_activations);
        assert_eq!(log.count_where(|e| matches!(e, FireEvent::Combat(_))), 1);
        assert!(renderer.render_count() >= 1);
    }

    #[test]
    fn test_pooled_scheduling_runs() {
        let config = fast_config(6).with_scheduling(SchedulingModel::PooledSweep { workers: 3 });
        let sim = Simulation::start(
            config,
            Arc::new(MemoryEventLog::new()),
            Arc::new(RecordingRenderer::new()),
        )
        .unwrap();

        sim.grid().transition(Coord::new(0, 5), CellState::Sensor, CellState::OnFire);
        let deadline = Instant::now() + Duration::from_secs(10);
        while sim.grid().count(CellState::OnFire) < 36 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        let summary = sim.shutdown().unwrap();
        assert_eq!(summary.on_fire, 36);
    }

    #[test]
    fn test_wait_returns_once_triggered_from_another_thread() {
        let sim = Simulation::start(
            fast_config(3),
            Arc::new(MemoryEventLog::new()),
            Arc::new(RecordingRenderer::new()),
        )
        .unwrap();

        let signal = sim.shutdown_signal();
        let trigger = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            signal.trigger();
        });

        let begin = Instant::now();
        sim.wait();
        assert!(begin.elapsed() < Duration::from_secs(5));
        trigger.join().unwrap();

        let summary = sim.shutdown().unwrap();
        assert_eq!(summary.grid_size, 3);
    }

    #[test]
    fn test_shutdown_is_prompt() {
        let config = fast_config(4).with_watch_interval(Duration::from_secs(3600));
        let sim = Simulation::start(
            config,
            Arc::new(MemoryEventLog::new()),
            Arc::new(RecordingRenderer::new()),
        )
        .unwrap();

        let start = Instant::now();
        let summary = sim.shutdown().unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(summary.sensors, 16);
        assert_eq!(summary.ignitions, 0);
    }
}
