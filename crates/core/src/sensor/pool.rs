//! Pooled scheduling: a rayon pool sweeps every cell once per interval
//!
//! Same observable contract as one thread per watcher, but with a bounded
//! number of OS threads. Within a sweep, cells are polled in parallel
//! batches in no particular order.

use super::{PollOutcome, WatchContext};
use crate::error::SimulationError;
use crate::grid::Coord;
use crate::shutdown::ShutdownSignal;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Totals for one sweep over the grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Cells found burning
    pub detections: usize,
    /// Neighbors newly set on fire
    pub ignited: usize,
    /// Border notifications raised
    pub border_notifications: usize,
}

impl SweepStats {
    fn add(mut self, outcome: &PollOutcome) -> Self {
        if let PollOutcome::FireDetected {
            ignited,
            border_notified,
        } = outcome
        {
            self.detections += 1;
            self.ignited += ignited.len();
            self.border_notifications += usize::from(*border_notified);
        }
        self
    }

    fn merge(self, other: Self) -> Self {
        Self {
            detections: self.detections + other.detections,
            ignited: self.ignited + other.ignited,
            border_notifications: self.border_notifications + other.border_notifications,
        }
    }
}

/// Work-stealing replacement for per-cell watcher threads
pub struct SweepPool {
    context: Arc<WatchContext>,
    coords: Vec<Coord>,
    pool: rayon::ThreadPool,
    interval: Duration,
    shutdown: ShutdownSignal,
}

impl SweepPool {
    /// Build a pool of `workers` threads over every cell of the context's grid
    ///
    /// # Errors
    /// Returns [`SimulationError::Spawn`] if the worker threads cannot be
    /// started.
    pub fn new(
        context: Arc<WatchContext>,
        workers: usize,
        interval: Duration,
        shutdown: ShutdownSignal,
    ) -> Result<Self, SimulationError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sensor-sweep-{i}"))
            .build()
            .map_err(|e| SimulationError::Spawn {
                unit: "sensor sweep pool".to_string(),
                reason: e.to_string(),
            })?;
        let coords = context.grid().coords().collect();
        info!(workers, "Sensor sweep pool ready");
        Ok(Self {
            context,
            coords,
            pool,
            interval,
            shutdown,
        })
    }

    /// Poll every cell once, in parallel
    pub fn sweep_once(&self) -> SweepStats {
        let context = &self.context;
        let stats = self.pool.install(|| {
            self.coords
                .par_iter()
                .map(|&coord| context.poll(coord))
                .fold(SweepStats::default, |acc, outcome| acc.add(&outcome))
                .reduce(SweepStats::default, SweepStats::merge)
        });
        if stats.detections > 0 {
            debug!(
                detections = stats.detections,
                ignited = stats.ignited,
                border = stats.border_notifications,
                "Sweep complete"
            );
        }
        stats
    }

    /// Sweep, then sleep one interval, until shutdown
    pub fn run(&self) {
        loop {
            self.sweep_once();
            if !self.shutdown.sleep(self.interval) {
                break;
            }
        }
    }
}
