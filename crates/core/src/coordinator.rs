//! Border notification channel and the central coordinator
//!
//! Border watchers raise a [`BorderNotifier`] signal; the single
//! [`CentralCoordinator`] blocks on it, logs the escalation and renders the
//! grid.
//!
//! # Coalescing
//!
//! The notifier carries a pending flag, not a count. Any number of signals
//! raised before the coordinator next wakes collapse into one activation.
//! A signal raised while the coordinator is busy is never lost: the flag is
//! checked before the coordinator goes back to waiting.

use crate::events::{EventLog, FireEvent};
use crate::grid::Grid;
use crate::render::Renderer;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

/// Phases kept in [`CoordinatorStatus::transitions`]
pub const PHASE_HISTORY_LEN: usize = 16;

#[derive(Debug, Default)]
struct NotifierState {
    pending: bool,
    closed: bool,
}

/// Wait/notify channel from border watchers to the coordinator
#[derive(Debug, Default)]
pub struct BorderNotifier {
    state: Mutex<NotifierState>,
    wake: Condvar,
    /// Signals raised, including ones later coalesced
    raised: AtomicU64,
}

impl BorderNotifier {
    /// Open channel with no pending signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal and wake the coordinator if it is waiting
    pub fn notify(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.pending = true;
        self.raised.fetch_add(1, Ordering::Relaxed);
        self.wake.notify_one();
    }

    /// Stop the channel; a blocked [`wait`](Self::wait) returns `false`
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.closed = true;
        self.wake.notify_all();
    }

    /// Block until a signal is pending (consuming it) or the channel closes
    ///
    /// Returns `true` for a consumed signal, `false` once closed. A signal
    /// pending at close time is still delivered first.
    pub fn wait(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self
            .wake
            .wait_while(state, |s| !s.pending && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        Self::consume(&mut state)
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`
    ///
    /// Returns `Some(true)` for a consumed signal, `Some(false)` if closed and
    /// `None` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<bool> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut state, result) = self
            .wake
            .wait_timeout_while(state, timeout, |s| !s.pending && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        if result.timed_out() && !state.pending && !state.closed {
            return None;
        }
        Some(Self::consume(&mut state))
    }

    fn consume(state: &mut NotifierState) -> bool {
        if state.pending {
            state.pending = false;
            true
        } else {
            false
        }
    }

    /// Whether a signal is waiting to be consumed
    pub fn is_pending(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
    }

    /// Total signals raised since creation
    pub fn raised(&self) -> u64 {
        self.raised.load(Ordering::Relaxed)
    }
}

/// Observable phase of the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinatorPhase {
    /// Waiting for a border notification
    Idle,
    /// Logging and rendering in response to one
    Handling,
}

/// Shared view of the coordinator's progress
#[derive(Debug)]
pub struct CoordinatorStatus {
    phase: Mutex<CoordinatorPhase>,
    activations: AtomicU64,
    /// Most recent phases entered, oldest first
    transitions: Mutex<VecDeque<CoordinatorPhase>>,
}

impl Default for CoordinatorStatus {
    fn default() -> Self {
        Self {
            phase: Mutex::new(CoordinatorPhase::Idle),
            activations: AtomicU64::new(0),
            transitions: Mutex::new(VecDeque::from([CoordinatorPhase::Idle])),
        }
    }
}

impl CoordinatorStatus {
    /// Current phase
    pub fn phase(&self) -> CoordinatorPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Completed `Idle → Handling → Idle` cycles
    pub fn activations(&self) -> u64 {
        self.activations.load(Ordering::Acquire)
    }

    /// The last [`PHASE_HISTORY_LEN`] phases entered, oldest first
    ///
    /// A fresh status holds just `[Idle]`.
    pub fn transitions(&self) -> Vec<CoordinatorPhase> {
        self.transitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }

    fn enter(&self, next: CoordinatorPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = next;
        let mut history = self.transitions.lock().unwrap_or_else(PoisonError::into_inner);
        if history.len() == PHASE_HISTORY_LEN {
            history.pop_front();
        }
        history.push_back(next);
    }
}

/// The single consumer of border notifications
pub struct CentralCoordinator {
    grid: Arc<Grid>,
    notifier: Arc<BorderNotifier>,
    event_log: Arc<dyn EventLog>,
    renderer: Arc<dyn Renderer>,
    status: Arc<CoordinatorStatus>,
}

impl CentralCoordinator {
    /// Coordinator rendering `grid` through `renderer` on each activation
    pub fn new(
        grid: Arc<Grid>,
        notifier: Arc<BorderNotifier>,
        event_log: Arc<dyn EventLog>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            grid,
            notifier,
            event_log,
            renderer,
            status: Arc::new(CoordinatorStatus::default()),
        }
    }

    /// Handle to the coordinator's observable status
    pub fn status(&self) -> Arc<CoordinatorStatus> {
        Arc::clone(&self.status)
    }

    /// Handle notifications until the notifier is closed
    pub fn run(&self) {
        info!("Central coordinator waiting for border notifications");
        while self.notifier.wait() {
            self.handle_notification();
        }
        info!(
            activations = self.status.activations(),
            "Central coordinator stopped"
        );
    }

    /// One `Idle → Handling → Idle` cycle: log, render, go idle
    ///
    /// Runs without holding the notifier lock or any cell guard, so watchers
    /// keep signalling and propagating while the grid is rendered.
    pub fn handle_notification(&self) {
        self.status.enter(CoordinatorPhase::Handling);
        debug!("Coordinator handling border notification");
        self.event_log.emit(FireEvent::CoordinatorNotified);
        self.renderer.render(&self.grid.snapshot());
        self.status.activations.fetch_add(1, Ordering::Release);
        self.status.enter(CoordinatorPhase::Idle);
    }
}
