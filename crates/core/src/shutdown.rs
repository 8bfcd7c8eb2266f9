//! Cooperative cancellation shared by every concurrent unit

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Inner {
    triggered: Mutex<bool>,
    wake: Condvar,
}

/// Cloneable stop flag with an interruptible sleep
///
/// Units sleep through [`ShutdownSignal::sleep`] instead of
/// `std::thread::sleep`, so triggering the signal wakes every sleeper
/// immediately rather than after its current interval.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    /// Untriggered signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown and wake every sleeper
    pub fn trigger(&self) {
        let mut triggered = self
            .inner
            .triggered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *triggered = true;
        self.inner.wake.notify_all();
    }

    /// Whether shutdown has been requested
    pub fn is_triggered(&self) -> bool {
        *self
            .inner
            .triggered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `interval` unless shutdown is requested first
    ///
    /// Returns `true` if the unit should keep running, `false` once shutdown
    /// has been triggered (before or during the sleep).
    pub fn sleep(&self, interval: Duration) -> bool {
        let triggered = self
            .inner
            .triggered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (triggered, _timeout) = self
            .inner
            .wake
            .wait_timeout_while(triggered, interval, |triggered| !*triggered)
            .unwrap_or_else(PoisonError::into_inner);
        !*triggered
    }
}
