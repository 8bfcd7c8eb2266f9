//! In-memory event sink for tests and run summaries

use super::{EventLog, EventRecord, FireEvent};
use std::sync::{Mutex, PoisonError};

/// Keeps every record in emission order
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    records: Mutex<Vec<EventRecord>>,
}

impl MemoryEventLog {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record so far
    pub fn records(&self) -> Vec<EventRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events without timestamps, in emission order
    pub fn events(&self) -> Vec<FireEvent> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|r| r.event)
            .collect()
    }

    /// Number of recorded events matching `predicate`
    pub fn count_where(&self, predicate: impl Fn(&FireEvent) -> bool) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| predicate(&r.event))
            .count()
    }

    /// Number of records kept
    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been logged yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventLog for MemoryEventLog {
    fn emit(&self, event: FireEvent) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(EventRecord::now(event));
    }
}
