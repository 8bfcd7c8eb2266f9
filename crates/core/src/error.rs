//! Error type for simulation startup and shutdown

use std::error::Error;
use std::fmt;

/// Failures surfaced by [`Simulation`](crate::Simulation)
///
/// Coordinate misuse is not represented here: an out-of-range coordinate is a
/// programming error and panics at the access site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// A configuration value cannot produce a working simulation
    InvalidConfig {
        /// Name of the offending field (e.g. `"grid_size"`)
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
    /// A concurrent unit could not be started; the simulation cannot run
    /// with missing units
    Spawn {
        /// Unit that failed (e.g. `"sensor (3, 4)"`)
        unit: String,
        /// Underlying OS or pool error
        reason: String,
    },
    /// A unit panicked and was reported when joined at shutdown
    UnitPanicked {
        /// Name of the unit's thread
        unit: String,
    },
}

impl SimulationError {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::InvalidConfig { field, reason } => {
                write!(f, "invalid configuration '{field}': {reason}")
            }
            SimulationError::Spawn { unit, reason } => {
                write!(f, "failed to start {unit}: {reason}")
            }
            SimulationError::UnitPanicked { unit } => write!(f, "{unit} panicked"),
        }
    }
}

impl Error for SimulationError {}
