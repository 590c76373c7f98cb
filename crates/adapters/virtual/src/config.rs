//! Simulation mode configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::outlet::Faults;

/// Replace every configured outlet by a virtual one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub enabled: bool,
    /// State every virtual outlet starts in.
    pub initially_on: bool,
    /// Artificial delay of every call, in milliseconds.
    pub latency_ms: u64,
}

impl SimulationConfig {
    /// Faults applied to every simulated outlet.
    #[must_use]
    pub fn faults(&self) -> Faults {
        Faults {
            latency: Duration::from_millis(self.latency_ms),
            ..Faults::default()
        }
    }
}
