pub mod machine;
pub mod runner;
pub mod safety;
pub mod sim;
pub mod state;
pub mod vehicle;

use serde::Deserialize;
use std::time::Duration;

pub use crate::machine::FlightStateMachine;
pub use crate::runner::ControlLoop;
pub use crate::state::{FlightPhase, FlightStatus};
pub use crate::vehicle::{LedSignal, Vehicle, VehicleError, VideoChannel};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Control tick period.
    pub tick_ms: u64,

    /// Bounded wait for the vehicle's readiness signal; no retry on expiry.
    pub connect_timeout_ms: u64,

    /// Repeated actuation failures are logged at most once per interval.
    pub error_log_interval_ms: u64,

    /// Drive the vehicle LEDs green/red on target found/lost.
    pub led_signal: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_ms: 5,
            connect_timeout_ms: 8000,
            error_log_interval_ms: 1000,
            led_signal: true,
        }
    }
}

impl LoopConfig {
    pub fn tick(&self) -> Duration { Duration::from_millis(self.tick_ms.max(1)) }
    pub fn connect_timeout(&self) -> Duration { Duration::from_millis(self.connect_timeout_ms) }
    pub fn error_log_interval(&self) -> Duration { Duration::from_millis(self.error_log_interval_ms) }
}

#[derive(Debug, thiserror::Error)]
pub enum FlightError {
    #[error("vehicle connect failed: {0}")]
    Connect(#[source] VehicleError),

    #[error("vehicle configuration failed: {0}")]
    Configure(#[source] VehicleError),

    #[error("vehicle link lost while {phase}: {source}")]
    Link {
        phase: FlightPhase,
        #[source]
        source: VehicleError,
    },
}
