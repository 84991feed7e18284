use serde::{Deserialize, Serialize};

use crate::control::ControlOutput;
use crate::detection::DetectionResult;

/// Status update pushed by the vehicle's telemetry feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleStatus {
    pub battery_percent: u8,
    pub flying: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatteryLevel {
    Critical,
    Low,
    Ok,
}

impl BatteryLevel {
    pub fn from_percent(p: u8) -> Self {
        if p < 15 {
            BatteryLevel::Critical
        } else if p < 50 {
            BatteryLevel::Low
        } else {
            BatteryLevel::Ok
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    pub ts_unix_ms: i64,
    pub phase: String,
    pub connected: bool,
    pub flying: bool,
    pub battery_percent: u8,
    pub battery: BatteryLevel,
    pub detection: DetectionResult,
    pub output: ControlOutput,
}
