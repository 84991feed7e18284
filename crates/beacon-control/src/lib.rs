pub mod axis;
pub mod law;
pub mod pid;

use serde::Deserialize;

pub use crate::axis::AxisStrategy;
pub use crate::law::ControlLaw;
pub use crate::pid::{PidConfig, PidController};

/// Tuning for the shipped proportional/dead-band law.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Frame size the detector reports coordinates in; setpoints are its center.
    pub frame_width: u32,
    pub frame_height: u32,

    pub yaw_gain: f64,
    pub yaw_max: f64,

    pub vertical_gain: f64,
    pub vertical_max: f64,

    /// Apparent size to hold. Calibrated per target (paddle ~100, cup ~40).
    pub ideal_extent: f64,
    pub extent_tolerance: f64,
    pub tilt_step: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            frame_width: 320,
            frame_height: 240,
            yaw_gain: 1.0,
            yaw_max: 0.5,
            vertical_gain: 1.0,
            vertical_max: 0.3,
            ideal_extent: 100.0,
            extent_tolerance: 30.0,
            tilt_step: 0.12,
        }
    }
}
