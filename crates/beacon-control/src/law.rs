use beacon_proto::control::ControlOutput;
use beacon_proto::detection::DetectionResult;
use tracing::debug;

use crate::axis::AxisStrategy;
use crate::ControlConfig;

/// Shipped control law: proportional yaw and vertical, dead-band
/// forward/back, no strafing. Stateless.
#[derive(Debug, Clone)]
pub struct ControlLaw {
    yaw: AxisStrategy,
    vertical: AxisStrategy,
    forward_back: AxisStrategy,
}

impl ControlLaw {
    pub fn new(cfg: &ControlConfig) -> Self {
        let half_w = cfg.frame_width.max(1) as f64 / 2.0;
        let half_h = cfg.frame_height.max(1) as f64 / 2.0;
        debug!(
            "control: yaw ±{} vertical ±{} extent {}±{} step {}",
            cfg.yaw_max, cfg.vertical_max, cfg.ideal_extent, cfg.extent_tolerance, cfg.tilt_step
        );
        Self {
            yaw: AxisStrategy::Proportional {
                setpoint: half_w,
                span: half_w,
                gain: cfg.yaw_gain,
                max: cfg.yaw_max,
                invert: false,
            },
            vertical: AxisStrategy::Proportional {
                setpoint: half_h,
                span: half_h,
                gain: cfg.vertical_gain,
                max: cfg.vertical_max,
                invert: true,
            },
            forward_back: AxisStrategy::DeadBand {
                ideal: cfg.ideal_extent,
                tolerance: cfg.extent_tolerance,
                step: cfg.tilt_step,
            },
        }
    }

    pub fn yaw(&self) -> &AxisStrategy { &self.yaw }
    pub fn vertical(&self) -> &AxisStrategy { &self.vertical }
    pub fn forward_back(&self) -> &AxisStrategy { &self.forward_back }

    /// Commands for one detection. Callers must not act on the result when
    /// `det.found` is false; the values are still finite and in range.
    pub fn compute(&self, det: &DetectionResult) -> ControlOutput {
        ControlOutput {
            yaw_rate: self.yaw.output(det.x),
            vertical_speed: self.vertical.output(det.y),
            forward_back_tilt: self.forward_back.output(det.extent),
            left_right_tilt: 0.0,
        }
    }
}

impl Default for ControlLaw {
    fn default() -> Self {
        Self::new(&ControlConfig::default())
    }
}
