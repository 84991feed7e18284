use serde::{Deserialize, Serialize};

/// One actuation sample. Each axis is already clamped by the control law.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlOutput {
    pub yaw_rate: f32,
    pub vertical_speed: f32,
    pub forward_back_tilt: f32,
    /// Strafing is never used for centering; always zero.
    pub left_right_tilt: f32,
}

impl ControlOutput {
    pub const HOVER: Self = Self {
        yaw_rate: 0.0,
        vertical_speed: 0.0,
        forward_back_tilt: 0.0,
        left_right_tilt: 0.0,
    };

    pub fn is_zero(&self) -> bool {
        self.yaw_rate == 0.0
            && self.vertical_speed == 0.0
            && self.forward_back_tilt == 0.0
            && self.left_right_tilt == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PendingAction {
    None = 0,
    TakeOff = 1,
    Land = 2,
}

impl PendingAction {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => PendingAction::TakeOff,
            2 => PendingAction::Land,
            _ => PendingAction::None,
        }
    }
}
