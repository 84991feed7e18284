use beacon_proto::frame::RawFrame;
use beacon_proto::telemetry::VehicleStatus;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum VehicleError {
    #[error("cannot resolve vehicle host {host}: {reason}")]
    Resolve { host: String, reason: String },

    #[error("no readiness signal within {0:?}")]
    Timeout(Duration),

    #[error("link down: {0}")]
    Link(String),

    #[error("{command} rejected: {reason}")]
    Command { command: &'static str, reason: String },
}

impl VehicleError {
    /// Link-level failures end the session; command failures are transient.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, VehicleError::Command { .. })
    }
}

impl From<std::io::Error> for VehicleError {
    fn from(e: std::io::Error) -> Self {
        VehicleError::Link(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoChannel {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedSignal {
    Green,
    Red,
}

pub type FrameSink = Box<dyn FnMut(&RawFrame<'_>) + Send>;
pub type StatusSink = Box<dyn FnMut(VehicleStatus) + Send>;

/// Command side of a vehicle link. Frames and telemetry flow back through
/// the sinks handed to the concrete adapter, on the adapter's own threads.
pub trait Vehicle: Send {
    fn connect(&mut self) -> Result<(), VehicleError>;
    fn wait_for_ready(&mut self, timeout: Duration) -> Result<(), VehicleError>;
    fn disconnect(&mut self) -> Result<(), VehicleError>;

    fn clear_emergency(&mut self) -> Result<(), VehicleError>;
    fn select_video_channel(&mut self, channel: VideoChannel) -> Result<(), VehicleError>;
    fn set_combined_yaw_mode(&mut self, enabled: bool) -> Result<(), VehicleError>;
    fn trim(&mut self) -> Result<(), VehicleError>;

    fn take_off(&mut self) -> Result<(), VehicleError>;
    fn land(&mut self) -> Result<(), VehicleError>;
    fn hover(&mut self) -> Result<(), VehicleError>;
    fn move_axes(&mut self, left_right: f32, front_back: f32, vertical: f32, yaw: f32) -> Result<(), VehicleError>;

    fn set_led(&mut self, _signal: LedSignal) -> Result<(), VehicleError> {
        Ok(())
    }
}
