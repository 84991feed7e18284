use std::sync::Arc;
use std::time::Duration;

use beacon_control::ControlLaw;
use beacon_fc::vehicle::{LedSignal, Vehicle, VehicleError, VideoChannel};
use beacon_fc::{FlightStateMachine, FlightStatus, LoopConfig};
use beacon_proto::detection::DetectionResult;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    WaitReady,
    Disconnect,
    ClearEmergency,
    Video(VideoChannel),
    CombinedYaw(bool),
    Trim,
    TakeOff,
    Land,
    Hover,
    /// left/right, front/back, vertical, yaw
    Move([f32; 4]),
    Led(LedSignal),
}

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Command,
    Link,
}

/// Records every call; optionally fails one named command.
#[derive(Debug, Default)]
pub struct MockVehicle {
    pub calls: Vec<Call>,
    pub never_ready: bool,
    pub fail: Option<(&'static str, Failure)>,
}

impl MockVehicle {
    pub fn failing(command: &'static str, kind: Failure) -> Self {
        Self { fail: Some((command, kind)), ..Default::default() }
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    fn record(&mut self, name: &'static str, call: Call) -> Result<(), VehicleError> {
        self.calls.push(call);
        match self.fail {
            Some((n, Failure::Command)) if n == name => {
                Err(VehicleError::Command { command: name, reason: "nack".into() })
            }
            Some((n, Failure::Link)) if n == name => Err(VehicleError::Link("socket closed".into())),
            _ => Ok(()),
        }
    }
}

impl Vehicle for MockVehicle {
    fn connect(&mut self) -> Result<(), VehicleError> { self.record("connect", Call::Connect) }

    fn wait_for_ready(&mut self, timeout: Duration) -> Result<(), VehicleError> {
        self.record("wait_for_ready", Call::WaitReady)?;
        if self.never_ready { return Err(VehicleError::Timeout(timeout)); }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), VehicleError> { self.record("disconnect", Call::Disconnect) }
    fn clear_emergency(&mut self) -> Result<(), VehicleError> { self.record("clear_emergency", Call::ClearEmergency) }

    fn select_video_channel(&mut self, channel: VideoChannel) -> Result<(), VehicleError> {
        self.record("video", Call::Video(channel))
    }

    fn set_combined_yaw_mode(&mut self, enabled: bool) -> Result<(), VehicleError> {
        self.record("combined_yaw", Call::CombinedYaw(enabled))
    }

    fn trim(&mut self) -> Result<(), VehicleError> { self.record("trim", Call::Trim) }
    fn take_off(&mut self) -> Result<(), VehicleError> { self.record("take_off", Call::TakeOff) }
    fn land(&mut self) -> Result<(), VehicleError> { self.record("land", Call::Land) }
    fn hover(&mut self) -> Result<(), VehicleError> { self.record("hover", Call::Hover) }

    fn move_axes(&mut self, left_right: f32, front_back: f32, vertical: f32, yaw: f32) -> Result<(), VehicleError> {
        self.record("move", Call::Move([left_right, front_back, vertical, yaw]))
    }

    fn set_led(&mut self, signal: LedSignal) -> Result<(), VehicleError> { self.record("led", Call::Led(signal)) }
}

pub struct Rig {
    pub machine: FlightStateMachine,
    pub status: Arc<FlightStatus>,
    pub detection: watch::Sender<DetectionResult>,
}

pub fn rig(cfg: LoopConfig) -> Rig {
    let status = Arc::new(FlightStatus::new());
    let (detection, rx) = watch::channel(DetectionResult::none());
    let machine = FlightStateMachine::new(cfg, ControlLaw::default(), status.clone(), rx);
    Rig { machine, status, detection }
}

pub fn quiet() -> LoopConfig {
    LoopConfig { led_signal: false, ..Default::default() }
}

pub fn seen(x: f64, y: f64, extent: f64) -> DetectionResult {
    DetectionResult { found: true, x, y, extent }
}
