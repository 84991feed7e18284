use beacon_control::ControlLaw;
use beacon_proto::control::{ControlOutput, PendingAction};
use beacon_proto::detection::DetectionResult;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::safety::ErrorThrottle;
use crate::state::{FlightPhase, FlightStatus};
use crate::vehicle::{LedSignal, Vehicle, VehicleError, VideoChannel};
use crate::{FlightError, LoopConfig};

/// Connection/airborne state machine plus the per-tick control step.
///
/// ```text
/// DISCONNECTED -> CONNECTING -> READY <-> FLYING
///        any state -> ERROR on link failure
/// ```
pub struct FlightStateMachine {
    cfg: LoopConfig,
    law: ControlLaw,
    status: Arc<FlightStatus>,
    detection: watch::Receiver<DetectionResult>,
    output: watch::Sender<ControlOutput>,
    throttle: ErrorThrottle,
    led: Option<LedSignal>,
}

impl FlightStateMachine {
    pub fn new(
        cfg: LoopConfig,
        law: ControlLaw,
        status: Arc<FlightStatus>,
        detection: watch::Receiver<DetectionResult>,
    ) -> Self {
        let throttle = ErrorThrottle::new(cfg.error_log_interval());
        let (output, _) = watch::channel(ControlOutput::HOVER);
        Self { cfg, law, status, detection, output, throttle, led: None }
    }

    pub fn config(&self) -> &LoopConfig { &self.cfg }
    pub fn status(&self) -> &Arc<FlightStatus> { &self.status }
    pub fn phase(&self) -> FlightPhase { self.status.phase() }

    /// Last command sent to the vehicle (hover while idle).
    pub fn outputs(&self) -> watch::Receiver<ControlOutput> {
        self.output.subscribe()
    }

    /// Connect, wait for readiness and run the one-time configuration.
    /// Any failure here is fatal: the machine parks in `Error`.
    pub fn start<V: Vehicle + ?Sized>(&mut self, vehicle: &mut V) -> Result<(), FlightError> {
        self.status.set_phase(FlightPhase::Connecting);
        info!("fc: connecting (timeout {:?})", self.cfg.connect_timeout());

        let connected = vehicle
            .connect()
            .and_then(|_| vehicle.wait_for_ready(self.cfg.connect_timeout()));
        if let Err(e) = connected {
            error!("fc: connect failed: {}", e);
            self.status.set_phase(FlightPhase::Error);
            return Err(FlightError::Connect(e));
        }

        let configured = vehicle
            .clear_emergency()
            .and_then(|_| vehicle.select_video_channel(VideoChannel::Horizontal))
            .and_then(|_| vehicle.set_combined_yaw_mode(true))
            .and_then(|_| vehicle.trim());
        if let Err(e) = configured {
            error!("fc: configuration failed: {}", e);
            self.status.set_phase(FlightPhase::Error);
            return Err(FlightError::Configure(e));
        }

        self.status.set_connected(true);
        self.status.set_phase(FlightPhase::Ready);
        info!("fc: vehicle ready");
        Ok(())
    }

    /// One control step. Only link failures surface as `Err`.
    pub fn tick<V: Vehicle + ?Sized>(&mut self, vehicle: &mut V) -> Result<(), FlightError> {
        match self.phase() {
            FlightPhase::Ready | FlightPhase::Flying => {}
            _ => return Ok(()),
        }

        let det = *self.detection.borrow();
        if self.cfg.led_signal {
            self.signal(vehicle, det.found)?;
        }
        self.apply_pending(vehicle)?;
        self.steer(vehicle, &det)
    }

    fn signal<V: Vehicle + ?Sized>(&mut self, vehicle: &mut V, found: bool) -> Result<(), FlightError> {
        let want = if found { LedSignal::Green } else { LedSignal::Red };
        if self.led == Some(want) { return Ok(()); }
        if self.guard("led", vehicle.set_led(want))? {
            self.led = Some(want);
        }
        Ok(())
    }

    fn apply_pending<V: Vehicle + ?Sized>(&mut self, vehicle: &mut V) -> Result<(), FlightError> {
        match self.status.pending() {
            PendingAction::None => {}
            PendingAction::TakeOff => {
                if self.status.is_flying() {
                    warn!("fc: will not take off, already flying");
                } else if self.guard("takeoff", vehicle.take_off())? {
                    info!("fc: takeoff");
                    self.status.set_phase(FlightPhase::Flying);
                } else {
                    // transient failure, retried next tick
                    return Ok(());
                }
                self.status.clear_pending(PendingAction::TakeOff);
            }
            PendingAction::Land => {
                if !self.status.is_flying() {
                    warn!("fc: will not land, not flying");
                } else if self.guard("land", vehicle.land())? {
                    info!("fc: land");
                    self.status.set_phase(FlightPhase::Ready);
                } else {
                    return Ok(());
                }
                self.status.clear_pending(PendingAction::Land);
            }
        }
        Ok(())
    }

    fn steer<V: Vehicle + ?Sized>(&mut self, vehicle: &mut V, det: &DetectionResult) -> Result<(), FlightError> {
        if self.phase() != FlightPhase::Flying || !self.status.is_flying() {
            self.output.send_replace(ControlOutput::HOVER);
            return Ok(());
        }

        // never extrapolate from stale coordinates
        let cmd = if det.found { self.law.compute(det) } else { ControlOutput::HOVER };

        let sent = if cmd.is_zero() {
            self.guard("hover", vehicle.hover())?
        } else {
            debug!(
                "fc: move yaw={:.3} vz={:.3} tilt={:.3}",
                cmd.yaw_rate, cmd.vertical_speed, cmd.forward_back_tilt
            );
            self.guard(
                "move",
                vehicle.move_axes(cmd.left_right_tilt, cmd.forward_back_tilt, cmd.vertical_speed, cmd.yaw_rate),
            )?
        };
        if sent {
            self.output.send_replace(cmd);
        }
        Ok(())
    }

    /// Ok(true): command went through. Ok(false): transient failure, logged.
    fn guard(&mut self, what: &str, res: Result<(), VehicleError>) -> Result<bool, FlightError> {
        match res {
            Ok(()) => Ok(true),
            Err(e) if e.is_fatal() => {
                let phase = self.phase();
                error!("fc: {} failed, link lost: {}", what, e);
                self.status.set_phase(FlightPhase::Error);
                Err(FlightError::Link { phase, source: e })
            }
            Err(e) => {
                self.throttle.report(what, &e);
                Ok(false)
            }
        }
    }
}
