use beacon_proto::control::PendingAction;
use beacon_proto::telemetry::{BatteryLevel, VehicleStatus};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FlightPhase {
    Disconnected = 0,
    Connecting = 1,
    Ready = 2,
    Flying = 3,
    Error = 4,
}

impl FlightPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => FlightPhase::Connecting,
            2 => FlightPhase::Ready,
            3 => FlightPhase::Flying,
            4 => FlightPhase::Error,
            _ => FlightPhase::Disconnected,
        }
    }
}

impl fmt::Display for FlightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlightPhase::Disconnected => "disconnected",
            FlightPhase::Connecting => "connecting",
            FlightPhase::Ready => "ready",
            FlightPhase::Flying => "flying",
            FlightPhase::Error => "error",
        };
        f.write_str(s)
    }
}

/// Cross-thread flight state. Each field has a single writer: telemetry owns
/// `flying`/battery, the operator sets `pending`, the control loop owns the
/// rest and clears `pending`.
#[derive(Debug, Default)]
pub struct FlightStatus {
    connected: AtomicBool,
    flying: AtomicBool,
    battery: AtomicU8,
    pending: AtomicU8,
    phase: AtomicU8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightSnapshot {
    pub phase: FlightPhase,
    pub connected: bool,
    pub flying: bool,
    pub battery_percent: u8,
    pub pending: PendingAction,
}

impl FlightSnapshot {
    pub fn battery_level(&self) -> BatteryLevel {
        BatteryLevel::from_percent(self.battery_percent)
    }
}

impl FlightStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Telemetry callback.
    pub fn on_status(&self, st: VehicleStatus) {
        self.flying.store(st.flying, Ordering::Release);
        self.battery.store(st.battery_percent.min(100), Ordering::Relaxed);
    }

    pub fn request(&self, action: PendingAction) {
        self.pending.store(action as u8, Ordering::Release);
    }

    pub fn pending(&self) -> PendingAction {
        PendingAction::from_u8(self.pending.load(Ordering::Acquire))
    }

    /// Clear `handled` unless the operator replaced it in the meantime.
    pub fn clear_pending(&self, handled: PendingAction) -> bool {
        self.pending
            .compare_exchange(handled as u8, PendingAction::None as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_flying(&self) -> bool { self.flying.load(Ordering::Acquire) }
    pub fn is_connected(&self) -> bool { self.connected.load(Ordering::Acquire) }
    pub fn battery_percent(&self) -> u8 { self.battery.load(Ordering::Relaxed) }
    pub fn phase(&self) -> FlightPhase { FlightPhase::from_u8(self.phase.load(Ordering::Acquire)) }

    pub(crate) fn set_connected(&self, v: bool) { self.connected.store(v, Ordering::Release); }
    pub(crate) fn set_phase(&self, p: FlightPhase) { self.phase.store(p as u8, Ordering::Release); }

    pub fn snapshot(&self) -> FlightSnapshot {
        FlightSnapshot {
            phase: self.phase(),
            connected: self.is_connected(),
            flying: self.is_flying(),
            battery_percent: self.battery_percent(),
            pending: self.pending(),
        }
    }
}
