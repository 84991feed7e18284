use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::machine::FlightStateMachine;
use crate::state::{FlightPhase, FlightStatus};
use crate::vehicle::Vehicle;
use crate::FlightError;

/// The dedicated control thread body: start the vehicle, tick at a fixed
/// period while `running` is set, disconnect no matter how the loop ends.
pub struct ControlLoop<V: Vehicle> {
    vehicle: V,
    machine: FlightStateMachine,
    running: Arc<AtomicBool>,
}

impl<V: Vehicle> ControlLoop<V> {
    pub fn new(vehicle: V, machine: FlightStateMachine, running: Arc<AtomicBool>) -> Self {
        Self { vehicle, machine, running }
    }

    pub fn running(&self) -> Arc<AtomicBool> { self.running.clone() }

    pub fn machine(&self) -> &FlightStateMachine { &self.machine }

    /// Blocks until `running` is cleared or the link fails. Hands the vehicle
    /// back (already disconnected) so callers can inspect or reuse it.
    pub fn run(mut self) -> (V, Result<(), FlightError>) {
        let res = self.drive();
        self.running.store(false, Ordering::Release);
        (self.vehicle, res)
    }

    fn drive(&mut self) -> Result<(), FlightError> {
        let status = self.machine.status().clone();
        let period = self.machine.config().tick();
        let mut link = LinkGuard { vehicle: &mut self.vehicle, status };

        self.machine.start(&mut *link)?;

        let mut ticks: u64 = 0;
        while self.running.load(Ordering::Acquire) {
            let started = Instant::now();
            self.machine.tick(&mut *link)?;
            ticks += 1;
            if let Some(rest) = period.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        info!("fc: control loop stopped after {} ticks", ticks);
        Ok(())
    }
}

/// Disconnects on drop, including when the loop unwinds from a panic.
struct LinkGuard<'a, V: Vehicle> {
    vehicle: &'a mut V,
    status: Arc<FlightStatus>,
}

impl<V: Vehicle> Deref for LinkGuard<'_, V> {
    type Target = V;
    fn deref(&self) -> &V { self.vehicle }
}

impl<V: Vehicle> DerefMut for LinkGuard<'_, V> {
    fn deref_mut(&mut self) -> &mut V { self.vehicle }
}

impl<V: Vehicle> Drop for LinkGuard<'_, V> {
    fn drop(&mut self) {
        if let Err(e) = self.vehicle.disconnect() {
            warn!("fc: disconnect failed: {}", e);
        }
        self.status.set_connected(false);
        if self.status.phase() != FlightPhase::Error {
            self.status.set_phase(FlightPhase::Disconnected);
        }
        info!("fc: disconnected");
    }
}
