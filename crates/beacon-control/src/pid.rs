use serde::Deserialize;
use tracing::trace;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Output is clamped to `±max_magnitude`.
    pub max_magnitude: f64,
    /// Scale the integral and derivative terms by the sample interval.
    /// Off for the fixed-rate loop, where `dt` is constant and folded into the gains.
    pub use_dt: bool,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self { kp: 1.0, ki: 0.5, kd: 0.5, max_magnitude: 1.0, use_dt: false }
    }
}

/// Single-axis PID. One instance per axis; accumulators are never shared.
#[derive(Debug, Clone)]
pub struct PidController {
    cfg: PidConfig,
    integral: f64,
    last_error: f64,
}

impl PidController {
    pub fn new(cfg: PidConfig) -> Self {
        let max_magnitude = if cfg.max_magnitude.is_finite() { cfg.max_magnitude.abs() } else { 0.0 };
        Self { cfg: PidConfig { max_magnitude, ..cfg }, integral: 0.0, last_error: 0.0 }
    }

    /// `error = actual - desired`; returns the clamped command.
    pub fn control(&mut self, actual: f64, desired: f64, dt: f64) -> f64 {
        let error = actual - desired;
        if !error.is_finite() {
            return 0.0;
        }

        let scaled = self.cfg.use_dt && dt > 0.0 && dt.is_finite();
        let derivative = if scaled {
            self.integral += error * dt;
            (error - self.last_error) / dt
        } else {
            self.integral += error;
            error - self.last_error
        };
        self.last_error = error;

        if !self.integral.is_finite() {
            self.integral = 0.0;
        }

        let out = self.cfg.kp * error + self.cfg.ki * self.integral + self.cfg.kd * derivative;
        if out.is_nan() {
            return 0.0;
        }
        let max = self.cfg.max_magnitude;
        let clamped = out.clamp(-max, max);
        if clamped != out {
            trace!("control: pid saturated {:.3} -> {:.3}", out, clamped);
        }
        clamped
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
    }

    pub fn integral(&self) -> f64 { self.integral }
}
