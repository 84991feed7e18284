/// How one actuation axis turns a measurement into a command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisStrategy {
    /// `gain * (measured - setpoint) / span`, clamped to `±max`, negated when
    /// `invert` is set.
    Proportional {
        setpoint: f64,
        span: f64,
        gain: f64,
        max: f64,
        invert: bool,
    },
    /// Zero inside `[ideal - tolerance, ideal + tolerance]`, a fixed `∓step`
    /// outside it. Below the band yields `-step`.
    DeadBand {
        ideal: f64,
        tolerance: f64,
        step: f64,
    },
}

impl AxisStrategy {
    /// Largest magnitude this axis can ever emit.
    pub fn limit(&self) -> f32 {
        match *self {
            AxisStrategy::Proportional { max, .. } => max.abs() as f32,
            AxisStrategy::DeadBand { step, .. } => step.abs() as f32,
        }
    }

    pub fn output(&self, measured: f64) -> f32 {
        let out = match *self {
            AxisStrategy::Proportional { setpoint, span, gain, max, invert } => {
                let max = if max.is_nan() { 0.0 } else { max.abs() };
                let error = (measured - setpoint) / span;
                let v = (gain * error).clamp(-max, max);
                if invert { -v } else { v }
            }
            AxisStrategy::DeadBand { ideal, tolerance, step } => {
                let step = step.abs();
                if measured < ideal - tolerance {
                    -step
                } else if measured > ideal + tolerance {
                    step
                } else {
                    0.0
                }
            }
        };
        // NaN in, zero out
        if out.is_finite() { out as f32 } else { 0.0 }
    }
}
