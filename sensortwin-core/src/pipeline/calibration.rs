//! Calibration error stage
//!
//! Factory calibration is never perfect: each channel carries a gain and
//! offset error, both of which may themselves drift linearly with
//! simulated time, plus an optional quadratic non-linearity referenced to
//! the *true* value (sensor electronics bend relative to the physical
//! quantity, not to the already-distorted signal):
//!
//! ```text
//! value = value × (gain + gain_drift×h) + (offset + offset_drift×h)
//!       + nonlinear_coeff × true²
//! ```
//!
//! Without a simulation clock the drift terms contribute nothing and the
//! static gain/offset still apply.

use crate::config::CalibrationSpec;

/// Configured calibration error for one sensor
#[derive(Debug, Clone)]
pub struct CalibrationModel {
    spec: CalibrationSpec,
}

impl CalibrationModel {
    pub fn from_spec(spec: &CalibrationSpec) -> Self {
        Self { spec: spec.clone() }
    }

    pub fn gain(&self) -> f64 {
        self.spec.gain
    }

    pub fn offset(&self) -> f64 {
        self.spec.offset
    }

    /// Apply calibration error to a channel value
    pub fn apply(
        &self,
        channel: &str,
        value: f64,
        true_value: f64,
        elapsed_hours: Option<f64>,
    ) -> f64 {
        let (base_gain, base_offset) = match self.spec.per_channel.get(channel) {
            Some(overrides) => (
                overrides.gain.unwrap_or(self.spec.gain),
                overrides.offset.unwrap_or(self.spec.offset),
            ),
            None => (self.spec.gain, self.spec.offset),
        };
        self.calibrate(value, true_value, base_gain, base_offset, elapsed_hours)
    }

    /// Apply the global calibration uniformly (imaging sensors)
    pub fn apply_uniform(&self, value: f64, true_value: f64, elapsed_hours: Option<f64>) -> f64 {
        self.calibrate(
            value,
            true_value,
            self.spec.gain,
            self.spec.offset,
            elapsed_hours,
        )
    }

    fn calibrate(
        &self,
        value: f64,
        true_value: f64,
        base_gain: f64,
        base_offset: f64,
        elapsed_hours: Option<f64>,
    ) -> f64 {
        let hours = elapsed_hours.unwrap_or(0.0);
        let gain = base_gain + self.spec.gain_drift_per_hour * hours;
        let offset = base_offset + self.spec.offset_drift_per_hour * hours;
        value * gain + offset + self.spec.nonlinear_coeff * true_value * true_value
    }
}
