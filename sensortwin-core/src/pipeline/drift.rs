//! Time-based drift stage
//!
//! Sensors age: the baseline creeps and the sensitivity decays or inflates
//! slowly. Both effects are linear in elapsed simulation hours:
//!
//! ```text
//! value = value × factor + baseline_rate × hours
//! factor = 1 + (sensitivity_% / 100) × hours,  clamped to [0.1, 2.0]
//! ```
//!
//! The clamp bounds pathological configurations: a sensor never gains more
//! than 2× or loses more than 90% of its sensitivity from drift alone.
//! The stage only runs when the environment exposes a simulation clock;
//! the caller resolves that once per sample (see
//! [`StageContext`](super::StageContext)).

use crate::config::DriftSpec;
use crate::constants::drift::{SENSITIVITY_FACTOR_MAX, SENSITIVITY_FACTOR_MIN};

/// Configured drift behavior for one sensor
#[derive(Debug, Clone)]
pub struct DriftModel {
    spec: DriftSpec,
}

impl DriftModel {
    pub fn from_spec(spec: &DriftSpec) -> Self {
        Self { spec: spec.clone() }
    }

    pub fn baseline_per_hour(&self) -> f64 {
        self.spec.baseline_per_hour
    }

    pub fn sensitivity_percent_per_hour(&self) -> f64 {
        self.spec.sensitivity_percent_per_hour
    }

    /// Apply drift to a channel value after `elapsed_hours` of simulation
    pub fn apply(&self, channel: &str, value: f64, elapsed_hours: f64) -> f64 {
        let (baseline, sensitivity) = match self.spec.per_channel.get(channel) {
            Some(overrides) => (
                overrides
                    .baseline_per_hour
                    .unwrap_or(self.spec.baseline_per_hour),
                overrides
                    .sensitivity_percent_per_hour
                    .unwrap_or(self.spec.sensitivity_percent_per_hour),
            ),
            None => (
                self.spec.baseline_per_hour,
                self.spec.sensitivity_percent_per_hour,
            ),
        };
        drift_value(value, baseline, sensitivity, elapsed_hours)
    }

    /// Apply global drift uniformly (imaging sensors drift whole-frame)
    pub fn apply_uniform(&self, value: f64, elapsed_hours: f64) -> f64 {
        drift_value(
            value,
            self.spec.baseline_per_hour,
            self.spec.sensitivity_percent_per_hour,
            elapsed_hours,
        )
    }
}

fn drift_value(value: f64, baseline: f64, sensitivity_percent: f64, hours: f64) -> f64 {
    let factor = (1.0 + sensitivity_percent / 100.0 * hours)
        .clamp(SENSITIVITY_FACTOR_MIN, SENSITIVITY_FACTOR_MAX);
    value * factor + baseline * hours
}
