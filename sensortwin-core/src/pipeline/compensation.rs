//! Environmental compensation stage
//!
//! Instruments compensate internally for ambient temperature, and that
//! compensation carries its own error: a residual shift proportional to
//! how far the ambient is from the calibration reference.
//!
//! `value += offset_per_degree × (ambient − reference)`
//!
//! The ambient temperature comes from the environment at the sensor's own
//! pose; when it cannot be queried the stage is skipped upstream.

use crate::config::CompensationSpec;

/// Configured compensation error for one sensor
#[derive(Debug, Clone)]
pub struct CompensationModel {
    spec: CompensationSpec,
}

impl CompensationModel {
    pub fn from_spec(spec: &CompensationSpec) -> Self {
        Self { spec: spec.clone() }
    }

    pub fn offset_per_degree(&self) -> f64 {
        self.spec.offset_per_degree
    }

    /// Apply to a channel value given the ambient temperature
    pub fn apply(&self, channel: &str, value: f64, ambient_c: f64) -> f64 {
        let coeff = self
            .spec
            .per_channel
            .get(channel)
            .copied()
            .unwrap_or(self.spec.offset_per_degree);
        value + coeff * (ambient_c - self.spec.reference_temp_c)
    }

    /// Apply the global coefficient uniformly (imaging sensors)
    pub fn apply_uniform(&self, value: f64, ambient_c: f64) -> f64 {
        value + self.spec.offset_per_degree * (ambient_c - self.spec.reference_temp_c)
    }
}
