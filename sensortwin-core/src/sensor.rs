//! Sensor Contract
//!
//! ## Overview
//!
//! Every simulated instrument implements [`Sensor`]. The contract is
//! small and strict:
//!
//! - `sample` always resolves ground truth first and, only if that
//!   succeeds, runs the imperfection pipeline; a ground-truth error is
//!   returned verbatim without touching filter state.
//! - `ground_truth` converts every failure mode (not capable, capability
//!   missing, capability failed, malformed response) into a structured
//!   error value. It never panics.
//! - `apply_imperfections` is the only operation allowed to mutate sensor
//!   state, and only its own EMA/defect state.
//!
//! Identity, pose, enablement, and ground-truth capability are shared by
//! all kinds and live in [`SensorCore`], which concrete sensors embed.

use serde::Serialize;

use crate::config::ImperfectionConfig;
use crate::environment::EnvironmentQuery;
use crate::errors::{SensorError, SensorResult};
use crate::geometry::{Position, SamplingVolume};
use crate::pipeline::{SkipWarnings, StageContext};
use crate::reading::Reading;

/// The abstract sensor contract
pub trait Sensor {
    /// Unique sensor id within its array
    fn id(&self) -> &str;

    /// Sensor kind string, matching the registry key
    fn kind(&self) -> &'static str;

    fn position(&self) -> Position;

    fn update_pose(&mut self, position: Position);

    fn is_enabled(&self) -> bool;

    fn enable(&mut self);

    fn disable(&mut self);

    fn has_ground_truth(&self) -> bool;

    /// Noise-free reading straight from the environment
    fn ground_truth(&self, env: &dyn EnvironmentQuery) -> SensorResult<Reading>;

    /// Run the imperfection pipeline over a true reading
    fn apply_imperfections(
        &mut self,
        truth: Reading,
        env: &dyn EnvironmentQuery,
    ) -> SensorResult<Reading>;

    /// One imperfect reading: ground truth, then the pipeline
    ///
    /// A ground-truth error short-circuits and is returned verbatim;
    /// the pipeline (and its state) is not touched in that case.
    fn sample(&mut self, env: &dyn EnvironmentQuery) -> SensorResult<Reading> {
        let truth = self.ground_truth(env)?;
        self.apply_imperfections(truth, env)
    }

    /// Descriptive metadata for ML feature bookkeeping
    fn ml_metadata(&self) -> SensorMetadata;
}

/// Identity and shared state embedded by every concrete sensor
#[derive(Debug, Clone)]
pub struct SensorCore {
    id: String,
    kind: &'static str,
    position: Position,
    volume: SamplingVolume,
    enabled: bool,
    has_ground_truth: bool,
    warnings: SkipWarnings,
}

impl SensorCore {
    pub fn new(
        id: impl Into<String>,
        kind: &'static str,
        position: Position,
        volume: SamplingVolume,
        enabled: bool,
        has_ground_truth: bool,
    ) -> SensorResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(SensorError::invalid_config("sensor id must not be empty"));
        }
        Ok(Self {
            id,
            kind,
            position,
            volume,
            enabled,
            has_ground_truth,
            warnings: SkipWarnings::default(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn volume(&self) -> &SamplingVolume {
        &self.volume
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn has_ground_truth(&self) -> bool {
        self.has_ground_truth
    }

    /// Resolve the optional per-sample stage inputs (simulation clock,
    /// ambient temperature), logging each missing input once
    pub fn stage_context(
        &mut self,
        env: &dyn EnvironmentQuery,
        needs_hours: bool,
        needs_ambient: bool,
    ) -> StageContext {
        StageContext::resolve(
            &self.id,
            env,
            self.position,
            &self.volume,
            needs_hours,
            needs_ambient,
            &mut self.warnings,
        )
    }

    /// Gate for `ground_truth`: a sensor configured without that
    /// capability refuses with a structured error, not a panic
    pub fn require_ground_truth(&self) -> SensorResult<()> {
        if !self.has_ground_truth {
            return Err(SensorError::NoGroundTruth {
                sensor_id: self.id.clone(),
            });
        }
        Ok(())
    }
}

/// Serializable sensor description for downstream ML tooling
#[derive(Debug, Clone, Serialize)]
pub struct SensorMetadata {
    pub sensor_id: String,
    pub sensor_kind: String,
    pub position: [f64; 3],
    pub enabled: bool,
    pub has_ground_truth: bool,
    pub imperfections: ImperfectionSummary,
}

impl SensorMetadata {
    pub fn from_core(core: &SensorCore, imperfections: ImperfectionSummary) -> Self {
        Self {
            sensor_id: core.id().to_string(),
            sensor_kind: core.kind().to_string(),
            position: core.position().as_array(),
            enabled: core.is_enabled(),
            has_ground_truth: core.has_ground_truth(),
            imperfections,
        }
    }
}

/// Flat summary of which imperfection stages a sensor carries
///
/// `None` means the stage is absent for this sensor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImperfectionSummary {
    pub response_alpha: Option<f64>,
    pub noise_std_dev: Option<f64>,
    pub drift_baseline_per_hour: Option<f64>,
    pub drift_sensitivity_percent_per_hour: Option<f64>,
    pub calibration_gain: Option<f64>,
    pub calibration_offset: Option<f64>,
    pub compensation_offset_per_degree: Option<f64>,
}

impl ImperfectionSummary {
    pub fn from_config(config: &ImperfectionConfig) -> Self {
        Self {
            response_alpha: config.response.map(|r| r.alpha),
            noise_std_dev: config.noise.as_ref().map(|n| n.std_dev),
            drift_baseline_per_hour: config.drift.as_ref().map(|d| d.baseline_per_hour),
            drift_sensitivity_percent_per_hour: config
                .drift
                .as_ref()
                .map(|d| d.sensitivity_percent_per_hour),
            calibration_gain: config.calibration.as_ref().map(|c| c.gain),
            calibration_offset: config.calibration.as_ref().map(|c| c.offset),
            compensation_offset_per_degree: config
                .compensation
                .as_ref()
                .map(|c| c.offset_per_degree),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_id_is_rejected() {
        let err = SensorCore::new(
            "",
            "chemical_array",
            Position::default(),
            SamplingVolume::Point,
            true,
            true,
        );
        assert!(matches!(err, Err(SensorError::InvalidConfig { .. })));
    }

    #[test]
    fn ground_truth_gate() {
        let core = SensorCore::new(
            "s1",
            "field",
            Position::default(),
            SamplingVolume::Point,
            true,
            false,
        )
        .unwrap();
        assert!(matches!(
            core.require_ground_truth(),
            Err(SensorError::NoGroundTruth { .. })
        ));
    }
}
