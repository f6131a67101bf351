//! Configuration Schema
//!
//! ## Overview
//!
//! Arrays are built from a single configuration document: per-array id and
//! default pose, plus a list of per-sensor entries each carrying kind,
//! optional explicit id, enabled flag, imperfection specs, and a
//! kind-specific parameter block.
//!
//! ## Closed schemas
//!
//! The original system carried deep, loosely-typed configuration
//! dictionaries with stringly-typed lookups scattered through the
//! pipeline. Here every level is a typed struct with
//! `#[serde(deny_unknown_fields)]`: unknown top-level or per-sensor fields
//! are rejected at load time, and each sensor kind validates its own
//! parameter block once at construction. The kind-specific block stays a
//! raw `serde_json::Value` in [`SensorEntry`] only because dispatch on the
//! kind string happens in the registry; the receiving constructor
//! immediately deserializes it into its closed parameter struct.
//!
//! Range rules that serde cannot express (EMA alpha in (0,1], defect
//! pixels inside the image) are checked by the constructors and reported
//! as [`SensorError::InvalidConfig`](crate::errors::SensorError), the one
//! error class that is fatal at construction.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::constants::compensation::DEFAULT_REFERENCE_TEMP_C;
use crate::errors::{SensorError, SensorResult};
use crate::geometry::{Position, SamplingVolume};

fn default_true() -> bool {
    true
}

fn default_gain() -> f64 {
    1.0
}

fn default_reference_temp() -> f64 {
    DEFAULT_REFERENCE_TEMP_C
}

/// Root configuration: one sensor array
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArrayConfig {
    /// Array identity, used as prefix for generated sensor ids
    pub id: String,

    /// Pose applied to sensors that do not name their own
    #[serde(default)]
    pub default_position: Position,

    /// Sensor roster; membership is fixed once the array is built
    pub sensors: Vec<SensorEntry>,
}

impl ArrayConfig {
    /// Parse from a JSON document, rejecting unknown fields at any level
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One sensor in the array roster
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorEntry {
    /// Sensor kind, resolved against the registry at build time
    pub kind: String,

    /// Explicit id; generated from array id + kind + ordinal when absent
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Overrides the array default pose
    #[serde(default)]
    pub position: Option<Position>,

    #[serde(default)]
    pub sampling_volume: SamplingVolume,

    /// Sensors built without ground truth refuse `ground_truth` calls
    #[serde(default = "default_true")]
    pub has_ground_truth: bool,

    #[serde(default)]
    pub imperfections: ImperfectionConfig,

    /// Kind-specific parameters, validated by the kind's constructor
    #[serde(default)]
    pub params: serde_json::Value,
}

impl SensorEntry {
    /// Deserialize the kind-specific parameter block into its closed
    /// schema; an absent block reads as an empty object
    pub fn kind_params<T: serde::de::DeserializeOwned>(&self) -> SensorResult<T> {
        let value = match &self.params {
            serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
            other => other.clone(),
        };
        serde_json::from_value(value)
            .map_err(|e| SensorError::invalid_config(format!("{} params: {e}", self.kind)))
    }
}

/// Imperfection specs attached to a sensor at construction
///
/// All optional; an absent spec disables that pipeline stage. Specs are
/// never mutated by sampling.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImperfectionConfig {
    pub response: Option<ResponseSpec>,
    pub noise: Option<NoiseSpec>,
    pub drift: Option<DriftSpec>,
    pub calibration: Option<CalibrationSpec>,
    pub compensation: Option<CompensationSpec>,
}

/// Response-time filtering (EMA) parameters
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseSpec {
    /// EMA coefficient; must lie in (0, 1]. 1.0 means no lag
    pub alpha: f64,
}

/// Supported noise distributions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseDistribution {
    #[default]
    Gaussian,
}

/// Additive noise parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoiseSpec {
    #[serde(default)]
    pub distribution: NoiseDistribution,

    /// Global mean of the noise distribution
    #[serde(default)]
    pub mean: f64,

    /// Global standard deviation; ≤ 0 disables the stage
    #[serde(default)]
    pub std_dev: f64,

    /// RNG seed for reproducible runs; fresh entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Per-channel overrides falling back to the global mean/std
    #[serde(default)]
    pub per_channel: BTreeMap<String, ChannelNoise>,
}

/// Per-channel noise override
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelNoise {
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub std_dev: Option<f64>,
}

/// Time-proportional drift parameters, rates per simulated hour
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriftSpec {
    /// Additive baseline drift, units per hour
    #[serde(default)]
    pub baseline_per_hour: f64,

    /// Multiplicative sensitivity drift, percent of reading per hour
    #[serde(default)]
    pub sensitivity_percent_per_hour: f64,

    #[serde(default)]
    pub per_channel: BTreeMap<String, ChannelDrift>,
}

/// Per-channel drift override
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelDrift {
    #[serde(default)]
    pub baseline_per_hour: Option<f64>,
    #[serde(default)]
    pub sensitivity_percent_per_hour: Option<f64>,
}

/// Calibration error parameters
///
/// Image sensors use the global gain/offset only; per-channel overrides
/// apply to channel-keyed sensors.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationSpec {
    #[serde(default)]
    pub offset: f64,

    #[serde(default = "default_gain")]
    pub gain: f64,

    /// Linear drift of the offset, units per hour
    #[serde(default)]
    pub offset_drift_per_hour: f64,

    /// Linear drift of the gain, per hour
    #[serde(default)]
    pub gain_drift_per_hour: f64,

    /// Quadratic non-linearity: adds `coeff × true_value²`
    #[serde(default)]
    pub nonlinear_coeff: f64,

    #[serde(default)]
    pub per_channel: BTreeMap<String, ChannelCalibration>,
}

impl Default for CalibrationSpec {
    fn default() -> Self {
        Self {
            offset: 0.0,
            gain: 1.0,
            offset_drift_per_hour: 0.0,
            gain_drift_per_hour: 0.0,
            nonlinear_coeff: 0.0,
            per_channel: BTreeMap::new(),
        }
    }
}

/// Per-channel calibration override
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelCalibration {
    #[serde(default)]
    pub offset: Option<f64>,
    #[serde(default)]
    pub gain: Option<f64>,
}

/// Environmental compensation error parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompensationSpec {
    /// Temperature the sensor was calibrated at, °C
    #[serde(default = "default_reference_temp")]
    pub reference_temp_c: f64,

    /// Reading shift per degree away from the reference
    #[serde(default)]
    pub offset_per_degree: f64,

    /// Per-channel coefficient overrides
    #[serde(default)]
    pub per_channel: BTreeMap<String, f64>,
}

impl Default for CompensationSpec {
    fn default() -> Self {
        Self {
            reference_temp_c: DEFAULT_REFERENCE_TEMP_C,
            offset_per_degree: 0.0,
            per_channel: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_array_config_parses() {
        let cfg = ArrayConfig::from_json(
            r#"{
                "id": "station_a",
                "sensors": [
                    {"kind": "chemical_array", "params": {"channels": ["CO"]}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.id, "station_a");
        assert_eq!(cfg.sensors.len(), 1);
        assert!(cfg.sensors[0].enabled);
        assert!(cfg.sensors[0].has_ground_truth);
    }

    #[test]
    fn unknown_top_level_field_is_rejected() {
        let err = ArrayConfig::from_json(
            r#"{"id": "a", "sensors": [], "scenario_db": "nope"}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn unknown_sensor_field_is_rejected() {
        let err = ArrayConfig::from_json(
            r#"{
                "id": "a",
                "sensors": [{"kind": "field", "colour": "red"}]
            }"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn unknown_imperfection_field_is_rejected() {
        let err = ArrayConfig::from_json(
            r#"{
                "id": "a",
                "sensors": [{
                    "kind": "field",
                    "imperfections": {"noise": {"std_dev": 0.1, "shape": "weibull"}}
                }]
            }"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn sampling_volume_variants_parse() {
        let cfg = ArrayConfig::from_json(
            r#"{
                "id": "a",
                "sensors": [{
                    "kind": "field",
                    "sampling_volume": {"shape": "sphere", "radius_m": 2.0}
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(
            cfg.sensors[0].sampling_volume,
            SamplingVolume::Sphere { radius_m: 2.0 }
        );
    }
}
