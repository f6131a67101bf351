//! Multi-channel chemical array sensor
//!
//! Models an electrochemical array: N named channels, each reading the
//! concentration of one species, with cross-sensitivity between channels
//! (a CO cell responds weakly to NO2, and so on). Ground truth is one
//! `chemical_concentration` query per channel; the full pipeline
//! (stages 1–6) then runs per channel with per-channel overrides where
//! configured.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::{ImperfectionConfig, SensorEntry};
use crate::environment::EnvironmentQuery;
use crate::errors::{SensorError, SensorResult};
use crate::geometry::{Position, SamplingVolume};
use crate::pipeline::{
    CalibrationModel, CompensationModel, CrossSensitivity, DriftModel, NoiseInjector,
    ResponseFilter,
};
use crate::reading::{finish_stage, Reading, Unit};
use crate::sensor::{ImperfectionSummary, Sensor, SensorCore, SensorMetadata};

/// Kind-specific parameters, closed schema
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChemicalArrayParams {
    /// Channel names, one per measured species
    pub channels: Vec<String>,

    /// Sparse interference table: target → (interferer → coefficient)
    #[serde(default)]
    pub cross_sensitivity: BTreeMap<String, BTreeMap<String, f64>>,
}

/// N-channel chemical array
pub struct ChemicalArraySensor {
    core: SensorCore,
    channels: Vec<String>,
    crosstalk: Option<CrossSensitivity>,
    response: Option<ResponseFilter>,
    noise: Option<NoiseInjector>,
    drift: Option<DriftModel>,
    calibration: Option<CalibrationModel>,
    compensation: Option<CompensationModel>,
    needs_clock: bool,
    summary: ImperfectionSummary,
}

impl ChemicalArraySensor {
    /// Registry kind string
    pub const KIND: &'static str = "chemical_array";

    pub fn new(
        id: impl Into<String>,
        position: Position,
        volume: SamplingVolume,
        enabled: bool,
        has_ground_truth: bool,
        params: ChemicalArrayParams,
        imperfections: &ImperfectionConfig,
    ) -> SensorResult<Self> {
        let core = SensorCore::new(id, Self::KIND, position, volume, enabled, has_ground_truth)?;

        if params.channels.is_empty() {
            return Err(SensorError::invalid_config(
                "chemical array needs at least one channel",
            ));
        }
        let channel_set: BTreeSet<&String> = params.channels.iter().collect();
        if channel_set.len() != params.channels.len() {
            return Err(SensorError::invalid_config(
                "chemical array channel names must be unique",
            ));
        }
        for (target, row) in &params.cross_sensitivity {
            if !channel_set.contains(target) {
                return Err(SensorError::invalid_config(format!(
                    "cross-sensitivity target '{target}' is not a configured channel"
                )));
            }
            for interferer in row.keys() {
                if !channel_set.contains(interferer) {
                    return Err(SensorError::invalid_config(format!(
                        "cross-sensitivity interferer '{interferer}' is not a configured channel"
                    )));
                }
            }
        }

        let response = match &imperfections.response {
            Some(spec) => Some(ResponseFilter::new(spec.alpha)?),
            None => None,
        };
        let calibration = imperfections.calibration.as_ref().map(CalibrationModel::from_spec);
        let needs_clock = imperfections.drift.is_some()
            || imperfections.calibration.as_ref().is_some_and(|c| {
                c.gain_drift_per_hour != 0.0 || c.offset_drift_per_hour != 0.0
            });

        Ok(Self {
            core,
            channels: params.channels,
            crosstalk: CrossSensitivity::from_table(params.cross_sensitivity),
            response,
            noise: imperfections.noise.as_ref().map(NoiseInjector::from_spec),
            drift: imperfections.drift.as_ref().map(DriftModel::from_spec),
            calibration,
            compensation: imperfections
                .compensation
                .as_ref()
                .map(CompensationModel::from_spec),
            needs_clock,
            summary: ImperfectionSummary::from_config(imperfections),
        })
    }

    /// Build from a configuration entry with an already-resolved id/pose
    pub fn from_entry(
        id: String,
        position: Position,
        entry: &SensorEntry,
    ) -> SensorResult<Self> {
        let params: ChemicalArrayParams = entry.kind_params()?;
        Self::new(
            id,
            position,
            entry.sampling_volume,
            entry.enabled,
            entry.has_ground_truth,
            params,
            &entry.imperfections,
        )
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }
}

impl Sensor for ChemicalArraySensor {
    fn id(&self) -> &str {
        self.core.id()
    }

    fn kind(&self) -> &'static str {
        self.core.kind()
    }

    fn position(&self) -> Position {
        self.core.position()
    }

    fn update_pose(&mut self, position: Position) {
        self.core.set_position(position);
    }

    fn is_enabled(&self) -> bool {
        self.core.is_enabled()
    }

    fn enable(&mut self) {
        self.core.set_enabled(true);
    }

    fn disable(&mut self) {
        self.core.set_enabled(false);
    }

    fn has_ground_truth(&self) -> bool {
        self.core.has_ground_truth()
    }

    fn ground_truth(&self, env: &dyn EnvironmentQuery) -> SensorResult<Reading> {
        self.core.require_ground_truth()?;
        let mut reading = Reading::new(Unit::Ppm);
        for channel in &self.channels {
            let value = env
                .chemical_concentration(channel, self.core.position(), self.core.volume())
                .map_err(|e| e.into_sensor_error("chemical_concentration"))?;
            reading.insert(channel.clone(), finish_stage(value, Unit::Ppm));
        }
        Ok(reading)
    }

    fn apply_imperfections(
        &mut self,
        truth: Reading,
        env: &dyn EnvironmentQuery,
    ) -> SensorResult<Reading> {
        let needs_ambient = self.compensation.is_some();
        let ctx = self.core.stage_context(env, self.needs_clock, needs_ambient);
        let unit = Unit::Ppm;
        let truth_values = truth.into_values();

        // Stage 1: cross-talk composes the perceived values
        let mut values = match &self.crosstalk {
            Some(stage) => stage
                .perceive(&truth_values)
                .into_iter()
                .map(|(k, v)| (k, finish_stage(v, unit)))
                .collect(),
            None => truth_values.clone(),
        };

        // Stage 2: response lag
        if let Some(filter) = &mut self.response {
            values = filter
                .filter(&values)
                .into_iter()
                .map(|(k, v)| (k, finish_stage(v, unit)))
                .collect();
        }

        // Stage 3: additive noise
        if let Some(noise) = &mut self.noise {
            for (channel, value) in values.iter_mut() {
                *value = finish_stage(noise.apply(channel, *value), unit);
            }
        }

        // Stage 4: drift (skipped without a simulation clock)
        if let (Some(drift), Some(hours)) = (&self.drift, ctx.elapsed_hours) {
            for (channel, value) in values.iter_mut() {
                *value = finish_stage(drift.apply(channel, *value, hours), unit);
            }
        }

        // Stage 5: calibration; non-linearity references the true value
        if let Some(calibration) = &self.calibration {
            for (channel, value) in values.iter_mut() {
                let true_value = truth_values.get(channel).copied().unwrap_or(*value);
                *value = finish_stage(
                    calibration.apply(channel, *value, true_value, ctx.elapsed_hours),
                    unit,
                );
            }
        }

        // Stage 6: environmental compensation (skipped without ambient)
        if let (Some(compensation), Some(ambient)) = (&self.compensation, ctx.ambient_temp_c) {
            for (channel, value) in values.iter_mut() {
                *value = finish_stage(compensation.apply(channel, *value, ambient), unit);
            }
        }

        Ok(Reading::from_values(unit, values))
    }

    fn ml_metadata(&self) -> SensorMetadata {
        SensorMetadata::from_core(&self.core, self.summary.clone())
    }
}
