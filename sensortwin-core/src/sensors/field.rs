//! Electromagnetic field sensor
//!
//! ## Model
//!
//! A single-axis EMF probe reporting scalar field magnitude plus the
//! dominant frequency of the band it watches. Three response effects sit
//! on top of the shared pipeline:
//!
//! - **Frequency-dependent gain**: probes are not flat across frequency.
//!   The configured frequency → gain table resolves by exact match first,
//!   then nearest entry within a tolerance, then a default gain. A
//!   non-finite dominant frequency also resolves to the default.
//! - **Directional sensitivity**: the probe reads the projection of the
//!   field vector onto its own axis, `dot(unit(orientation), field)`. A
//!   zero-length orientation reads zero. Environments that report no
//!   field vector fall back to the scalar magnitude.
//! - **EMI**: every nearby interference source couples in with strength
//!   attenuated by frequency separation and distance:
//!   `strength × exp(−|Δf|/coupling) / (d² + 1)`. A fraction of the sum
//!   lands on the reading, another on the spectrum noise floor.
//!
//! Spectrum output is optional: fundamental at the calibrated magnitude,
//! odd harmonics (3f/5f/7f) at configurable amplitude ratios, a
//! high-frequency-noise entry when the environment reports corona
//! discharge, and every component scaled by the cosine of a configured
//! axis misalignment.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::config::{ImperfectionConfig, SensorEntry};
use crate::constants::emi::{
    DEFAULT_COUPLING_HZ, DEFAULT_SEARCH_RADIUS_M, NOISE_FLOOR_FRACTION, READING_FRACTION,
};
use crate::constants::field::{
    DEFAULT_FREQUENCY_RANGE_HZ, DEFAULT_FREQUENCY_TOLERANCE_HZ, DEFAULT_GAIN,
    DEFAULT_HARMONIC_RATIOS, HARMONIC_MULTIPLES,
};
use crate::environment::EnvironmentQuery;
use crate::errors::{SensorError, SensorResult};
use crate::geometry::{Position, SamplingVolume, Vector3};
use crate::pipeline::{
    CalibrationModel, CompensationModel, DriftModel, NoiseInjector, ResponseFilter,
};
use crate::reading::{finish_stage, round_to, Reading, Unit};
use crate::sensor::{ImperfectionSummary, Sensor, SensorCore, SensorMetadata};

/// Key of the scalar magnitude channel
pub const MAGNITUDE_KEY: &str = "magnitude";
/// Key of the dominant-frequency channel
pub const DOMINANT_FREQUENCY_KEY: &str = "dominant_frequency_hz";

fn default_frequency_range() -> (f64, f64) {
    DEFAULT_FREQUENCY_RANGE_HZ
}

fn default_gain_value() -> f64 {
    DEFAULT_GAIN
}

fn default_tolerance() -> f64 {
    DEFAULT_FREQUENCY_TOLERANCE_HZ
}

fn default_coupling() -> f64 {
    DEFAULT_COUPLING_HZ
}

fn default_radius() -> f64 {
    DEFAULT_SEARCH_RADIUS_M
}

fn default_harmonic_ratios() -> Vec<f64> {
    DEFAULT_HARMONIC_RATIOS.to_vec()
}

/// Kind-specific parameters, closed schema
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldParams {
    /// Probe axis
    #[serde(default)]
    pub orientation: Vector3,

    /// Watched band, Hz
    #[serde(default = "default_frequency_range")]
    pub frequency_range_hz: (f64, f64),

    /// Frequency → gain table; JSON object keys are frequency strings
    /// ("50" and "50.0" both parse to 50 Hz)
    #[serde(default)]
    pub frequency_gain: BTreeMap<String, f64>,

    /// Gain when nothing in the table matches
    #[serde(default = "default_gain_value")]
    pub default_gain: f64,

    /// Nearest-entry matching tolerance, Hz
    #[serde(default = "default_tolerance")]
    pub frequency_tolerance_hz: f64,

    /// EMI frequency-coupling constant, Hz
    #[serde(default = "default_coupling")]
    pub emi_coupling_hz: f64,

    /// Radius to scan for interference sources, m
    #[serde(default = "default_radius")]
    pub interference_radius_m: f64,

    /// Spectrum analysis output; absent means magnitude-only readings
    #[serde(default)]
    pub spectrum: Option<SpectrumParams>,
}

/// Spectrum analysis parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpectrumParams {
    /// Harmonic amplitudes relative to the fundamental, one per reported
    /// harmonic (3f, 5f, 7f)
    #[serde(default = "default_harmonic_ratios")]
    pub harmonic_ratios: Vec<f64>,

    /// Mounting misalignment; scales every spectrum component by its
    /// cosine
    #[serde(default)]
    pub axis_misalignment_degrees: f64,
}

/// Scalar field sensor with frequency and directional response
pub struct FieldSensor {
    core: SensorCore,
    orientation: Vector3,
    frequency_range_hz: (f64, f64),
    gain_table: Vec<(f64, f64)>,
    default_gain: f64,
    frequency_tolerance_hz: f64,
    emi_coupling_hz: f64,
    interference_radius_m: f64,
    spectrum: Option<SpectrumParams>,
    response: Option<ResponseFilter>,
    noise: Option<NoiseInjector>,
    drift: Option<DriftModel>,
    calibration: Option<CalibrationModel>,
    compensation: Option<CompensationModel>,
    needs_clock: bool,
    emi_skip_logged: bool,
    summary: ImperfectionSummary,
}

impl FieldSensor {
    /// Registry kind string
    pub const KIND: &'static str = "field";

    pub fn new(
        id: impl Into<String>,
        position: Position,
        volume: SamplingVolume,
        enabled: bool,
        has_ground_truth: bool,
        params: FieldParams,
        imperfections: &ImperfectionConfig,
    ) -> SensorResult<Self> {
        let core = SensorCore::new(id, Self::KIND, position, volume, enabled, has_ground_truth)?;

        // The table arrives keyed by strings; parse once so lookups are
        // numeric from here on
        let mut gain_table = Vec::with_capacity(params.frequency_gain.len());
        for (key, gain) in &params.frequency_gain {
            let frequency: f64 = key.trim().parse().map_err(|_| {
                SensorError::invalid_config(format!(
                    "frequency gain key '{key}' is not a number"
                ))
            })?;
            if !frequency.is_finite() || frequency < 0.0 {
                return Err(SensorError::invalid_config(format!(
                    "frequency gain key '{key}' must be a finite non-negative frequency"
                )));
            }
            gain_table.push((frequency, *gain));
        }
        gain_table.sort_by(|a, b| a.0.total_cmp(&b.0));

        if params.frequency_tolerance_hz < 0.0 {
            return Err(SensorError::invalid_config(
                "frequency tolerance must not be negative",
            ));
        }
        if params.emi_coupling_hz <= 0.0 {
            return Err(SensorError::invalid_config(
                "EMI coupling constant must be positive",
            ));
        }

        if params.orientation.normalized().is_none() {
            log::warn!(
                "field sensor {}: zero-length orientation, directional readings will be 0",
                core.id()
            );
        }

        let response = match &imperfections.response {
            Some(spec) => Some(ResponseFilter::new(spec.alpha)?),
            None => None,
        };
        let needs_clock = imperfections.drift.is_some()
            || imperfections.calibration.as_ref().is_some_and(|c| {
                c.gain_drift_per_hour != 0.0 || c.offset_drift_per_hour != 0.0
            });

        Ok(Self {
            core,
            orientation: params.orientation,
            frequency_range_hz: params.frequency_range_hz,
            gain_table,
            default_gain: params.default_gain,
            frequency_tolerance_hz: params.frequency_tolerance_hz,
            emi_coupling_hz: params.emi_coupling_hz,
            interference_radius_m: params.interference_radius_m,
            spectrum: params.spectrum,
            response,
            noise: imperfections.noise.as_ref().map(NoiseInjector::from_spec),
            drift: imperfections.drift.as_ref().map(DriftModel::from_spec),
            calibration: imperfections
                .calibration
                .as_ref()
                .map(CalibrationModel::from_spec),
            compensation: imperfections
                .compensation
                .as_ref()
                .map(CompensationModel::from_spec),
            needs_clock,
            emi_skip_logged: false,
            summary: ImperfectionSummary::from_config(imperfections),
        })
    }

    /// Build from a configuration entry with an already-resolved id/pose
    pub fn from_entry(
        id: String,
        position: Position,
        entry: &SensorEntry,
    ) -> SensorResult<Self> {
        let params: FieldParams = entry.kind_params()?;
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

    /// Resolve the gain for a dominant frequency:
    /// exact match > nearest within tolerance > default
    fn gain_for(&self, dominant_hz: f64) -> f64 {
        if !dominant_hz.is_finite() {
            return self.default_gain;
        }
        let mut nearest: Option<(f64, f64)> = None;
        for &(frequency, gain) in &self.gain_table {
            if frequency == dominant_hz {
                return gain;
            }
            let distance = (frequency - dominant_hz).abs();
            if distance <= self.frequency_tolerance_hz
                && nearest.map_or(true, |(best, _)| distance < best)
            {
                nearest = Some((distance, gain));
            }
        }
        nearest.map_or(self.default_gain, |(_, gain)| gain)
    }

    /// Summed interference contribution at the sensor position
    fn emi_contribution(&mut self, env: &dyn EnvironmentQuery, dominant_hz: f64) -> f64 {
        let sources = match env
            .nearby_interference_sources(self.core.position(), self.interference_radius_m)
        {
            Ok(sources) => sources,
            Err(_) => {
                if !self.emi_skip_logged {
                    log::debug!(
                        "sensor {}: no interference source capability, EMI stage skipped",
                        self.core.id()
                    );
                    self.emi_skip_logged = true;
                }
                return 0.0;
            }
        };

        let position = self.core.position();
        sources
            .iter()
            .map(|source| {
                let distance = position.distance_to(&source.position);
                let attenuation = if dominant_hz.is_finite() {
                    (-(source.frequency_hz - dominant_hz).abs() / self.emi_coupling_hz).exp()
                } else {
                    // Unknown dominant frequency: assume full coupling
                    1.0
                };
                source.strength * attenuation / (distance * distance + 1.0)
            })
            .sum()
    }
}

impl Sensor for FieldSensor {
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
        let emf = env
            .emf_characteristics(self.core.position(), self.frequency_range_hz)
            .map_err(|e| e.into_sensor_error("emf_characteristics"))?;

        if !emf.magnitude.is_finite() {
            return Err(SensorError::MalformedResponse {
                reason: format!("field magnitude is not finite: {}", emf.magnitude),
            });
        }

        let magnitude = match emf.field_vector {
            Some(field) => match self.orientation.normalized() {
                Some(axis) => axis.dot(&field),
                None => 0.0,
            },
            None => emf.magnitude,
        };

        let mut reading = Reading::new(Unit::VoltsPerMeter);
        reading.insert(MAGNITUDE_KEY, finish_stage(magnitude, Unit::VoltsPerMeter));
        if emf.dominant_frequency_hz.is_finite() {
            reading.insert(
                DOMINANT_FREQUENCY_KEY,
                round_to(emf.dominant_frequency_hz, 3),
            );
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
        let unit = Unit::VoltsPerMeter;

        let true_magnitude =
            truth
                .get(MAGNITUDE_KEY)
                .ok_or_else(|| SensorError::MalformedResponse {
                    reason: "field reading is missing its magnitude channel".into(),
                })?;
        let dominant_hz = truth.get(DOMINANT_FREQUENCY_KEY).unwrap_or(f64::NAN);

        // Perceived value: frequency response applies before anything else
        let mut value = finish_stage(true_magnitude * self.gain_for(dominant_hz), unit);

        // Stage 2: response lag on the magnitude channel
        if let Some(filter) = &mut self.response {
            let input = BTreeMap::from([(MAGNITUDE_KEY.to_string(), value)]);
            value = finish_stage(filter.filter(&input)[MAGNITUDE_KEY], unit);
        }

        // Stage 3: additive noise
        if let Some(noise) = &mut self.noise {
            value = finish_stage(noise.apply(MAGNITUDE_KEY, value), unit);
        }

        // EMI couples in after noise, before drift
        let emi_total = self.emi_contribution(env, dominant_hz);
        if emi_total > 0.0 {
            value = finish_stage(value + emi_total * READING_FRACTION, unit);
        }

        // Stage 4: drift
        if let (Some(drift), Some(hours)) = (&self.drift, ctx.elapsed_hours) {
            value = finish_stage(drift.apply(MAGNITUDE_KEY, value, hours), unit);
        }

        // Stage 5: calibration
        if let Some(calibration) = &self.calibration {
            value = finish_stage(
                calibration.apply(MAGNITUDE_KEY, value, true_magnitude, ctx.elapsed_hours),
                unit,
            );
        }

        // Stage 6: environmental compensation
        if let (Some(compensation), Some(ambient)) = (&self.compensation, ctx.ambient_temp_c) {
            value = finish_stage(compensation.apply(MAGNITUDE_KEY, value, ambient), unit);
        }

        let mut reading = Reading::new(unit);
        reading.insert(MAGNITUDE_KEY, value);
        if dominant_hz.is_finite() {
            reading.insert(DOMINANT_FREQUENCY_KEY, round_to(dominant_hz, 3));
        }

        if let Some(spectrum) = &self.spectrum {
            // Misalignment projects every spectral component onto the
            // true axis
            let alignment = spectrum.axis_misalignment_degrees.to_radians().cos();
            let fundamental = value;
            reading.insert(
                "spectrum_fundamental",
                finish_stage(fundamental * alignment, unit),
            );
            for (multiple, ratio) in HARMONIC_MULTIPLES.iter().zip(&spectrum.harmonic_ratios) {
                reading.insert(
                    format!("spectrum_harmonic_{multiple}"),
                    finish_stage(fundamental * ratio * alignment, unit),
                );
            }
            if emi_total > 0.0 {
                reading.insert(
                    "spectrum_noise_floor",
                    finish_stage(emi_total * NOISE_FLOOR_FRACTION * alignment, unit),
                );
            }
            if let Ok(corona) = env.corona_discharge_level(self.core.position()) {
                if corona > 0.0 {
                    reading.insert(
                        "spectrum_hf_noise",
                        finish_stage(corona * alignment, unit),
                    );
                }
            }
        }

        Ok(reading)
    }

    fn ml_metadata(&self) -> SensorMetadata {
        SensorMetadata::from_core(&self.core, self.summary.clone())
    }
}
