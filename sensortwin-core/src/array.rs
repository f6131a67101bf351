//! Sensor Array Orchestrator
//!
//! ## Overview
//!
//! A [`SensorArray`] owns a named collection of sensors, builds them from
//! an [`ArrayConfig`] through an explicit [`SensorRegistry`], and fans
//! sampling calls out across the collection. Membership is fixed once the
//! array is built; sensors may be enabled or disabled afterwards but never
//! added or removed.
//!
//! ## Failure isolation
//!
//! One sensor failing must never silence the others: each per-sensor
//! result (reading or structured error) lands in its own map entry,
//! keyed by sensor id. The only fatal construction paths are invalid
//! configuration (bad parameters, duplicate ids); an *unregistered kind*
//! merely skips that sensor with a warning, so a config written for a
//! richer registry still builds a usable array.
//!
//! ## Registry
//!
//! The kind → constructor mapping is an explicit value built once at
//! startup and passed in, not a module-level global. Custom kinds
//! register alongside the built-ins:
//!
//! ```
//! use sensortwin_core::array::SensorRegistry;
//!
//! let registry = SensorRegistry::with_builtin_kinds();
//! assert!(registry.builder("chemical_array").is_some());
//! ```

use std::collections::BTreeMap;

use crate::config::{ArrayConfig, SensorEntry};
use crate::environment::EnvironmentQuery;
use crate::errors::{SensorError, SensorResult};
use crate::geometry::Position;
use crate::reading::Reading;
use crate::sensor::{Sensor, SensorMetadata};
use crate::sensors::{ChemicalArraySensor, FieldSensor, ThermalImagerSensor};

/// Constructor signature for one sensor kind
///
/// Receives the resolved id and pose plus the raw configuration entry;
/// the builder validates the kind-specific parameter block itself.
pub type SensorBuilder = fn(String, Position, &SensorEntry) -> SensorResult<Box<dyn Sensor>>;

/// Explicit kind → constructor mapping
pub struct SensorRegistry {
    builders: BTreeMap<String, SensorBuilder>,
}

impl SensorRegistry {
    /// Empty registry; useful when only custom kinds should exist
    pub fn new() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// Registry pre-loaded with the three built-in kinds
    pub fn with_builtin_kinds() -> Self {
        let mut registry = Self::new();
        registry.register(ChemicalArraySensor::KIND, |id, position, entry| {
            Ok(Box::new(ChemicalArraySensor::from_entry(id, position, entry)?))
        });
        registry.register(ThermalImagerSensor::KIND, |id, position, entry| {
            Ok(Box::new(ThermalImagerSensor::from_entry(id, position, entry)?))
        });
        registry.register(FieldSensor::KIND, |id, position, entry| {
            Ok(Box::new(FieldSensor::from_entry(id, position, entry)?))
        });
        registry
    }

    /// Register a kind, replacing any previous builder for it
    pub fn register(&mut self, kind: &str, builder: SensorBuilder) {
        self.builders.insert(kind.to_string(), builder);
    }

    pub fn builder(&self, kind: &str) -> Option<&SensorBuilder> {
        self.builders.get(kind)
    }

    /// Registered kind strings, sorted
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::with_builtin_kinds()
    }
}

/// One training sample: imperfect readings plus ground-truth-derived labels
#[derive(Debug)]
pub struct TrainingSample {
    /// Per-sensor reading or error, keyed by sensor id
    pub readings: BTreeMap<String, SensorResult<Reading>>,
    /// Scenario labels plus `gt_<sensor_id>_<channel>` ground-truth fields
    pub labels: BTreeMap<String, serde_json::Value>,
}

/// Named collection of sensors sampled as one unit
pub struct SensorArray {
    id: String,
    sensors: BTreeMap<String, Box<dyn Sensor>>,
}

impl SensorArray {
    /// Build from configuration
    ///
    /// Unregistered kinds are skipped with a warning; invalid parameters
    /// and duplicate ids are fatal.
    pub fn from_config(config: &ArrayConfig, registry: &SensorRegistry) -> SensorResult<Self> {
        if config.id.is_empty() {
            return Err(SensorError::invalid_config("array id must not be empty"));
        }

        let mut sensors: BTreeMap<String, Box<dyn Sensor>> = BTreeMap::new();
        for (ordinal, entry) in config.sensors.iter().enumerate() {
            let id = entry
                .id
                .clone()
                .unwrap_or_else(|| format!("{}_{}_{}", config.id, entry.kind, ordinal));

            let Some(builder) = registry.builder(&entry.kind) else {
                log::warn!(
                    "array {}: kind '{}' is not registered, skipping sensor '{}'",
                    config.id,
                    entry.kind,
                    id
                );
                continue;
            };

            let position = entry.position.unwrap_or(config.default_position);
            let sensor = builder(id.clone(), position, entry)?;

            if sensors.contains_key(&id) {
                return Err(SensorError::invalid_config(format!(
                    "duplicate sensor id '{id}' in array '{}'",
                    config.id
                )));
            }
            sensors.insert(id, sensor);
        }

        Ok(Self {
            id: config.id.clone(),
            sensors,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Sensor ids in sorted order
    pub fn sensor_ids(&self) -> Vec<&str> {
        self.sensors.keys().map(String::as_str).collect()
    }

    pub fn sensor(&self, id: &str) -> Option<&dyn Sensor> {
        self.sensors.get(id).map(|s| s.as_ref())
    }

    pub fn sensor_mut(&mut self, id: &str) -> Option<&mut (dyn Sensor + 'static)> {
        self.sensors.get_mut(id).map(|s| s.as_mut())
    }

    /// Sample every enabled sensor, isolating per-sensor failures
    pub fn sample_environment(
        &mut self,
        env: &dyn EnvironmentQuery,
    ) -> BTreeMap<String, SensorResult<Reading>> {
        self.sensors
            .iter_mut()
            .filter(|(_, sensor)| sensor.is_enabled())
            .map(|(id, sensor)| (id.clone(), sensor.sample(env)))
            .collect()
    }

    /// Ground truth from every enabled, ground-truth-capable sensor
    pub fn ground_truth_data(
        &self,
        env: &dyn EnvironmentQuery,
    ) -> BTreeMap<String, SensorResult<Reading>> {
        self.sensors
            .iter()
            .filter(|(_, sensor)| sensor.is_enabled() && sensor.has_ground_truth())
            .map(|(id, sensor)| (id.clone(), sensor.ground_truth(env)))
            .collect()
    }

    /// One (readings, labels) pair for training-data generation
    ///
    /// Labels combine the caller's scenario labels with every available
    /// ground-truth field, flattened as `gt_<sensor_id>_<channel>`.
    /// Sensors whose ground truth fails contribute no labels; their error
    /// still appears in the readings map.
    pub fn generate_training_sample(
        &mut self,
        env: &dyn EnvironmentQuery,
        scenario_labels: &BTreeMap<String, serde_json::Value>,
    ) -> TrainingSample {
        let readings = self.sample_environment(env);

        let mut labels = scenario_labels.clone();
        for (id, result) in self.ground_truth_data(env) {
            if let Ok(reading) = result {
                for (channel, value) in reading.iter() {
                    labels.insert(
                        format!("gt_{id}_{channel}"),
                        serde_json::Value::from(*value),
                    );
                }
            }
        }

        TrainingSample { readings, labels }
    }

    /// Metadata for every sensor, enabled or not
    pub fn ml_metadata(&self) -> Vec<SensorMetadata> {
        self.sensors.values().map(|s| s.ml_metadata()).collect()
    }
}
