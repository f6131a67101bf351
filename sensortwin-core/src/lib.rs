//! Sensor simulation core for SensorTwin
//!
//! Produces synthetic sensor readings from a digital-twin environment,
//! reproducing the imperfections of real instruments: finite response
//! time, noise, drift, cross-channel interference, calibration error,
//! environmental compensation error, and optical/electrical artifacts.
//! The readings feed downstream ML-training-data generation; the
//! environment model itself is an external collaborator reached only
//! through the [`EnvironmentQuery`] capability trait.
//!
//! ```no_run
//! use sensortwin_core::{ArrayConfig, SensorArray, SensorRegistry};
//!
//! let config = ArrayConfig::from_json(r#"{
//!     "id": "station_a",
//!     "sensors": [
//!         {"kind": "chemical_array", "params": {"channels": ["CO", "NO2"]}}
//!     ]
//! }"#).unwrap();
//!
//! let registry = SensorRegistry::with_builtin_kinds();
//! let mut array = SensorArray::from_config(&config, &registry).unwrap();
//! // let readings = array.sample_environment(&env);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod array;
pub mod config;
pub mod constants;
pub mod environment;
pub mod errors;
pub mod geometry;
pub mod pipeline;
pub mod reading;
pub mod sensor;
pub mod sensors;
pub mod thermal_image;

// Public API
pub use array::{SensorArray, SensorRegistry, TrainingSample};
pub use config::{ArrayConfig, ImperfectionConfig, SensorEntry};
pub use environment::{EmfCharacteristics, EnvironmentQuery, InterferenceSource};
pub use errors::{SensorError, SensorResult};
pub use geometry::{Position, SamplingVolume, Vector3};
pub use reading::{Reading, Unit};
pub use sensor::{Sensor, SensorMetadata};
pub use sensors::{ChemicalArraySensor, FieldSensor, ThermalImagerSensor};
pub use thermal_image::ThermalImage;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
