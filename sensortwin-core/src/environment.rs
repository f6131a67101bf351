//! Environment Query Interface
//!
//! ## Overview
//!
//! The simulated physical environment is an external collaborator; this
//! core only ever *queries* it. `EnvironmentQuery` is the capability
//! surface those queries go through. Every method is optional: the default
//! implementations report the capability as unsupported, and sensors
//! degrade gracefully (structured error for required capabilities, skipped
//! pipeline stage for optional ones) instead of failing.
//!
//! ## Design
//!
//! The original system substituted bound methods on environment objects to
//! mock capabilities in tests. Here that becomes a plain trait: each test
//! double implements exactly the methods it supports and inherits
//! `Unsupported` for the rest. No runtime patching, and the capability set
//! of any environment is visible in its `impl` block.
//!
//! The environment is treated as read-only from the core's perspective;
//! all methods take `&self` and a query must never observably mutate the
//! world.

use crate::errors::SensorError;
use crate::geometry::{Position, SamplingVolume, Vector3};
use crate::thermal_image::ThermalImage;
use thiserror::Error;

/// Result type for environment queries
pub type EnvResult<T> = Result<T, EnvError>;

/// Failure modes of a single environment query
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    /// The environment does not implement this capability
    #[error("capability not provided by this environment")]
    Unsupported,

    /// The capability exists but the query failed
    #[error("query failed: {0}")]
    Failed(String),
}

impl EnvError {
    /// Convert into the sensor-facing error, tagging the capability name
    pub(crate) fn into_sensor_error(self, capability: &'static str) -> SensorError {
        match self {
            EnvError::Unsupported => SensorError::CapabilityMissing { capability },
            EnvError::Failed(reason) => SensorError::CapabilityFailed { capability, reason },
        }
    }
}

/// Electromagnetic field state at a position, as reported by the environment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmfCharacteristics {
    /// Field magnitude in V/m
    pub magnitude: f64,
    /// Dominant frequency in Hz
    pub dominant_frequency_hz: f64,
    /// Field direction, if the environment models one
    pub field_vector: Option<Vector3>,
}

/// An interference source near a field sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterferenceSource {
    pub position: Position,
    /// Source strength in V/m at 1 m
    pub strength: f64,
    /// Emission frequency in Hz
    pub frequency_hz: f64,
}

/// Capability surface of the simulated environment
///
/// Each method defaults to `Err(EnvError::Unsupported)` so an environment
/// (or a test double) only implements what it actually models.
pub trait EnvironmentQuery {
    /// Concentration of a chemical species averaged over a volume, in ppm
    fn chemical_concentration(
        &self,
        chemical: &str,
        position: Position,
        volume: &SamplingVolume,
    ) -> EnvResult<f64> {
        let _ = (chemical, position, volume);
        Err(EnvError::Unsupported)
    }

    /// Ambient temperature averaged over a volume, in °C
    fn temperature_celsius(&self, position: Position, volume: &SamplingVolume) -> EnvResult<f64> {
        let _ = (position, volume);
        Err(EnvError::Unsupported)
    }

    /// Thermal image seen by a camera at `camera_position` looking along
    /// `orientation` with the given field of view, at the requested
    /// resolution
    fn thermal_field_view(
        &self,
        camera_position: Position,
        orientation: Vector3,
        fov_degrees: f64,
        resolution: (usize, usize),
    ) -> EnvResult<ThermalImage> {
        let _ = (camera_position, orientation, fov_degrees, resolution);
        Err(EnvError::Unsupported)
    }

    /// Electromagnetic field state within a frequency band
    fn emf_characteristics(
        &self,
        position: Position,
        frequency_range_hz: (f64, f64),
    ) -> EnvResult<EmfCharacteristics> {
        let _ = (position, frequency_range_hz);
        Err(EnvError::Unsupported)
    }

    /// Interference sources within `radius_m` of a position
    fn nearby_interference_sources(
        &self,
        position: Position,
        radius_m: f64,
    ) -> EnvResult<Vec<InterferenceSource>> {
        let _ = (position, radius_m);
        Err(EnvError::Unsupported)
    }

    /// Corona discharge indicator at a position; > 0 means active discharge
    fn corona_discharge_level(&self, position: Position) -> EnvResult<f64> {
        let _ = position;
        Err(EnvError::Unsupported)
    }

    /// Simulation clock, in hours since scenario start
    fn simulation_elapsed_hours(&self) -> EnvResult<f64> {
        Err(EnvError::Unsupported)
    }
}
