//! Shared test environment doubles
//!
//! A scriptable in-memory implementation of `EnvironmentQuery`. Each
//! capability is backed by an `Option`; `None` means the environment does
//! not provide it, exercising the graceful-degradation paths.

use std::collections::BTreeMap;

use sensortwin_core::environment::{EmfCharacteristics, EnvError, EnvResult, InterferenceSource};
use sensortwin_core::{EnvironmentQuery, Position, SamplingVolume, ThermalImage, Vector3};

/// Scriptable digital-twin environment
#[derive(Default)]
pub struct TwinEnvironment {
    /// Species → concentration in ppm
    pub concentrations: BTreeMap<String, f64>,
    /// Ambient temperature; `None` = capability absent
    pub ambient_c: Option<f64>,
    /// Simulation clock; `None` = capability absent
    pub elapsed_hours: Option<f64>,
    /// Uniform thermal scene; `None` = capability absent
    pub scene_c: Option<f64>,
    /// Hot spots painted over the uniform scene, (row, col, °C)
    pub thermal_spots: Vec<(usize, usize, f64)>,
    /// EMF state; `None` = capability absent
    pub emf: Option<EmfCharacteristics>,
    /// Interference sources; `None` = capability absent
    pub interference: Option<Vec<InterferenceSource>>,
    /// Corona discharge indicator; `None` = capability absent
    pub corona: Option<f64>,
}

impl TwinEnvironment {
    pub fn with_concentrations(pairs: &[(&str, f64)]) -> Self {
        Self {
            concentrations: pairs
                .iter()
                .map(|(species, ppm)| (species.to_string(), *ppm))
                .collect(),
            ..Default::default()
        }
    }
}

impl EnvironmentQuery for TwinEnvironment {
    fn chemical_concentration(
        &self,
        chemical: &str,
        _position: Position,
        _volume: &SamplingVolume,
    ) -> EnvResult<f64> {
        if self.concentrations.is_empty() {
            return Err(EnvError::Unsupported);
        }
        self.concentrations
            .get(chemical)
            .copied()
            .ok_or_else(|| EnvError::Failed(format!("no concentration field for {chemical}")))
    }

    fn temperature_celsius(&self, _position: Position, _volume: &SamplingVolume) -> EnvResult<f64> {
        self.ambient_c.ok_or(EnvError::Unsupported)
    }

    fn thermal_field_view(
        &self,
        _camera_position: Position,
        _orientation: Vector3,
        _fov_degrees: f64,
        resolution: (usize, usize),
    ) -> EnvResult<ThermalImage> {
        let scene = self.scene_c.ok_or(EnvError::Unsupported)?;
        let (width, height) = resolution;
        let mut image = ThermalImage::filled(width, height, scene);
        for &(row, col, temp) in &self.thermal_spots {
            image.set(row, col, temp);
        }
        Ok(image)
    }

    fn emf_characteristics(
        &self,
        _position: Position,
        _frequency_range_hz: (f64, f64),
    ) -> EnvResult<EmfCharacteristics> {
        self.emf.ok_or(EnvError::Unsupported)
    }

    fn nearby_interference_sources(
        &self,
        _position: Position,
        _radius_m: f64,
    ) -> EnvResult<Vec<InterferenceSource>> {
        self.interference.clone().ok_or(EnvError::Unsupported)
    }

    fn corona_discharge_level(&self, _position: Position) -> EnvResult<f64> {
        self.corona.ok_or(EnvError::Unsupported)
    }

    fn simulation_elapsed_hours(&self) -> EnvResult<f64> {
        self.elapsed_hours.ok_or(EnvError::Unsupported)
    }
}
