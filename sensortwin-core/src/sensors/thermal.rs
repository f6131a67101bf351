//! 2-D thermal imager sensor
//!
//! ## Model
//!
//! A fixed width × height microbolometer grid. Ground truth is a full
//! thermal image from the environment, validated against the configured
//! resolution. On top of the shared pipeline the imager adds structural
//! defects between the noise and calibration stages:
//!
//! - **Dead pixels**: stuck low at a configured value
//! - **Hot pixels**: stuck high at a configured value
//! - **Optical blur**: separable Gaussian convolution over the frame
//!
//! Defect pixels are forced again after the blur pass so bleed from
//! neighbors never softens them; with calibration unconfigured their final
//! values are exactly the configured constants.
//!
//! Calibration and environmental compensation are global (one gain/offset/
//! coefficient for the whole frame), not per-pixel. Temperatures are
//! rounded to 2 decimals after every stage and never sign-clamped.

use serde::Deserialize;

use crate::config::{ImperfectionConfig, SensorEntry};
use crate::constants::thermal::{
    BLUR_KERNEL_SIGMAS, DEFAULT_DEAD_PIXEL_C, DEFAULT_FOV_DEGREES, DEFAULT_HOT_PIXEL_C,
};
use crate::environment::EnvironmentQuery;
use crate::errors::{SensorError, SensorResult};
use crate::geometry::{Position, SamplingVolume, Vector3};
use crate::pipeline::{
    CalibrationModel, CompensationModel, DriftModel, GridResponseFilter, NoiseInjector,
};
use crate::reading::{round_to, Reading, Unit};
use crate::sensor::{ImperfectionSummary, Sensor, SensorCore, SensorMetadata};
use crate::thermal_image::ThermalImage;

fn default_fov() -> f64 {
    DEFAULT_FOV_DEGREES
}

fn default_dead_value() -> f64 {
    DEFAULT_DEAD_PIXEL_C
}

fn default_hot_value() -> f64 {
    DEFAULT_HOT_PIXEL_C
}

/// Kind-specific parameters, closed schema
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThermalImagerParams {
    pub width: usize,
    pub height: usize,

    /// Camera boresight direction
    #[serde(default)]
    pub orientation: Vector3,

    #[serde(default = "default_fov")]
    pub fov_degrees: f64,

    /// `[row, col]` coordinates stuck at `dead_pixel_value`
    #[serde(default)]
    pub dead_pixels: Vec<[usize; 2]>,

    /// `[row, col]` coordinates stuck at `hot_pixel_value`
    #[serde(default)]
    pub hot_pixels: Vec<[usize; 2]>,

    #[serde(default = "default_dead_value")]
    pub dead_pixel_value: f64,

    #[serde(default = "default_hot_value")]
    pub hot_pixel_value: f64,

    /// Gaussian blur sigma in pixels; absent means no blur
    #[serde(default)]
    pub blur_sigma: Option<f64>,
}

/// Thermal imaging sensor with pixel defects and optical blur
pub struct ThermalImagerSensor {
    core: SensorCore,
    width: usize,
    height: usize,
    orientation: Vector3,
    fov_degrees: f64,
    dead_pixels: Vec<[usize; 2]>,
    hot_pixels: Vec<[usize; 2]>,
    dead_pixel_value: f64,
    hot_pixel_value: f64,
    blur_sigma: Option<f64>,
    response: Option<GridResponseFilter>,
    noise: Option<NoiseInjector>,
    drift: Option<DriftModel>,
    calibration: Option<CalibrationModel>,
    compensation: Option<CompensationModel>,
    needs_clock: bool,
    summary: ImperfectionSummary,
}

impl ThermalImagerSensor {
    /// Registry kind string
    pub const KIND: &'static str = "thermal_imager";

    pub fn new(
        id: impl Into<String>,
        position: Position,
        volume: SamplingVolume,
        enabled: bool,
        has_ground_truth: bool,
        params: ThermalImagerParams,
        imperfections: &ImperfectionConfig,
    ) -> SensorResult<Self> {
        let core = SensorCore::new(id, Self::KIND, position, volume, enabled, has_ground_truth)?;

        if params.width == 0 || params.height == 0 {
            return Err(SensorError::invalid_config(
                "thermal imager resolution must be non-zero in both axes",
            ));
        }
        for &[row, col] in params.dead_pixels.iter().chain(params.hot_pixels.iter()) {
            if row >= params.height || col >= params.width {
                return Err(SensorError::invalid_config(format!(
                    "defect pixel [{row}, {col}] outside {}x{} image",
                    params.width, params.height
                )));
            }
        }
        if let Some(sigma) = params.blur_sigma {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(SensorError::invalid_config(format!(
                    "blur sigma must be positive, got {sigma}"
                )));
            }
        }

        let response = match &imperfections.response {
            Some(spec) => Some(GridResponseFilter::new(spec.alpha)?),
            None => None,
        };
        let needs_clock = imperfections.drift.is_some()
            || imperfections.calibration.as_ref().is_some_and(|c| {
                c.gain_drift_per_hour != 0.0 || c.offset_drift_per_hour != 0.0
            });

        Ok(Self {
            core,
            width: params.width,
            height: params.height,
            orientation: params.orientation,
            fov_degrees: params.fov_degrees,
            dead_pixels: params.dead_pixels,
            hot_pixels: params.hot_pixels,
            dead_pixel_value: params.dead_pixel_value,
            hot_pixel_value: params.hot_pixel_value,
            blur_sigma: params.blur_sigma,
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
            summary: ImperfectionSummary::from_config(imperfections),
        })
    }

    /// Build from a configuration entry with an already-resolved id/pose
    pub fn from_entry(
        id: String,
        position: Position,
        entry: &SensorEntry,
    ) -> SensorResult<Self> {
        let params: ThermalImagerParams = entry.kind_params()?;
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

    pub fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn round_image(image: &mut ThermalImage) {
        for pixel in image.pixels_mut() {
            *pixel = round_to(*pixel, Unit::Celsius.decimals());
        }
    }

    /// Force dead and hot pixels to their configured values
    fn stamp_defects(&self, image: &mut ThermalImage) {
        for &[row, col] in &self.dead_pixels {
            image.set(row, col, self.dead_pixel_value);
        }
        for &[row, col] in &self.hot_pixels {
            image.set(row, col, self.hot_pixel_value);
        }
    }

    /// Separable Gaussian convolution with edge clamping
    fn blur(&self, image: &ThermalImage, sigma: f64) -> ThermalImage {
        let radius = (BLUR_KERNEL_SIGMAS * sigma).ceil().max(1.0) as i64;
        let mut kernel = Vec::with_capacity(2 * radius as usize + 1);
        for i in -radius..=radius {
            kernel.push((-(i as f64).powi(2) / (2.0 * sigma * sigma)).exp());
        }
        let norm: f64 = kernel.iter().sum();

        let (width, height) = (self.width as i64, self.height as i64);
        let sample = |img: &ThermalImage, row: i64, col: i64| {
            let r = row.clamp(0, height - 1) as usize;
            let c = col.clamp(0, width - 1) as usize;
            img.get(r, c)
        };

        // Horizontal pass
        let mut horizontal = ThermalImage::filled(self.width, self.height, 0.0);
        for row in 0..height {
            for col in 0..width {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    acc += weight * sample(image, row, col + k as i64 - radius);
                }
                horizontal.set(row as usize, col as usize, acc / norm);
            }
        }

        // Vertical pass
        let mut blurred = ThermalImage::filled(self.width, self.height, 0.0);
        for row in 0..height {
            for col in 0..width {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    acc += weight * sample(&horizontal, row + k as i64 - radius, col);
                }
                blurred.set(row as usize, col as usize, acc / norm);
            }
        }
        blurred
    }
}

impl Sensor for ThermalImagerSensor {
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
        let mut image = env
            .thermal_field_view(
                self.core.position(),
                self.orientation,
                self.fov_degrees,
                (self.width, self.height),
            )
            .map_err(|e| e.into_sensor_error("thermal_field_view"))?;

        if image.resolution() != (self.width, self.height) {
            return Err(SensorError::MalformedResponse {
                reason: format!(
                    "environment returned a {}x{} image, sensor is configured for {}x{}",
                    image.width(),
                    image.height(),
                    self.width,
                    self.height
                ),
            });
        }

        Self::round_image(&mut image);
        Ok(image.to_reading())
    }

    fn apply_imperfections(
        &mut self,
        truth: Reading,
        env: &dyn EnvironmentQuery,
    ) -> SensorResult<Reading> {
        let needs_ambient = self.compensation.is_some();
        let ctx = self.core.stage_context(env, self.needs_clock, needs_ambient);

        let truth_image = ThermalImage::from_reading(&truth, self.width, self.height)?;
        let mut image = truth_image.clone();

        // Stage 2: per-pixel response lag
        if let Some(filter) = &mut self.response {
            filter.filter(image.pixels_mut());
            Self::round_image(&mut image);
        }

        // Stage 3: per-pixel noise
        if let Some(noise) = &mut self.noise {
            noise.apply_grid(image.pixels_mut());
            Self::round_image(&mut image);
        }

        // Structural defects sit between noise and calibration
        self.stamp_defects(&mut image);

        if let Some(sigma) = self.blur_sigma {
            image = self.blur(&image, sigma);
            Self::round_image(&mut image);
            // Blur bleeds neighbors into defect pixels; force them back
            self.stamp_defects(&mut image);
        }

        // Stage 4: whole-frame drift
        if let (Some(drift), Some(hours)) = (&self.drift, ctx.elapsed_hours) {
            for pixel in image.pixels_mut() {
                *pixel = round_to(drift.apply_uniform(*pixel, hours), Unit::Celsius.decimals());
            }
        }

        // Stage 5: global calibration, per-pixel true reference
        if let Some(calibration) = &self.calibration {
            for (pixel, &true_pixel) in image
                .pixels_mut()
                .iter_mut()
                .zip(truth_image.pixels().iter())
            {
                *pixel = round_to(
                    calibration.apply_uniform(*pixel, true_pixel, ctx.elapsed_hours),
                    Unit::Celsius.decimals(),
                );
            }
        }

        // Stage 6: global environmental compensation
        if let (Some(compensation), Some(ambient)) = (&self.compensation, ctx.ambient_temp_c) {
            for pixel in image.pixels_mut() {
                *pixel = round_to(
                    compensation.apply_uniform(*pixel, ambient),
                    Unit::Celsius.decimals(),
                );
            }
        }

        Ok(image.to_reading())
    }

    fn ml_metadata(&self) -> SensorMetadata {
        SensorMetadata::from_core(&self.core, self.summary.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoiseSpec;
    use crate::environment::EnvResult;

    /// Environment serving a uniform scene, with one warm spot
    struct SceneEnv {
        scene: f64,
        spot: Option<(usize, usize, f64)>,
        served_resolution: Option<(usize, usize)>,
    }

    impl EnvironmentQuery for SceneEnv {
        fn thermal_field_view(
            &self,
            _camera_position: Position,
            _orientation: Vector3,
            _fov_degrees: f64,
            resolution: (usize, usize),
        ) -> EnvResult<ThermalImage> {
            let (width, height) = self.served_resolution.unwrap_or(resolution);
            let mut image = ThermalImage::filled(width, height, self.scene);
            if let Some((row, col, temp)) = self.spot {
                image.set(row, col, temp);
            }
            Ok(image)
        }
    }

    fn imager(params: ThermalImagerParams, imperfections: ImperfectionConfig) -> ThermalImagerSensor {
        ThermalImagerSensor::new(
            "cam_0",
            Position::default(),
            SamplingVolume::Point,
            true,
            true,
            params,
            &imperfections,
        )
        .unwrap()
    }

    fn basic_params(width: usize, height: usize) -> ThermalImagerParams {
        ThermalImagerParams {
            width,
            height,
            orientation: Vector3::default(),
            fov_degrees: DEFAULT_FOV_DEGREES,
            dead_pixels: vec![],
            hot_pixels: vec![],
            dead_pixel_value: DEFAULT_DEAD_PIXEL_C,
            hot_pixel_value: DEFAULT_HOT_PIXEL_C,
            blur_sigma: None,
        }
    }

    #[test]
    fn perfect_imager_reproduces_ground_truth() {
        let env = SceneEnv {
            scene: 21.5,
            spot: Some((1, 2, 80.0)),
            served_resolution: None,
        };
        let mut sensor = imager(basic_params(4, 3), ImperfectionConfig::default());
        let truth = sensor.ground_truth(&env).unwrap();
        let sample = sensor.sample(&env).unwrap();
        assert_eq!(truth, sample);
        assert_eq!(sample.get("px_1_2"), Some(80.0));
    }

    #[test]
    fn wrong_resolution_is_a_malformed_response() {
        let env = SceneEnv {
            scene: 20.0,
            spot: None,
            served_resolution: Some((8, 8)),
        };
        let mut sensor = imager(basic_params(4, 3), ImperfectionConfig::default());
        assert!(matches!(
            sensor.sample(&env),
            Err(SensorError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn defect_pixels_survive_noise_and_blur() {
        let env = SceneEnv {
            scene: 25.0,
            spot: None,
            served_resolution: None,
        };
        let mut params = basic_params(6, 6);
        params.dead_pixels = vec![[0, 0]];
        params.hot_pixels = vec![[3, 4]];
        params.blur_sigma = Some(1.0);

        let imperfections = ImperfectionConfig {
            noise: Some(NoiseSpec {
                std_dev: 2.0,
                seed: Some(7),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut sensor = imager(params, imperfections);

        for _ in 0..3 {
            let reading = sensor.sample(&env).unwrap();
            assert_eq!(reading.get("px_0_0"), Some(DEFAULT_DEAD_PIXEL_C));
            assert_eq!(reading.get("px_3_4"), Some(DEFAULT_HOT_PIXEL_C));
        }
    }

    #[test]
    fn blur_smooths_toward_neighbors() {
        let env = SceneEnv {
            scene: 20.0,
            spot: Some((3, 3, 100.0)),
            served_resolution: None,
        };
        let mut params = basic_params(7, 7);
        params.blur_sigma = Some(1.0);
        let mut sensor = imager(params, ImperfectionConfig::default());

        let reading = sensor.sample(&env).unwrap();
        let center = reading.get("px_3_3").unwrap();
        let neighbor = reading.get("px_3_4").unwrap();
        // Spot energy spreads: center drops, neighbor rises
        assert!(center < 100.0 && center > 20.0);
        assert!(neighbor > 20.0);
    }

    #[test]
    fn defect_pixel_outside_image_is_a_construction_error() {
        let mut params = basic_params(4, 4);
        params.hot_pixels = vec![[4, 0]];
        let result = ThermalImagerSensor::new(
            "cam_bad",
            Position::default(),
            SamplingVolume::Point,
            true,
            true,
            params,
            &ImperfectionConfig::default(),
        );
        assert!(matches!(result, Err(SensorError::InvalidConfig { .. })));
    }

    #[test]
    fn temperatures_may_be_negative() {
        let env = SceneEnv {
            scene: -30.0,
            spot: None,
            served_resolution: None,
        };
        let mut sensor = imager(basic_params(2, 2), ImperfectionConfig::default());
        let reading = sensor.sample(&env).unwrap();
        assert_eq!(reading.get("px_0_0"), Some(-30.0));
    }
}
