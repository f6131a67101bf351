//! Thermal Imager Example
//!
//! Renders a small thermal scene with a hot spot and shows how pixel
//! defects and optical blur shape the sampled frame.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_thermal_imager
//! ```

use sensortwin_core::environment::EnvResult;
use sensortwin_core::{
    ArrayConfig, EnvironmentQuery, Position, SensorArray, SensorRegistry, ThermalImage, Vector3,
};

/// A 20 °C wall with an 90 °C hot spot in the middle
struct WallScene;

impl EnvironmentQuery for WallScene {
    fn thermal_field_view(
        &self,
        _camera_position: Position,
        _orientation: Vector3,
        _fov_degrees: f64,
        resolution: (usize, usize),
    ) -> EnvResult<ThermalImage> {
        let (width, height) = resolution;
        let mut image = ThermalImage::filled(width, height, 20.0);
        image.set(height / 2, width / 2, 90.0);
        Ok(image)
    }
}

fn main() {
    let config = ArrayConfig::from_json(
        r#"{
            "id": "inspection",
            "sensors": [{
                "kind": "thermal_imager",
                "id": "cam",
                "params": {
                    "width": 9,
                    "height": 7,
                    "dead_pixels": [[0, 0]],
                    "hot_pixels": [[6, 8]],
                    "blur_sigma": 0.8
                },
                "imperfections": {
                    "noise": {"std_dev": 0.3, "seed": 7}
                }
            }]
        }"#,
    )
    .expect("config parses");

    let registry = SensorRegistry::with_builtin_kinds();
    let mut array = SensorArray::from_config(&config, &registry).expect("array builds");

    let readings = array.sample_environment(&WallScene);
    let frame = readings["cam"].as_ref().expect("camera reads");

    println!("SensorTwin Thermal Imager Example");
    println!("=================================\n");
    for row in 0..7 {
        for col in 0..9 {
            let key = ThermalImage::pixel_key(row, col);
            print!("{:>7.1}", frame.get(&key).unwrap());
        }
        println!();
    }

    println!("\nThe hot spot is blurred into its neighbors, the dead pixel");
    println!("at (0,0) is stuck at -40.0, the hot pixel at (6,8) at 150.0.");
}
