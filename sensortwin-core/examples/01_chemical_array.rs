//! Chemical Array Basics Example
//!
//! Builds a three-channel gas sensor with cross-sensitivity, response lag,
//! and drift, then samples it against a minimal in-memory environment.
//!
//! ## What You'll Learn
//!
//! - Implementing `EnvironmentQuery` for a test environment
//! - Configuring a sensor array from JSON
//! - How ground truth and imperfect samples diverge over time
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_chemical_array
//! ```

use std::cell::Cell;
use std::collections::BTreeMap;

use sensortwin_core::environment::{EnvError, EnvResult};
use sensortwin_core::{
    ArrayConfig, EnvironmentQuery, Position, SamplingVolume, SensorArray, SensorRegistry,
};

/// A leaking gas main: CO rises with time, the others stay flat
struct LeakEnvironment {
    hours: Cell<f64>,
}

impl EnvironmentQuery for LeakEnvironment {
    fn chemical_concentration(
        &self,
        chemical: &str,
        _position: Position,
        _volume: &SamplingVolume,
    ) -> EnvResult<f64> {
        match chemical {
            "CO" => Ok(40.0 + 20.0 * self.hours.get()),
            "NO2" => Ok(30.0),
            "SO2" => Ok(10.0),
            other => Err(EnvError::Failed(format!("no field for {other}"))),
        }
    }

    fn simulation_elapsed_hours(&self) -> EnvResult<f64> {
        Ok(self.hours.get())
    }
}

fn main() {
    let config = ArrayConfig::from_json(
        r#"{
            "id": "plant_floor",
            "sensors": [{
                "kind": "chemical_array",
                "id": "gas_rack",
                "params": {
                    "channels": ["CO", "NO2", "SO2"],
                    "cross_sensitivity": {"CO": {"NO2": 0.1, "SO2": 0.05}}
                },
                "imperfections": {
                    "response": {"alpha": 0.6},
                    "noise": {"std_dev": 0.5, "seed": 42},
                    "drift": {"baseline_per_hour": 0.2, "sensitivity_percent_per_hour": 1.0}
                }
            }]
        }"#,
    )
    .expect("config parses");

    let registry = SensorRegistry::with_builtin_kinds();
    let mut array = SensorArray::from_config(&config, &registry).expect("array builds");

    let env = LeakEnvironment { hours: Cell::new(0.0) };

    println!("SensorTwin Chemical Array Example");
    println!("=================================\n");
    println!("{:>5} {:>10} {:>10} {:>10}", "hour", "true CO", "read CO", "read NO2");

    for step in 0..6 {
        env.hours.set(step as f64 * 0.5);

        let truth = array.ground_truth_data(&env);
        let readings = array.sample_environment(&env);

        let true_co = truth["gas_rack"].as_ref().unwrap().get("CO").unwrap();
        let reading = readings["gas_rack"].as_ref().unwrap();
        println!(
            "{:>5.1} {:>10.3} {:>10.3} {:>10.3}",
            env.hours.get(),
            true_co,
            reading.get("CO").unwrap(),
            reading.get("NO2").unwrap(),
        );
    }

    println!("\nThe read CO trails the true value (response lag), rides above");
    println!("NO2's cross-talk contribution, and creeps upward with drift.");
}
