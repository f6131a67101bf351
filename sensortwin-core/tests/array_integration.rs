//! Array-level behavior against a scriptable environment: config-driven
//! construction, fan-out sampling, failure isolation, training samples.

mod common;

use std::collections::BTreeMap;

use common::TwinEnvironment;
use sensortwin_core::{ArrayConfig, EmfCharacteristics, SensorArray, SensorRegistry};

fn full_station_config() -> ArrayConfig {
    ArrayConfig::from_json(
        r#"{
            "id": "substation_7",
            "default_position": {"x": 10.0, "y": 0.0, "z": 1.5},
            "sensors": [
                {
                    "kind": "chemical_array",
                    "id": "gas_rack",
                    "params": {
                        "channels": ["CO", "NO2", "SO2"],
                        "cross_sensitivity": {"CO": {"NO2": 0.1, "SO2": 0.05}}
                    },
                    "imperfections": {
                        "response": {"alpha": 1.0}
                    }
                },
                {
                    "kind": "thermal_imager",
                    "id": "cam_north",
                    "params": {"width": 8, "height": 6, "dead_pixels": [[0, 0]]}
                },
                {
                    "kind": "field",
                    "id": "emf_probe",
                    "params": {
                        "orientation": {"x": 1.0, "y": 0.0, "z": 0.0},
                        "frequency_gain": {"50": 1.5},
                        "spectrum": {}
                    }
                }
            ]
        }"#,
    )
    .unwrap()
}

fn full_environment() -> TwinEnvironment {
    let mut env = TwinEnvironment::with_concentrations(&[
        ("CO", 100.0),
        ("NO2", 50.0),
        ("SO2", 20.0),
    ]);
    env.scene_c = Some(22.0);
    env.thermal_spots = vec![(2, 3, 75.0)];
    env.emf = Some(EmfCharacteristics {
        magnitude: 4.0,
        dominant_frequency_hz: 50.0,
        field_vector: None,
    });
    env.elapsed_hours = Some(0.0);
    env.ambient_c = Some(25.0);
    env
}

#[test]
fn full_station_samples_every_sensor() {
    let env = full_environment();
    let mut array =
        SensorArray::from_config(&full_station_config(), &SensorRegistry::with_builtin_kinds())
            .unwrap();
    assert_eq!(array.len(), 3);

    let results = array.sample_environment(&env);
    assert_eq!(results.len(), 3);

    let gas = results["gas_rack"].as_ref().unwrap();
    assert_eq!(gas.get("CO"), Some(106.0));
    assert_eq!(gas.get("NO2"), Some(50.0));

    let cam = results["cam_north"].as_ref().unwrap();
    assert_eq!(cam.len(), 8 * 6);
    assert_eq!(cam.get("px_2_3"), Some(75.0));
    // Dead pixel forced low regardless of the scene
    assert_eq!(cam.get("px_0_0"), Some(-40.0));

    let emf = results["emf_probe"].as_ref().unwrap();
    assert_eq!(emf.get("magnitude"), Some(6.0)); // 4.0 × table gain 1.5
    assert_eq!(emf.get("spectrum_fundamental"), Some(6.0));
}

#[test]
fn one_dead_capability_fails_only_its_sensor() {
    let mut env = full_environment();
    env.scene_c = None; // thermal capability withdrawn

    let mut array =
        SensorArray::from_config(&full_station_config(), &SensorRegistry::with_builtin_kinds())
            .unwrap();
    let results = array.sample_environment(&env);

    assert!(results["gas_rack"].is_ok());
    assert!(results["emf_probe"].is_ok());
    assert!(results["cam_north"].is_err());
}

#[test]
fn ground_truth_data_skips_non_capable_sensors() {
    let config = ArrayConfig::from_json(
        r#"{
            "id": "station",
            "sensors": [
                {"kind": "chemical_array", "id": "gas", "params": {"channels": ["CO"]}},
                {
                    "kind": "chemical_array",
                    "id": "gas_blind",
                    "has_ground_truth": false,
                    "params": {"channels": ["CO"]}
                }
            ]
        }"#,
    )
    .unwrap();

    let env = TwinEnvironment::with_concentrations(&[("CO", 12.0)]);
    let array = SensorArray::from_config(&config, &SensorRegistry::with_builtin_kinds()).unwrap();

    let truth = array.ground_truth_data(&env);
    assert_eq!(truth.len(), 1);
    assert!(truth.contains_key("gas"));
}

#[test]
fn training_sample_merges_scenario_and_ground_truth_labels() {
    let env = full_environment();
    let mut array =
        SensorArray::from_config(&full_station_config(), &SensorRegistry::with_builtin_kinds())
            .unwrap();

    let scenario = BTreeMap::from([
        ("scenario".to_string(), serde_json::Value::from("overload")),
        ("severity".to_string(), serde_json::Value::from(3)),
    ]);
    let sample = array.generate_training_sample(&env, &scenario);

    assert_eq!(sample.labels["scenario"], "overload");
    assert_eq!(sample.labels["severity"], 3);
    assert_eq!(sample.labels["gt_gas_rack_CO"], 100.0);
    assert_eq!(sample.labels["gt_emf_probe_magnitude"], 4.0);
    assert_eq!(sample.labels["gt_cam_north_px_2_3"], 75.0);
    assert_eq!(sample.readings.len(), 3);
}

#[test]
fn metadata_serializes_for_downstream_tooling() {
    let array =
        SensorArray::from_config(&full_station_config(), &SensorRegistry::with_builtin_kinds())
            .unwrap();

    let metadata = array.ml_metadata();
    assert_eq!(metadata.len(), 3);

    let json = serde_json::to_value(&metadata).unwrap();
    let gas = json
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["sensor_id"] == "gas_rack")
        .unwrap();
    assert_eq!(gas["sensor_kind"], "chemical_array");
    assert_eq!(gas["position"][0], 10.0);
    assert_eq!(gas["imperfections"]["response_alpha"], 1.0);
    assert!(gas["imperfections"]["noise_std_dev"].is_null());
}

#[test]
fn bad_alpha_in_config_fails_construction() {
    let config = ArrayConfig::from_json(
        r#"{
            "id": "station",
            "sensors": [{
                "kind": "field",
                "imperfections": {"response": {"alpha": 1.5}}
            }]
        }"#,
    )
    .unwrap();
    assert!(SensorArray::from_config(&config, &SensorRegistry::with_builtin_kinds()).is_err());
}
