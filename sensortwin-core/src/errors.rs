//! Error Types for Sensor Simulation Failures
//!
//! ## Error Categories
//!
//! Errors fall into two broad classes with different propagation rules:
//!
//! ### Sampling errors (returned as values, never panic)
//! - `CapabilityMissing`: the environment does not implement a query the
//!   sensor needs (e.g. no thermal field view for an imager)
//! - `CapabilityFailed`: the query exists but raised or returned invalid data
//! - `MalformedResponse`: the query returned data of the wrong shape
//!   (e.g. an image with unexpected resolution)
//! - `NoGroundTruth`: ground truth requested from a sensor configured
//!   without that capability
//!
//! These are captured at the point of failure and surface as `Err` entries
//! in the orchestrator's output map; one sensor's failure never aborts the
//! rest of the array.
//!
//! ### Construction errors (fatal, raised before any sampling)
//! - `InvalidConfig`: a construction-time parameter is out of range
//!   (EMA alpha outside (0,1], defect pixel outside the image, duplicate
//!   sensor id). This is the only class that terminates construction
//!   instead of producing a degraded runtime value.

use serde::Serialize;
use thiserror::Error;

/// Result type for sensor operations
pub type SensorResult<T> = Result<T, SensorError>;

/// Errors produced by sensor construction and sampling
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum SensorError {
    /// Environment does not provide a required query capability
    #[error("environment does not support {capability}")]
    CapabilityMissing {
        /// Name of the missing capability
        capability: &'static str,
    },

    /// The capability exists but the query failed
    #[error("{capability} query failed: {reason}")]
    CapabilityFailed {
        /// Name of the failing capability
        capability: &'static str,
        /// Human-readable failure description
        reason: String,
    },

    /// The environment returned data with the wrong shape
    #[error("malformed environment response: {reason}")]
    MalformedResponse {
        /// What was wrong with the response
        reason: String,
    },

    /// Construction-time parameter out of range; fatal, never deferred
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Which parameter and why
        reason: String,
    },

    /// Ground truth requested from a sensor without that capability
    #[error("sensor '{sensor_id}' is not ground-truth capable")]
    NoGroundTruth {
        /// The sensor that was asked
        sensor_id: String,
    },
}

impl SensorError {
    /// Shorthand for `InvalidConfig` with a formatted reason
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        let err = SensorError::CapabilityMissing {
            capability: "thermal_field_view",
        };
        assert_eq!(
            err.to_string(),
            "environment does not support thermal_field_view"
        );

        let err = SensorError::NoGroundTruth {
            sensor_id: "array_chem_0".into(),
        };
        assert!(err.to_string().contains("array_chem_0"));
    }
}
