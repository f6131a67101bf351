//! Response-time filtering stage
//!
//! Real instruments do not track a step change instantly; a first-order
//! lag is modeled with an exponential moving average per channel (or per
//! pixel, for imagers):
//!
//! ```text
//! state[k] = α·true[k] + (1−α)·state[k]      α ∈ (0, 1]
//! ```
//!
//! The accumulator initializes lazily to the first true value, so there is
//! no transient ramp-up from zero. The key set is fixed for the sensor's
//! lifetime; if the keyed shape ever changes the state is re-initialized
//! wholesale rather than partially patched.
//!
//! This is the only stateful stage in the pipeline; the state is a field
//! the filter borrows mutably, so the contract is visible in the type
//! signature.

use std::collections::BTreeMap;

use crate::errors::{SensorError, SensorResult};

/// Validate an EMA coefficient; out-of-range alpha is a construction
/// error, never a runtime one
pub(crate) fn validate_alpha(alpha: f64) -> SensorResult<f64> {
    if !alpha.is_finite() || alpha <= 0.0 || alpha > 1.0 {
        return Err(SensorError::invalid_config(format!(
            "response alpha must lie in (0, 1], got {alpha}"
        )));
    }
    Ok(alpha)
}

/// Per-channel EMA filter for keyed readings
#[derive(Debug, Clone)]
pub struct ResponseFilter {
    alpha: f64,
    state: BTreeMap<String, f64>,
}

impl ResponseFilter {
    pub fn new(alpha: f64) -> SensorResult<Self> {
        Ok(Self {
            alpha: validate_alpha(alpha)?,
            state: BTreeMap::new(),
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Filter one keyed reading, updating the persistent state
    pub fn filter(&mut self, values: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
        let shape_changed = !self.state.is_empty()
            && (self.state.len() != values.len()
                || values.keys().any(|k| !self.state.contains_key(k)));
        if shape_changed {
            self.state.clear();
        }

        values
            .iter()
            .map(|(key, &true_value)| {
                let filtered = match self.state.get(key) {
                    Some(&prev) => self.alpha * true_value + (1.0 - self.alpha) * prev,
                    None => true_value,
                };
                self.state.insert(key.clone(), filtered);
                (key.clone(), filtered)
            })
            .collect()
    }
}

/// Dense EMA filter for row-major pixel grids
#[derive(Debug, Clone)]
pub struct GridResponseFilter {
    alpha: f64,
    state: Vec<f64>,
}

impl GridResponseFilter {
    pub fn new(alpha: f64) -> SensorResult<Self> {
        Ok(Self {
            alpha: validate_alpha(alpha)?,
            state: Vec::new(),
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Filter a pixel buffer in place
    ///
    /// A length change re-initializes the whole state to the incoming
    /// frame (resolution change), matching the lazy first-frame init.
    pub fn filter(&mut self, pixels: &mut [f64]) {
        if self.state.len() != pixels.len() {
            self.state = pixels.to_vec();
            return;
        }
        for (pixel, state) in pixels.iter_mut().zip(self.state.iter_mut()) {
            *state = self.alpha * *pixel + (1.0 - self.alpha) * *state;
            *pixel = *state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_bounds_are_construction_errors() {
        assert!(ResponseFilter::new(0.0).is_err());
        assert!(ResponseFilter::new(-0.1).is_err());
        assert!(ResponseFilter::new(1.1).is_err());
        assert!(ResponseFilter::new(f64::NAN).is_err());
        assert!(ResponseFilter::new(1.0).is_ok());
        assert!(ResponseFilter::new(0.3).is_ok());
    }

    #[test]
    fn first_sample_passes_through() {
        let mut filter = ResponseFilter::new(0.2).unwrap();
        let values = BTreeMap::from([("CO".to_string(), 40.0)]);
        assert_eq!(filter.filter(&values)["CO"], 40.0);
    }

    #[test]
    fn converges_monotonically_to_constant_input() {
        let mut filter = ResponseFilter::new(0.3).unwrap();
        let mut values = BTreeMap::from([("CO".to_string(), 0.0)]);
        filter.filter(&values);

        values.insert("CO".to_string(), 10.0);
        let mut prev = 0.0;
        for _ in 0..40 {
            let out = filter.filter(&values)["CO"];
            assert!(out > prev, "filtered value must approach the input");
            assert!(out <= 10.0);
            prev = out;
        }
        assert!((prev - 10.0).abs() < 1e-3);
    }

    #[test]
    fn key_set_change_reinitializes_wholesale() {
        let mut filter = ResponseFilter::new(0.5).unwrap();
        filter.filter(&BTreeMap::from([("CO".to_string(), 100.0)]));

        // Different key set: old CO state must not leak into the new shape
        let values = BTreeMap::from([
            ("CO".to_string(), 10.0),
            ("NO2".to_string(), 5.0),
        ]);
        let out = filter.filter(&values);
        assert_eq!(out["CO"], 10.0);
        assert_eq!(out["NO2"], 5.0);
    }

    #[test]
    fn grid_filter_initializes_to_first_frame() {
        let mut filter = GridResponseFilter::new(0.4).unwrap();
        let mut frame = vec![20.0, 21.0, 22.0];
        filter.filter(&mut frame);
        assert_eq!(frame, vec![20.0, 21.0, 22.0]);

        let mut next = vec![30.0, 21.0, 22.0];
        filter.filter(&mut next);
        assert!((next[0] - 24.0).abs() < 1e-12); // 0.4*30 + 0.6*20
        assert_eq!(next[1], 21.0);
    }

    #[test]
    fn grid_resolution_change_resets_state() {
        let mut filter = GridResponseFilter::new(0.4).unwrap();
        filter.filter(&mut vec![20.0, 20.0]);

        let mut resized = vec![50.0, 50.0, 50.0];
        filter.filter(&mut resized);
        assert_eq!(resized, vec![50.0, 50.0, 50.0]);
    }
}
