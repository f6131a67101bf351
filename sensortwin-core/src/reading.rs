//! Sensor Reading Type
//!
//! A reading is a flat mapping from channel/pixel key to numeric value,
//! plus a unit tag. Ground-truth and imperfect readings share this shape,
//! so downstream consumers cannot distinguish them by structure alone.
//! Readings are produced fresh on every sample; a sensor never retains one
//! beyond what its filter state requires.
//!
//! Rounding policy lives here: every pipeline stage rounds to a fixed
//! decimal precision appropriate to the physical unit (3 decimals for
//! concentrations and field strengths, 2 for temperatures) so outputs stay
//! stable and comparable in tests. Negative-clamping policy is also a
//! property of the unit: concentrations and field magnitudes can never go
//! below zero, temperatures can.

use serde::Serialize;
use std::collections::BTreeMap;

/// Physical unit of a reading's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Parts per million (chemical concentration)
    Ppm,
    /// Degrees Celsius (thermal)
    Celsius,
    /// Volts per meter (electromagnetic field strength)
    VoltsPerMeter,
}

impl Unit {
    /// Human-readable unit symbol
    pub const fn name(&self) -> &'static str {
        match self {
            Unit::Ppm => "ppm",
            Unit::Celsius => "°C",
            Unit::VoltsPerMeter => "V/m",
        }
    }

    /// Decimal places every pipeline stage rounds to for this unit
    pub const fn decimals(&self) -> u32 {
        match self {
            Unit::Ppm => 3,
            Unit::Celsius => 2,
            Unit::VoltsPerMeter => 3,
        }
    }

    /// Whether values in this unit are clamped to ≥ 0 after every stage
    pub const fn clamps_negative(&self) -> bool {
        match self {
            Unit::Ppm | Unit::VoltsPerMeter => true,
            Unit::Celsius => false,
        }
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Round per the unit's precision, then clamp if the unit requires it
///
/// Applied after every pipeline stage so no stage can leave an
/// out-of-domain intermediate behind.
pub fn finish_stage(value: f64, unit: Unit) -> f64 {
    let rounded = round_to(value, unit.decimals());
    if unit.clamps_negative() {
        rounded.max(0.0)
    } else {
        rounded
    }
}

/// One sensor output: keyed values plus a unit tag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    unit: Unit,
    values: BTreeMap<String, f64>,
}

impl Reading {
    pub fn new(unit: Unit) -> Self {
        Self {
            unit,
            values: BTreeMap::new(),
        }
    }

    /// Build from an existing key → value map
    pub fn from_values(unit: Unit, values: BTreeMap<String, f64>) -> Self {
        Self { unit, values }
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate channels in key order (deterministic across runs)
    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.values.iter()
    }

    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    /// Consume into the underlying map
    pub fn into_values(self) -> BTreeMap<String, f64> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_matches_unit_precision() {
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(21.987654, 2), 21.99);
        assert_eq!(round_to(-0.0004, 3), -0.0);
    }

    #[test]
    fn concentrations_clamp_to_zero() {
        assert_eq!(finish_stage(-3.2, Unit::Ppm), 0.0);
        assert_eq!(finish_stage(-3.2, Unit::VoltsPerMeter), 0.0);
    }

    #[test]
    fn temperatures_keep_their_sign() {
        assert_eq!(finish_stage(-12.345, Unit::Celsius), -12.35);
    }

    #[test]
    fn reading_iterates_in_key_order() {
        let mut r = Reading::new(Unit::Ppm);
        r.insert("SO2", 1.0);
        r.insert("CO", 2.0);
        r.insert("NO2", 3.0);
        let keys: Vec<_> = r.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["CO", "NO2", "SO2"]);
    }
}
