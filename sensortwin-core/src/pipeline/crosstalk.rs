//! Cross-sensitivity stage (chemical arrays)
//!
//! A chemical channel responds spuriously to concentrations of other
//! species. The interference table is sparse: only configured
//! target/interferer pairs contribute, and A affecting B says nothing
//! about B affecting A.

use std::collections::BTreeMap;

/// Sparse interference table: target channel → (interferer → coefficient)
#[derive(Debug, Clone)]
pub struct CrossSensitivity {
    table: BTreeMap<String, BTreeMap<String, f64>>,
}

impl CrossSensitivity {
    /// Build from a configured table; an empty table means the stage is
    /// absent and should be skipped entirely
    pub fn from_table(table: BTreeMap<String, BTreeMap<String, f64>>) -> Option<Self> {
        if table.is_empty() {
            return None;
        }
        Some(Self { table })
    }

    /// Compose perceived values:
    /// `perceived[t] = true[t] + Σ true[i] × coeff[t][i]`
    ///
    /// Interferers absent from the true reading contribute nothing.
    pub fn perceive(&self, truth: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
        truth
            .iter()
            .map(|(channel, &true_value)| {
                let mut perceived = true_value;
                if let Some(row) = self.table.get(channel) {
                    for (interferer, coeff) in row {
                        if let Some(&interferer_value) = truth.get(interferer) {
                            perceived += interferer_value * coeff;
                        }
                    }
                }
                (channel.clone(), perceived)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truth() -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("CO".to_string(), 100.0),
            ("NO2".to_string(), 50.0),
            ("SO2".to_string(), 20.0),
        ])
    }

    #[test]
    fn interference_is_linear_and_directional() {
        let table = BTreeMap::from([(
            "CO".to_string(),
            BTreeMap::from([("NO2".to_string(), 0.1), ("SO2".to_string(), 0.05)]),
        )]);
        let stage = CrossSensitivity::from_table(table).unwrap();

        let perceived = stage.perceive(&truth());
        // CO picks up 50*0.1 + 20*0.05 = 6.0
        assert_eq!(perceived["CO"], 106.0);
        // NO2 affecting CO does not imply CO affecting NO2
        assert_eq!(perceived["NO2"], 50.0);
        assert_eq!(perceived["SO2"], 20.0);
    }

    #[test]
    fn unknown_interferer_contributes_nothing() {
        let table = BTreeMap::from([(
            "CO".to_string(),
            BTreeMap::from([("O3".to_string(), 0.5)]),
        )]);
        let stage = CrossSensitivity::from_table(table).unwrap();
        assert_eq!(stage.perceive(&truth())["CO"], 100.0);
    }

    #[test]
    fn empty_table_disables_the_stage() {
        assert!(CrossSensitivity::from_table(BTreeMap::new()).is_none());
    }
}
