//! Imperfection Pipeline Stages
//!
//! ## Overview
//!
//! Every concrete sensor turns a ground-truth reading into an imperfect
//! one by running the same fixed, order-dependent chain of numeric
//! transforms inside `apply_imperfections`:
//!
//! ```text
//! truth → cross-talk → response EMA → noise → [defects] → drift
//!       → calibration → compensation → reading
//! ```
//!
//! 1. **Cross-talk** (chemical arrays): perceived value composition over a
//!    sparse interference table
//! 2. **Response-time filtering**: per-key exponential moving average,
//!    modeling finite sensor response; the only stateful stage
//! 3. **Additive noise**: one independent Gaussian draw per channel/pixel
//! 4. **Time drift**: baseline and sensitivity drift, linear in simulated
//!    hours
//! 5. **Calibration**: gain/offset error, optionally drifting, plus a
//!    quadratic non-linearity term
//! 6. **Environmental compensation**: residual temperature dependence
//!
//! Kind-specific structural defects slot into the chain where the physics
//! puts them: dead/hot pixel substitution and optical blur between stages
//! 3 and 5 for imagers, EMI and spectrum composition after stage 3 for
//! field sensors.
//!
//! Each stage is a pure function of the previous stage's output plus the
//! sensor's own configuration; stage 2 additionally owns its filter state,
//! borrowed mutably so the stateful contract is visible in the signature.
//! After every stage the value is rounded to the unit's precision and, for
//! concentrations and field magnitudes, clamped to ≥ 0
//! (see [`finish_stage`](crate::reading::finish_stage)).
//!
//! ## Optional inputs
//!
//! Stages 4–6 need inputs the environment may not provide: a simulation
//! clock and an ambient temperature. Their absence is not an error: the
//! stage is skipped, and [`StageContext`] logs one warning per sensor the
//! first time each input is found missing. Both drift stages (baseline and
//! calibration drift) share the same resolved clock, so "drift inputs
//! unavailable" is reported exactly once, from one place.

mod calibration;
mod compensation;
mod crosstalk;
mod drift;
mod noise;
mod response;

pub use calibration::CalibrationModel;
pub use compensation::CompensationModel;
pub use crosstalk::CrossSensitivity;
pub use drift::DriftModel;
pub use noise::NoiseInjector;
pub use response::{GridResponseFilter, ResponseFilter};

use crate::environment::EnvironmentQuery;
use crate::geometry::{Position, SamplingVolume};

/// Once-per-sensor flags for skipped-stage warnings
///
/// Lives in the sensor (alongside its filter state) so each condition is
/// logged the first time it occurs and stays silent afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipWarnings {
    clock_warned: bool,
    ambient_warned: bool,
}

/// Per-sample inputs shared by the time- and temperature-dependent stages
///
/// Resolved once at the start of `apply_imperfections`; a `None` field
/// means the corresponding stages are no-ops for this sample.
#[derive(Debug, Clone, Copy)]
pub struct StageContext {
    /// Simulated hours since scenario start, if the environment has a clock
    pub elapsed_hours: Option<f64>,
    /// Ambient temperature at the sensor's pose, if queryable
    pub ambient_temp_c: Option<f64>,
}

impl StageContext {
    /// Resolve optional stage inputs from the environment
    ///
    /// `needs_hours` / `needs_ambient` reflect which stages the sensor has
    /// configured; inputs nothing will consume are neither queried nor
    /// warned about.
    pub fn resolve(
        sensor_id: &str,
        env: &dyn EnvironmentQuery,
        position: Position,
        volume: &SamplingVolume,
        needs_hours: bool,
        needs_ambient: bool,
        warnings: &mut SkipWarnings,
    ) -> Self {
        let elapsed_hours = if needs_hours {
            match env.simulation_elapsed_hours() {
                Ok(hours) => Some(hours),
                Err(_) => {
                    if !warnings.clock_warned {
                        log::warn!(
                            "sensor {sensor_id}: drift inputs unavailable \
                             (no simulation clock); drift stages skipped"
                        );
                        warnings.clock_warned = true;
                    }
                    None
                }
            }
        } else {
            None
        };

        let ambient_temp_c = if needs_ambient {
            match env.temperature_celsius(position, volume) {
                Ok(temp) => Some(temp),
                Err(_) => {
                    if !warnings.ambient_warned {
                        log::warn!(
                            "sensor {sensor_id}: ambient temperature unavailable; \
                             environmental compensation skipped"
                        );
                        warnings.ambient_warned = true;
                    }
                    None
                }
            }
        } else {
            None
        };

        Self {
            elapsed_hours,
            ambient_temp_c,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{EnvError, EnvResult};

    struct ClockOnlyEnv;
    impl EnvironmentQuery for ClockOnlyEnv {
        fn simulation_elapsed_hours(&self) -> EnvResult<f64> {
            Ok(2.5)
        }
        fn temperature_celsius(
            &self,
            _position: Position,
            _volume: &SamplingVolume,
        ) -> EnvResult<f64> {
            Err(EnvError::Failed("thermal solver offline".into()))
        }
    }

    #[test]
    fn resolves_only_requested_inputs() {
        let env = ClockOnlyEnv;
        let mut warnings = SkipWarnings::default();
        let ctx = StageContext::resolve(
            "s1",
            &env,
            Position::default(),
            &SamplingVolume::Point,
            true,
            false,
            &mut warnings,
        );
        assert_eq!(ctx.elapsed_hours, Some(2.5));
        assert_eq!(ctx.ambient_temp_c, None);
    }

    #[test]
    fn failed_ambient_query_degrades_to_skip() {
        let env = ClockOnlyEnv;
        let mut warnings = SkipWarnings::default();
        let ctx = StageContext::resolve(
            "s1",
            &env,
            Position::default(),
            &SamplingVolume::Point,
            true,
            true,
            &mut warnings,
        );
        assert_eq!(ctx.elapsed_hours, Some(2.5));
        assert_eq!(ctx.ambient_temp_c, None);
        assert!(warnings.ambient_warned);
    }
}
