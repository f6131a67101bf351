//! Additive noise stage
//!
//! One independent Gaussian draw per channel/pixel per sample, with
//! per-channel mean/std overrides falling back to the global spec. A
//! standard deviation ≤ 0 disables noise for that key. The injector owns
//! its RNG; seeding it from the spec makes a whole run reproducible.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::collections::BTreeMap;

use crate::config::{ChannelNoise, NoiseSpec};

/// Gaussian noise source for one sensor
#[derive(Debug)]
pub struct NoiseInjector {
    mean: f64,
    std_dev: f64,
    per_channel: BTreeMap<String, ChannelNoise>,
    rng: StdRng,
}

impl NoiseInjector {
    pub fn from_spec(spec: &NoiseSpec) -> Self {
        let rng = match spec.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            mean: spec.mean,
            std_dev: spec.std_dev,
            per_channel: spec.per_channel.clone(),
            rng,
        }
    }

    /// Effective (mean, std_dev) for a channel after override fallback
    fn params_for(&self, channel: &str) -> (f64, f64) {
        match self.per_channel.get(channel) {
            Some(overrides) => (
                overrides.mean.unwrap_or(self.mean),
                overrides.std_dev.unwrap_or(self.std_dev),
            ),
            None => (self.mean, self.std_dev),
        }
    }

    /// Add one draw to a channel value; std ≤ 0 leaves it untouched
    pub fn apply(&mut self, channel: &str, value: f64) -> f64 {
        let (mean, std_dev) = self.params_for(channel);
        if std_dev <= 0.0 {
            return value;
        }
        match Normal::new(mean, std_dev) {
            Ok(dist) => value + dist.sample(&mut self.rng),
            Err(_) => value,
        }
    }

    /// Add one independent draw per pixel, global spec only
    pub fn apply_grid(&mut self, pixels: &mut [f64]) {
        if self.std_dev <= 0.0 {
            return;
        }
        let Ok(dist) = Normal::new(self.mean, self.std_dev) else {
            return;
        };
        for pixel in pixels.iter_mut() {
            *pixel += dist.sample(&mut self.rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_spec(std_dev: f64) -> NoiseSpec {
        NoiseSpec {
            std_dev,
            seed: Some(42),
            ..NoiseSpec::default()
        }
    }

    #[test]
    fn zero_std_dev_is_a_no_op() {
        let mut injector = NoiseInjector::from_spec(&seeded_spec(0.0));
        assert_eq!(injector.apply("CO", 12.5), 12.5);

        let mut pixels = vec![20.0; 4];
        injector.apply_grid(&mut pixels);
        assert_eq!(pixels, vec![20.0; 4]);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let mut a = NoiseInjector::from_spec(&seeded_spec(1.0));
        let mut b = NoiseInjector::from_spec(&seeded_spec(1.0));
        for _ in 0..10 {
            assert_eq!(a.apply("CO", 5.0), b.apply("CO", 5.0));
        }
    }

    #[test]
    fn per_channel_override_takes_precedence() {
        let mut spec = seeded_spec(0.0); // global disabled
        spec.per_channel.insert(
            "NO2".to_string(),
            ChannelNoise {
                mean: Some(100.0),
                std_dev: Some(0.001),
            },
        );
        let mut injector = NoiseInjector::from_spec(&spec);

        // Global std ≤ 0: CO untouched
        assert_eq!(injector.apply("CO", 1.0), 1.0);
        // NO2 override: shifted by roughly the override mean
        let noisy = injector.apply("NO2", 1.0);
        assert!((noisy - 101.0).abs() < 1.0);
    }

    #[test]
    fn draws_scatter_around_the_mean() {
        let mut injector = NoiseInjector::from_spec(&seeded_spec(2.0));
        let n = 2000;
        let sum: f64 = (0..n).map(|_| injector.apply("CO", 0.0)).sum();
        let mean = sum / n as f64;
        assert!(mean.abs() < 0.2, "sample mean {mean} too far from 0");
    }
}
