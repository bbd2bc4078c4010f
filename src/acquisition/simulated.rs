// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated weather source
//!
//! Produces a bounded random walk around a starting point so that the slave can
//! be exercised without a weather poller.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{SourceError, WeatherSample, WeatherSource};

const TEMPERATURE_RANGE: (f32, f32) = (-20.0, 50.0);
const HUMIDITY_RANGE: (f32, f32) = (0.0, 100.0);

pub struct SimulatedSource {
    rng: StdRng,
    current: WeatherSample,
    /// Largest change applied to each value per sample
    step: f32,
}

impl SimulatedSource {
    pub fn new(start: WeatherSample) -> Self {
        Self::from_rng(StdRng::from_os_rng(), start)
    }

    /// Deterministic source, for tests
    pub fn with_seed(seed: u64, start: WeatherSample) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), start)
    }

    fn from_rng(rng: StdRng, start: WeatherSample) -> Self {
        Self {
            rng,
            current: start,
            step: 0.5,
        }
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new(WeatherSample {
            temperature: 28.0,
            humidity: 70.0,
        })
    }
}

impl WeatherSource for SimulatedSource {
    fn latest_sample(&mut self) -> Result<Option<WeatherSample>, SourceError> {
        let dt = self.rng.random_range(-self.step..=self.step);
        let dh = self.rng.random_range(-self.step..=self.step);
        self.current.temperature =
            (self.current.temperature + dt).clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1);
        self.current.humidity =
            (self.current.humidity + dh).clamp(HUMIDITY_RANGE.0, HUMIDITY_RANGE.1);
        Ok(Some(self.current))
    }

    fn describe(&self) -> String {
        "simulated weather".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_walk_stays_bounded() {
        let mut source = SimulatedSource::with_seed(
            42,
            WeatherSample {
                temperature: 49.9,
                humidity: 0.1,
            },
        );
        let mut previous = source.current;
        for _ in 0..1000 {
            let sample = source.latest_sample().unwrap().unwrap();
            assert!((TEMPERATURE_RANGE.0..=TEMPERATURE_RANGE.1).contains(&sample.temperature));
            assert!((HUMIDITY_RANGE.0..=HUMIDITY_RANGE.1).contains(&sample.humidity));
            assert!((sample.temperature - previous.temperature).abs() <= 0.5 + 1e-4);
            previous = sample;
        }
    }

    #[test]
    fn test_seeded_sources_agree() {
        let start = WeatherSample {
            temperature: 25.0,
            humidity: 60.0,
        };
        let mut a = SimulatedSource::with_seed(7, start);
        let mut b = SimulatedSource::with_seed(7, start);
        for _ in 0..10 {
            assert_eq!(a.latest_sample().unwrap(), b.latest_sample().unwrap());
        }
    }
}
