//! Recorded flight profile
//!
//! Airspeed and altitude against time, queried for the mean conditions of
//! each realized segment.

use serde::{Deserialize, Serialize};

use crate::TurbulenceError;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileSample {
    /// [s]
    pub timestamp: f64,
    /// True airspeed [m/s]
    pub airspeed: f64,
    /// [m]
    pub altitude: f64,
}

/// Mean flight conditions over a span.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlightConditions {
    pub airspeed: f64,
    pub altitude: f64,
}

/// Samples with strictly increasing timestamps.
#[derive(Clone, Debug, PartialEq)]
pub struct FlightProfile {
    samples: Vec<ProfileSample>,
}

impl FlightProfile {
    pub fn new(samples: Vec<ProfileSample>) -> Result<Self, TurbulenceError> {
        if samples.is_empty() {
            return Err(TurbulenceError::InvalidProfile("profile has no samples".into()));
        }
        for (i, s) in samples.iter().enumerate() {
            if !(s.timestamp.is_finite() && s.airspeed.is_finite() && s.altitude.is_finite()) {
                return Err(TurbulenceError::InvalidProfile(format!(
                    "sample {i} has a non-finite value"
                )));
            }
        }
        if let Some(i) = samples
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(TurbulenceError::InvalidProfile(format!(
                "timestamps must be strictly increasing (sample {})",
                i + 1
            )));
        }
        Ok(Self { samples })
    }

    /// 1 Hz profile at fixed conditions.
    pub fn constant(
        duration_s: u64,
        airspeed: f64,
        altitude: f64,
    ) -> Result<Self, TurbulenceError> {
        let samples = (0..duration_s.max(1))
            .map(|t| ProfileSample {
                timestamp: t as f64,
                airspeed,
                altitude,
            })
            .collect();
        Self::new(samples)
    }

    pub fn samples(&self) -> &[ProfileSample] {
        &self.samples
    }

    /// Flight duration in whole seconds, padded one second past the last
    /// timestamp.
    pub fn duration_s(&self) -> u64 {
        let last = self.samples.last().map_or(0.0, |s| s.timestamp);
        last.max(0.0).floor() as u64 + 1
    }

    /// Profile linearly interpolated at `t_s`, held constant beyond the ends.
    pub fn interpolate(&self, t_s: f64) -> FlightConditions {
        let idx = self.samples.partition_point(|s| s.timestamp <= t_s);
        let conditions = |s: &ProfileSample| FlightConditions {
            airspeed: s.airspeed,
            altitude: s.altitude,
        };
        if idx == 0 {
            return conditions(&self.samples[0]);
        }
        if idx == self.samples.len() {
            return conditions(&self.samples[idx - 1]);
        }
        let a = &self.samples[idx - 1];
        let b = &self.samples[idx];
        let t = (t_s - a.timestamp) / (b.timestamp - a.timestamp);
        FlightConditions {
            airspeed: a.airspeed + (b.airspeed - a.airspeed) * t,
            altitude: a.altitude + (b.altitude - a.altitude) * t,
        }
    }

    /// Mean airspeed and altitude of samples in `[start_s, end_s)`. A span
    /// without samples falls back to the interpolated midpoint.
    pub fn mean_conditions(&self, start_s: f64, end_s: f64) -> FlightConditions {
        let lo = self.samples.partition_point(|s| s.timestamp < start_s);
        let hi = self.samples.partition_point(|s| s.timestamp < end_s);
        if hi <= lo {
            return self.interpolate(0.5 * (start_s + end_s));
        }

        let span = &self.samples[lo..hi];
        let n = span.len() as f64;
        FlightConditions {
            airspeed: span.iter().map(|s| s.airspeed).sum::<f64>() / n,
            altitude: span.iter().map(|s| s.altitude).sum::<f64>() / n,
        }
    }
}
