//! MIL-HDBK-1797A turbulence parameters
//!
//! Altitude-banded intensity and scale-length models. Below 1000 ft the
//! low-altitude formulas apply, above 2000 ft the high-altitude ones, and the
//! band in between blends the two formulas linearly so intensity and scale
//! length stay continuous across the seam.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::TurbulenceError;

pub const M_TO_FT: f64 = 3.28084;

const LOW_ALTITUDE_FT: f64 = 1000.0;
const HIGH_ALTITUDE_FT: f64 = 2000.0;

/// Sorted `(x, y)` breakpoints with piecewise-linear interpolation, clamped
/// to the end values outside the table.
#[derive(Clone, Copy, Debug)]
pub struct BreakpointTable {
    points: &'static [(f64, f64)],
}

impl BreakpointTable {
    pub const fn new(points: &'static [(f64, f64)]) -> Self {
        Self { points }
    }

    pub fn interpolate(&self, x: f64) -> f64 {
        let Some(&(x_first, y_first)) = self.points.first() else {
            return 0.0;
        };
        if x <= x_first {
            return y_first;
        }

        for pair in self.points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if x <= x1 {
                if x1 == x0 {
                    return y1;
                }
                return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
            }
        }

        self.points.last().map_or(y_first, |&(_, y)| y)
    }
}

// High-altitude intensity [ft/s] against altitude [ft], figure 262.
const HIGH_ALTITUDE_NONE: BreakpointTable = BreakpointTable::new(&[(0.0, 1.0), (80_000.0, 1.0)]);
const HIGH_ALTITUDE_LIGHT: BreakpointTable = BreakpointTable::new(&[
    (0.0, 5.0),
    (8_000.0, 5.0),
    (16_000.0, 3.0),
    (80_000.0, 3.0),
]);
const HIGH_ALTITUDE_MODERATE: BreakpointTable = BreakpointTable::new(&[
    (0.0, 10.0),
    (10_000.0, 10.0),
    (44_000.0, 3.0),
    (80_000.0, 3.0),
]);
const HIGH_ALTITUDE_SEVERE: BreakpointTable = BreakpointTable::new(&[
    (2_000.0, 15.0),
    (4_000.0, 20.0),
    (20_000.0, 20.0),
    (80_000.0, 3.0),
]);

/// Turbulence severity level.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Severity {
    /// Calm conditions
    #[default]
    None = 0,
    Light = 1,
    Moderate = 2,
    Severe = 3,
}

impl Severity {
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Light => "light",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }

    /// Reference wind speed at 20 ft [kn].
    fn wind_at_20ft_kn(self) -> f64 {
        match self {
            Severity::None => 5.0,
            Severity::Light => 15.0,
            Severity::Moderate => 30.0,
            Severity::Severe => 45.0,
        }
    }

    fn high_altitude_table(self) -> &'static BreakpointTable {
        match self {
            Severity::None => &HIGH_ALTITUDE_NONE,
            Severity::Light => &HIGH_ALTITUDE_LIGHT,
            Severity::Moderate => &HIGH_ALTITUDE_MODERATE,
            Severity::Severe => &HIGH_ALTITUDE_SEVERE,
        }
    }
}

impl TryFrom<u8> for Severity {
    type Error = TurbulenceError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Severity::None),
            1 => Ok(Severity::Light),
            2 => Ok(Severity::Moderate),
            3 => Ok(Severity::Severe),
            other => Err(TurbulenceError::InvalidParameter(format!(
                "severity must be 0, 1, 2 or 3, got {other}"
            ))),
        }
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.level()
    }
}

/// Per-axis quantity (u longitudinal, v lateral, w vertical).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisTriple {
    pub u: f64,
    pub v: f64,
    pub w: f64,
}

impl AxisTriple {
    pub fn new(u: f64, v: f64, w: f64) -> Self {
        Self { u, v, w }
    }

    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value)
    }

    pub fn lerp(a: Self, b: Self, t: f64) -> Self {
        Self {
            u: a.u + (b.u - a.u) * t,
            v: a.v + (b.v - a.v) * t,
            w: a.w + (b.w - a.w) * t,
        }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.u * factor, self.v * factor, self.w * factor)
    }

    pub fn max(&self) -> f64 {
        self.u.max(self.v).max(self.w)
    }
}

fn blend_altitude_band(
    h_ft: f64,
    low: impl Fn(f64) -> AxisTriple,
    high: impl Fn(f64) -> AxisTriple,
) -> AxisTriple {
    if h_ft <= LOW_ALTITUDE_FT {
        low(h_ft)
    } else if h_ft >= HIGH_ALTITUDE_FT {
        high(h_ft)
    } else {
        let t = (h_ft - LOW_ALTITUDE_FT) / (HIGH_ALTITUDE_FT - LOW_ALTITUDE_FT);
        AxisTriple::lerp(low(LOW_ALTITUDE_FT), high(HIGH_ALTITUDE_FT), t)
    }
}

fn low_altitude_std_ft(h_ft: f64, severity: Severity) -> AxisTriple {
    let h_ft = h_ft.max(0.0);
    let sigma_w = 0.1 * severity.wind_at_20ft_kn();
    let sigma_u = sigma_w / (0.177 + 0.000823 * h_ft).powf(0.4);
    AxisTriple::new(sigma_u, sigma_u, sigma_w)
}

fn high_altitude_std_ft(h_ft: f64, severity: Severity) -> AxisTriple {
    AxisTriple::uniform(severity.high_altitude_table().interpolate(h_ft))
}

/// Gust intensity `(sigma_u, sigma_v, sigma_w)` [m/s] at `altitude_m`.
pub fn turbulence_std(altitude_m: f64, severity: Severity) -> AxisTriple {
    let h_ft = altitude_m * M_TO_FT;
    blend_altitude_band(
        h_ft,
        |h| low_altitude_std_ft(h, severity),
        |h| high_altitude_std_ft(h, severity),
    )
    .scale(1.0 / M_TO_FT)
}

fn low_altitude_scale_length_ft(h_ft: f64) -> AxisTriple {
    let l_u = h_ft / (0.177 + 0.000823 * h_ft).powf(1.2);
    AxisTriple::new(l_u, l_u / 2.0, h_ft / 2.0)
}

fn high_altitude_scale_length_ft(_h_ft: f64) -> AxisTriple {
    AxisTriple::new(2500.0, 1250.0, 1250.0)
}

/// Scale lengths `(L_u, L_v, L_w)` [m] at `altitude_m`, floored at 1 m.
pub fn turbulence_scale_length(altitude_m: f64) -> AxisTriple {
    let h_ft = altitude_m.max(1.0) * M_TO_FT;
    blend_altitude_band(
        h_ft,
        low_altitude_scale_length_ft,
        high_altitude_scale_length_ft,
    )
    .scale(1.0 / M_TO_FT)
}

/// Correlation bandwidth [Hz] before any Nyquist clamp.
pub fn turbulence_bandwidth(altitude_m: f64, airspeed: f64) -> f64 {
    100.0 * airspeed / turbulence_scale_length(altitude_m).max()
}

/// Clamp `bandwidth` to the Nyquist frequency of `sampling_frequency`.
pub fn clamp_bandwidth(bandwidth: f64, sampling_frequency: f64) -> f64 {
    let nyquist = sampling_frequency / 2.0;
    if bandwidth > nyquist {
        debug!(bandwidth, nyquist, "turbulence bandwidth above Nyquist, clamping");
        nyquist
    } else {
        bandwidth
    }
}

/// Spectral parameters for one segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpectralParameters {
    /// True airspeed [m/s]
    pub airspeed: f64,
    /// Gust intensity per axis [m/s]
    pub sigma: AxisTriple,
    /// Scale length per axis [m]
    pub length_scale: AxisTriple,
    /// Aircraft wingspan [m]
    pub wingspan: f64,
    /// Band limit [Hz], never above Nyquist
    pub bandwidth: f64,
}

impl SpectralParameters {
    /// Derive the parameters for mean `airspeed` [m/s] and `altitude_m`.
    ///
    /// Every transfer function divides by the airspeed, so a non-positive
    /// mean airspeed is rejected.
    pub fn derive(
        airspeed: f64,
        altitude_m: f64,
        severity: Severity,
        wingspan: f64,
        sampling_frequency: f64,
    ) -> Result<Self, TurbulenceError> {
        if !airspeed.is_finite() || airspeed <= 0.0 {
            return Err(TurbulenceError::InvalidParameter(format!(
                "segment airspeed must be finite and > 0, got {airspeed}"
            )));
        }
        if !altitude_m.is_finite() {
            return Err(TurbulenceError::InvalidParameter(format!(
                "segment altitude must be finite, got {altitude_m}"
            )));
        }
        if !wingspan.is_finite() || wingspan <= 0.0 {
            return Err(TurbulenceError::InvalidParameter(format!(
                "wingspan must be finite and > 0, got {wingspan}"
            )));
        }

        Ok(Self {
            airspeed,
            sigma: turbulence_std(altitude_m, severity),
            length_scale: turbulence_scale_length(altitude_m),
            wingspan,
            bandwidth: clamp_bandwidth(
                turbulence_bandwidth(altitude_m, airspeed),
                sampling_frequency,
            ),
        })
    }
}
