//! Turbulence transfer functions
//!
//! Spectral magnitudes for the six disturbance channels, evaluated at an
//! angular frequency `omega` [rad/s]. Rotary channels reuse the w or v
//! translational spectrum with an extra frequency-dependent factor.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::signal::Channel;
use crate::spectral::SpectralParameters;

/// Which closed-form family shapes the noise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumForm {
    /// Square root of the MIL-HDBK-1797A power spectra, so `H^2 = phi`.
    #[default]
    VonKarman,
    /// Rational shaping filters approximating the von Karman spectra.
    RationalFilter,
}

/// Anything that maps an angular frequency to a spectral magnitude.
pub trait Spectrum {
    fn magnitude(&self, omega: f64) -> f64;
}

impl<F> Spectrum for F
where
    F: Fn(f64) -> f64,
{
    fn magnitude(&self, omega: f64) -> f64 {
        self(omega)
    }
}

/// Transfer function of one channel under fixed segment parameters.
#[derive(Clone, Copy, Debug)]
pub struct ChannelSpectrum<'a> {
    pub channel: Channel,
    pub form: SpectrumForm,
    pub params: &'a SpectralParameters,
}

impl<'a> ChannelSpectrum<'a> {
    pub fn new(channel: Channel, form: SpectrumForm, params: &'a SpectralParameters) -> Self {
        Self {
            channel,
            form,
            params,
        }
    }
}

impl Spectrum for ChannelSpectrum<'_> {
    fn magnitude(&self, omega: f64) -> f64 {
        magnitude(self.channel, self.form, omega, self.params)
    }
}

pub fn magnitude(
    channel: Channel,
    form: SpectrumForm,
    omega: f64,
    params: &SpectralParameters,
) -> f64 {
    match form {
        SpectrumForm::VonKarman => power_spectrum(channel, omega, params).sqrt(),
        SpectrumForm::RationalFilter => rational_filter(channel, omega, params).abs(),
    }
}

/// Power spectral density `phi` of `channel` at `omega`.
pub fn power_spectrum(channel: Channel, omega: f64, params: &SpectralParameters) -> f64 {
    let v = params.airspeed;
    let b = params.wingspan;
    match channel {
        Channel::U => phi_longitudinal(params.sigma.u, params.length_scale.u, v, omega),
        Channel::V => phi_transverse(params.sigma.v, params.length_scale.v, v, omega),
        Channel::W => phi_transverse(params.sigma.w, params.length_scale.w, v, omega),
        Channel::P => {
            let sigma_w = params.sigma.w;
            let l_w = params.length_scale.w;
            sigma_w.powi(2) / 2.0 / l_w * 0.8 * (2.0 * PI * l_w / 4.0 / b).powf(1.0 / 3.0)
                / (1.0 + (4.0 * b * omega / PI / v).powi(2))
        }
        Channel::Q => {
            (omega / v).powi(2) / (1.0 + (4.0 * b * omega / PI / v).powi(2))
                * power_spectrum(Channel::W, omega, params)
        }
        Channel::R => {
            (omega / v).powi(2) / (1.0 + (3.0 * b * omega / PI / v).powi(2))
                * power_spectrum(Channel::V, omega, params)
        }
    }
}

fn phi_longitudinal(sigma: f64, l: f64, v: f64, omega: f64) -> f64 {
    sigma.powi(2) * 2.0 * l / PI / (1.0 + (1.339 * l * omega / v).powi(2)).powf(5.0 / 6.0)
}

fn phi_transverse(sigma: f64, l: f64, v: f64, omega: f64) -> f64 {
    let x2 = (2.678 * l * omega / v).powi(2);
    sigma.powi(2) * 2.0 * l / PI * (1.0 + 8.0 / 3.0 * x2) / (1.0 + x2).powf(11.0 / 6.0)
}

/// Shaping filter `H` of `channel` at `s`. May be negative (r channel).
pub fn rational_filter(channel: Channel, s: f64, params: &SpectralParameters) -> f64 {
    let v = params.airspeed;
    let b = params.wingspan;
    match channel {
        Channel::U => {
            let l = params.length_scale.u;
            let x = l * s / v;
            params.sigma.u * (2.0 * l / PI / v).sqrt() * (1.0 + 0.25 * x)
                / (1.0 + 1.357 * x + 0.1987 * x.powi(2))
        }
        Channel::V => filter_transverse(params.sigma.v, params.length_scale.v, v, s),
        Channel::W => filter_transverse(params.sigma.w, params.length_scale.w, v, s),
        Channel::P => {
            let l_w = params.length_scale.w;
            params.sigma.w * (0.8 / v).sqrt() * (PI / 4.0 / b).powf(1.0 / 6.0)
                / ((2.0 * l_w).powf(1.0 / 3.0) * (1.0 + 4.0 * b * s / PI / v))
        }
        Channel::Q => {
            s * rational_filter(Channel::W, s, params) / v / (1.0 + 4.0 * b * s / PI / v)
        }
        Channel::R => {
            -s * rational_filter(Channel::V, s, params) / v / (1.0 + 3.0 * b * s / PI / v)
        }
    }
}

fn filter_transverse(sigma: f64, l: f64, v: f64, s: f64) -> f64 {
    let x = 2.0 * l * s / v;
    sigma * (2.0 * l / PI / v).sqrt() * (1.0 + 2.7478 * x + 0.3398 * x.powi(2))
        / (1.0 + 2.9958 * x + 1.9754 * x.powi(2) + 0.1539 * x.powi(3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::{AxisTriple, Severity};

    fn reference_params() -> SpectralParameters {
        SpectralParameters::derive(150.0, 3000.0, Severity::Moderate, 20.0, 50.0)
            .expect("valid parameters")
    }

    #[test]
    fn von_karman_magnitude_squares_to_power_spectrum() {
        let params = reference_params();
        for channel in Channel::ALL {
            for omega in [0.1, 1.0, 10.0, 60.0] {
                let h = magnitude(channel, SpectrumForm::VonKarman, omega, &params);
                let phi = power_spectrum(channel, omega, &params);
                assert!((h * h - phi).abs() <= 1e-12 * phi.max(1.0), "{channel:?} at {omega}");
            }
        }
    }

    #[test]
    fn translational_spectra_start_at_sigma_squared_scale() {
        let params = reference_params();
        let phi_u0 = power_spectrum(Channel::U, 0.0, &params);
        let expected = params.sigma.u.powi(2) * 2.0 * params.length_scale.u / PI;
        assert!((phi_u0 - expected).abs() < 1e-9);
        assert_eq!(power_spectrum(Channel::Q, 0.0, &params), 0.0);
        assert_eq!(power_spectrum(Channel::R, 0.0, &params), 0.0);
    }

    #[test]
    fn spectra_decay_with_frequency() {
        let params = reference_params();
        for channel in [Channel::U, Channel::V, Channel::W, Channel::P] {
            let low = power_spectrum(channel, 0.5, &params);
            let high = power_spectrum(channel, 50.0, &params);
            assert!(high < low, "{channel:?}");
        }
    }

    #[test]
    fn rotary_channels_scale_translational_spectra() {
        let params = reference_params();
        let omega = 2.0;
        let v = params.airspeed;
        let b = params.wingspan;
        let expected_q = (omega / v).powi(2) / (1.0 + (4.0 * b * omega / PI / v).powi(2))
            * power_spectrum(Channel::W, omega, &params);
        assert!((power_spectrum(Channel::Q, omega, &params) - expected_q).abs() < 1e-15);
    }

    #[test]
    fn rational_filter_r_is_negative_but_magnitude_is_not() {
        let params = reference_params();
        assert!(rational_filter(Channel::R, 1.0, &params) < 0.0);
        assert!(magnitude(Channel::R, SpectrumForm::RationalFilter, 1.0, &params) > 0.0);
    }

    #[test]
    fn rational_filter_matches_low_frequency_level() {
        let params = SpectralParameters {
            airspeed: 100.0,
            sigma: AxisTriple::uniform(2.0),
            length_scale: AxisTriple::uniform(500.0),
            wingspan: 10.0,
            bandwidth: 20.0,
        };
        let h0 = rational_filter(Channel::W, 0.0, &params);
        let expected = 2.0 * (2.0 * 500.0 / PI / 100.0).sqrt();
        assert!((h0 - expected).abs() < 1e-12);
    }

    #[test]
    fn closures_are_spectra() {
        let flat = |_omega: f64| 3.0;
        assert_eq!(flat.magnitude(12.0), 3.0);
    }
}
