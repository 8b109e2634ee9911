//! Segment realization and placement
//!
//! Each interval is realized on a support that extends past both ends by the
//! half-width of the blend ramp there, so the blender has data wherever the
//! interval's class carries weight. Ramps never reach past the midpoint of a
//! neighbouring interval, so supports of one class never overlap.

use rand::Rng;
use tracing::debug;

use crate::blend::transition_half_widths;
use crate::config::GeneratorConfig;
use crate::noise::ColoredNoiseGenerator;
use crate::profile::{FlightConditions, FlightProfile};
use crate::schedule::TurbulenceInterval;
use crate::signal::{
    sample_count, sample_index, support_index, Channel, Signal, Timeline, CHANNEL_COUNT,
};
use crate::spectral::{Severity, SpectralParameters};
use crate::transfer::ChannelSpectrum;
use crate::TurbulenceError;

/// An interval together with the time span its realization covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentWindow {
    pub interval: TurbulenceInterval,
    pub support_start_s: f64,
    pub support_end_s: f64,
}

/// Expand every interval of the time-ordered cover `intervals` by the
/// ramp half-width on each side that has a neighbour.
pub fn expand_windows(
    intervals: &[TurbulenceInterval],
    flight_duration_s: u64,
    transition_s: f64,
) -> Vec<SegmentWindow> {
    let flight_end = flight_duration_s as f64;
    let half_widths = transition_half_widths(intervals, transition_s);

    intervals
        .iter()
        .enumerate()
        .map(|(i, interval)| {
            let before = i.checked_sub(1).map_or(0.0, |b| half_widths[b]);
            let after = half_widths.get(i).copied().unwrap_or(0.0);
            SegmentWindow {
                interval: *interval,
                support_start_s: (interval.start_s as f64 - before).max(0.0),
                support_end_s: (interval.end_s() as f64 + after).min(flight_end),
            }
        })
        .collect()
}

/// Realizes windows against one flight profile and stamps them onto
/// flight-long timelines.
pub struct SegmentComposer<'a> {
    profile: &'a FlightProfile,
    config: &'a GeneratorConfig,
    noise: ColoredNoiseGenerator,
}

impl<'a> SegmentComposer<'a> {
    pub fn new(profile: &'a FlightProfile, config: &'a GeneratorConfig) -> Self {
        Self {
            profile,
            config,
            noise: ColoredNoiseGenerator::new(),
        }
    }

    /// Spectral parameters for the profile's mean conditions over
    /// `[start_s, end_s)`.
    pub fn parameters(
        &self,
        start_s: f64,
        end_s: f64,
        severity: Severity,
    ) -> Result<(FlightConditions, SpectralParameters), TurbulenceError> {
        let conditions = self.profile.mean_conditions(start_s, end_s);
        let params = SpectralParameters::derive(
            conditions.airspeed,
            conditions.altitude,
            severity,
            self.config.wingspan_m,
            self.config.sampling_frequency,
        )?;
        Ok((conditions, params))
    }

    /// Six channels of `n` samples shaped by `params`.
    pub fn realize<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        params: &SpectralParameters,
        n: usize,
    ) -> Result<Signal, TurbulenceError> {
        let fs = self.config.sampling_frequency;
        let form = self.config.spectrum_form;
        let mut channels: [Vec<f64>; CHANNEL_COUNT] = Default::default();
        for channel in Channel::ALL {
            let spectrum = ChannelSpectrum::new(channel, form, params);
            channels[channel.index()] =
                self.noise.generate(rng, n, fs, params.bandwidth, &spectrum);
        }
        Signal::from_channels(fs, &channels)
    }

    /// Realization covering the window's support, parameterized by the
    /// mean conditions of its core interval.
    pub fn realize_window<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        window: &SegmentWindow,
    ) -> Result<(usize, Signal), TurbulenceError> {
        let fs = self.config.sampling_frequency;
        let interval = &window.interval;
        let (conditions, params) = self.parameters(
            interval.start_s as f64,
            interval.end_s() as f64,
            interval.severity,
        )?;

        let offset = support_index(window.support_start_s, fs);
        let end = support_index(window.support_end_s, fs);
        let n = end.saturating_sub(offset);

        debug!(
            start_s = interval.start_s,
            duration_s = interval.duration_s,
            turbulent = interval.is_turbulent,
            severity = interval.severity.label(),
            airspeed = conditions.airspeed,
            altitude = conditions.altitude,
            bandwidth = params.bandwidth,
            samples = n,
            "realized segment"
        );

        Ok((offset, self.realize(rng, &params, n)?))
    }

    /// Timeline of `class` holding every window's realization. Cores of
    /// turbulent windows are flagged.
    pub fn compose<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        windows: &[SegmentWindow],
        class: &'static str,
        flight_duration_s: u64,
    ) -> Result<Timeline, TurbulenceError> {
        let fs = self.config.sampling_frequency;
        let mut timeline = Timeline::new(class, sample_count(flight_duration_s as f64, fs), fs);

        for window in windows {
            let (offset, segment) = self.realize_window(rng, window)?;
            let flagged = if window.interval.is_turbulent {
                sample_index(window.interval.start_s as f64, fs)
                    ..sample_index(window.interval.end_s() as f64, fs)
            } else {
                0..0
            };
            timeline.stamp(offset, &segment, flagged)?;
        }

        Ok(timeline)
    }
}
