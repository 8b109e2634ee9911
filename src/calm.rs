//! Calm-conditions-only generation
//!
//! The flight is cut into parameter-refresh windows of fixed length. Each
//! window is realized from the mean conditions of its core and overlap-added
//! with complementary ramps centered on the window boundaries, so the
//! weights sum to one everywhere.

use rand::Rng;
use tracing::debug;

use crate::blend::ramp;
use crate::compose::SegmentComposer;
use crate::config::GeneratorConfig;
use crate::profile::FlightProfile;
use crate::signal::{sample_count, sample_time, support_index, OutputSeries, Signal};
use crate::TurbulenceError;

/// Core span `[start_s, end_s)` of one refresh window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RefreshWindow {
    pub start_s: f64,
    pub end_s: f64,
}

/// Refresh windows covering `[0, flight_duration_s)`.
///
/// Boundaries sit at `k * period` for `k >= 1` as long as the ramp centered
/// on the boundary still ends inside the flight.
pub fn refresh_windows(
    flight_duration_s: u64,
    period_s: f64,
    transition_s: f64,
) -> Vec<RefreshWindow> {
    let flight_end = flight_duration_s as f64;
    let half = 0.5 * transition_s.max(0.0);

    let mut windows = Vec::new();
    let mut start = 0.0;
    let mut k = 1u64;
    loop {
        let boundary = k as f64 * period_s;
        if boundary + half > flight_end || boundary >= flight_end {
            break;
        }
        windows.push(RefreshWindow {
            start_s: start,
            end_s: boundary,
        });
        start = boundary;
        k += 1;
    }
    windows.push(RefreshWindow {
        start_s: start,
        end_s: flight_end,
    });
    windows
}

/// Background turbulence over the whole flight with every flag cleared.
pub fn generate_calm<R: Rng + ?Sized>(
    rng: &mut R,
    profile: &FlightProfile,
    config: &GeneratorConfig,
) -> Result<(OutputSeries, Vec<RefreshWindow>), TurbulenceError> {
    let fs = config.sampling_frequency;
    let duration_s = profile.duration_s();
    let flight_end = duration_s as f64;
    let transition = config.transition_duration_s;
    let half = 0.5 * transition;
    let len = sample_count(flight_end, fs);

    let windows = refresh_windows(duration_s, config.parameter_refresh_period_s, transition);
    let mut composer = SegmentComposer::new(profile, config);
    let mut output = Signal::zeros(len, fs);

    for window in &windows {
        let rises = window.start_s > 0.0;
        let falls = window.end_s < flight_end;
        let support_start = if rises { (window.start_s - half).max(0.0) } else { 0.0 };
        let support_end = if falls { (window.end_s + half).min(flight_end) } else { flight_end };

        let (conditions, params) =
            composer.parameters(window.start_s, window.end_s, config.background_severity)?;
        let offset = support_index(support_start, fs);
        let end = support_index(support_end, fs).min(len);
        let n = end.saturating_sub(offset);

        debug!(
            start_s = window.start_s,
            end_s = window.end_s,
            airspeed = conditions.airspeed,
            altitude = conditions.altitude,
            bandwidth = params.bandwidth,
            samples = n,
            "realized refresh window"
        );

        let segment = composer.realize(rng, &params, n)?;
        for (j, (out, sample)) in output.samples_mut()[offset..end]
            .iter_mut()
            .zip(segment.samples())
            .enumerate()
        {
            let t = sample_time(offset + j, fs);
            let rise = if rises {
                ramp(t, window.start_s, transition, config.transition_shape)
            } else {
                1.0
            };
            let fall = if falls {
                1.0 - ramp(t, window.end_s, transition, config.transition_shape)
            } else {
                1.0
            };
            let weight = rise.min(fall);
            for (o, s) in out.iter_mut().zip(sample) {
                *o += weight * s;
            }
        }
    }

    let series = OutputSeries::from_signal(&output, &vec![false; len])?;
    Ok((series, windows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blend::TransitionShape;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn windows_tile_the_flight() {
        let windows = refresh_windows(400, 180.0, 3.0);
        let spans: Vec<(f64, f64)> = windows.iter().map(|w| (w.start_s, w.end_s)).collect();
        assert_eq!(spans, vec![(0.0, 180.0), (180.0, 360.0), (360.0, 400.0)]);

        let windows = refresh_windows(361, 180.0, 3.0);
        assert_eq!(windows.last().map(|w| (w.start_s, w.end_s)), Some((180.0, 361.0)));

        let windows = refresh_windows(100, 180.0, 3.0);
        assert_eq!(windows.len(), 1);
    }

    #[test]
    fn ramp_weights_sum_to_one_across_boundaries() {
        let transition = 4.0;
        for shape in [TransitionShape::Linear, TransitionShape::Cosine] {
            for t in [98.0, 99.5, 100.0, 101.0, 102.0] {
                let fall = 1.0 - ramp(t, 100.0, transition, shape);
                let rise = ramp(t, 100.0, transition, shape);
                assert!((fall + rise - 1.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn calm_flight_is_unflagged_and_full_length() {
        let profile = FlightProfile::constant(120, 60.0, 300.0).expect("profile");
        let mut config = GeneratorConfig::new(12.0);
        config.sampling_frequency = 20.0;
        config.parameter_refresh_period_s = 50.0;

        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let (series, windows) = generate_calm(&mut rng, &profile, &config).expect("calm");
        assert_eq!(windows.len(), 3);
        assert_eq!(series.len(), 2400);
        assert_eq!(series.turbulent_fraction(), 0.0);
        assert!(series.channel(crate::signal::Channel::U).iter().any(|&u| u != 0.0));
        assert!(series.rows.iter().all(|r| r.u.is_finite() && r.r.is_finite()));
    }
}
